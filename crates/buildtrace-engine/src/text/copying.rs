//! Recognition of the copy task's three fixed message templates.

const COPYING_PREFIX: &str = "Copying file from \"";
const HARD_LINK_PREFIX: &str = "Creating hard link to copy \"";
const DID_NOT_COPY_PREFIX: &str = "Did not copy from file \"";

const TO_MID: &str = "\" to \"";
const TO_FILE_MID: &str = "\" to file \"";

/// Extract `(source, destination, copied)` from a copy-task message, or
/// `None` when the text matches none of the three templates.
pub(crate) fn parse_copy_message(text: &str) -> Option<(String, String, bool)> {
    if let Some((source, destination)) = split_paths(text, COPYING_PREFIX, TO_MID) {
        return Some((source, destination, true));
    }
    if let Some((source, destination)) = split_paths(text, HARD_LINK_PREFIX, TO_MID) {
        return Some((source, destination, true));
    }
    if let Some((source, destination)) = split_paths(text, DID_NOT_COPY_PREFIX, TO_FILE_MID) {
        return Some((source, destination, false));
    }
    None
}

fn split_paths(text: &str, prefix: &str, mid: &str) -> Option<(String, String)> {
    let rest = text.strip_prefix(prefix)?;
    let mid_idx = rest.find(mid)?;
    let source = &rest[..mid_idx];
    let rest = &rest[mid_idx + mid.len()..];
    let end = rest.find('"')?;
    Some((source.to_string(), rest[..end].to_string()))
}
