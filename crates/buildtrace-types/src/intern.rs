use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

/// A deduplicated string handle.
///
/// Two interned strings obtained from the same [`StringInterner`] compare
/// pointer-equal whenever their newline-normalized text is equal, so equality
/// checks on hot paths are a pointer comparison first and a text comparison
/// only as a fallback (e.g. for handles that crossed interner boundaries or
/// came from deserialization).
#[derive(Clone)]
pub struct InternedString(Arc<str>);

impl InternedString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if both handles share the same backing storage.
    pub fn ptr_eq(&self, other: &InternedString) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq for InternedString {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl Eq for InternedString {}

impl Hash for InternedString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialEq<str> for InternedString {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl From<&str> for InternedString {
    /// Wraps text without interning it. Intended for tests and for values
    /// that never repeat; repeated strings should go through the interner.
    fn from(text: &str) -> Self {
        InternedString(Arc::from(text))
    }
}

impl Serialize for InternedString {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for InternedString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(InternedString(Arc::from(text.as_str())))
    }
}

/// Deduplicates repeated text into shared storage.
///
/// Build logs repeat the same paths, property names, and item specs millions
/// of times; interning bounds memory to one copy per distinct string. Lookup
/// normalizes `\r\n` and lone `\r` to `\n`, but the canonical stored value is
/// the original text of the first occurrence - callers must not assume the
/// returned string is normalized.
///
/// The table never evicts; an interner lives for the processing of one build.
pub struct StringInterner {
    table: Mutex<HashMap<String, Arc<str>>>,
    empty: Arc<str>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
            empty: Arc::from(""),
        }
    }

    /// Intern `text`, returning the shared handle for its first occurrence.
    ///
    /// Empty input passes through as a shared empty handle without touching
    /// the table.
    pub fn intern(&self, text: &str) -> InternedString {
        if text.is_empty() {
            return InternedString(self.empty.clone());
        }

        let key = normalize_newlines(text);
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = table.get(key.as_ref()) {
            return InternedString(existing.clone());
        }

        let stored: Arc<str> = Arc::from(text);
        table.insert(key.into_owned(), stored.clone());
        InternedString(stored)
    }

    /// Number of distinct strings currently interned.
    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize `\r\n` and lone `\r` to `\n`.
///
/// Used for interner lookup keys and by the message text parsers, which
/// split payloads on normalized newlines.
pub fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_deduplicates() {
        let interner = StringInterner::new();
        let a = interner.intern("obj/Debug/App.dll");
        let b = interner.intern("obj/Debug/App.dll");

        assert!(a.ptr_eq(&b));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_intern_normalizes_lookup_but_keeps_first_occurrence() {
        let interner = StringInterner::new();
        let first = interner.intern("line1\r\nline2");
        let second = interner.intern("line1\nline2");
        let third = interner.intern("line1\rline2");

        assert!(first.ptr_eq(&second));
        assert!(first.ptr_eq(&third));
        // Canonical value is the original, un-normalized first occurrence.
        assert_eq!(second.as_str(), "line1\r\nline2");
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_intern_empty_passthrough() {
        let interner = StringInterner::new();
        let a = interner.intern("");
        let b = interner.intern("");

        assert!(a.is_empty());
        assert!(a.ptr_eq(&b));
        assert_eq!(interner.len(), 0);
    }

    #[test]
    fn test_intern_distinct_strings_stay_distinct() {
        let interner = StringInterner::new();
        let a = interner.intern("Compile");
        let b = interner.intern("Content");

        assert!(!a.ptr_eq(&b));
        assert_ne!(a, b);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_intern_concurrent_use() {
        use std::sync::Arc as StdArc;
        use std::thread;

        let interner = StdArc::new(StringInterner::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let interner = interner.clone();
                thread::spawn(move || interner.intern("shared/path.cs"))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for pair in results.windows(2) {
            assert!(pair[0].ptr_eq(&pair[1]));
        }
        assert_eq!(interner.len(), 1);
    }
}
