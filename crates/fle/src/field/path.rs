//! `/`-delimited field paths and the request-scoped set of declared paths.
//!
//! Segments are escaped JSON-pointer style: `~` → `~0`, `/` → `~1`. Unlike
//! RFC 6901 pointers, paths carry no leading `/`: `a~1b/c` names key `c`
//! inside key `a/b` of the root object.

use std::collections::BTreeMap;

/// Escape one key for use as a path segment.
pub fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Reverse [`escape_segment`]. `~1` is replaced before `~0` so that `~01`
/// yields the literal `~1`.
pub fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Split an escaped path into its unescaped segments.
///
/// The empty path names the empty key `""` of the root object.
pub fn parse_path(path: &str) -> Vec<String> {
    path.split('/').map(unescape_segment).collect()
}

/// Paths declared for encryption on one piece of content, each bound to a
/// provider alias.
///
/// Declarations are request-scoped: the encrypt pass clears them once every
/// declared field has been sealed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptionPaths {
    entries: BTreeMap<String, String>,
}

impl EncryptionPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an already-escaped `path` for encryption under `alias`.
    /// A second declaration of the same path replaces the alias.
    pub fn register(&mut self, path: impl Into<String>, alias: impl Into<String>) {
        self.entries.insert(path.into(), alias.into());
    }

    /// Declare the top-level key `name` (escaped here) for encryption.
    pub fn register_field(&mut self, name: &str, alias: impl Into<String>) {
        self.register(escape_segment(name), alias);
    }

    /// Drop the declaration for the top-level key `name`, if any.
    pub fn remove_field(&mut self, name: &str) -> Option<String> {
        self.entries.remove(&escape_segment(name))
    }

    /// Move every declaration of `child` under the key `name`, leaving
    /// `child` empty. Used when a child object with its own declarations is
    /// inserted into a parent.
    pub fn nest(&mut self, name: &str, child: &mut EncryptionPaths) {
        let prefix = escape_segment(name);
        for (path, alias) in std::mem::take(&mut child.entries) {
            self.entries.insert(format!("{prefix}/{path}"), alias);
        }
    }

    /// The alias declared for `path`.
    pub fn alias_for(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// Declarations in lexicographic path order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, a)| (p.as_str(), a.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
