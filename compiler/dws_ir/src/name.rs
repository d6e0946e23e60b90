//! Case-insensitive identifiers.
//!
//! DWScript resolves every symbol (variables, classes, methods, fields,
//! functions, units) without regard to case. `Name` keeps the original
//! spelling for diagnostics and a canonical key for identity; all equality,
//! ordering and hashing go through the key.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// An identifier with its source spelling and canonical lookup key.
///
/// Cloning is two reference-count bumps. The key is produced by
/// [`Name::canonical`], which is the only case-folding routine in the
/// workspace; storage and lookup sites must not fold case on their own.
#[derive(Clone)]
pub struct Name {
    spelling: Rc<str>,
    key: Rc<str>,
}

impl Name {
    /// Create a name from its source spelling.
    pub fn new(spelling: &str) -> Self {
        let key = Self::canonical(spelling);
        if key == spelling {
            let shared: Rc<str> = Rc::from(spelling);
            Name {
                spelling: Rc::clone(&shared),
                key: shared,
            }
        } else {
            Name {
                spelling: Rc::from(spelling),
                key: Rc::from(key.as_str()),
            }
        }
    }

    /// Canonicalize an identifier for case-insensitive comparison.
    pub fn canonical(spelling: &str) -> String {
        spelling.to_lowercase()
    }

    /// The original spelling.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.spelling
    }

    /// The canonical key.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Check whether `other` names the same symbol.
    pub fn matches(&self, other: &str) -> bool {
        *self.key == *Self::canonical(other)
    }
}

impl PartialEq for Name {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Name {}

impl Hash for Name {
    // Must hash exactly like `str` so `Borrow<str>` lookups by canonical key work.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.key
    }
}

impl From<&str> for Name {
    fn from(spelling: &str) -> Self {
        Name::new(spelling)
    }
}

impl From<String> for Name {
    fn from(spelling: String) -> Self {
        Name::new(&spelling)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.spelling)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spelling)
    }
}
