//! Interned strings used as knowledge paths, parameter names and tags.
//!
//! Two symbols built from the same text share one leaked `&'static str`, so
//! equality and hashing only look at the address.

use ::once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Mutex;

static SYMBOL_HEAP: Lazy<Mutex<HashSet<&'static str>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// An interned string with O(1) equality.
#[derive(Clone, Copy, Eq)]
pub struct Symbol {
    s: &'static str,
}

impl Symbol {
    pub fn new(s: &str) -> Self {
        // A poisoned heap still holds valid leaked strings.
        let mut heap = SYMBOL_HEAP
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(&s) = heap.get(s) {
            return Symbol { s };
        }
        let s: &'static str = Box::leak(s.to_owned().into_boxed_str());
        heap.insert(s);
        Symbol { s }
    }

    /// Retrieves the address of the backing string.
    pub fn addr(self) -> usize {
        self.s.as_ptr() as usize
    }

    pub fn as_str(self) -> &'static str {
        self.s
    }

    /// Number of distinct symbols interned so far.
    pub fn count() -> usize {
        SYMBOL_HEAP
            .lock()
            .map(|heap| heap.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}

impl Debug for Symbol {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        Debug::fmt(self.s, fmt)
    }
}

impl Display for Symbol {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        fmt.write_str(self.s)
    }
}

impl Deref for Symbol {
    type Target = str;
    fn deref(&self) -> &str {
        self.s
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state)
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.s == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.s == *other
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl From<&String> for Symbol {
    fn from(s: &String) -> Self {
        Symbol::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol::new(&s)
    }
}

impl<'de> serde::Deserialize<'de> for Symbol {
    fn deserialize<D: serde::Deserializer<'de>>(de: D) -> Result<Symbol, D::Error> {
        String::deserialize(de).map(Symbol::from)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_text_same_symbol() {
        let a = Symbol::from("Blackboard/Target");
        let b = Symbol::from(String::from("Blackboard/Target"));
        assert_eq!(a, b);
        assert_eq!(a.addr(), b.addr());
        assert_eq!(a, "Blackboard/Target");
        assert_ne!(a, Symbol::from("Blackboard/Other"));
    }
}
