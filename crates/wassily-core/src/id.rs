use lasso::{Rodeo, Spur};
use std::fmt;

/// An interned element name, cheap to copy and compare.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name(Spur);

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}

/// Per-surface name interner and unique-name generator.
///
/// Generated names are `<tag><n>` with `n` drawn from a monotonic counter
/// owned by the table, so two surfaces never share naming state and tests
/// can seed the counter for deterministic names.
#[derive(Debug)]
pub struct NameTable {
    rodeo: Rodeo,
    counter: u64,
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NameTable {
    pub fn new() -> Self {
        Self::with_counter(0)
    }

    /// Start the generator at `counter`.
    pub fn with_counter(counter: u64) -> Self {
        Self {
            rodeo: Rodeo::default(),
            counter,
        }
    }

    /// Intern a name, or return the existing one.
    pub fn intern(&mut self, s: &str) -> Name {
        Name(self.rodeo.get_or_intern(s))
    }

    /// Look up a name without interning it.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.rodeo.get(s).map(Name)
    }

    pub fn resolve(&self, name: Name) -> &str {
        self.rodeo.resolve(&name.0)
    }

    /// Number of distinct names interned so far.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }

    /// A fresh name with a type tag (e.g. `Circle7`).
    pub fn fresh(&mut self, tag: &str) -> Name {
        let n = self.counter;
        self.counter += 1;
        self.intern(&format!("{tag}{n}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let mut names = NameTable::new();
        let a = names.intern("axis");
        let b = names.intern("axis");
        assert_eq!(a, b);
        assert_eq!(names.resolve(a), "axis");
        assert_eq!(names.get("missing"), None);
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn fresh_names_are_unique_and_seedable() {
        let mut names = NameTable::with_counter(40);
        let a = names.fresh("Circle");
        let b = names.fresh("Circle");
        assert_ne!(a, b);
        assert_eq!(names.resolve(a), "Circle40");
        assert_eq!(names.resolve(b), "Circle41");
    }
}
