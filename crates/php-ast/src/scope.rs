use std::fmt;

/// Generation id for a lexical scope used by variable binding.
///
/// A fresh value is allocated each time a nested scope opens; there is no
/// decrement, so a scope identifies a nesting, not a depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scope(i32);

impl Scope {
    pub const GLOBAL: Scope = Scope(0);
    /// Never a real scope.
    pub const INVALID: Scope = Scope(-1);
    /// Do not track this scope.
    pub const IGNORE: Scope = Scope(i32::MAX);

    pub fn new(start: i32) -> Self {
        Scope(start)
    }

    pub fn start(self) -> i32 {
        self.0
    }

    /// Advance to the next scope. Saturates at [`Scope::IGNORE`].
    pub fn increment(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    pub fn is_global(self) -> bool {
        self.0 == 0
    }

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::GLOBAL
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        assert!(Scope::GLOBAL.is_global());
        assert!(Scope::GLOBAL.is_valid());
        assert!(!Scope::INVALID.is_valid());
        assert!(Scope::IGNORE.is_valid());
        assert_eq!(Scope::default(), Scope::GLOBAL);
    }

    #[test]
    fn test_increment_allocates_next() {
        let mut scope = Scope::GLOBAL;
        scope.increment();
        scope.increment();
        assert_eq!(scope.start(), 2);
        assert!(!scope.is_global());
        assert_eq!(scope.to_string(), "2");
    }

    #[test]
    fn test_increment_saturates() {
        let mut scope = Scope::IGNORE;
        scope.increment();
        assert_eq!(scope, Scope::IGNORE);
    }
}
