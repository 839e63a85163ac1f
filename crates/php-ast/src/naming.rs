//! Naming context recorded by a binder: the current namespace and the
//! `use` aliases in effect. Stored on namespace and global-code nodes
//! through their property bags.

use crate::names::QualifiedName;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingContext {
    pub current_namespace: Option<QualifiedName>,
    /// `use A\B as C;` entries, in declaration order.
    pub aliases: Vec<(String, QualifiedName)>,
    /// `use const` entries.
    pub constant_aliases: Vec<(String, QualifiedName)>,
    /// `use function` entries.
    pub function_aliases: Vec<(String, QualifiedName)>,
}

impl NamingContext {
    pub fn new(current_namespace: Option<QualifiedName>) -> Self {
        Self {
            current_namespace,
            ..Self::default()
        }
    }

    pub fn add_alias(&mut self, alias: impl Into<String>, target: QualifiedName) {
        self.aliases.push((alias.into(), target));
    }

    pub fn add_constant_alias(&mut self, alias: impl Into<String>, target: QualifiedName) {
        self.constant_aliases.push((alias.into(), target));
    }

    pub fn add_function_alias(&mut self, alias: impl Into<String>, target: QualifiedName) {
        self.function_aliases.push((alias.into(), target));
    }

    /// Resolve a class alias. Aliases compare case-insensitively.
    pub fn resolve_alias(&self, alias: &str) -> Option<&QualifiedName> {
        self.aliases
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(alias))
            .map(|(_, target)| target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_alias_ignores_case() {
        let mut naming = NamingContext::new(Some(QualifiedName::namespace("App")));
        naming.add_alias("Model", QualifiedName::parse("App\\Models\\Model"));
        let target = naming.resolve_alias("model").map(ToString::to_string);
        assert_eq!(target.as_deref(), Some("App\\Models\\Model"));
        assert!(naming.resolve_alias("Other").is_none());
    }
}
