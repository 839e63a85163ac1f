//! Names and located name references.
//!
//! PHP identifiers for functions, classes, constants and namespaces compare
//! case-insensitively; variable names do not. The `*Ref` types pair a name
//! with the span it was written at and compare structurally.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use php_lexer::Span;

/// Separator between namespace segments.
pub const NAMESPACE_SEPARATOR: char = '\\';

/// An identifier compared without regard to ASCII case.
#[derive(Debug, Clone)]
pub struct Name(Arc<str>);

impl Name {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Name(value.into())
    }

    pub fn empty() -> Self {
        Name(Arc::from(""))
    }

    pub fn value(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Name {
    fn default() -> Self {
        Name::empty()
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

/// A variable name without the leading `$`. Case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableName(Arc<str>);

impl VariableName {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        VariableName(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }

    pub fn is_this(&self) -> bool {
        &*self.0 == "this"
    }

    /// Superglobals such as `$_GET` or `$GLOBALS`.
    pub fn is_auto_global(&self) -> bool {
        matches!(
            &*self.0,
            "GLOBALS" | "_SERVER" | "_GET" | "_POST" | "_FILES" | "_COOKIE" | "_SESSION" | "_REQUEST" | "_ENV"
        )
    }
}

impl fmt::Display for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl From<&str> for VariableName {
    fn from(value: &str) -> Self {
        VariableName::new(value)
    }
}

/// A possibly namespaced name such as `\Foo\Bar\baz`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub name: Name,
    pub namespaces: Vec<Name>,
    /// Written with a leading separator.
    pub fully_qualified: bool,
}

impl QualifiedName {
    pub fn new(name: Name, namespaces: Vec<Name>, fully_qualified: bool) -> Self {
        Self {
            name,
            namespaces,
            fully_qualified,
        }
    }

    /// Split written source text on `\`. Empty segments are dropped.
    pub fn parse(text: &str) -> Self {
        let fully_qualified = text.starts_with(NAMESPACE_SEPARATOR);
        let mut segments: Vec<Name> = text
            .split(NAMESPACE_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .map(Name::from)
            .collect();
        let name = segments.pop().unwrap_or_default();
        Self {
            name,
            namespaces: segments,
            fully_qualified,
        }
    }

    /// A name that is itself a namespace, e.g. from `namespace A\B;`.
    pub fn namespace(text: &str) -> Self {
        let mut qualified = Self::parse(text);
        if !qualified.name.is_empty() {
            let last = std::mem::take(&mut qualified.name);
            qualified.namespaces.push(last);
        }
        qualified
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.namespaces.is_empty()
    }

    pub fn is_simple(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// The namespace part joined with `\`, without a leading separator.
    pub fn namespace_php_name(&self) -> String {
        join(&self.namespaces)
    }
}

fn join(names: &[Name]) -> String {
    let mut out = String::new();
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            out.push(NAMESPACE_SEPARATOR);
        }
        out.push_str(name.value());
    }
    out
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fully_qualified {
            write!(f, "{NAMESPACE_SEPARATOR}")?;
        }
        for namespace in &self.namespaces {
            write!(f, "{namespace}{NAMESPACE_SEPARATOR}")?;
        }
        write!(f, "{}", self.name)
    }
}

/// A [`Name`] and where it was written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameRef {
    pub span: Span,
    pub name: Name,
}

impl NameRef {
    pub fn new(span: Span, name: impl Into<Name>) -> Self {
        Self {
            span,
            name: name.into(),
        }
    }

    pub fn invalid() -> Self {
        Self::new(Span::INVALID, Name::empty())
    }

    pub fn has_value(&self) -> bool {
        !self.name.is_empty()
    }
}

/// A [`QualifiedName`] and where it was written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedNameRef {
    pub span: Span,
    pub qualified_name: QualifiedName,
}

impl QualifiedNameRef {
    pub fn new(span: Span, qualified_name: QualifiedName) -> Self {
        Self {
            span,
            qualified_name,
        }
    }

    pub fn invalid() -> Self {
        Self::new(Span::INVALID, QualifiedName::default())
    }

    /// False only when both the name and the namespace list are empty.
    pub fn has_value(&self) -> bool {
        !self.qualified_name.is_empty()
    }
}

/// A [`VariableName`] and where it was written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableNameRef {
    pub span: Span,
    pub name: VariableName,
}

impl VariableNameRef {
    pub fn new(span: Span, name: impl Into<VariableName>) -> Self {
        Self {
            span,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_name_ignores_case() {
        assert_eq!(Name::from("StrLen"), Name::from("strlen"));
        let set: HashSet<Name> = ["Foo", "FOO", "foo", "bar"].into_iter().map(Name::from).collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_variable_name_is_case_sensitive() {
        assert_ne!(VariableName::from("a"), VariableName::from("A"));
        assert_eq!(VariableName::from("x").to_string(), "$x");
        assert!(VariableName::from("this").is_this());
        assert!(VariableName::from("_GET").is_auto_global());
    }

    #[test]
    fn test_qualified_name_parse_and_display() {
        let name = QualifiedName::parse("\\Foo\\Bar\\baz");
        assert!(name.fully_qualified);
        assert_eq!(name.name, Name::from("baz"));
        assert_eq!(name.namespace_php_name(), "Foo\\Bar");
        assert_eq!(name.to_string(), "\\Foo\\Bar\\baz");

        let simple = QualifiedName::parse("strlen");
        assert!(simple.is_simple());
        assert_eq!(simple.to_string(), "strlen");
    }

    #[test]
    fn test_namespace_name() {
        let ns = QualifiedName::namespace("App\\Models");
        assert!(ns.name.is_empty());
        assert_eq!(ns.namespace_php_name(), "App\\Models");
        assert!(QualifiedName::namespace("").is_empty());
    }

    #[test]
    fn test_refs_have_value() {
        assert!(!NameRef::invalid().has_value());
        assert!(NameRef::new(Span::new(0, 1), "A").has_value());
        assert!(!QualifiedNameRef::invalid().has_value());

        let ns_only = QualifiedNameRef::new(Span::new(0, 3), QualifiedName::namespace("App"));
        assert!(ns_only.has_value());
    }

    #[test]
    fn test_refs_compare_structurally() {
        let a = VariableNameRef::new(Span::new(4, 2), "x");
        let b = VariableNameRef::new(Span::new(4, 2), "x");
        let c = VariableNameRef::new(Span::new(9, 2), "x");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
