//! Syntax tree nodes.
//!
//! Node kinds form a closed set: [`Statement`] and [`Expression`] list every
//! variant, and their `accept` methods are the single place that maps a
//! variant to its visitor handler. Each node carries its span and a
//! [`PropertyCollection`] for annotations added by later passes.

use php_lexer::{SemanticValue, Span, Text, Token, TokenKind};

use crate::names::{NameRef, QualifiedNameRef, VariableNameRef};
use crate::operation::Operation;
use crate::properties::PropertyCollection;
use crate::visit_mut::VisitorMut;
use crate::visitor::Visitor;

/// Common surface of every node.
pub trait AstNode {
    /// Node type name, e.g. `"EchoStmt"`.
    fn kind(&self) -> &'static str;
    fn span(&self) -> Span;
    fn properties(&self) -> &PropertyCollection;
    fn properties_mut(&mut self) -> &mut PropertyCollection;
}

macro_rules! ast_nodes {
    ($($node:ident),* $(,)?) => {
        $(
            impl AstNode for $node {
                fn kind(&self) -> &'static str {
                    stringify!($node)
                }

                fn span(&self) -> Span {
                    self.span
                }

                fn properties(&self) -> &PropertyCollection {
                    &self.properties
                }

                fn properties_mut(&mut self) -> &mut PropertyCollection {
                    &mut self.properties
                }
            }
        )*
    };
}

ast_nodes!(
    GlobalCode,
    NamespaceDecl,
    GlobalConstDeclList,
    GlobalConstantDecl,
    EchoStmt,
    ExpressionStmt,
    BlockStmt,
    LongIntLiteral,
    DoubleLiteral,
    StringLiteral,
    BinaryStringLiteral,
    BoolLiteral,
    NullLiteral,
    DirectVarUse,
    ConcatEx,
    UnaryEx,
    BinaryEx,
    ValueAssignEx,
    RefAssignEx,
    IncDecEx,
    DirectFcnCall,
);

// ---------------------------------------------------------------------------
// Root and statements
// ---------------------------------------------------------------------------

/// A whole source file.
#[derive(Debug)]
pub struct GlobalCode {
    pub span: Span,
    pub statements: Vec<Statement>,
    pub properties: PropertyCollection,
}

impl GlobalCode {
    pub fn new(span: Span, statements: Vec<Statement>) -> Self {
        Self {
            span,
            statements,
            properties: PropertyCollection::new(),
        }
    }

    pub fn accept<'ast, V: Visitor<'ast> + ?Sized>(&'ast self, visitor: &mut V) {
        visitor.visit_global_code(self);
    }

    pub fn accept_mut<V: VisitorMut + ?Sized>(&mut self, visitor: &mut V) {
        visitor.visit_global_code(self);
    }
}

#[derive(Debug)]
pub enum Statement {
    Namespace(NamespaceDecl),
    ConstDeclList(GlobalConstDeclList),
    Echo(EchoStmt),
    Expression(ExpressionStmt),
    Block(BlockStmt),
}

impl Statement {
    pub fn accept<'ast, V: Visitor<'ast> + ?Sized>(&'ast self, visitor: &mut V) {
        match self {
            Statement::Namespace(node) => visitor.visit_namespace_decl(node),
            Statement::ConstDeclList(node) => visitor.visit_global_const_decl_list(node),
            Statement::Echo(node) => visitor.visit_echo_stmt(node),
            Statement::Expression(node) => visitor.visit_expression_stmt(node),
            Statement::Block(node) => visitor.visit_block_stmt(node),
        }
    }

    pub fn accept_mut<V: VisitorMut + ?Sized>(&mut self, visitor: &mut V) {
        match self {
            Statement::Namespace(node) => visitor.visit_namespace_decl(node),
            Statement::ConstDeclList(node) => visitor.visit_global_const_decl_list(node),
            Statement::Echo(node) => visitor.visit_echo_stmt(node),
            Statement::Expression(node) => visitor.visit_expression_stmt(node),
            Statement::Block(node) => visitor.visit_block_stmt(node),
        }
    }

    pub fn node(&self) -> &dyn AstNode {
        match self {
            Statement::Namespace(node) => node,
            Statement::ConstDeclList(node) => node,
            Statement::Echo(node) => node,
            Statement::Expression(node) => node,
            Statement::Block(node) => node,
        }
    }

    pub fn span(&self) -> Span {
        self.node().span()
    }
}

/// `namespace A\B;` or `namespace A\B { ... }`. The name is invalid for an
/// anonymous `namespace { ... }` block.
#[derive(Debug)]
pub struct NamespaceDecl {
    pub span: Span,
    pub name: QualifiedNameRef,
    /// Declared with `;` rather than a braced block.
    pub simple_syntax: bool,
    pub statements: Vec<Statement>,
    pub properties: PropertyCollection,
}

impl NamespaceDecl {
    pub fn new(span: Span, name: QualifiedNameRef, simple_syntax: bool, statements: Vec<Statement>) -> Self {
        Self {
            span,
            name,
            simple_syntax,
            statements,
            properties: PropertyCollection::new(),
        }
    }
}

/// `const A = 1, B = 2;`
#[derive(Debug)]
pub struct GlobalConstDeclList {
    pub span: Span,
    pub constants: Vec<GlobalConstantDecl>,
    pub properties: PropertyCollection,
}

impl GlobalConstDeclList {
    pub fn new(span: Span, constants: Vec<GlobalConstantDecl>) -> Self {
        Self {
            span,
            constants,
            properties: PropertyCollection::new(),
        }
    }
}

#[derive(Debug)]
pub struct GlobalConstantDecl {
    pub span: Span,
    pub name: NameRef,
    /// Declared inside a conditional block.
    pub conditional: bool,
    pub initializer: Expression,
    pub properties: PropertyCollection,
}

impl GlobalConstantDecl {
    pub fn new(span: Span, name: NameRef, conditional: bool, initializer: Expression) -> Self {
        Self {
            span,
            name,
            conditional,
            initializer,
            properties: PropertyCollection::new(),
        }
    }
}

#[derive(Debug)]
pub struct EchoStmt {
    pub span: Span,
    pub parameters: Vec<Expression>,
    pub properties: PropertyCollection,
}

impl EchoStmt {
    pub fn new(span: Span, parameters: Vec<Expression>) -> Self {
        Self {
            span,
            parameters,
            properties: PropertyCollection::new(),
        }
    }
}

#[derive(Debug)]
pub struct ExpressionStmt {
    pub span: Span,
    pub expression: Expression,
    pub properties: PropertyCollection,
}

impl ExpressionStmt {
    pub fn new(span: Span, expression: Expression) -> Self {
        Self {
            span,
            expression,
            properties: PropertyCollection::new(),
        }
    }
}

#[derive(Debug)]
pub struct BlockStmt {
    pub span: Span,
    pub statements: Vec<Statement>,
    pub properties: PropertyCollection,
}

impl BlockStmt {
    pub fn new(span: Span, statements: Vec<Statement>) -> Self {
        Self {
            span,
            statements,
            properties: PropertyCollection::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum Expression {
    LongInt(LongIntLiteral),
    Double(DoubleLiteral),
    String(StringLiteral),
    BinaryString(BinaryStringLiteral),
    Bool(BoolLiteral),
    Null(NullLiteral),
    Variable(DirectVarUse),
    Concat(ConcatEx),
    Unary(UnaryEx),
    Binary(BinaryEx),
    ValueAssign(ValueAssignEx),
    RefAssign(RefAssignEx),
    IncDec(IncDecEx),
    Call(DirectFcnCall),
}

impl Expression {
    pub fn accept<'ast, V: Visitor<'ast> + ?Sized>(&'ast self, visitor: &mut V) {
        match self {
            Expression::LongInt(node) => visitor.visit_long_int_literal(node),
            Expression::Double(node) => visitor.visit_double_literal(node),
            Expression::String(node) => visitor.visit_string_literal(node),
            Expression::BinaryString(node) => visitor.visit_binary_string_literal(node),
            Expression::Bool(node) => visitor.visit_bool_literal(node),
            Expression::Null(node) => visitor.visit_null_literal(node),
            Expression::Variable(node) => visitor.visit_direct_var_use(node),
            Expression::Concat(node) => visitor.visit_concat_ex(node),
            Expression::Unary(node) => visitor.visit_unary_ex(node),
            Expression::Binary(node) => visitor.visit_binary_ex(node),
            Expression::ValueAssign(node) => visitor.visit_value_assign_ex(node),
            Expression::RefAssign(node) => visitor.visit_ref_assign_ex(node),
            Expression::IncDec(node) => visitor.visit_inc_dec_ex(node),
            Expression::Call(node) => visitor.visit_direct_fcn_call(node),
        }
    }

    pub fn accept_mut<V: VisitorMut + ?Sized>(&mut self, visitor: &mut V) {
        match self {
            Expression::LongInt(node) => visitor.visit_long_int_literal(node),
            Expression::Double(node) => visitor.visit_double_literal(node),
            Expression::String(node) => visitor.visit_string_literal(node),
            Expression::BinaryString(node) => visitor.visit_binary_string_literal(node),
            Expression::Bool(node) => visitor.visit_bool_literal(node),
            Expression::Null(node) => visitor.visit_null_literal(node),
            Expression::Variable(node) => visitor.visit_direct_var_use(node),
            Expression::Concat(node) => visitor.visit_concat_ex(node),
            Expression::Unary(node) => visitor.visit_unary_ex(node),
            Expression::Binary(node) => visitor.visit_binary_ex(node),
            Expression::ValueAssign(node) => visitor.visit_value_assign_ex(node),
            Expression::RefAssign(node) => visitor.visit_ref_assign_ex(node),
            Expression::IncDec(node) => visitor.visit_inc_dec_ex(node),
            Expression::Call(node) => visitor.visit_direct_fcn_call(node),
        }
    }

    pub fn node(&self) -> &dyn AstNode {
        match self {
            Expression::LongInt(node) => node,
            Expression::Double(node) => node,
            Expression::String(node) => node,
            Expression::BinaryString(node) => node,
            Expression::Bool(node) => node,
            Expression::Null(node) => node,
            Expression::Variable(node) => node,
            Expression::Concat(node) => node,
            Expression::Unary(node) => node,
            Expression::Binary(node) => node,
            Expression::ValueAssign(node) => node,
            Expression::RefAssign(node) => node,
            Expression::IncDec(node) => node,
            Expression::Call(node) => node,
        }
    }

    pub fn span(&self) -> Span {
        self.node().span()
    }

    /// Build a literal from a scanned literal token.
    ///
    /// Integer and float tokens map to numeric literals; a complete quoted
    /// string maps to a string literal, or a binary string when its decoded
    /// value is not text. `true`, `false` and `null` are plain identifiers
    /// to the scanner and are matched here case-insensitively.
    pub fn from_literal_token(token: &Token) -> Option<Expression> {
        let span = token.span;
        let literal = match (token.kind, &token.value) {
            (TokenKind::LNumber | TokenKind::L64Number, value) => {
                Expression::LongInt(LongIntLiteral::new(span, value.as_i64()?))
            }
            (TokenKind::DNumber, value) => Expression::Double(DoubleLiteral::new(span, value.as_f64()?)),
            (TokenKind::ConstantEncapsedString, SemanticValue::Literal { text, .. }) => match text {
                Text::Str(value) => Expression::String(StringLiteral::new(span, value.to_string())),
                Text::Bytes(bytes) => Expression::BinaryString(BinaryStringLiteral::new(span, bytes.clone())),
            },
            (TokenKind::String, value) => {
                let word = value.as_str()?;
                if word.eq_ignore_ascii_case("true") {
                    Expression::Bool(BoolLiteral::new(span, true))
                } else if word.eq_ignore_ascii_case("false") {
                    Expression::Bool(BoolLiteral::new(span, false))
                } else if word.eq_ignore_ascii_case("null") {
                    Expression::Null(NullLiteral::new(span))
                } else {
                    return None;
                }
            }
            _ => return None,
        };
        Some(literal)
    }
}

#[derive(Debug)]
pub struct LongIntLiteral {
    pub span: Span,
    pub value: i64,
    pub properties: PropertyCollection,
}

impl LongIntLiteral {
    pub fn new(span: Span, value: i64) -> Self {
        Self {
            span,
            value,
            properties: PropertyCollection::new(),
        }
    }
}

#[derive(Debug)]
pub struct DoubleLiteral {
    pub span: Span,
    pub value: f64,
    pub properties: PropertyCollection,
}

impl DoubleLiteral {
    pub fn new(span: Span, value: f64) -> Self {
        Self {
            span,
            value,
            properties: PropertyCollection::new(),
        }
    }
}

#[derive(Debug)]
pub struct StringLiteral {
    pub span: Span,
    pub value: String,
    pub properties: PropertyCollection,
}

impl StringLiteral {
    pub fn new(span: Span, value: impl Into<String>) -> Self {
        Self {
            span,
            value: value.into(),
            properties: PropertyCollection::new(),
        }
    }
}

/// A string whose decoded bytes are not valid text in the source encoding.
#[derive(Debug)]
pub struct BinaryStringLiteral {
    pub span: Span,
    pub value: Vec<u8>,
    pub properties: PropertyCollection,
}

impl BinaryStringLiteral {
    pub fn new(span: Span, value: Vec<u8>) -> Self {
        Self {
            span,
            value,
            properties: PropertyCollection::new(),
        }
    }
}

#[derive(Debug)]
pub struct BoolLiteral {
    pub span: Span,
    pub value: bool,
    pub properties: PropertyCollection,
}

impl BoolLiteral {
    pub fn new(span: Span, value: bool) -> Self {
        Self {
            span,
            value,
            properties: PropertyCollection::new(),
        }
    }
}

#[derive(Debug)]
pub struct NullLiteral {
    pub span: Span,
    pub properties: PropertyCollection,
}

impl NullLiteral {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            properties: PropertyCollection::new(),
        }
    }
}

/// `$name`
#[derive(Debug)]
pub struct DirectVarUse {
    pub span: Span,
    pub name: VariableNameRef,
    pub properties: PropertyCollection,
}

impl DirectVarUse {
    pub fn new(span: Span, name: VariableNameRef) -> Self {
        Self {
            span,
            name,
            properties: PropertyCollection::new(),
        }
    }
}

/// An interpolated string or a chain of `.` operands.
#[derive(Debug)]
pub struct ConcatEx {
    pub span: Span,
    pub expressions: Vec<Expression>,
    pub properties: PropertyCollection,
}

impl ConcatEx {
    pub fn new(span: Span, expressions: Vec<Expression>) -> Self {
        Self {
            span,
            expressions,
            properties: PropertyCollection::new(),
        }
    }
}

#[derive(Debug)]
pub struct UnaryEx {
    pub span: Span,
    pub operation: Operation,
    pub operand: Box<Expression>,
    pub properties: PropertyCollection,
}

impl UnaryEx {
    pub fn new(span: Span, operation: Operation, operand: Expression) -> Self {
        Self {
            span,
            operation,
            operand: Box::new(operand),
            properties: PropertyCollection::new(),
        }
    }
}

#[derive(Debug)]
pub struct BinaryEx {
    pub span: Span,
    pub operation: Operation,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub properties: PropertyCollection,
}

impl BinaryEx {
    pub fn new(span: Span, operation: Operation, left: Expression, right: Expression) -> Self {
        Self {
            span,
            operation,
            left: Box::new(left),
            right: Box::new(right),
            properties: PropertyCollection::new(),
        }
    }
}

/// `$a = expr` and the compound assignments.
#[derive(Debug)]
pub struct ValueAssignEx {
    pub span: Span,
    pub operation: Operation,
    pub target: Box<Expression>,
    pub value: Box<Expression>,
    pub properties: PropertyCollection,
}

impl ValueAssignEx {
    pub fn new(span: Span, operation: Operation, target: Expression, value: Expression) -> Self {
        Self {
            span,
            operation,
            target: Box::new(target),
            value: Box::new(value),
            properties: PropertyCollection::new(),
        }
    }
}

/// `$a = &expr`
#[derive(Debug)]
pub struct RefAssignEx {
    pub span: Span,
    pub target: Box<Expression>,
    pub value: Box<Expression>,
    pub properties: PropertyCollection,
}

impl RefAssignEx {
    pub fn new(span: Span, target: Expression, value: Expression) -> Self {
        Self {
            span,
            target: Box::new(target),
            value: Box::new(value),
            properties: PropertyCollection::new(),
        }
    }

    pub fn operation(&self) -> Operation {
        Operation::AssignRef
    }
}

/// `++$a`, `$a--` and friends.
#[derive(Debug)]
pub struct IncDecEx {
    pub span: Span,
    pub inc: bool,
    pub post: bool,
    pub operand: Box<Expression>,
    pub properties: PropertyCollection,
}

impl IncDecEx {
    pub fn new(span: Span, inc: bool, post: bool, operand: Expression) -> Self {
        Self {
            span,
            inc,
            post,
            operand: Box::new(operand),
            properties: PropertyCollection::new(),
        }
    }
}

/// A call through a written function name, `strlen($s)`.
#[derive(Debug)]
pub struct DirectFcnCall {
    pub span: Span,
    pub name: QualifiedNameRef,
    pub arguments: Vec<Expression>,
    pub properties: PropertyCollection,
}

impl DirectFcnCall {
    pub fn new(span: Span, name: QualifiedNameRef, arguments: Vec<Expression>) -> Self {
        Self {
            span,
            name,
            arguments,
            properties: PropertyCollection::new(),
        }
    }
}

macro_rules! into_enum {
    ($target:ident { $($variant:ident($node:ident)),* $(,)? }) => {
        $(
            impl From<$node> for $target {
                fn from(node: $node) -> Self {
                    $target::$variant(node)
                }
            }
        )*
    };
}

into_enum!(Statement {
    Namespace(NamespaceDecl),
    ConstDeclList(GlobalConstDeclList),
    Echo(EchoStmt),
    Expression(ExpressionStmt),
    Block(BlockStmt),
});

into_enum!(Expression {
    LongInt(LongIntLiteral),
    Double(DoubleLiteral),
    String(StringLiteral),
    BinaryString(BinaryStringLiteral),
    Bool(BoolLiteral),
    Null(NullLiteral),
    Variable(DirectVarUse),
    Concat(ConcatEx),
    Unary(UnaryEx),
    Binary(BinaryEx),
    ValueAssign(ValueAssignEx),
    RefAssign(RefAssignEx),
    IncDec(IncDecEx),
    Call(DirectFcnCall),
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::QualifiedName;
    use php_lexer::Scanner;
    use pretty_assertions::assert_eq;

    fn literals(source: &str) -> Vec<Expression> {
        Scanner::tokenize(&format!("<?php {source}"))
            .iter()
            .filter_map(Expression::from_literal_token)
            .collect()
    }

    #[test]
    fn test_kind_names() {
        let call = DirectFcnCall::new(
            Span::new(0, 9),
            QualifiedNameRef::new(Span::new(0, 6), QualifiedName::parse("strlen")),
            vec![],
        );
        assert_eq!(call.kind(), "DirectFcnCall");
        let stmt: Statement = EchoStmt::new(Span::new(0, 5), vec![]).into();
        assert_eq!(stmt.node().kind(), "EchoStmt");
        assert_eq!(stmt.span(), Span::new(0, 5));
    }

    #[test]
    fn test_literals_from_tokens() {
        let kinds: Vec<_> = literals("1 2.5 'a' TRUE false Null foo 0xffffffffffffffff")
            .iter()
            .map(|e| e.node().kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "LongIntLiteral",
                "DoubleLiteral",
                "StringLiteral",
                "BoolLiteral",
                "BoolLiteral",
                "NullLiteral",
                "DoubleLiteral",
            ]
        );
    }

    #[test]
    fn test_binary_string_literal_from_token() {
        match literals("b'ab'").as_slice() {
            [Expression::BinaryString(node)] => assert_eq!(node.value, b"ab".to_vec()),
            other => panic!("expected a binary string, got {other:?}"),
        }
    }

    #[test]
    fn test_literal_keeps_token_span() {
        let found = literals("  42");
        assert_eq!(found[0].span(), Span::new(8, 2));
    }

    #[test]
    fn test_properties_through_node_trait() {
        let mut lit = LongIntLiteral::new(Span::new(0, 1), 1);
        lit.properties_mut().set(String::from("folded"));
        assert_eq!(lit.properties().get::<String>().map(String::as_str), Some("folded"));
    }

    #[test]
    fn test_ref_assign_operation() {
        let target = Expression::from(DirectVarUse::new(
            Span::new(0, 2),
            VariableNameRef::new(Span::new(0, 2), "a"),
        ));
        let value = Expression::from(DirectVarUse::new(
            Span::new(6, 2),
            VariableNameRef::new(Span::new(6, 2), "b"),
        ));
        let assign = RefAssignEx::new(Span::new(0, 8), target, value);
        assert_eq!(assign.operation(), Operation::AssignRef);
    }
}
