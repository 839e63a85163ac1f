use php_ast::ast::*;
use php_ast::visitor::{self, Visitor};
use php_ast::{AstNode, NamingContext};
use php_lexer::Span;

use crate::{NodeWriter, Property};

/// Visitor that reports each node to a [`NodeWriter`].
///
/// Naming contexts are read from the property bags of `GlobalCode` and
/// `NamespaceDecl` nodes, where a binder stores them; nodes without one
/// get an empty `NamingContext` property.
pub struct TreeSerializer<W> {
    writer: W,
}

impl<W: NodeWriter> TreeSerializer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn leaf(&mut self, node: &dyn AstNode, properties: &[Property]) {
        self.writer.start_node(node.kind(), node.span(), properties);
        self.writer.end_node();
    }

    fn enter(&mut self, node: &dyn AstNode, properties: &[Property]) {
        self.writer.start_node(node.kind(), node.span(), properties);
    }

    fn exit(&mut self) {
        self.writer.end_node();
    }
}

fn naming_context(node: &dyn AstNode) -> Property {
    let mut data = Vec::new();
    if let Some(context) = node.properties().get::<NamingContext>() {
        if let Some(namespace) = &context.current_namespace {
            data.push(Property::text("Namespace", namespace.namespace_php_name()));
        }
        for (name, aliases) in [
            ("Aliases", &context.aliases),
            ("ConstantAliases", &context.constant_aliases),
            ("FunctionAliases", &context.function_aliases),
        ] {
            if !aliases.is_empty() {
                let entries = aliases
                    .iter()
                    .map(|(alias, target)| Property::text(alias.clone(), target.to_string()))
                    .collect();
                data.push(Property::nested(name, entries));
            }
        }
    }
    Property::nested("NamingContext", data)
}

fn operation(op: php_ast::Operation) -> Property {
    Property::text("Operation", op.name())
}

impl<'ast, W: NodeWriter> Visitor<'ast> for TreeSerializer<W> {
    fn visit_global_code(&mut self, node: &'ast GlobalCode) {
        self.enter(node, &[naming_context(node)]);
        visitor::walk_global_code(self, node);
        self.exit();
    }

    fn visit_namespace_decl(&mut self, node: &'ast NamespaceDecl) {
        let mut properties = Vec::with_capacity(3);
        if node.name.has_value() {
            properties.push(Property::text("Name", node.name.qualified_name.namespace_php_name()));
        }
        properties.push(Property::flag("SimpleSyntax", node.simple_syntax));
        properties.push(naming_context(node));
        self.enter(node, &properties);
        visitor::walk_namespace_decl(self, node);
        self.exit();
    }

    fn visit_global_const_decl_list(&mut self, node: &'ast GlobalConstDeclList) {
        self.enter(node, &[]);
        visitor::walk_global_const_decl_list(self, node);
        self.exit();
    }

    fn visit_global_constant_decl(&mut self, node: &'ast GlobalConstantDecl) {
        self.enter(
            node,
            &[
                Property::flag("NameIsConditional", node.conditional),
                Property::text("Name", node.name.name.value()),
            ],
        );
        visitor::walk_global_constant_decl(self, node);
        self.exit();
    }

    fn visit_echo_stmt(&mut self, node: &'ast EchoStmt) {
        self.enter(node, &[]);
        visitor::walk_echo_stmt(self, node);
        self.exit();
    }

    fn visit_expression_stmt(&mut self, node: &'ast ExpressionStmt) {
        self.enter(node, &[]);
        visitor::walk_expression_stmt(self, node);
        self.exit();
    }

    fn visit_block_stmt(&mut self, node: &'ast BlockStmt) {
        self.enter(node, &[]);
        visitor::walk_block_stmt(self, node);
        self.exit();
    }

    fn visit_long_int_literal(&mut self, node: &'ast LongIntLiteral) {
        self.leaf(node, &[Property::text("Value", node.value.to_string())]);
    }

    fn visit_double_literal(&mut self, node: &'ast DoubleLiteral) {
        self.leaf(node, &[Property::text("Value", node.value.to_string())]);
    }

    fn visit_string_literal(&mut self, node: &'ast StringLiteral) {
        self.leaf(node, &[Property::text("Value", node.value.as_str())]);
    }

    fn visit_binary_string_literal(&mut self, node: &'ast BinaryStringLiteral) {
        self.leaf(
            node,
            &[Property::text("Value", String::from_utf8_lossy(&node.value).into_owned())],
        );
    }

    fn visit_bool_literal(&mut self, node: &'ast BoolLiteral) {
        self.leaf(node, &[Property::flag("Value", node.value)]);
    }

    fn visit_null_literal(&mut self, node: &'ast NullLiteral) {
        self.leaf(node, &[Property::text("Value", "null")]);
    }

    fn visit_direct_var_use(&mut self, node: &'ast DirectVarUse) {
        self.leaf(node, &[Property::text("Name", node.name.name.value())]);
    }

    fn visit_concat_ex(&mut self, node: &'ast ConcatEx) {
        self.enter(node, &[]);
        visitor::walk_concat_ex(self, node);
        self.exit();
    }

    fn visit_unary_ex(&mut self, node: &'ast UnaryEx) {
        self.enter(node, &[operation(node.operation)]);
        visitor::walk_unary_ex(self, node);
        self.exit();
    }

    fn visit_binary_ex(&mut self, node: &'ast BinaryEx) {
        self.enter(node, &[operation(node.operation)]);
        visitor::walk_binary_ex(self, node);
        self.exit();
    }

    fn visit_value_assign_ex(&mut self, node: &'ast ValueAssignEx) {
        self.enter(node, &[operation(node.operation)]);
        visitor::walk_value_assign_ex(self, node);
        self.exit();
    }

    fn visit_ref_assign_ex(&mut self, node: &'ast RefAssignEx) {
        self.enter(node, &[operation(node.operation())]);
        visitor::walk_ref_assign_ex(self, node);
        self.exit();
    }

    fn visit_inc_dec_ex(&mut self, node: &'ast IncDecEx) {
        self.enter(
            node,
            &[Property::flag("Inc", node.inc), Property::flag("Post", node.post)],
        );
        visitor::walk_inc_dec_ex(self, node);
        self.exit();
    }

    fn visit_direct_fcn_call(&mut self, node: &'ast DirectFcnCall) {
        self.enter(node, &[Property::text("Name", node.name.qualified_name.to_string())]);
        visitor::walk_direct_fcn_call(self, node);
        self.exit();
    }
}

/// Span helper for writers that report `start`/`end` pairs.
pub(crate) fn span_bounds(span: Span) -> (usize, usize) {
    (span.start, span.end())
}
