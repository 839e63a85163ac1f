//! Read-only traversal.
//!
//! Every `visit_*` method defaults to the matching `walk_*` function, which
//! visits the node's children in source order. A pass overrides the nodes it
//! cares about and calls the `walk_*` function itself if it still wants to
//! descend.

use crate::ast::*;

pub trait Visitor<'ast> {
    fn visit_global_code(&mut self, node: &'ast GlobalCode) {
        walk_global_code(self, node);
    }

    fn visit_statement(&mut self, node: &'ast Statement) {
        walk_statement(self, node);
    }

    fn visit_namespace_decl(&mut self, node: &'ast NamespaceDecl) {
        walk_namespace_decl(self, node);
    }

    fn visit_global_const_decl_list(&mut self, node: &'ast GlobalConstDeclList) {
        walk_global_const_decl_list(self, node);
    }

    fn visit_global_constant_decl(&mut self, node: &'ast GlobalConstantDecl) {
        walk_global_constant_decl(self, node);
    }

    fn visit_echo_stmt(&mut self, node: &'ast EchoStmt) {
        walk_echo_stmt(self, node);
    }

    fn visit_expression_stmt(&mut self, node: &'ast ExpressionStmt) {
        walk_expression_stmt(self, node);
    }

    fn visit_block_stmt(&mut self, node: &'ast BlockStmt) {
        walk_block_stmt(self, node);
    }

    fn visit_expression(&mut self, node: &'ast Expression) {
        walk_expression(self, node);
    }

    fn visit_long_int_literal(&mut self, _node: &'ast LongIntLiteral) {}

    fn visit_double_literal(&mut self, _node: &'ast DoubleLiteral) {}

    fn visit_string_literal(&mut self, _node: &'ast StringLiteral) {}

    fn visit_binary_string_literal(&mut self, _node: &'ast BinaryStringLiteral) {}

    fn visit_bool_literal(&mut self, _node: &'ast BoolLiteral) {}

    fn visit_null_literal(&mut self, _node: &'ast NullLiteral) {}

    fn visit_direct_var_use(&mut self, _node: &'ast DirectVarUse) {}

    fn visit_concat_ex(&mut self, node: &'ast ConcatEx) {
        walk_concat_ex(self, node);
    }

    fn visit_unary_ex(&mut self, node: &'ast UnaryEx) {
        walk_unary_ex(self, node);
    }

    fn visit_binary_ex(&mut self, node: &'ast BinaryEx) {
        walk_binary_ex(self, node);
    }

    fn visit_value_assign_ex(&mut self, node: &'ast ValueAssignEx) {
        walk_value_assign_ex(self, node);
    }

    fn visit_ref_assign_ex(&mut self, node: &'ast RefAssignEx) {
        walk_ref_assign_ex(self, node);
    }

    fn visit_inc_dec_ex(&mut self, node: &'ast IncDecEx) {
        walk_inc_dec_ex(self, node);
    }

    fn visit_direct_fcn_call(&mut self, node: &'ast DirectFcnCall) {
        walk_direct_fcn_call(self, node);
    }
}

pub fn walk_global_code<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast GlobalCode) {
    for stmt in &node.statements {
        visitor.visit_statement(stmt);
    }
}

pub fn walk_statement<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast Statement) {
    node.accept(visitor);
}

pub fn walk_namespace_decl<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast NamespaceDecl) {
    for stmt in &node.statements {
        visitor.visit_statement(stmt);
    }
}

pub fn walk_global_const_decl_list<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    node: &'ast GlobalConstDeclList,
) {
    for constant in &node.constants {
        visitor.visit_global_constant_decl(constant);
    }
}

pub fn walk_global_constant_decl<'ast, V: Visitor<'ast> + ?Sized>(
    visitor: &mut V,
    node: &'ast GlobalConstantDecl,
) {
    visitor.visit_expression(&node.initializer);
}

pub fn walk_echo_stmt<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast EchoStmt) {
    for expr in &node.parameters {
        visitor.visit_expression(expr);
    }
}

pub fn walk_expression_stmt<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast ExpressionStmt) {
    visitor.visit_expression(&node.expression);
}

pub fn walk_block_stmt<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast BlockStmt) {
    for stmt in &node.statements {
        visitor.visit_statement(stmt);
    }
}

pub fn walk_expression<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast Expression) {
    node.accept(visitor);
}

pub fn walk_concat_ex<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast ConcatEx) {
    for expr in &node.expressions {
        visitor.visit_expression(expr);
    }
}

pub fn walk_unary_ex<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast UnaryEx) {
    visitor.visit_expression(&node.operand);
}

pub fn walk_binary_ex<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast BinaryEx) {
    visitor.visit_expression(&node.left);
    visitor.visit_expression(&node.right);
}

pub fn walk_value_assign_ex<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast ValueAssignEx) {
    visitor.visit_expression(&node.target);
    visitor.visit_expression(&node.value);
}

pub fn walk_ref_assign_ex<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast RefAssignEx) {
    visitor.visit_expression(&node.target);
    visitor.visit_expression(&node.value);
}

pub fn walk_inc_dec_ex<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast IncDecEx) {
    visitor.visit_expression(&node.operand);
}

pub fn walk_direct_fcn_call<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast DirectFcnCall) {
    for arg in &node.arguments {
        visitor.visit_expression(arg);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct KindCollector {
        kinds: Vec<&'static str>,
    }

    impl KindCollector {
        fn record(&mut self, node: &dyn AstNode) {
            self.kinds.push(node.kind());
        }
    }

    impl<'ast> Visitor<'ast> for KindCollector {
        fn visit_global_code(&mut self, node: &'ast GlobalCode) {
            self.record(node);
            walk_global_code(self, node);
        }

        fn visit_statement(&mut self, node: &'ast Statement) {
            self.record(node.node());
            walk_statement(self, node);
        }

        fn visit_global_constant_decl(&mut self, node: &'ast GlobalConstantDecl) {
            self.record(node);
            walk_global_constant_decl(self, node);
        }

        fn visit_expression(&mut self, node: &'ast Expression) {
            self.record(node.node());
            walk_expression(self, node);
        }
    }

    #[test]
    fn test_default_walk_visits_every_node_in_source_order() {
        let tree = fixtures::sample();
        let mut collector = KindCollector::default();
        tree.accept(&mut collector);
        assert_eq!(
            collector.kinds,
            vec![
                "GlobalCode",
                "NamespaceDecl",
                "GlobalConstDeclList",
                "GlobalConstantDecl",
                "LongIntLiteral",
                "ExpressionStmt",
                "ValueAssignEx",
                "DirectVarUse",
                "BinaryEx",
                "UnaryEx",
                "LongIntLiteral",
                "DirectFcnCall",
                "DirectVarUse",
                "EchoStmt",
                "ConcatEx",
                "StringLiteral",
                "DirectVarUse",
                "IncDecEx",
                "DirectVarUse",
            ]
        );
    }

    #[test]
    fn test_visits_start_offsets_never_decrease() {
        struct Starts(Vec<usize>);
        impl<'ast> Visitor<'ast> for Starts {
            fn visit_expression(&mut self, node: &'ast Expression) {
                self.0.push(node.span().start);
                walk_expression(self, node);
            }
        }

        let tree = fixtures::sample();
        let mut starts = Starts(Vec::new());
        tree.accept(&mut starts);
        assert!(starts.0.windows(2).all(|w| w[0] <= w[1]), "{:?}", starts.0);
    }

    #[test]
    fn test_override_without_walk_skips_children() {
        #[derive(Default)]
        struct NoDescent {
            binaries: usize,
            variables: usize,
        }

        impl<'ast> Visitor<'ast> for NoDescent {
            fn visit_binary_ex(&mut self, _node: &'ast BinaryEx) {
                self.binaries += 1;
            }

            fn visit_direct_var_use(&mut self, _node: &'ast DirectVarUse) {
                self.variables += 1;
            }
        }

        let tree = fixtures::sample();
        let mut visitor = NoDescent::default();
        tree.accept(&mut visitor);
        assert_eq!(visitor.binaries, 1);
        // `$x` target, `$x` in the string and `$x++`; `$y` sits under the binary.
        assert_eq!(visitor.variables, 3);
    }

    #[test]
    fn test_visitor_as_trait_object() {
        #[derive(Default)]
        struct Calls(Vec<String>);
        impl<'ast> Visitor<'ast> for Calls {
            fn visit_direct_fcn_call(&mut self, node: &'ast DirectFcnCall) {
                self.0.push(node.name.qualified_name.to_string());
                walk_direct_fcn_call(self, node);
            }
        }

        let tree = fixtures::sample();
        let mut calls = Calls::default();
        let visitor: &mut dyn Visitor<'_> = &mut calls;
        tree.accept(visitor);
        assert_eq!(calls.0, vec!["strlen".to_string()]);
    }
}
