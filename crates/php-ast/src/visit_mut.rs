//! Traversal with exclusive access, for passes that annotate or rewrite
//! nodes. Same shape as [`Visitor`](crate::visitor::Visitor).

use crate::ast::*;

pub trait VisitorMut {
    fn visit_global_code(&mut self, node: &mut GlobalCode) {
        walk_global_code_mut(self, node);
    }

    fn visit_statement(&mut self, node: &mut Statement) {
        walk_statement_mut(self, node);
    }

    fn visit_namespace_decl(&mut self, node: &mut NamespaceDecl) {
        walk_namespace_decl_mut(self, node);
    }

    fn visit_global_const_decl_list(&mut self, node: &mut GlobalConstDeclList) {
        walk_global_const_decl_list_mut(self, node);
    }

    fn visit_global_constant_decl(&mut self, node: &mut GlobalConstantDecl) {
        walk_global_constant_decl_mut(self, node);
    }

    fn visit_echo_stmt(&mut self, node: &mut EchoStmt) {
        walk_echo_stmt_mut(self, node);
    }

    fn visit_expression_stmt(&mut self, node: &mut ExpressionStmt) {
        walk_expression_stmt_mut(self, node);
    }

    fn visit_block_stmt(&mut self, node: &mut BlockStmt) {
        walk_block_stmt_mut(self, node);
    }

    fn visit_expression(&mut self, node: &mut Expression) {
        walk_expression_mut(self, node);
    }

    fn visit_long_int_literal(&mut self, _node: &mut LongIntLiteral) {}

    fn visit_double_literal(&mut self, _node: &mut DoubleLiteral) {}

    fn visit_string_literal(&mut self, _node: &mut StringLiteral) {}

    fn visit_binary_string_literal(&mut self, _node: &mut BinaryStringLiteral) {}

    fn visit_bool_literal(&mut self, _node: &mut BoolLiteral) {}

    fn visit_null_literal(&mut self, _node: &mut NullLiteral) {}

    fn visit_direct_var_use(&mut self, _node: &mut DirectVarUse) {}

    fn visit_concat_ex(&mut self, node: &mut ConcatEx) {
        walk_concat_ex_mut(self, node);
    }

    fn visit_unary_ex(&mut self, node: &mut UnaryEx) {
        walk_unary_ex_mut(self, node);
    }

    fn visit_binary_ex(&mut self, node: &mut BinaryEx) {
        walk_binary_ex_mut(self, node);
    }

    fn visit_value_assign_ex(&mut self, node: &mut ValueAssignEx) {
        walk_value_assign_ex_mut(self, node);
    }

    fn visit_ref_assign_ex(&mut self, node: &mut RefAssignEx) {
        walk_ref_assign_ex_mut(self, node);
    }

    fn visit_inc_dec_ex(&mut self, node: &mut IncDecEx) {
        walk_inc_dec_ex_mut(self, node);
    }

    fn visit_direct_fcn_call(&mut self, node: &mut DirectFcnCall) {
        walk_direct_fcn_call_mut(self, node);
    }
}

pub fn walk_global_code_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut GlobalCode) {
    for stmt in &mut node.statements {
        visitor.visit_statement(stmt);
    }
}

pub fn walk_statement_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut Statement) {
    node.accept_mut(visitor);
}

pub fn walk_namespace_decl_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut NamespaceDecl) {
    for stmt in &mut node.statements {
        visitor.visit_statement(stmt);
    }
}

pub fn walk_global_const_decl_list_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut GlobalConstDeclList) {
    for constant in &mut node.constants {
        visitor.visit_global_constant_decl(constant);
    }
}

pub fn walk_global_constant_decl_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut GlobalConstantDecl) {
    visitor.visit_expression(&mut node.initializer);
}

pub fn walk_echo_stmt_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut EchoStmt) {
    for expr in &mut node.parameters {
        visitor.visit_expression(expr);
    }
}

pub fn walk_expression_stmt_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut ExpressionStmt) {
    visitor.visit_expression(&mut node.expression);
}

pub fn walk_block_stmt_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut BlockStmt) {
    for stmt in &mut node.statements {
        visitor.visit_statement(stmt);
    }
}

pub fn walk_expression_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut Expression) {
    node.accept_mut(visitor);
}

pub fn walk_concat_ex_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut ConcatEx) {
    for expr in &mut node.expressions {
        visitor.visit_expression(expr);
    }
}

pub fn walk_unary_ex_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut UnaryEx) {
    visitor.visit_expression(&mut node.operand);
}

pub fn walk_binary_ex_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut BinaryEx) {
    visitor.visit_expression(&mut node.left);
    visitor.visit_expression(&mut node.right);
}

pub fn walk_value_assign_ex_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut ValueAssignEx) {
    visitor.visit_expression(&mut node.target);
    visitor.visit_expression(&mut node.value);
}

pub fn walk_ref_assign_ex_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut RefAssignEx) {
    visitor.visit_expression(&mut node.target);
    visitor.visit_expression(&mut node.value);
}

pub fn walk_inc_dec_ex_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut IncDecEx) {
    visitor.visit_expression(&mut node.operand);
}

pub fn walk_direct_fcn_call_mut<V: VisitorMut + ?Sized>(visitor: &mut V, node: &mut DirectFcnCall) {
    for arg in &mut node.arguments {
        visitor.visit_expression(arg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::QualifiedName;
    use crate::scope::Scope;
    use crate::visitor::{self, fixtures, Visitor};
    use pretty_assertions::assert_eq;

    /// Stamps variables and calls with a counter that rises per nested expression.
    struct DepthAnnotator {
        depth: Scope,
    }

    impl VisitorMut for DepthAnnotator {
        fn visit_expression(&mut self, node: &mut Expression) {
            let outer = self.depth;
            self.depth.increment();
            node.accept_mut(self);
            self.depth = outer;
        }

        fn visit_direct_var_use(&mut self, node: &mut DirectVarUse) {
            node.properties.set(self.depth);
        }

        fn visit_direct_fcn_call(&mut self, node: &mut DirectFcnCall) {
            node.properties.set(self.depth);
            walk_direct_fcn_call_mut(self, node);
        }
    }

    struct ReadBack(Vec<(String, i32)>);

    impl<'ast> Visitor<'ast> for ReadBack {
        fn visit_direct_var_use(&mut self, node: &'ast DirectVarUse) {
            if let Some(scope) = node.properties.get::<Scope>() {
                self.0.push((node.name.name.to_string(), scope.start()));
            }
        }

        fn visit_direct_fcn_call(&mut self, node: &'ast DirectFcnCall) {
            if let Some(scope) = node.properties.get::<Scope>() {
                self.0.push((node.name.qualified_name.to_string(), scope.start()));
            }
            visitor::walk_direct_fcn_call(self, node);
        }
    }

    // ========================================================================
    // Annotation
    // ========================================================================

    #[test]
    fn test_annotations_are_readable_by_later_pass() {
        let mut tree = fixtures::sample();
        tree.accept_mut(&mut DepthAnnotator { depth: Scope::new(0) });

        let mut read = ReadBack(Vec::new());
        tree.accept(&mut read);
        assert_eq!(
            read.0,
            vec![
                ("$x".to_string(), 2),
                ("strlen".to_string(), 3),
                ("$y".to_string(), 4),
                ("$x".to_string(), 2),
                ("$x".to_string(), 2),
            ]
        );
    }

    // ========================================================================
    // Rewriting
    // ========================================================================

    #[test]
    fn test_rewrite_call_names() {
        struct Qualify;
        impl VisitorMut for Qualify {
            fn visit_direct_fcn_call(&mut self, node: &mut DirectFcnCall) {
                node.name.qualified_name.fully_qualified = true;
                walk_direct_fcn_call_mut(self, node);
            }
        }

        let mut tree = fixtures::sample();
        tree.accept_mut(&mut Qualify);

        struct Names(Vec<String>);
        impl<'ast> Visitor<'ast> for Names {
            fn visit_direct_fcn_call(&mut self, node: &'ast DirectFcnCall) {
                self.0.push(node.name.qualified_name.to_string());
            }
        }
        let mut names = Names(Vec::new());
        tree.accept(&mut names);
        assert_eq!(names.0, vec!["\\strlen".to_string()]);
        assert_eq!(QualifiedName::parse("\\strlen").to_string(), "\\strlen");
    }
}
