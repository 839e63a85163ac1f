//! PHP AST
//!
//! Node model for PHP syntax trees. Every node carries its span and an open
//! [`PropertyCollection`] so analysis passes can attach data without
//! changing node definitions. Passes traverse the tree through
//! [`Visitor`] (shared borrows) or [`VisitorMut`] (exclusive borrows); both
//! default to a source-order walk over each node's children.
//!
//! # Example
//!
//! ```
//! use php_ast::{Expression, GlobalCode, EchoStmt, Statement, Visitor};
//! use php_lexer::Scanner;
//!
//! let tokens = Scanner::tokenize("<?php echo 1, 'two';");
//! let parameters: Vec<Expression> = tokens.iter().filter_map(Expression::from_literal_token).collect();
//! let span = parameters[0].span().to(parameters[1].span());
//! let echo = EchoStmt::new(span, parameters);
//! let tree = GlobalCode::new(echo.span, vec![Statement::from(echo)]);
//!
//! #[derive(Default)]
//! struct Count(usize);
//! impl<'ast> Visitor<'ast> for Count {
//!     fn visit_expression(&mut self, node: &'ast Expression) {
//!         self.0 += 1;
//!         php_ast::visitor::walk_expression(self, node);
//!     }
//! }
//!
//! let mut count = Count::default();
//! tree.accept(&mut count);
//! assert_eq!(count.0, 2);
//! ```

pub mod ast;
pub mod names;
pub mod naming;
pub mod operation;
pub mod properties;
pub mod scope;
pub mod visit_mut;
pub mod visitor;

pub use ast::*;
pub use names::{Name, NameRef, QualifiedName, QualifiedNameRef, VariableName, VariableNameRef, NAMESPACE_SEPARATOR};
pub use naming::NamingContext;
pub use operation::Operation;
pub use properties::{BoxedProperty, PropertyCollection, PropertyKey};
pub use scope::Scope;
pub use visit_mut::VisitorMut;
pub use visitor::Visitor;
