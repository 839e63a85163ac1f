//! PHP Lexer
//!
//! Tokenizes PHP source into a stream of tokens with spans and decoded
//! semantic values. Handles inline HTML and open/close tags, string
//! interpolation, heredoc/nowdoc with flexible indentation, and numeric
//! literal overflow. Scanner state can be snapshotted and restored to
//! resume scanning mid-file.
//!
//! # Example
//!
//! ```
//! use php_lexer::{Scanner, TokenKind};
//!
//! let tokens = Scanner::tokenize("<?php echo $name;");
//! assert_eq!(tokens[0].kind, TokenKind::OpenTag);
//! assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::End));
//! ```

pub mod diagnostics;
pub mod escape;
pub mod heredoc;
pub mod number;
pub mod options;
pub mod scanner;
pub mod state;
pub mod strings;
pub mod token;

pub use diagnostics::{Diagnostic, DiagnosticBag, ErrorSink, LexError, NullSink, Severity};
pub use options::{Encoding, LanguageFeatures, ScannerOptions};
pub use scanner::Scanner;
pub use state::{CompressedState, DocComment, LexicalState};
pub use strings::{StringPool, StringTable};
pub use token::{QuoteKind, SemanticValue, Span, Text, Token, TokenKind};
