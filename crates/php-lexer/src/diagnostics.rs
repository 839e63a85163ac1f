use crate::token::Span;

/// Problems the scanner reports while it keeps going.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("syntax error, unexpected '{0}'")]
    UnexpectedCharacter(char),

    #[error("incorrect heredoc indentation")]
    IncorrectHeredocIndentation,

    #[error("invalid numeric literal '{0}'")]
    InvalidNumericLiteral(String),

    #[error("unterminated comment starting at offset {0}")]
    UnterminatedComment(usize),

    #[error("integer literal '{0}' does not fit in 64 bits and was converted to float")]
    TooBigIntegerConversion(String),

    #[error("float literal '{0}' overflowed to infinity")]
    TooBigDouble(String),

    #[error("invalid unicode code point in escape '{0}'")]
    InvalidCodePoint(String),
}

/// Whether scanning results can still be trusted after a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Warning,
}

impl LexError {
    pub fn severity(&self) -> Severity {
        match self {
            LexError::UnexpectedCharacter(_)
            | LexError::IncorrectHeredocIndentation
            | LexError::InvalidNumericLiteral(_)
            | LexError::UnterminatedComment(_) => Severity::Fatal,
            LexError::TooBigIntegerConversion(_)
            | LexError::TooBigDouble(_)
            | LexError::InvalidCodePoint(_) => Severity::Warning,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// A reported problem with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: Span,
    pub error: LexError,
}

/// Receiver for scanner diagnostics.
pub trait ErrorSink {
    fn error(&mut self, span: Span, error: LexError);
}

/// Drops every diagnostic. Used when no sink is supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ErrorSink for NullSink {
    fn error(&mut self, _span: Span, _error: LexError) {}
}

/// Records diagnostics in the order they were reported.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(|d| d.error.is_fatal())
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl ErrorSink for DiagnosticBag {
    fn error(&mut self, span: Span, error: LexError) {
        self.diagnostics.push(Diagnostic { span, error });
    }
}

impl<S: ErrorSink + ?Sized> ErrorSink for &mut S {
    fn error(&mut self, span: Span, error: LexError) {
        (**self).error(span, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_partition() {
        assert!(LexError::IncorrectHeredocIndentation.is_fatal());
        assert!(LexError::UnexpectedCharacter('`').is_fatal());
        assert!(!LexError::TooBigDouble("1e999".into()).is_fatal());
        assert_eq!(
            LexError::InvalidCodePoint("\\u{d800}".into()).severity(),
            Severity::Warning
        );
    }

    #[test]
    fn test_bag_records_in_order() {
        let mut bag = DiagnosticBag::new();
        bag.error(Span::new(0, 1), LexError::TooBigDouble("1e999".into()));
        assert!(!bag.has_fatal());
        bag.error(Span::new(5, 2), LexError::IncorrectHeredocIndentation);
        assert!(bag.has_fatal());
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.diagnostics()[1].span, Span::new(5, 2));
    }

    #[test]
    fn test_borrowed_sink_forwards() {
        let mut bag = DiagnosticBag::new();
        {
            let mut sink = &mut bag;
            sink.error(Span::new(1, 1), LexError::UnexpectedCharacter('\u{1}'));
        }
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            LexError::IncorrectHeredocIndentation.to_string(),
            "incorrect heredoc indentation"
        );
        assert_eq!(
            LexError::UnexpectedCharacter('#').to_string(),
            "syntax error, unexpected '#'"
        );
    }
}
