use std::sync::Arc;

use serde::Serialize;

use crate::token::Span;

/// Scanner context that decides which character patterns are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum LexicalState {
    /// Outside `<?php ... ?>`: everything is inline HTML.
    #[default]
    Initial,
    InScripting,
    InDoubleQuotes,
    InSingleQuotes,
    InBackquote,
    InHeredoc,
    InNowdoc,
    /// The closing heredoc label is next.
    EndHeredoc,
    /// After `->` or `?->`: the next label is a property name.
    LookingForProperty,
    /// After `${`: a bare label is a variable name.
    LookingForVarname,
    /// After `$name[` inside a string.
    VarOffset,
}

impl LexicalState {
    /// States that accumulate literal text rather than code.
    pub fn is_string(self) -> bool {
        matches!(
            self,
            LexicalState::InDoubleQuotes
                | LexicalState::InSingleQuotes
                | LexicalState::InBackquote
                | LexicalState::InHeredoc
                | LexicalState::InNowdoc
        )
    }
}

/// A documentation comment waiting to be attached to the next declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocComment {
    pub text: Arc<str>,
    pub span: Span,
}

/// Snapshot of everything the scanner needs to resume mid-file, apart from
/// the input position itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompressedState {
    heredoc_label: Option<Arc<str>>,
    current: LexicalState,
    stack: Vec<LexicalState>,
    doc_comment: Option<DocComment>,
}

impl CompressedState {
    pub(crate) fn new(
        heredoc_label: Option<Arc<str>>,
        current: LexicalState,
        stack: Vec<LexicalState>,
        doc_comment: Option<DocComment>,
    ) -> Self {
        Self {
            heredoc_label,
            current,
            stack,
            doc_comment,
        }
    }

    pub fn heredoc_label(&self) -> Option<&str> {
        self.heredoc_label.as_deref()
    }

    pub fn current(&self) -> LexicalState {
        self.current
    }

    /// Saved state stack, bottom first.
    pub fn stack(&self) -> &[LexicalState] {
        &self.stack
    }

    pub fn doc_comment(&self) -> Option<&DocComment> {
        self.doc_comment.as_ref()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Option<Arc<str>>,
        LexicalState,
        Vec<LexicalState>,
        Option<DocComment>,
    ) {
        (self.heredoc_label, self.current, self.stack, self.doc_comment)
    }
}
