use std::io::{self, Read};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::diagnostics::{ErrorSink, LexError, NullSink};
use crate::escape::{self, EscapeMode, EscapeOptions, Unescaped};
use crate::heredoc;
use crate::number::{self, IntegerLiteral};
use crate::options::{Encoding, LanguageFeatures, ScannerOptions};
use crate::state::{CompressedState, DocComment, LexicalState};
use crate::strings::{PooledStringTable, StringPool, StringTable};
use crate::token::{self, QuoteKind, SemanticValue, Span, Text, Token, TokenKind};

/// Where a heredoc text fragment stops.
enum FragmentEnd {
    Label(heredoc::ClosingLabel),
    Interpolation,
    Eof,
}

/// PHP source scanner.
///
/// Produces one token per [`next_token`](Scanner::next_token) call, driven
/// by an explicit stack of [`LexicalState`]s: string literals push their
/// state, interpolations push the scripting state again, and closing a
/// construct pops back to whatever enclosed it.
///
/// Diagnostics go to the error sink `E`; scanning never stops on malformed
/// input.
pub struct Scanner<E: ErrorSink = NullSink> {
    chars: Vec<char>,
    pos: usize,
    token_start: usize,
    shift: usize,
    state: LexicalState,
    stack: Vec<LexicalState>,
    heredoc_label: Option<Arc<str>>,
    doc_comment: Option<DocComment>,
    features: LanguageFeatures,
    encoding: Encoding,
    strings: PooledStringTable,
    errors: E,
}

impl Scanner<NullSink> {
    /// Create a scanner with default options that drops diagnostics.
    pub fn new(source: &str) -> Self {
        Self::with_options(source, ScannerOptions::default(), NullSink)
    }

    /// Scan the whole source, ending with the [`TokenKind::End`] token.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Scanner::new(source).collect_all()
    }
}

impl<E: ErrorSink> Scanner<E> {
    pub fn with_options(source: &str, options: ScannerOptions, errors: E) -> Self {
        let pool = options.pool.unwrap_or_else(StringPool::shared);
        Self {
            chars: source.chars().collect(),
            pos: 0,
            token_start: 0,
            shift: options.position_shift,
            state: options.initial_state,
            stack: Vec::new(),
            heredoc_label: None,
            doc_comment: None,
            features: options.features,
            encoding: options.encoding,
            strings: pool.acquire(),
            errors,
        }
    }

    /// Read the whole stream and decode it with the configured encoding.
    pub fn from_reader<R: Read>(mut reader: R, options: ScannerOptions, errors: E) -> io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let source = options.encoding.decode(&bytes);
        Ok(Self::with_options(&source, options, errors))
    }

    /// Scan the next token. After the input is exhausted every call returns
    /// an empty [`TokenKind::End`] token.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.token_start = self.pos;
            if self.is_at_end() {
                return self.emit(TokenKind::End);
            }
            if let Some(token) = self.scan() {
                return token;
            }
        }
    }

    /// Scan the rest of the input, including the final `End` token.
    pub fn collect_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::End;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    pub fn state(&self) -> LexicalState {
        self.state
    }

    /// Absolute offset of the next character to scan.
    pub fn position(&self) -> usize {
        self.shift + self.pos
    }

    pub fn snapshot(&self) -> CompressedState {
        CompressedState::new(
            self.heredoc_label.clone(),
            self.state,
            self.stack.clone(),
            self.doc_comment.clone(),
        )
    }

    pub fn restore(&mut self, snapshot: CompressedState) {
        let (label, current, stack, doc_comment) = snapshot.into_parts();
        trace!(state = ?current, depth = stack.len(), "restore scanner state");
        self.heredoc_label = label;
        self.state = current;
        self.stack = stack;
        self.doc_comment = doc_comment;
    }

    /// The doc comment waiting to be attached to the next declaration.
    pub fn doc_comment(&self) -> Option<&DocComment> {
        self.doc_comment.as_ref()
    }

    pub fn take_doc_comment(&mut self) -> Option<DocComment> {
        self.doc_comment.take()
    }

    pub fn errors(&self) -> &E {
        &self.errors
    }

    pub fn into_errors(self) -> E {
        self.errors
    }

    fn scan(&mut self) -> Option<Token> {
        match self.state {
            LexicalState::Initial => Some(self.scan_inline_html()),
            LexicalState::InScripting => Some(self.scan_scripting()),
            LexicalState::LookingForProperty => self.scan_property(),
            LexicalState::LookingForVarname => self.scan_varname(),
            LexicalState::VarOffset => self.scan_var_offset(),
            LexicalState::InDoubleQuotes => Some(self.scan_quoted_body('"')),
            LexicalState::InBackquote => Some(self.scan_quoted_body('`')),
            LexicalState::InSingleQuotes => Some(self.scan_single_quoted_body()),
            LexicalState::InHeredoc => self.scan_heredoc_body(),
            LexicalState::InNowdoc => self.scan_nowdoc_body(),
            LexicalState::EndHeredoc => Some(self.scan_heredoc_end()),
        }
    }

    // --- Inline HTML ---

    fn scan_inline_html(&mut self) -> Token {
        if let Some((kind, len)) = self.open_tag_at(self.pos) {
            self.advance_by(len);
            self.begin(LexicalState::InScripting);
            return self.emit(kind);
        }
        while !self.is_at_end() && self.open_tag_at(self.pos).is_none() {
            self.advance();
        }
        let text = self.source_text(self.token_start, self.pos);
        self.emit_value(TokenKind::InlineHtml, SemanticValue::Text(Text::Str(text)))
    }

    fn open_tag_at(&self, i: usize) -> Option<(TokenKind, usize)> {
        if self.char_at(i) != '<' || self.char_at(i + 1) != '?' {
            return None;
        }
        if self.char_at(i + 2) == '=' {
            return Some((TokenKind::OpenTagWithEcho, 3));
        }
        if self.matches_ignore_case(i + 2, "php") {
            if i + 5 >= self.chars.len() {
                return Some((TokenKind::OpenTag, 5));
            }
            match (self.char_at(i + 5), self.char_at(i + 6)) {
                ('\r', '\n') => return Some((TokenKind::OpenTag, 7)),
                (' ' | '\t' | '\n' | '\r', _) => return Some((TokenKind::OpenTag, 6)),
                _ => {}
            }
        }
        if self.features.contains(LanguageFeatures::SHORT_OPEN_TAGS) {
            return Some((TokenKind::OpenTag, 2));
        }
        None
    }

    // --- Scripting ---

    fn scan_scripting(&mut self) -> Token {
        let c = self.peek();
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                while matches!(self.peek(), ' ' | '\t' | '\n' | '\r') && !self.is_at_end() {
                    self.advance();
                }
                self.emit(TokenKind::Whitespace)
            }
            '#' if self.peek_at(1) == '[' => {
                self.advance_by(2);
                self.emit(TokenKind::Attribute)
            }
            '#' => self.scan_line_comment(),
            '/' if self.peek_at(1) == '/' => self.scan_line_comment(),
            '/' if self.peek_at(1) == '*' => self.scan_block_comment(),
            '?' if self.peek_at(1) == '>' => self.scan_close_tag(),
            '$' if is_label_start(self.peek_at(1)) => self.scan_variable(),
            '0'..='9' => self.scan_number(),
            '.' if self.peek_at(1).is_ascii_digit() => self.scan_number(),
            'b' | 'B' if matches!(self.peek_at(1), '\'' | '"') => {
                self.advance();
                if self.peek() == '\'' {
                    self.scan_single_quoted()
                } else {
                    self.scan_double_quoted()
                }
            }
            'b' | 'B' if self.matches(self.pos + 1, "<<<") => {
                self.advance();
                match self.scan_heredoc_start() {
                    Some(token) => token,
                    None => {
                        self.pos = self.token_start;
                        self.scan_identifier()
                    }
                }
            }
            c if is_label_start(c) => self.scan_identifier(),
            '\\' => {
                self.advance();
                self.emit(TokenKind::NsSeparator)
            }
            '(' => match self.scan_cast() {
                Some(token) => token,
                None => self.scan_operator(),
            },
            '\'' => self.scan_single_quoted(),
            '"' => self.scan_double_quoted(),
            '`' => {
                self.advance();
                self.push_state(LexicalState::InBackquote);
                self.emit(TokenKind::Backquote)
            }
            '<' if self.matches(self.pos, "<<<") => match self.scan_heredoc_start() {
                Some(token) => token,
                None => self.scan_operator(),
            },
            _ => self.scan_operator(),
        }
    }

    fn scan_operator(&mut self) -> Token {
        for &(text, kind) in token::OPERATORS {
            if self.matches(self.pos, text) {
                self.advance_by(text.len());
                return self.finish_operator(kind);
            }
        }
        let c = self.peek();
        self.advance();
        let span = self.span();
        self.report(span, LexError::UnexpectedCharacter(c));
        self.emit(TokenKind::BadCharacter)
    }

    fn finish_operator(&mut self, kind: TokenKind) -> Token {
        match kind {
            TokenKind::LBrace => {
                self.doc_comment = None;
                self.push_state(LexicalState::InScripting);
            }
            TokenKind::RBrace => {
                self.doc_comment = None;
                if !self.stack.is_empty() {
                    self.pop_state();
                }
            }
            TokenKind::Semicolon => self.doc_comment = None,
            TokenKind::ObjectOperator | TokenKind::NullsafeObjectOperator => {
                self.push_state(LexicalState::LookingForProperty);
            }
            _ => {}
        }
        self.emit(kind)
    }

    fn scan_line_comment(&mut self) -> Token {
        while !self.is_at_end() {
            match self.peek() {
                '\n' => {
                    self.advance();
                    break;
                }
                '\r' => {
                    self.advance();
                    if self.peek() == '\n' {
                        self.advance();
                    }
                    break;
                }
                '?' if self.peek_at(1) == '>' => break,
                _ => self.advance(),
            }
        }
        let text = self.source_text(self.token_start, self.pos);
        self.emit_value(TokenKind::Comment, SemanticValue::Text(Text::Str(text)))
    }

    fn scan_block_comment(&mut self) -> Token {
        let is_doc = self.peek_at(2) == '*' && matches!(self.peek_at(3), ' ' | '\t' | '\n' | '\r');
        self.advance_by(2);
        let mut closed = false;
        while !self.is_at_end() {
            if self.matches(self.pos, "*/") {
                self.advance_by(2);
                closed = true;
                break;
            }
            self.advance();
        }
        let span = self.span();
        if !closed {
            self.report(span, LexError::UnterminatedComment(span.start));
        }
        let text = self.source_text(self.token_start, self.pos);
        if is_doc {
            self.doc_comment = Some(DocComment {
                text: Arc::clone(&text),
                span,
            });
            return self.emit_value(TokenKind::DocComment, SemanticValue::Text(Text::Str(text)));
        }
        self.emit_value(TokenKind::Comment, SemanticValue::Text(Text::Str(text)))
    }

    fn scan_close_tag(&mut self) -> Token {
        self.advance_by(2);
        match self.peek() {
            '\n' => self.advance(),
            '\r' => {
                self.advance();
                if self.peek() == '\n' {
                    self.advance();
                }
            }
            _ => {}
        }
        self.begin(LexicalState::Initial);
        self.emit(TokenKind::CloseTag)
    }

    fn scan_variable(&mut self) -> Token {
        self.advance();
        let name_start = self.pos;
        self.skip_label();
        let name = self.intern_range(name_start, self.pos);
        self.emit_value(TokenKind::Variable, SemanticValue::Text(Text::Str(name)))
    }

    fn scan_identifier(&mut self) -> Token {
        self.skip_label();
        let text = self.intern_range(self.token_start, self.pos);
        let mut kind = token::keyword(&text).unwrap_or(TokenKind::String);

        if kind == TokenKind::Yield {
            let mut i = self.pos;
            while matches!(self.char_at(i), ' ' | '\t' | '\n' | '\r') {
                i += 1;
            }
            if i > self.pos && self.matches_ignore_case(i, "from") && !is_label_char(self.char_at(i + 4)) {
                self.pos = i + 4;
                kind = TokenKind::YieldFrom;
                let text = self.intern_range(self.token_start, self.pos);
                return self.emit_value(kind, SemanticValue::Text(Text::Str(text)));
            }
        }
        self.emit_value(kind, SemanticValue::Text(Text::Str(text)))
    }

    /// `(` optional blanks, a cast type name, optional blanks, `)`.
    fn scan_cast(&mut self) -> Option<Token> {
        let mut i = self.pos + 1;
        while matches!(self.char_at(i), ' ' | '\t') {
            i += 1;
        }
        let name_start = i;
        while self.char_at(i).is_ascii_alphabetic() {
            i += 1;
        }
        if i == name_start {
            return None;
        }
        let name: String = self.chars[name_start..i].iter().collect();
        let kind = token::cast(&name)?;
        while matches!(self.char_at(i), ' ' | '\t') {
            i += 1;
        }
        if self.char_at(i) != ')' {
            return None;
        }
        self.pos = i + 1;
        Some(self.emit(kind))
    }

    // --- Numbers ---

    fn scan_number(&mut self) -> Token {
        let prefixed = match (self.peek(), self.peek_at(1)) {
            ('0', 'x' | 'X') if self.peek_at(2).is_ascii_hexdigit() => Some(16),
            ('0', 'b' | 'B') if matches!(self.peek_at(2), '0' | '1') => Some(2),
            ('0', 'o' | 'O') if self.peek_at(2).is_digit(8) => Some(8),
            _ => None,
        };
        if let Some(radix) = prefixed {
            self.advance_by(2);
            let digits_start = self.pos;
            self.skip_digits(radix);
            return self.finish_integer(digits_start, radix);
        }

        let mut real = false;
        if self.peek() == '.' {
            real = true;
            self.advance();
        }
        self.skip_digits(10);
        if !real && self.peek() == '.' {
            real = true;
            self.advance();
            self.skip_digits(10);
        }
        let exponent_digits = match (self.peek(), self.peek_at(1)) {
            ('e' | 'E', '+' | '-') if self.peek_at(2).is_ascii_digit() => Some(2),
            ('e' | 'E', d) if d.is_ascii_digit() => Some(1),
            _ => None,
        };
        if let Some(skip) = exponent_digits {
            real = true;
            self.advance_by(skip);
            self.skip_digits(10);
        }

        if real {
            let text = self.token_string();
            let literal = number::parse_real(&text);
            if literal.overflowed {
                let span = self.span();
                self.report(span, LexError::TooBigDouble(text));
            }
            return self.emit_value(TokenKind::DNumber, SemanticValue::Float(literal.value));
        }

        let digits = &self.chars[self.token_start..self.pos];
        if digits.len() > 1 && digits[0] == '0' {
            if digits.iter().any(|c| matches!(c, '8' | '9')) {
                let span = self.span();
                self.report(span, LexError::InvalidNumericLiteral(self.token_string()));
            }
            return self.finish_integer(self.token_start, 8);
        }
        self.finish_integer(self.token_start, 10)
    }

    fn skip_digits(&mut self, radix: u32) {
        loop {
            let c = self.peek();
            if c.is_digit(radix) || (c == '_' && self.peek_at(1).is_digit(radix)) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn finish_integer(&mut self, digits_start: usize, radix: u32) -> Token {
        match number::parse_integer(&self.chars[digits_start..self.pos], radix) {
            IntegerLiteral::Int(value) => self.integer_token(TokenKind::LNumber, value),
            IntegerLiteral::Overflow(value) => {
                let span = self.span();
                self.report(span, LexError::TooBigIntegerConversion(self.token_string()));
                self.emit_value(TokenKind::DNumber, SemanticValue::Float(value))
            }
        }
    }

    /// `LNumber` for 32-bit values, `L64Number` for wider ones. Numeric
    /// array offsets keep their kind.
    fn integer_token(&self, kind: TokenKind, value: i64) -> Token {
        match i32::try_from(value) {
            Ok(small) => self.emit_value(kind, SemanticValue::Integer(small)),
            Err(_) if kind == TokenKind::LNumber => {
                self.emit_value(TokenKind::L64Number, SemanticValue::WideInteger(value))
            }
            Err(_) => self.emit_value(kind, SemanticValue::WideInteger(value)),
        }
    }

    // --- Quoted strings ---

    fn scan_single_quoted(&mut self) -> Token {
        let quote_pos = self.pos;
        let mut i = quote_pos + 1;
        while i < self.chars.len() {
            match self.chars[i] {
                '\\' => i += 2,
                '\'' => {
                    self.pos = i + 1;
                    let text = self.literal_text('\'', EscapeMode::SingleQuoted);
                    return self.emit_value(
                        TokenKind::ConstantEncapsedString,
                        SemanticValue::Literal {
                            text,
                            quote: QuoteKind::Single,
                        },
                    );
                }
                _ => i += 1,
            }
        }
        self.pos = quote_pos + 1;
        self.push_state(LexicalState::InSingleQuotes);
        self.emit(TokenKind::SingleQuotes)
    }

    fn scan_double_quoted(&mut self) -> Token {
        let quote_pos = self.pos;
        let mut i = quote_pos + 1;
        while i < self.chars.len() {
            match self.chars[i] {
                '\\' => i += 2,
                '"' => {
                    self.pos = i + 1;
                    let text = self.literal_text('"', EscapeMode::DoubleQuoted);
                    return self.emit_value(
                        TokenKind::ConstantEncapsedString,
                        SemanticValue::Literal {
                            text,
                            quote: QuoteKind::Double,
                        },
                    );
                }
                _ if self.interpolation_at(i) => break,
                _ => i += 1,
            }
        }
        self.pos = quote_pos + 1;
        self.push_state(LexicalState::InDoubleQuotes);
        self.emit(TokenKind::DoubleQuotes)
    }

    /// Body of a double-quoted or backquoted string being interpolated.
    fn scan_quoted_body(&mut self, terminator: char) -> Token {
        if self.peek() == terminator {
            self.advance();
            self.pop_state();
            let kind = if terminator == '`' {
                TokenKind::Backquote
            } else {
                TokenKind::DoubleQuotes
            };
            return self.emit(kind);
        }
        if self.interpolation_at(self.pos) {
            return self.scan_interpolation();
        }
        let mut i = self.pos;
        while i < self.chars.len() {
            let c = self.chars[i];
            if c == terminator || self.interpolation_at(i) {
                break;
            }
            i += if c == '\\' { 2 } else { 1 };
        }
        self.pos = i.min(self.chars.len());
        let mode = if terminator == '`' {
            EscapeMode::Backquote
        } else {
            EscapeMode::DoubleQuoted
        };
        let text = self.decode_range(self.token_start, self.pos, mode, false);
        self.encapsed(text)
    }

    fn scan_single_quoted_body(&mut self) -> Token {
        if self.peek() == '\'' {
            self.advance();
            self.pop_state();
            return self.emit(TokenKind::SingleQuotes);
        }
        let mut i = self.pos;
        while i < self.chars.len() && self.chars[i] != '\'' {
            i += if self.chars[i] == '\\' { 2 } else { 1 };
        }
        self.pos = i.min(self.chars.len());
        let text = self.decode_range(self.token_start, self.pos, EscapeMode::SingleQuoted, false);
        self.encapsed(text)
    }

    // --- Interpolation ---

    fn interpolation_at(&self, i: usize) -> bool {
        match self.char_at(i) {
            '$' => is_label_start(self.char_at(i + 1)) || self.char_at(i + 1) == '{',
            '{' => self.char_at(i + 1) == '$',
            _ => false,
        }
    }

    fn scan_interpolation(&mut self) -> Token {
        match (self.peek(), self.peek_at(1)) {
            ('$', '{') => {
                self.advance_by(2);
                self.push_state(LexicalState::LookingForVarname);
                self.emit(TokenKind::DollarOpenCurlyBraces)
            }
            ('{', _) => {
                self.advance();
                self.push_state(LexicalState::InScripting);
                self.emit(TokenKind::CurlyOpen)
            }
            _ => {
                let token = self.scan_variable();
                if self.peek() == '[' {
                    self.push_state(LexicalState::VarOffset);
                } else if (self.matches(self.pos, "->") && is_label_start(self.peek_at(2)))
                    || (self.matches(self.pos, "?->") && is_label_start(self.peek_at(3)))
                {
                    self.push_state(LexicalState::LookingForProperty);
                }
                token
            }
        }
    }

    fn scan_property(&mut self) -> Option<Token> {
        let c = self.peek();
        if matches!(c, ' ' | '\t' | '\n' | '\r') {
            while matches!(self.peek(), ' ' | '\t' | '\n' | '\r') && !self.is_at_end() {
                self.advance();
            }
            return Some(self.emit(TokenKind::Whitespace));
        }
        if self.matches(self.pos, "->") {
            self.advance_by(2);
            return Some(self.emit(TokenKind::ObjectOperator));
        }
        if self.matches(self.pos, "?->") {
            self.advance_by(3);
            return Some(self.emit(TokenKind::NullsafeObjectOperator));
        }
        self.pop_state();
        if is_label_start(c) {
            self.skip_label();
            let name = self.intern_range(self.token_start, self.pos);
            return Some(self.emit_value(TokenKind::String, SemanticValue::Text(Text::Str(name))));
        }
        None
    }

    fn scan_varname(&mut self) -> Option<Token> {
        self.pop_state();
        self.push_state(LexicalState::InScripting);
        if !is_label_start(self.peek()) {
            return None;
        }
        let mut end = self.pos;
        while is_label_char(self.char_at(end)) {
            end += 1;
        }
        if !matches!(self.char_at(end), '[' | '}') {
            return None;
        }
        self.pos = end;
        let name = self.intern_range(self.token_start, self.pos);
        Some(self.emit_value(TokenKind::StringVarname, SemanticValue::Text(Text::Str(name))))
    }

    fn scan_var_offset(&mut self) -> Option<Token> {
        let c = self.peek();
        match c {
            '[' => {
                self.advance();
                Some(self.emit(TokenKind::LBracket))
            }
            ']' => {
                self.advance();
                self.pop_state();
                Some(self.emit(TokenKind::RBracket))
            }
            '-' => {
                self.advance();
                Some(self.emit(TokenKind::Minus))
            }
            '$' if is_label_start(self.peek_at(1)) => Some(self.scan_variable()),
            '0'..='9' => Some(self.scan_offset_number()),
            c if is_label_start(c) => {
                self.skip_label();
                let name = self.intern_range(self.token_start, self.pos);
                Some(self.emit_value(TokenKind::String, SemanticValue::Text(Text::Str(name))))
            }
            _ => {
                self.pop_state();
                None
            }
        }
    }

    /// Decimal offsets become integers; anything a PHP array would keep as a
    /// string key (leading zero, too big) stays text.
    fn scan_offset_number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        let digits = &self.chars[self.token_start..self.pos];
        let value = if digits.len() > 1 && digits[0] == '0' {
            None
        } else {
            match number::parse_integer(digits, 10) {
                IntegerLiteral::Int(value) => Some(value),
                IntegerLiteral::Overflow(_) => None,
            }
        };
        match value {
            Some(value) => self.integer_token(TokenKind::NumString, value),
            None => {
                let text = self.intern_range(self.token_start, self.pos);
                self.emit_value(TokenKind::NumString, SemanticValue::Text(Text::Str(text)))
            }
        }
    }

    // --- Heredoc and nowdoc ---

    /// `<<<` optional blanks, a bare, double-quoted or single-quoted label,
    /// then a newline. Leaves the position untouched when not matched.
    fn scan_heredoc_start(&mut self) -> Option<Token> {
        let mut i = self.pos + 3;
        while matches!(self.char_at(i), ' ' | '\t') {
            i += 1;
        }
        let quote = match self.char_at(i) {
            q @ ('\'' | '"') => {
                i += 1;
                Some(q)
            }
            _ => None,
        };
        if !is_label_start(self.char_at(i)) {
            return None;
        }
        let label_start = i;
        while is_label_char(self.char_at(i)) {
            i += 1;
        }
        let label_end = i;
        if let Some(q) = quote {
            if self.char_at(i) != q {
                return None;
            }
            i += 1;
        }
        match (self.char_at(i), self.char_at(i + 1)) {
            ('\r', '\n') => i += 2,
            ('\n' | '\r', _) => i += 1,
            _ => return None,
        }

        let label = self.intern_range(label_start, label_end);
        self.pos = i;
        self.heredoc_label = Some(Arc::clone(&label));
        let body = if quote == Some('\'') {
            LexicalState::InNowdoc
        } else {
            LexicalState::InHeredoc
        };
        self.push_state(body);
        Some(self.emit_value(TokenKind::StartHeredoc, SemanticValue::Text(Text::Str(label))))
    }

    fn scan_heredoc_body(&mut self) -> Option<Token> {
        let Some(label) = self.heredoc_label.clone() else {
            self.pop_state();
            return None;
        };
        let at_line_start = self.at_line_start(self.pos);

        let mut i = self.pos;
        let mut line_start = at_line_start;
        let end = loop {
            if line_start {
                if let Some(found) = heredoc::closing_label_at(&self.chars, i, &label) {
                    break FragmentEnd::Label(found);
                }
            }
            if i >= self.chars.len() {
                break FragmentEnd::Eof;
            }
            if self.interpolation_at(i) {
                break FragmentEnd::Interpolation;
            }
            let c = self.chars[i];
            let escaped = c == '\\' && !matches!(self.char_at(i + 1), '\n' | '\0');
            line_start = !escaped && c == '\n';
            i += if escaped { 2 } else { 1 };
        };

        match end {
            FragmentEnd::Interpolation if i == self.pos => Some(self.scan_interpolation()),
            FragmentEnd::Interpolation => {
                self.pos = i;
                let text = self.heredoc_fragment(at_line_start, &label);
                Some(self.encapsed(text))
            }
            FragmentEnd::Label(found) => {
                self.pos = found.label_start;
                self.begin(LexicalState::EndHeredoc);
                let text = self.heredoc_final(at_line_start, Some(EscapeMode::DoubleQuoted))?;
                Some(self.encapsed(text))
            }
            FragmentEnd::Eof => {
                self.pos = self.chars.len();
                if self.pos == self.token_start {
                    return None;
                }
                let text = self.decode_range(self.token_start, self.pos, EscapeMode::DoubleQuoted, false);
                Some(self.encapsed(text))
            }
        }
    }

    fn scan_nowdoc_body(&mut self) -> Option<Token> {
        let Some(label) = self.heredoc_label.clone() else {
            self.pop_state();
            return None;
        };
        let at_line_start = self.at_line_start(self.pos);
        match heredoc::find_closing_label(&self.chars, self.pos, at_line_start, &label) {
            Some(found) => {
                self.pos = found.label_start;
                self.begin(LexicalState::EndHeredoc);
                let text = self.heredoc_final(at_line_start, None)?;
                Some(self.encapsed(text))
            }
            None => {
                self.pos = self.chars.len();
                if self.pos == self.token_start {
                    return None;
                }
                let text = self.intern_range(self.token_start, self.pos);
                Some(self.encapsed(Text::Str(text)))
            }
        }
    }

    /// Text from the token start up to the closing label, dedented by the
    /// label's indentation and decoded. `None` when nothing is left.
    fn heredoc_final(&mut self, at_line_start: bool, mode: Option<EscapeMode>) -> Option<Text> {
        let (start, end) = (self.token_start, self.pos);
        let width = match heredoc::resolve_indentation(&self.chars[start..end], at_line_start) {
            Ok(width) => width,
            Err(mismatch) => {
                let span = self.span();
                self.report(span, LexError::IncorrectHeredocIndentation);
                mismatch.shared
            }
        };
        let options = mode.map(|mode| self.escape_options(mode, false));
        let (text, invalid_code_point) = {
            let body = heredoc::final_body(&self.chars[start..end]);
            let body = heredoc::remove_indentation(body, at_line_start, width);
            if body.is_empty() {
                return None;
            }
            match options {
                Some(options) => decode_text(&mut self.strings, &body, options),
                None => (Text::Str(self.strings.intern_chars(&body)), false),
            }
        };
        if invalid_code_point {
            self.report_invalid_code_point();
        }
        Some(text)
    }

    /// A fragment ending at an interpolation. Its lines are dedented by the
    /// indentation of the closing label further ahead.
    fn heredoc_fragment(&mut self, at_line_start: bool, label: &str) -> Text {
        let (start, end) = (self.token_start, self.pos);
        let indent: Vec<char> = heredoc::find_closing_label(&self.chars, end, false, label)
            .map(|found| self.chars[found.line_start..found.label_start].to_vec())
            .unwrap_or_default();
        if !heredoc::is_indented_by(&self.chars[start..end], at_line_start, &indent) {
            let span = self.span();
            self.report(span, LexError::IncorrectHeredocIndentation);
        }
        let options = self.escape_options(EscapeMode::DoubleQuoted, false);
        let (text, invalid_code_point) = {
            let body = heredoc::remove_indentation(&self.chars[start..end], at_line_start, indent.len());
            decode_text(&mut self.strings, &body, options)
        };
        if invalid_code_point {
            self.report_invalid_code_point();
        }
        text
    }

    fn scan_heredoc_end(&mut self) -> Token {
        while matches!(self.peek(), ' ' | '\t') {
            self.advance();
        }
        let label = self.heredoc_label.take();
        if let Some(label) = &label {
            if self.matches(self.pos, label) {
                self.advance_by(label.chars().count());
            }
        }
        self.pop_state();
        let value = match label {
            Some(label) => SemanticValue::Text(Text::Str(label)),
            None => SemanticValue::None,
        };
        self.emit_value(TokenKind::EndHeredoc, value)
    }

    // --- Text helpers ---

    fn escape_options(&self, mode: EscapeMode, binary: bool) -> EscapeOptions {
        EscapeOptions::new(mode, self.encoding)
            .unicode_escapes(self.features.contains(LanguageFeatures::UNICODE_CODEPOINT_ESCAPES))
            .binary(binary)
    }

    /// Decoded body of the complete quoted literal under the cursor.
    fn literal_text(&mut self, quote: char, mode: EscapeMode) -> Text {
        let bounds = escape::quoted_bounds(&self.chars[self.token_start..self.pos], quote);
        self.decode_range(
            self.token_start + bounds.start,
            self.token_start + bounds.end,
            mode,
            bounds.binary,
        )
    }

    fn decode_range(&mut self, start: usize, end: usize, mode: EscapeMode, binary: bool) -> Text {
        let options = self.escape_options(mode, binary);
        let (text, invalid_code_point) = decode_text(&mut self.strings, &self.chars[start..end], options);
        if invalid_code_point {
            self.report_invalid_code_point();
        }
        text
    }

    fn report_invalid_code_point(&mut self) {
        let span = self.span();
        self.report(span, LexError::InvalidCodePoint(self.token_string()));
    }

    fn encapsed(&self, text: Text) -> Token {
        let raw = self.source_text(self.token_start, self.pos);
        self.emit_value(TokenKind::EncapsedAndWhitespace, SemanticValue::Encapsed { text, raw })
    }

    fn intern_range(&mut self, start: usize, end: usize) -> Arc<str> {
        self.strings.intern_chars(&self.chars[start..end])
    }

    /// Uninterned copy of a source range, for text that rarely repeats.
    fn source_text(&self, start: usize, end: usize) -> Arc<str> {
        Arc::from(self.chars[start..end].iter().collect::<String>())
    }

    fn token_string(&self) -> String {
        self.chars[self.token_start..self.pos].iter().collect()
    }

    // --- State stack ---

    fn push_state(&mut self, next: LexicalState) {
        trace!(from = ?self.state, to = ?next, depth = self.stack.len() + 1, "push lexical state");
        self.stack.push(self.state);
        self.state = next;
    }

    fn pop_state(&mut self) {
        let previous = self.stack.pop().unwrap_or(LexicalState::InScripting);
        trace!(from = ?self.state, to = ?previous, depth = self.stack.len(), "pop lexical state");
        self.state = previous;
    }

    fn begin(&mut self, state: LexicalState) {
        self.state = state;
    }

    fn report(&mut self, span: Span, error: LexError) {
        debug!(%span, %error, "lexical diagnostic");
        self.errors.error(span, error);
    }

    // --- Helpers ---

    fn span(&self) -> Span {
        Span::from_bounds(self.shift + self.token_start, self.shift + self.pos)
    }

    fn emit(&self, kind: TokenKind) -> Token {
        self.emit_value(kind, SemanticValue::None)
    }

    fn emit_value(&self, kind: TokenKind, value: SemanticValue) -> Token {
        Token::new(kind, self.span(), value)
    }

    fn peek(&self) -> char {
        self.char_at(self.pos)
    }

    fn peek_at(&self, offset: usize) -> char {
        self.char_at(self.pos + offset)
    }

    fn char_at(&self, i: usize) -> char {
        self.chars.get(i).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn advance_by(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.chars.len());
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn at_line_start(&self, i: usize) -> bool {
        i == 0 || self.chars.get(i - 1) == Some(&'\n')
    }

    fn skip_label(&mut self) {
        while is_label_char(self.peek()) {
            self.advance();
        }
    }

    fn matches(&self, at: usize, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(k, c)| self.chars.get(at + k) == Some(&c))
    }

    fn matches_ignore_case(&self, at: usize, text: &str) -> bool {
        text.chars().enumerate().all(|(k, c)| {
            self.chars
                .get(at + k)
                .is_some_and(|actual| actual.eq_ignore_ascii_case(&c))
        })
    }
}

impl<E: ErrorSink> Iterator for Scanner<E> {
    type Item = Token;

    /// Yields tokens up to, but not including, the end marker.
    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        (token.kind != TokenKind::End).then_some(token)
    }
}

fn decode_text(strings: &mut StringTable, chars: &[char], options: EscapeOptions) -> (Text, bool) {
    match escape::unescape(chars, options) {
        Unescaped::Verbatim => (Text::Str(strings.intern_chars(chars)), false),
        Unescaped::Rebuilt {
            text,
            invalid_code_point,
        } => (text, invalid_code_point),
    }
}

fn is_label_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || u32::from(c) >= 0x80
}

fn is_label_char(c: char) -> bool {
    is_label_start(c) || c.is_ascii_digit()
}
