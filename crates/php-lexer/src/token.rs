use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// A region of source text: a character offset and a length.
///
/// Spans order by start offset first, so successive tokens from one scanner
/// compare as non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub length: usize,
}

impl Span {
    /// Sentinel for names and nodes that have no source location.
    pub const INVALID: Span = Span {
        start: usize::MAX,
        length: 0,
    };

    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self {
            start,
            length: end.saturating_sub(start),
        }
    }

    pub fn end(&self) -> usize {
        self.start.saturating_add(self.length)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn is_valid(&self) -> bool {
        self.start != usize::MAX
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: Span) -> Span {
        Span::from_bounds(self.start.min(other.start), self.end().max(other.end()))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

/// Token classification for PHP source.
///
/// Kinds are plain tags; the payload of a token lives in its
/// [`SemanticValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Markup
    InlineHtml,
    OpenTag,
    OpenTagWithEcho,
    CloseTag,
    Whitespace,
    Comment,
    DocComment,

    // Literals
    LNumber,
    L64Number,
    DNumber,
    ConstantEncapsedString,
    EncapsedAndWhitespace,
    NumString,
    String,
    Variable,
    StringVarname,

    // String delimiters and interpolation
    DoubleQuotes,
    SingleQuotes,
    Backquote,
    StartHeredoc,
    EndHeredoc,
    DollarOpenCurlyBraces,
    CurlyOpen,

    // Keywords
    Abstract,
    Array,
    As,
    Break,
    Callable,
    Case,
    Catch,
    Class,
    Clone,
    Const,
    Continue,
    Declare,
    Default,
    Do,
    Echo,
    Else,
    ElseIf,
    Empty,
    EndDeclare,
    EndFor,
    EndForeach,
    EndIf,
    EndSwitch,
    EndWhile,
    Enum,
    Eval,
    Exit,
    Extends,
    Final,
    Finally,
    Fn,
    For,
    Foreach,
    Function,
    Global,
    Goto,
    HaltCompiler,
    If,
    Implements,
    Include,
    IncludeOnce,
    InstanceOf,
    InsteadOf,
    Interface,
    Isset,
    List,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    Match,
    Namespace,
    New,
    Print,
    Private,
    Protected,
    Public,
    Readonly,
    Require,
    RequireOnce,
    Return,
    Static,
    Switch,
    Throw,
    Trait,
    Try,
    Unset,
    Use,
    Var,
    While,
    Yield,
    YieldFrom,

    // Magic constants
    Line,
    File,
    Dir,
    ClassC,
    TraitC,
    MethodC,
    FuncC,
    NsC,

    // Casts
    IntCast,
    DoubleCast,
    StringCast,
    ArrayCast,
    ObjectCast,
    BoolCast,
    UnsetCast,

    // Compound operators
    ObjectOperator,
    NullsafeObjectOperator,
    DoubleArrow,
    DoubleColon,
    NsSeparator,
    Ellipsis,
    Inc,
    Dec,
    Pow,
    PowEqual,
    PlusEqual,
    MinusEqual,
    MulEqual,
    DivEqual,
    ConcatEqual,
    ModEqual,
    AndEqual,
    OrEqual,
    XorEqual,
    SlEqual,
    SrEqual,
    CoalesceEqual,
    Coalesce,
    BooleanAnd,
    BooleanOr,
    IsEqual,
    IsNotEqual,
    IsIdentical,
    IsNotIdentical,
    IsSmallerOrEqual,
    IsGreaterOrEqual,
    Spaceship,
    Sl,
    Sr,
    Attribute,

    // Single-character punctuation
    Semicolon,
    Comma,
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Amp,
    Pipe,
    Tilde,
    Bang,
    Eq,
    Lt,
    Gt,
    Question,
    Colon,
    At,
    Dollar,

    BadCharacter,

    // End of input
    End,
}

impl TokenKind {
    /// Whitespace and comments, which a parser skips.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocComment
        )
    }

    pub fn is_cast(self) -> bool {
        matches!(
            self,
            TokenKind::IntCast
                | TokenKind::DoubleCast
                | TokenKind::StringCast
                | TokenKind::ArrayCast
                | TokenKind::ObjectCast
                | TokenKind::BoolCast
                | TokenKind::UnsetCast
        )
    }
}

/// Text payload: valid text is interned, anything the source encoding
/// cannot represent (binary strings, raw escape bytes) stays as bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Text {
    Str(Arc<str>),
    Bytes(Vec<u8>),
}

impl Text {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Text::Str(s) => Some(s),
            Text::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Text::Str(s) => s.as_bytes(),
            Text::Bytes(b) => b,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Lossy rendering for display purposes.
    pub fn to_string_lossy(&self) -> String {
        match self {
            Text::Str(s) => s.to_string(),
            Text::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Text::Str(Arc::from(value))
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Text::Str(Arc::from(value))
    }
}

/// Which quote delimited a constant string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QuoteKind {
    Single,
    Double,
}

/// Typed payload carried by a token.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum SemanticValue {
    #[default]
    None,
    Integer(i32),
    WideInteger(i64),
    Float(f64),
    Text(Text),
    /// A complete quoted literal; `quote` records how it was delimited.
    Literal { text: Text, quote: QuoteKind },
    /// Raw text between interpolation points: decoded text plus the
    /// original source slice.
    Encapsed { text: Text, raw: Arc<str> },
}

impl SemanticValue {
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            SemanticValue::Integer(v) => Some(i64::from(v)),
            SemanticValue::WideInteger(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            SemanticValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&Text> {
        match self {
            SemanticValue::Text(text)
            | SemanticValue::Literal { text, .. }
            | SemanticValue::Encapsed { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.text().and_then(Text::as_str)
    }

    pub fn quote(&self) -> Option<QuoteKind> {
        match self {
            SemanticValue::Literal { quote, .. } => Some(*quote),
            _ => None,
        }
    }
}

/// A token produced by the PHP scanner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub value: SemanticValue,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, value: SemanticValue) -> Self {
        Self { kind, span, value }
    }
}

/// Look up a reserved word, ignoring ASCII case.
pub fn keyword(ident: &str) -> Option<TokenKind> {
    // Longest reserved word is `__halt_compiler`.
    if ident.len() > 15 {
        return None;
    }
    let lower = ident.to_ascii_lowercase();
    let kind = match lower.as_str() {
        "abstract" => TokenKind::Abstract,
        "and" => TokenKind::LogicalAnd,
        "array" => TokenKind::Array,
        "as" => TokenKind::As,
        "break" => TokenKind::Break,
        "callable" => TokenKind::Callable,
        "case" => TokenKind::Case,
        "catch" => TokenKind::Catch,
        "class" => TokenKind::Class,
        "clone" => TokenKind::Clone,
        "const" => TokenKind::Const,
        "continue" => TokenKind::Continue,
        "declare" => TokenKind::Declare,
        "default" => TokenKind::Default,
        "die" | "exit" => TokenKind::Exit,
        "do" => TokenKind::Do,
        "echo" => TokenKind::Echo,
        "else" => TokenKind::Else,
        "elseif" => TokenKind::ElseIf,
        "empty" => TokenKind::Empty,
        "enddeclare" => TokenKind::EndDeclare,
        "endfor" => TokenKind::EndFor,
        "endforeach" => TokenKind::EndForeach,
        "endif" => TokenKind::EndIf,
        "endswitch" => TokenKind::EndSwitch,
        "endwhile" => TokenKind::EndWhile,
        "enum" => TokenKind::Enum,
        "eval" => TokenKind::Eval,
        "extends" => TokenKind::Extends,
        "final" => TokenKind::Final,
        "finally" => TokenKind::Finally,
        "fn" => TokenKind::Fn,
        "for" => TokenKind::For,
        "foreach" => TokenKind::Foreach,
        "function" => TokenKind::Function,
        "global" => TokenKind::Global,
        "goto" => TokenKind::Goto,
        "if" => TokenKind::If,
        "implements" => TokenKind::Implements,
        "include" => TokenKind::Include,
        "include_once" => TokenKind::IncludeOnce,
        "instanceof" => TokenKind::InstanceOf,
        "insteadof" => TokenKind::InsteadOf,
        "interface" => TokenKind::Interface,
        "isset" => TokenKind::Isset,
        "list" => TokenKind::List,
        "match" => TokenKind::Match,
        "namespace" => TokenKind::Namespace,
        "new" => TokenKind::New,
        "or" => TokenKind::LogicalOr,
        "print" => TokenKind::Print,
        "private" => TokenKind::Private,
        "protected" => TokenKind::Protected,
        "public" => TokenKind::Public,
        "readonly" => TokenKind::Readonly,
        "require" => TokenKind::Require,
        "require_once" => TokenKind::RequireOnce,
        "return" => TokenKind::Return,
        "static" => TokenKind::Static,
        "switch" => TokenKind::Switch,
        "throw" => TokenKind::Throw,
        "trait" => TokenKind::Trait,
        "try" => TokenKind::Try,
        "unset" => TokenKind::Unset,
        "use" => TokenKind::Use,
        "var" => TokenKind::Var,
        "while" => TokenKind::While,
        "xor" => TokenKind::LogicalXor,
        "yield" => TokenKind::Yield,
        "__halt_compiler" => TokenKind::HaltCompiler,
        "__line__" => TokenKind::Line,
        "__file__" => TokenKind::File,
        "__dir__" => TokenKind::Dir,
        "__class__" => TokenKind::ClassC,
        "__trait__" => TokenKind::TraitC,
        "__method__" => TokenKind::MethodC,
        "__function__" => TokenKind::FuncC,
        "__namespace__" => TokenKind::NsC,
        _ => return None,
    };
    Some(kind)
}

/// Look up the type name inside a cast such as `(int)`, ignoring ASCII case.
pub fn cast(type_name: &str) -> Option<TokenKind> {
    let kind = match type_name.to_ascii_lowercase().as_str() {
        "int" | "integer" => TokenKind::IntCast,
        "bool" | "boolean" => TokenKind::BoolCast,
        "float" | "double" | "real" => TokenKind::DoubleCast,
        "string" | "binary" => TokenKind::StringCast,
        "array" => TokenKind::ArrayCast,
        "object" => TokenKind::ObjectCast,
        "unset" => TokenKind::UnsetCast,
        _ => return None,
    };
    Some(kind)
}

/// Operators and punctuation, longest spellings first so a prefix scan
/// picks the longest match.
pub(crate) const OPERATORS: &[(&str, TokenKind)] = &[
    ("<=>", TokenKind::Spaceship),
    ("**=", TokenKind::PowEqual),
    ("...", TokenKind::Ellipsis),
    ("<<=", TokenKind::SlEqual),
    (">>=", TokenKind::SrEqual),
    ("===", TokenKind::IsIdentical),
    ("!==", TokenKind::IsNotIdentical),
    ("??=", TokenKind::CoalesceEqual),
    ("?->", TokenKind::NullsafeObjectOperator),
    ("->", TokenKind::ObjectOperator),
    ("=>", TokenKind::DoubleArrow),
    ("::", TokenKind::DoubleColon),
    ("++", TokenKind::Inc),
    ("--", TokenKind::Dec),
    ("**", TokenKind::Pow),
    ("+=", TokenKind::PlusEqual),
    ("-=", TokenKind::MinusEqual),
    ("*=", TokenKind::MulEqual),
    ("/=", TokenKind::DivEqual),
    (".=", TokenKind::ConcatEqual),
    ("%=", TokenKind::ModEqual),
    ("&=", TokenKind::AndEqual),
    ("|=", TokenKind::OrEqual),
    ("^=", TokenKind::XorEqual),
    ("??", TokenKind::Coalesce),
    ("&&", TokenKind::BooleanAnd),
    ("||", TokenKind::BooleanOr),
    ("==", TokenKind::IsEqual),
    ("!=", TokenKind::IsNotEqual),
    ("<>", TokenKind::IsNotEqual),
    ("<=", TokenKind::IsSmallerOrEqual),
    (">=", TokenKind::IsGreaterOrEqual),
    ("<<", TokenKind::Sl),
    (">>", TokenKind::Sr),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
    (".", TokenKind::Dot),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("^", TokenKind::Caret),
    ("&", TokenKind::Amp),
    ("|", TokenKind::Pipe),
    ("~", TokenKind::Tilde),
    ("!", TokenKind::Bang),
    ("=", TokenKind::Eq),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("?", TokenKind::Question),
    (":", TokenKind::Colon),
    ("@", TokenKind::At),
    ("$", TokenKind::Dollar),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_end_and_order() {
        let a = Span::new(3, 4);
        let b = Span::new(7, 0);
        assert_eq!(a.end(), 7);
        assert!(b.is_empty());
        assert!(a < b);
        assert_eq!(a.to(b), Span::new(3, 4));
        assert!(!Span::INVALID.is_valid());
    }

    #[test]
    fn test_keyword_ignores_case() {
        assert_eq!(keyword("ECHO"), Some(TokenKind::Echo));
        assert_eq!(keyword("NameSpace"), Some(TokenKind::Namespace));
        assert_eq!(keyword("__CLASS__"), Some(TokenKind::ClassC));
        assert_eq!(keyword("echoes"), None);
    }

    #[test]
    fn test_cast_names() {
        assert_eq!(cast("Integer"), Some(TokenKind::IntCast));
        assert_eq!(cast("real"), Some(TokenKind::DoubleCast));
        assert_eq!(cast("binary"), Some(TokenKind::StringCast));
        assert_eq!(cast("void"), None);
    }

    #[test]
    fn test_operator_table_longest_first() {
        // every operator must come before any shorter operator it starts with
        for (i, (long, _)) in OPERATORS.iter().enumerate() {
            for (short, _) in &OPERATORS[..i] {
                assert!(
                    !(long.starts_with(short) && long.len() > short.len()),
                    "{long} is shadowed by {short}"
                );
            }
        }
    }

    #[test]
    fn test_semantic_value_accessors() {
        assert_eq!(SemanticValue::Integer(5).as_i64(), Some(5));
        assert_eq!(SemanticValue::WideInteger(1 << 40).as_i64(), Some(1 << 40));
        let lit = SemanticValue::Literal {
            text: Text::from("hi"),
            quote: QuoteKind::Single,
        };
        assert_eq!(lit.as_str(), Some("hi"));
        assert_eq!(lit.quote(), Some(QuoteKind::Single));
        assert_eq!(Text::Bytes(vec![0xff]).as_str(), None);
    }
}
