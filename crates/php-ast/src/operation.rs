use std::fmt;

use php_lexer::TokenKind;

/// Operator carried by unary, binary and assignment expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    // Binary
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    And,
    Or,
    Xor,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    Spaceship,
    Coalesce,

    // Unary
    Plus,
    Minus,
    LogicNegation,
    BitNegation,
    AtSign,
    Print,
    Clone,

    // Casts
    Int64Cast,
    DoubleCast,
    StringCast,
    ArrayCast,
    ObjectCast,
    BoolCast,
    UnsetCast,

    // Assignment
    AssignValue,
    AssignRef,
    AssignAdd,
    AssignSub,
    AssignMul,
    AssignDiv,
    AssignMod,
    AssignPow,
    AssignAppend,
    AssignAnd,
    AssignOr,
    AssignXor,
    AssignShiftLeft,
    AssignShiftRight,
    AssignCoalesce,
}

impl Operation {
    /// The variant name, as written by serializers.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Add => "Add",
            Operation::Sub => "Sub",
            Operation::Mul => "Mul",
            Operation::Div => "Div",
            Operation::Mod => "Mod",
            Operation::Pow => "Pow",
            Operation::Concat => "Concat",
            Operation::BitAnd => "BitAnd",
            Operation::BitOr => "BitOr",
            Operation::BitXor => "BitXor",
            Operation::ShiftLeft => "ShiftLeft",
            Operation::ShiftRight => "ShiftRight",
            Operation::And => "And",
            Operation::Or => "Or",
            Operation::Xor => "Xor",
            Operation::Equal => "Equal",
            Operation::NotEqual => "NotEqual",
            Operation::Identical => "Identical",
            Operation::NotIdentical => "NotIdentical",
            Operation::LessThan => "LessThan",
            Operation::GreaterThan => "GreaterThan",
            Operation::LessThanOrEqual => "LessThanOrEqual",
            Operation::GreaterThanOrEqual => "GreaterThanOrEqual",
            Operation::Spaceship => "Spaceship",
            Operation::Coalesce => "Coalesce",
            Operation::Plus => "Plus",
            Operation::Minus => "Minus",
            Operation::LogicNegation => "LogicNegation",
            Operation::BitNegation => "BitNegation",
            Operation::AtSign => "AtSign",
            Operation::Print => "Print",
            Operation::Clone => "Clone",
            Operation::Int64Cast => "Int64Cast",
            Operation::DoubleCast => "DoubleCast",
            Operation::StringCast => "StringCast",
            Operation::ArrayCast => "ArrayCast",
            Operation::ObjectCast => "ObjectCast",
            Operation::BoolCast => "BoolCast",
            Operation::UnsetCast => "UnsetCast",
            Operation::AssignValue => "AssignValue",
            Operation::AssignRef => "AssignRef",
            Operation::AssignAdd => "AssignAdd",
            Operation::AssignSub => "AssignSub",
            Operation::AssignMul => "AssignMul",
            Operation::AssignDiv => "AssignDiv",
            Operation::AssignMod => "AssignMod",
            Operation::AssignPow => "AssignPow",
            Operation::AssignAppend => "AssignAppend",
            Operation::AssignAnd => "AssignAnd",
            Operation::AssignOr => "AssignOr",
            Operation::AssignXor => "AssignXor",
            Operation::AssignShiftLeft => "AssignShiftLeft",
            Operation::AssignShiftRight => "AssignShiftRight",
            Operation::AssignCoalesce => "AssignCoalesce",
        }
    }

    /// Binary operator spelled by `kind`.
    pub fn binary(kind: TokenKind) -> Option<Operation> {
        let op = match kind {
            TokenKind::Plus => Operation::Add,
            TokenKind::Minus => Operation::Sub,
            TokenKind::Star => Operation::Mul,
            TokenKind::Slash => Operation::Div,
            TokenKind::Percent => Operation::Mod,
            TokenKind::Pow => Operation::Pow,
            TokenKind::Dot => Operation::Concat,
            TokenKind::Amp => Operation::BitAnd,
            TokenKind::Pipe => Operation::BitOr,
            TokenKind::Caret => Operation::BitXor,
            TokenKind::Sl => Operation::ShiftLeft,
            TokenKind::Sr => Operation::ShiftRight,
            TokenKind::BooleanAnd | TokenKind::LogicalAnd => Operation::And,
            TokenKind::BooleanOr | TokenKind::LogicalOr => Operation::Or,
            TokenKind::LogicalXor => Operation::Xor,
            TokenKind::IsEqual => Operation::Equal,
            TokenKind::IsNotEqual => Operation::NotEqual,
            TokenKind::IsIdentical => Operation::Identical,
            TokenKind::IsNotIdentical => Operation::NotIdentical,
            TokenKind::Lt => Operation::LessThan,
            TokenKind::Gt => Operation::GreaterThan,
            TokenKind::IsSmallerOrEqual => Operation::LessThanOrEqual,
            TokenKind::IsGreaterOrEqual => Operation::GreaterThanOrEqual,
            TokenKind::Spaceship => Operation::Spaceship,
            TokenKind::Coalesce => Operation::Coalesce,
            _ => return None,
        };
        Some(op)
    }

    /// Prefix operator or cast spelled by `kind`.
    pub fn unary(kind: TokenKind) -> Option<Operation> {
        let op = match kind {
            TokenKind::Plus => Operation::Plus,
            TokenKind::Minus => Operation::Minus,
            TokenKind::Bang => Operation::LogicNegation,
            TokenKind::Tilde => Operation::BitNegation,
            TokenKind::At => Operation::AtSign,
            TokenKind::Print => Operation::Print,
            TokenKind::Clone => Operation::Clone,
            TokenKind::IntCast => Operation::Int64Cast,
            TokenKind::DoubleCast => Operation::DoubleCast,
            TokenKind::StringCast => Operation::StringCast,
            TokenKind::ArrayCast => Operation::ArrayCast,
            TokenKind::ObjectCast => Operation::ObjectCast,
            TokenKind::BoolCast => Operation::BoolCast,
            TokenKind::UnsetCast => Operation::UnsetCast,
            _ => return None,
        };
        Some(op)
    }

    /// Assignment operator spelled by `kind`. `=` maps to
    /// [`Operation::AssignValue`]; `=&` is two tokens and is left to the
    /// parser.
    pub fn assignment(kind: TokenKind) -> Option<Operation> {
        let op = match kind {
            TokenKind::Eq => Operation::AssignValue,
            TokenKind::PlusEqual => Operation::AssignAdd,
            TokenKind::MinusEqual => Operation::AssignSub,
            TokenKind::MulEqual => Operation::AssignMul,
            TokenKind::DivEqual => Operation::AssignDiv,
            TokenKind::ModEqual => Operation::AssignMod,
            TokenKind::PowEqual => Operation::AssignPow,
            TokenKind::ConcatEqual => Operation::AssignAppend,
            TokenKind::AndEqual => Operation::AssignAnd,
            TokenKind::OrEqual => Operation::AssignOr,
            TokenKind::XorEqual => Operation::AssignXor,
            TokenKind::SlEqual => Operation::AssignShiftLeft,
            TokenKind::SrEqual => Operation::AssignShiftRight,
            TokenKind::CoalesceEqual => Operation::AssignCoalesce,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            Operation::AssignValue
                | Operation::AssignRef
                | Operation::AssignAdd
                | Operation::AssignSub
                | Operation::AssignMul
                | Operation::AssignDiv
                | Operation::AssignMod
                | Operation::AssignPow
                | Operation::AssignAppend
                | Operation::AssignAnd
                | Operation::AssignOr
                | Operation::AssignXor
                | Operation::AssignShiftLeft
                | Operation::AssignShiftRight
                | Operation::AssignCoalesce
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use php_lexer::Scanner;

    #[test]
    fn test_operators_from_scanned_tokens() {
        let ops: Vec<_> = Scanner::tokenize("<?php + . ?? <=> and")
            .into_iter()
            .filter_map(|t| Operation::binary(t.kind))
            .collect();
        assert_eq!(
            ops,
            vec![
                Operation::Add,
                Operation::Concat,
                Operation::Coalesce,
                Operation::Spaceship,
                Operation::And,
            ]
        );
    }

    #[test]
    fn test_casts_are_unary() {
        let ops: Vec<_> = Scanner::tokenize("<?php (int) (bool) ! ~")
            .into_iter()
            .filter_map(|t| Operation::unary(t.kind))
            .collect();
        assert_eq!(
            ops,
            vec![
                Operation::Int64Cast,
                Operation::BoolCast,
                Operation::LogicNegation,
                Operation::BitNegation,
            ]
        );
    }

    #[test]
    fn test_assignments() {
        assert_eq!(Operation::assignment(TokenKind::ConcatEqual), Some(Operation::AssignAppend));
        assert_eq!(Operation::assignment(TokenKind::Plus), None);
        assert!(Operation::AssignRef.is_assignment());
        assert!(!Operation::Concat.is_assignment());
    }

    #[test]
    fn test_display_uses_variant_name() {
        assert_eq!(Operation::AssignValue.to_string(), "AssignValue");
        assert_eq!(Operation::GreaterThanOrEqual.name(), "GreaterThanOrEqual");
    }
}
