//! The type system: built-in/constructed types, the four-valued
//! compatibility relation, and operator-result inference (spec 3 "Type",
//! spec 4.2 "Type system").

mod ty;

pub use ty::{Compatibility, Type};

use crate::ast::{BinaryOp, UnaryOp};

/// Single source of truth for type construction and queries. Holds no
/// mutable state - type objects are immutable once built, so there is
/// nothing to invalidate and no cache is required for correctness (spec
/// 4.2 notes a cache is merely *permitted*).
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeSystem;

impl TypeSystem {
    pub fn new() -> Self {
        Self
    }

    /// Resolve one of the recognized built-in type names.
    pub fn builtin(&self, name: &str) -> Option<Type> {
        match name {
            "byte" => Some(Type::Byte),
            "word" => Some(Type::Word),
            "boolean" | "bool" => Some(Type::Boolean),
            "void" => Some(Type::Void),
            "string" => Some(Type::String),
            _ => None,
        }
    }

    pub fn array_of(&self, element: Type, count: Option<usize>) -> Type {
        Type::Array { element: Box::new(element), count }
    }

    pub fn callback_of(&self, params: Vec<Type>, ret: Type) -> Type {
        Type::Callback { params, ret: Box::new(ret) }
    }

    pub fn compatibility(&self, source: &Type, target: &Type) -> Compatibility {
        use Compatibility::*;
        use Type::*;

        if source == &Unknown || target == &Unknown {
            // Error-recovery type: treated as compatible in every
            // direction so a prior error never avalanches into new ones.
            return Identical;
        }

        if source == target {
            return Identical;
        }

        match (source, target) {
            (Byte, Word) => Compatible,
            (Word, Byte) => RequiresConversion,
            (Byte, Boolean) | (Boolean, Byte) => Compatible,
            (Array { element: se, count: sc }, Array { element: te, count: tc }) => {
                if se != te {
                    return Incompatible;
                }
                match (sc, tc) {
                    (a, b) if a == b => Identical,
                    (Some(_), None) => Compatible,
                    _ => Incompatible,
                }
            }
            (Callback { params: sp, ret: sr }, Callback { params: tp, ret: tr }) => {
                if sp.len() == tp.len()
                    && sp.iter().zip(tp.iter()).all(|(a, b)| a == b)
                    && sr == tr
                {
                    Identical
                } else {
                    Incompatible
                }
            }
            (Function { params: sp, ret: sr }, Function { params: tp, ret: tr }) => {
                if sp.len() == tp.len()
                    && sp.iter().zip(tp.iter()).all(|(a, b)| a == b)
                    && sr == tr
                {
                    Identical
                } else {
                    Incompatible
                }
            }
            _ => Incompatible,
        }
    }

    pub fn can_assign(&self, source: &Type, target: &Type) -> bool {
        matches!(
            self.compatibility(source, target),
            Compatibility::Identical | Compatibility::Compatible
        )
    }

    fn is_numeric(t: &Type) -> bool {
        matches!(t, Type::Byte | Type::Word)
    }

    fn is_boolean_like(t: &Type) -> bool {
        matches!(t, Type::Boolean | Type::Byte)
    }

    /// Result type of `lhs op rhs`, or `Type::Unknown` if the operands
    /// don't fit the operator's family (spec 3 "Operation type rules").
    /// `Unknown` is also propagated straight through if either operand is
    /// already `Unknown`, per spec 4.6's "If either side is unknown,
    /// result is unknown."
    pub fn binary_op_type(&self, lhs: &Type, rhs: &Type, op: BinaryOp) -> Type {
        if *lhs == Type::Unknown || *rhs == Type::Unknown {
            return Type::Unknown;
        }

        if op.is_arithmetic_or_bitwise() {
            if Self::is_numeric(lhs) && Self::is_numeric(rhs) {
                return if *lhs == Type::Word || *rhs == Type::Word { Type::Word } else { Type::Byte };
            }
            return Type::Unknown;
        }

        if op.is_comparison() {
            if Self::is_numeric(lhs) && Self::is_numeric(rhs) {
                return Type::Boolean;
            }
            if *lhs == Type::Boolean && *rhs == Type::Boolean {
                return Type::Boolean;
            }
            return Type::Unknown;
        }

        if op.is_logical() {
            if Self::is_boolean_like(lhs) && Self::is_boolean_like(rhs) {
                return Type::Boolean;
            }
            return Type::Unknown;
        }

        Type::Unknown
    }

    pub fn unary_op_type(&self, operand: &Type, op: UnaryOp) -> Type {
        if op == UnaryOp::ADDRESS_OF {
            // Address-of always yields a word-sized pointer, even for an
            // ill-typed operand: spec 3 says this holds "regardless of
            // operand type".
            return Type::Word;
        }

        if *operand == Type::Unknown {
            return Type::Unknown;
        }

        match op {
            UnaryOp::NEGATE | UnaryOp::BIT_NOT => {
                if Self::is_numeric(operand) {
                    operand.clone()
                } else {
                    Type::Unknown
                }
            }
            UnaryOp::NOT => {
                if Self::is_boolean_like(operand) {
                    Type::Boolean
                } else {
                    Type::Unknown
                }
            }
            UnaryOp::ADDRESS_OF => unreachable!("handled above"),
        }
    }

    /// Least-upper-bound of a sequence of element types by the promotion
    /// rules, for array-literal typing (spec 4.6). Returns `Unknown` if
    /// the elements don't share a common type.
    pub fn common_type(&self, types: &[Type]) -> Type {
        let mut iter = types.iter();
        let Some(first) = iter.next() else {
            return Type::Unknown;
        };
        let mut acc = first.clone();
        for t in iter {
            acc = match self.compatibility(t, &acc) {
                Compatibility::Identical => acc,
                Compatibility::Compatible => acc,
                _ => match self.compatibility(&acc, t) {
                    Compatibility::Identical | Compatibility::Compatible => t.clone(),
                    _ => return Type::Unknown,
                },
            };
        }
        acc
    }
}
