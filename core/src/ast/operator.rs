/// Binary operators, grouped by the promotion-rule family spec 3 assigns
/// them to (arithmetic/bitwise share one rule, comparison and logical each
/// have their own).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum BinaryOp {
    ADD,
    SUB,
    MUL,
    DIV,
    MOD,

    BIT_AND,
    BIT_OR,
    BIT_XOR,
    SHL,
    SHR,

    EQUAL,
    NOT_EQUAL,
    GREATER_THAN,
    LESS_THAN,
    GREATER_EQUAL,
    LESS_EQUAL,

    LOGICAL_AND,
    LOGICAL_OR,
}

impl BinaryOp {
    pub fn is_arithmetic_or_bitwise(&self) -> bool {
        matches!(
            self,
            BinaryOp::ADD
                | BinaryOp::SUB
                | BinaryOp::MUL
                | BinaryOp::DIV
                | BinaryOp::MOD
                | BinaryOp::BIT_AND
                | BinaryOp::BIT_OR
                | BinaryOp::BIT_XOR
                | BinaryOp::SHL
                | BinaryOp::SHR
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::EQUAL
                | BinaryOp::NOT_EQUAL
                | BinaryOp::GREATER_THAN
                | BinaryOp::LESS_THAN
                | BinaryOp::GREATER_EQUAL
                | BinaryOp::LESS_EQUAL
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::LOGICAL_AND | BinaryOp::LOGICAL_OR)
    }
}

/// Unary operators. `ADDRESS_OF` is `@` (spec 3: "returns word regardless
/// of operand type").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum UnaryOp {
    NEGATE,
    BIT_NOT,
    NOT,
    ADDRESS_OF,
}

/// The operator carried by a compound assignment (`x += e`), or plain
/// assignment. `compound_binary_op` gives the binary op an `x op= e`
/// desugars to, per spec 4.6: "equivalent to typing x = x op e".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum CompoundOp {
    ASSIGN,
    ADD_ASSIGN,
    SUB_ASSIGN,
    MUL_ASSIGN,
    DIV_ASSIGN,
    MOD_ASSIGN,
    AND_ASSIGN,
    OR_ASSIGN,
    XOR_ASSIGN,
    SHL_ASSIGN,
    SHR_ASSIGN,
}

impl CompoundOp {
    pub fn compound_binary_op(&self) -> Option<BinaryOp> {
        Some(match self {
            CompoundOp::ASSIGN => return None,
            CompoundOp::ADD_ASSIGN => BinaryOp::ADD,
            CompoundOp::SUB_ASSIGN => BinaryOp::SUB,
            CompoundOp::MUL_ASSIGN => BinaryOp::MUL,
            CompoundOp::DIV_ASSIGN => BinaryOp::DIV,
            CompoundOp::MOD_ASSIGN => BinaryOp::MOD,
            CompoundOp::AND_ASSIGN => BinaryOp::BIT_AND,
            CompoundOp::OR_ASSIGN => BinaryOp::BIT_OR,
            CompoundOp::XOR_ASSIGN => BinaryOp::BIT_XOR,
            CompoundOp::SHL_ASSIGN => BinaryOp::SHL,
            CompoundOp::SHR_ASSIGN => BinaryOp::SHR,
        })
    }
}
