//! Per-symbol analysis metadata (spec 9, "Metadata on AST nodes"): a typed
//! side table keyed by an enum of metadata kinds, so the hardware-analysis
//! passes can stay independent of each other and of the core passes that
//! populate the symbol table.

use std::fmt;

/// 6502 accumulator/index registers a variable can prefer to live in
/// (spec 4.11, "Register preference").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    A,
    X,
    Y,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Register::A => 'A',
            Register::X => 'X',
            Register::Y => 'Y',
        };
        write!(f, "{}", c)
    }
}

/// A register preference plus the rule that produced it (spec 4.11: "Each
/// preference carries a human-readable rationale string.").
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterPreference {
    pub register: Option<Register>,
    pub rationale: String,
}

/// Classification of how a variable is accessed across its lifetime
/// (spec 4.11, "Access-pattern classification").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPattern {
    Single,
    Sequential,
    Strided,
    Random,
    HotPath,
}

/// The analysis results that can be attached to a symbol. One enum
/// variant per metadata kind keeps the side table's key space closed and
/// self-describing.
#[derive(Debug, Clone, PartialEq)]
pub enum Metadata {
    ZeroPagePriority(u8),
    AccessPattern(AccessPattern),
    ArithmeticIntensity(f32),
    RegisterPreference(RegisterPreference),
    LoopInductionStride(i64),
}

impl Metadata {
    fn discriminant(&self) -> u8 {
        match self {
            Metadata::ZeroPagePriority(_) => 0,
            Metadata::AccessPattern(_) => 1,
            Metadata::ArithmeticIntensity(_) => 2,
            Metadata::RegisterPreference(_) => 3,
            Metadata::LoopInductionStride(_) => 4,
        }
    }
}

/// Per-symbol metadata store. Small (at most a handful of entries per
/// symbol), so a flat `Vec` with linear lookup outperforms a `HashMap`
/// and keeps insertion order for iteration/debugging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataMap(Vec<Metadata>);

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, value: Metadata) {
        let discr = value.discriminant();
        if let Some(slot) = self.0.iter_mut().find(|m| m.discriminant() == discr) {
            *slot = value;
        } else {
            self.0.push(value);
        }
    }

    pub fn zero_page_priority(&self) -> Option<u8> {
        self.0.iter().find_map(|m| match m {
            Metadata::ZeroPagePriority(p) => Some(*p),
            _ => None,
        })
    }

    pub fn access_pattern(&self) -> Option<AccessPattern> {
        self.0.iter().find_map(|m| match m {
            Metadata::AccessPattern(p) => Some(*p),
            _ => None,
        })
    }

    pub fn arithmetic_intensity(&self) -> Option<f32> {
        self.0.iter().find_map(|m| match m {
            Metadata::ArithmeticIntensity(i) => Some(*i),
            _ => None,
        })
    }

    pub fn register_preference(&self) -> Option<&RegisterPreference> {
        self.0.iter().find_map(|m| match m {
            Metadata::RegisterPreference(r) => Some(r),
            _ => None,
        })
    }

    pub fn loop_induction_stride(&self) -> Option<i64> {
        self.0.iter().find_map(|m| match m {
            Metadata::LoopInductionStride(s) => Some(*s),
            _ => None,
        })
    }
}
