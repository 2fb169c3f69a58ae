use std::fmt;

/// A stable, arena-style id for a lexical scope (spec 9: "store nodes in
/// an arena keyed by stable integer ids ... never embed references that
/// outlive the arena"). Scope 0 is always the module/root scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub fn root() -> Self {
        ScopeId(0)
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}
