//! The call graph (spec 4.7): built incrementally during type checking, by
//! function name.

use std::collections::{BTreeSet, HashMap, HashSet};

/// Placeholder callee name used when a call targets an unresolved
/// function, so unresolved calls never introduce spurious edges between
/// real functions (spec 4.7).
pub const UNRESOLVED_CALLEE: &str = "<unresolved>";

#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    edges: HashMap<String, BTreeSet<String>>,
    callers: HashMap<String, BTreeSet<String>>,
    all_callers: BTreeSet<String>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_call(&mut self, caller: &str, callee: &str) {
        self.all_callers.insert(caller.to_string());
        self.edges.entry(caller.to_string()).or_default().insert(callee.to_string());
        if callee != UNRESOLVED_CALLEE {
            self.callers.entry(callee.to_string()).or_default().insert(caller.to_string());
        }
    }

    pub fn callees(&self, name: &str) -> BTreeSet<String> {
        self.edges.get(name).cloned().unwrap_or_default()
    }

    pub fn callers(&self, name: &str) -> BTreeSet<String> {
        self.callers.get(name).cloned().unwrap_or_default()
    }

    /// Functions with zero callees, among every function known to have
    /// made at least one call expression's worth of caller bookkeeping
    /// (i.e. every function whose body was type-checked).
    pub fn leaves(&self) -> BTreeSet<String> {
        self.all_callers
            .iter()
            .filter(|name| self.edges.get(*name).map(|s| s.is_empty()).unwrap_or(true))
            .cloned()
            .collect()
    }

    pub fn reachable_from(&self, name: &str) -> BTreeSet<String> {
        let mut seen = HashSet::new();
        let mut stack = vec![name.to_string()];
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            for callee in self.callees(&current) {
                if !seen.contains(&callee) {
                    stack.push(callee);
                }
            }
        }
        seen.remove(name);
        seen.into_iter().collect()
    }
}
