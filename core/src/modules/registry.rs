//! Module registry (spec 4.9: "map module-name -> program").

use indexmap::IndexMap;

use crate::ast::Program;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateModule {
    pub name: String,
}

/// Keeps programs in registration order, so `all()` - and therefore
/// everything downstream that iterates it - stays deterministic (spec 5).
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    programs: IndexMap<String, Program>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, program: Program) -> Result<(), DuplicateModule> {
        let name = name.into();
        if self.programs.contains_key(&name) {
            return Err(DuplicateModule { name });
        }
        self.programs.insert(name, program);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Program> {
        self.programs.get(name)
    }

    pub fn all(&self) -> impl Iterator<Item = (&String, &Program)> {
        self.programs.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
