//! Label table built in pass 1 and read-only during pass 2.

use std::collections::HashMap;

use super::LineError;

#[derive(Debug, Default)]
pub struct SymbolTable {
    labels: HashMap<String, u32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a label at an absolute byte address. Redefinition is an
    /// error.
    pub fn insert(&mut self, name: &str, address: u32) -> Result<(), LineError> {
        if self.labels.contains_key(name) {
            return Err(LineError::DuplicateLabel(name.to_string()));
        }
        self.labels.insert(name.to_string(), address);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<u32, LineError> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| LineError::UndefinedLabel(name.to_string()))
    }
}
