//! Source-level type names and the IR types they denote

use crate::ir::Type;

/// Closed table of type names usable in annotations.
///
/// The first name registered for an IR type is its canonical name, used
/// when a type is reported back to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCatalog {
    entries: Vec<(String, Type)>,
}

impl TypeCatalog {
    /// Catalog with `int`, `float`, `bool` and `none`
    pub fn new() -> Self {
        Self {
            entries: vec![
                ("int".to_string(), Type::Int),
                ("float".to_string(), Type::Float),
                ("bool".to_string(), Type::Bool),
                ("none".to_string(), Type::Void),
            ],
        }
    }

    /// Register an extra name for an existing IR type
    pub fn with_alias(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.register(name, ty);
        self
    }

    /// Register (or rebind) a type name
    pub fn register(&mut self, name: impl Into<String>, ty: Type) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = ty,
            None => self.entries.push((name, ty)),
        }
    }

    /// IR type for a source type name
    pub fn resolve(&self, name: &str) -> Option<&Type> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, ty)| ty)
    }

    /// Canonical source name of an IR type
    pub fn name_of(&self, ty: &Type) -> String {
        self.entries
            .iter()
            .find(|(_, existing)| existing == ty)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| ty.to_string())
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_but_keep_canonical_name() {
        let catalog = TypeCatalog::new().with_alias("i64", Type::Int);
        assert_eq!(catalog.resolve("i64"), Some(&Type::Int));
        assert_eq!(catalog.name_of(&Type::Int), "int");
        assert_eq!(catalog.name_of(&Type::Void), "none");
        assert!(catalog.resolve("str").is_none());
    }
}
