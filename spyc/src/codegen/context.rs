//! Lexical scopes for one function
//!
//! Scopes live in an arena and refer to their parent by index. Each scope
//! also remembers the block that code lowered in it is appended to.

use std::collections::HashMap;

use crate::ir::{BlockId, Register, Type, Value};

/// Handle to a scope inside a [`ScopeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// What a name refers to
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Stack slot holding a value of type `ty`
    Slot { ptr: Register, ty: Type },
    /// Value used as is, such as a parameter never assigned to
    Direct(Value),
}

#[derive(Debug)]
struct Scope {
    block: BlockId,
    parent: Option<ScopeId>,
    bindings: HashMap<String, Binding>,
}

/// All scopes of the function being lowered
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    /// Empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope without a parent
    pub fn root(&mut self, block: BlockId) -> ScopeId {
        self.push(block, None)
    }

    /// Create a scope nested in `parent`
    pub fn child(&mut self, parent: ScopeId, block: BlockId) -> ScopeId {
        self.push(block, Some(parent))
    }

    fn push(&mut self, block: BlockId, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope {
            block,
            parent,
            bindings: HashMap::new(),
        });
        ScopeId(self.scopes.len() - 1)
    }

    /// Insertion block of a scope
    pub fn block(&self, id: ScopeId) -> BlockId {
        self.scopes[id.0].block
    }

    /// Parent of a scope
    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scopes[id.0].parent
    }

    /// Bind `name` in `id`, shadowing any outer binding
    pub fn bind(&mut self, id: ScopeId, name: impl Into<String>, binding: Binding) {
        self.scopes[id.0].bindings.insert(name.into(), binding);
    }

    /// Resolve `name` starting at `id` and walking outwards
    pub fn lookup(&self, id: ScopeId, name: &str) -> Option<&Binding> {
        let mut current = Some(id);
        while let Some(scope_id) = current {
            let scope = &self.scopes[scope_id.0];
            if let Some(binding) = scope.bindings.get(name) {
                return Some(binding);
            }
            current = scope.parent;
        }
        None
    }
}
