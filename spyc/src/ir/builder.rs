//! IR builder utilities
//!
//! Helpers for constructing IR programmatically. The function builder owns
//! register numbering and refuses to extend a block past its terminator.

use thiserror::Error;

use super::*;

/// Misuse of the builder API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Attempted to append to a block that already has a terminator
    #[error("block '{0}' is already terminated")]
    Terminated(String),
    /// No block has been selected for insertion
    #[error("no insertion block selected")]
    NoInsertionBlock,
    /// The block id does not belong to this function
    #[error("unknown block id {0}")]
    UnknownBlock(usize),
}

/// IR builder for constructing modules
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    /// Create a new module builder
    pub fn new(name: String) -> Self {
        Self {
            module: Module::new(name),
        }
    }

    /// Add a function to the module
    pub fn add_function(&mut self, func: Function) {
        self.module.functions.push(func);
    }

    /// Whether a function with this name was already added
    pub fn has_function(&self, name: &str) -> bool {
        self.module.function(name).is_some()
    }

    /// Finish building and return the module
    pub fn build(self) -> Module {
        self.module
    }
}

/// IR builder for constructing functions
pub struct FunctionBuilder {
    function: Function,
    current_block: Option<BlockId>,
    next_register: usize,
    next_label: usize,
    entry_allocas: usize,
}

impl FunctionBuilder {
    /// Create a new function builder
    pub fn new(name: String, params: Vec<Parameter>, return_type: Type) -> Self {
        Self {
            function: Function::new(name, params, return_type),
            current_block: None,
            next_register: 0,
            next_label: 0,
            entry_allocas: 0,
        }
    }

    /// Name of the function under construction
    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Declared return type
    pub fn return_type(&self) -> &Type {
        &self.function.return_type
    }

    /// Create a new basic block
    pub fn create_block(&mut self, label: String) -> BlockId {
        self.function.blocks.push(BasicBlock::new(label));
        BlockId(self.function.blocks.len() - 1)
    }

    /// Suffix shared by the labels of one control-flow construct
    pub fn next_label_suffix(&mut self) -> usize {
        let suffix = self.next_label;
        self.next_label += 1;
        suffix
    }

    /// Switch to a block
    pub fn switch_to_block(&mut self, block_id: BlockId) {
        self.current_block = Some(block_id);
    }

    /// Allocate a fresh register of the given type
    pub fn fresh_register(&mut self, ty: Type) -> Register {
        let reg = Register {
            id: self.next_register,
            ty,
        };
        self.next_register += 1;
        reg
    }

    /// Add an instruction to the current block
    pub fn add_instruction(&mut self, inst: Instruction) -> Result<(), BuildError> {
        let block = self.open_block()?;
        block.instructions.push(inst);
        Ok(())
    }

    /// Reserve a stack slot at the top of the entry block.
    ///
    /// Slots are grouped ahead of every other entry instruction, so this
    /// works even after the entry block has been terminated.
    pub fn entry_alloca(&mut self, ty: Type) -> Result<Register, BuildError> {
        let dest = self.fresh_register(Type::Ptr(Box::new(ty.clone())));
        let entry = self
            .function
            .blocks
            .first_mut()
            .ok_or(BuildError::UnknownBlock(0))?;
        entry.instructions.insert(
            self.entry_allocas,
            Instruction::Alloca {
                dest: dest.clone(),
                ty,
            },
        );
        self.entry_allocas += 1;
        Ok(dest)
    }

    /// Set the terminator for the current block
    pub fn set_terminator(&mut self, term: Terminator) -> Result<(), BuildError> {
        let block = self.open_block()?;
        block.terminator = Some(term);
        Ok(())
    }

    /// Whether `block_id` already ends in a terminator
    pub fn is_terminated(&self, block_id: BlockId) -> bool {
        self.function
            .blocks
            .get(block_id.0)
            .is_some_and(BasicBlock::is_terminated)
    }

    /// Whether `block_id` can be reached from the entry block so far
    pub fn is_reachable(&self, block_id: BlockId) -> bool {
        self.function.is_reachable(block_id)
    }

    /// Finish building and return the function
    pub fn build(self) -> Function {
        self.function
    }

    fn open_block(&mut self) -> Result<&mut BasicBlock, BuildError> {
        let block_id = self.current_block.ok_or(BuildError::NoInsertionBlock)?;
        let block = self
            .function
            .blocks
            .get_mut(block_id.0)
            .ok_or(BuildError::UnknownBlock(block_id.0))?;
        if block.is_terminated() {
            return Err(BuildError::Terminated(block.label.clone()));
        }
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_instruction_after_terminator() {
        let mut builder = FunctionBuilder::new("f".to_string(), vec![], Type::Void);
        let entry = builder.create_block("entry".to_string());
        builder.switch_to_block(entry);
        builder
            .set_terminator(Terminator::Return(None))
            .expect("first terminator should be accepted");

        let dest = builder.fresh_register(Type::Ptr(Box::new(Type::Int)));
        let err = builder
            .add_instruction(Instruction::Alloca { dest, ty: Type::Int })
            .expect_err("append after terminator should fail");
        assert_eq!(err, BuildError::Terminated("entry".to_string()));
    }

    #[test]
    fn entry_allocas_stay_ahead_of_other_instructions() {
        let mut builder = FunctionBuilder::new("f".to_string(), vec![], Type::Void);
        let entry = builder.create_block("entry".to_string());
        builder.switch_to_block(entry);
        let first = builder.entry_alloca(Type::Int).expect("alloca");
        builder
            .add_instruction(Instruction::Store {
                ptr: Value::Register(first),
                value: Value::Int(1),
            })
            .expect("store");
        builder.entry_alloca(Type::Float).expect("alloca");

        let function = builder.build();
        let kinds = function.blocks[0]
            .instructions
            .iter()
            .map(|inst| matches!(inst, Instruction::Alloca { .. }))
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec![true, true, false]);
    }

    #[test]
    fn tracks_reachability_through_terminators() {
        let mut builder = FunctionBuilder::new("f".to_string(), vec![], Type::Void);
        let entry = builder.create_block("entry".to_string());
        let exit = builder.create_block("exit".to_string());
        let orphan = builder.create_block("orphan".to_string());
        let after = builder.create_block("after".to_string());
        builder.switch_to_block(entry);
        builder
            .set_terminator(Terminator::Branch(exit))
            .expect("branch should be accepted");
        builder.switch_to_block(orphan);
        builder
            .set_terminator(Terminator::Branch(after))
            .expect("branch should be accepted");

        assert!(builder.is_reachable(entry));
        assert!(builder.is_reachable(exit));
        assert!(!builder.is_reachable(orphan));
        assert!(!builder.is_reachable(after));
    }
}
