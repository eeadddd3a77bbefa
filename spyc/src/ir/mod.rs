//! Intermediate representation for SPython
//!
//! A module is an ordered list of functions; each function is an ordered
//! list of basic blocks. Every block holds straight-line instructions and,
//! once finished, exactly one terminator.

pub mod builder;
pub mod printer;

/// A compiled module
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Module name
    pub name: String,
    /// Functions in definition order
    pub functions: Vec<Function>,
}

/// A function definition
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Function name
    pub name: String,
    /// Parameters
    pub params: Vec<Parameter>,
    /// Return type
    pub return_type: Type,
    /// Basic blocks, entry first
    pub blocks: Vec<BasicBlock>,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub ty: Type,
}

/// Index of a block inside its function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

/// A basic block (straight-line code with no branches except at the end)
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    /// Block label, unique within the function
    pub label: String,
    /// Instructions in this block
    pub instructions: Vec<Instruction>,
    /// Block terminator; `None` while the block is still open
    pub terminator: Option<Terminator>,
}

/// A virtual register produced by exactly one instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Register {
    /// Function-local number
    pub id: usize,
    /// Type of the produced value
    pub ty: Type,
}

/// IR instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Two-operand arithmetic or bitwise operation
    Binary {
        dest: Register,
        op: BinOp,
        lhs: Value,
        rhs: Value,
    },
    /// Signed integer (or boolean) comparison producing `i1`
    ICmp {
        dest: Register,
        pred: IntPredicate,
        lhs: Value,
        rhs: Value,
    },
    /// Ordered floating point comparison producing `i1`
    FCmp {
        dest: Register,
        pred: FloatPredicate,
        lhs: Value,
        rhs: Value,
    },
    /// Floating point negation
    FNeg { dest: Register, operand: Value },
    /// Reserve a stack slot; `dest` has pointer type
    Alloca { dest: Register, ty: Type },
    /// Load from a stack slot
    Load { dest: Register, ptr: Value },
    /// Store to a stack slot
    Store { ptr: Value, value: Value },
    /// Direct function call
    Call {
        dest: Option<Register>,
        callee: String,
        return_type: Type,
        args: Vec<Value>,
    },
}

/// Block terminator (control flow)
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    /// Return from function
    Return(Option<Value>),
    /// Unconditional branch
    Branch(BlockId),
    /// Conditional branch on an `i1` value
    CondBranch {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    /// Unreachable code
    Unreachable,
}

impl Terminator {
    /// Blocks this terminator may transfer control to.
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Branch(target) => vec![*target],
            Terminator::CondBranch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Return(_) | Terminator::Unreachable => Vec::new(),
        }
    }
}

/// Binary operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    SRem,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
    And,
    Or,
    Xor,
}

/// Integer comparison predicate (signed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

/// Ordered float comparison predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatPredicate {
    Oeq,
    One,
    Olt,
    Ole,
    Ogt,
    Oge,
}

/// IR value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer constant
    Int(i64),
    /// Float constant
    Float(f64),
    /// Boolean constant
    Bool(bool),
    /// Result of an earlier instruction
    Register(Register),
    /// Incoming function argument
    Param { name: String, ty: Type },
}

impl Value {
    /// Type of this value
    pub fn ty(&self) -> Type {
        match self {
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Bool(_) => Type::Bool,
            Value::Register(reg) => reg.ty.clone(),
            Value::Param { ty, .. } => ty.clone(),
        }
    }
}

impl From<Register> for Value {
    fn from(reg: Register) -> Self {
        Value::Register(reg)
    }
}

/// IR type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Void (no value)
    Void,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// 1-bit boolean
    Bool,
    /// Pointer to a stack slot of the given type
    Ptr(Box<Type>),
}

impl Module {
    /// Create a new empty module
    pub fn new(name: String) -> Self {
        Self {
            name,
            functions: Vec::new(),
        }
    }

    /// Look up a function by name
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|func| func.name == name)
    }
}

impl Function {
    /// Create a new function
    pub fn new(name: String, params: Vec<Parameter>, return_type: Type) -> Self {
        Self {
            name,
            params,
            return_type,
            blocks: Vec::new(),
        }
    }

    /// Look up a block by label
    pub fn block(&self, label: &str) -> Option<&BasicBlock> {
        self.blocks.iter().find(|block| block.label == label)
    }

    /// Blocks with an edge into `target`
    pub fn predecessors(&self, target: BlockId) -> Vec<BlockId> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| {
                block
                    .terminator
                    .as_ref()
                    .is_some_and(|term| term.successors().contains(&target))
            })
            .map(|(index, _)| BlockId(index))
            .collect()
    }

    /// Whether control can reach `target` from the entry block
    pub fn is_reachable(&self, target: BlockId) -> bool {
        let mut visited = vec![false; self.blocks.len()];
        let mut pending = vec![target];
        while let Some(block) = pending.pop() {
            if block == BlockId(0) {
                return true;
            }
            match visited.get_mut(block.0) {
                Some(seen) if !*seen => *seen = true,
                _ => continue,
            }
            pending.extend(self.predecessors(block));
        }
        false
    }
}

impl BasicBlock {
    /// Create a new, open basic block
    pub fn new(label: String) -> Self {
        Self {
            label,
            instructions: Vec::new(),
            terminator: None,
        }
    }

    /// Whether the block already ends in a terminator
    pub fn is_terminated(&self) -> bool {
        self.terminator.is_some()
    }
}
