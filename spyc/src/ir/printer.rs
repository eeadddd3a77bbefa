//! Textual IR in an LLVM-flavoured syntax

use super::*;
use std::fmt;

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Int => write!(f, "i64"),
            Type::Float => write!(f, "double"),
            Type::Bool => write!(f, "i1"),
            Type::Ptr(_) => write!(f, "ptr"),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%t{}", self.id)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            // exact bit pattern, as LLVM expects for doubles
            Value::Float(value) => write!(f, "0x{:016X}", value.to_bits()),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Register(reg) => write!(f, "{}", reg),
            Value::Param { name, .. } => write!(f, "%arg.{}", name),
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::SDiv => "sdiv",
            BinOp::SRem => "srem",
            BinOp::FAdd => "fadd",
            BinOp::FSub => "fsub",
            BinOp::FMul => "fmul",
            BinOp::FDiv => "fdiv",
            BinOp::FRem => "frem",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
        };
        f.write_str(name)
    }
}

impl fmt::Display for IntPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Slt => "slt",
            IntPredicate::Sle => "sle",
            IntPredicate::Sgt => "sgt",
            IntPredicate::Sge => "sge",
        };
        f.write_str(name)
    }
}

impl fmt::Display for FloatPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FloatPredicate::Oeq => "oeq",
            FloatPredicate::One => "one",
            FloatPredicate::Olt => "olt",
            FloatPredicate::Ole => "ole",
            FloatPredicate::Ogt => "ogt",
            FloatPredicate::Oge => "oge",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Binary { dest, op, lhs, rhs } => {
                write!(f, "{} = {} {} {}, {}", dest, op, lhs.ty(), lhs, rhs)
            }
            Instruction::ICmp {
                dest,
                pred,
                lhs,
                rhs,
            } => write!(f, "{} = icmp {} {} {}, {}", dest, pred, lhs.ty(), lhs, rhs),
            Instruction::FCmp {
                dest,
                pred,
                lhs,
                rhs,
            } => write!(f, "{} = fcmp {} {} {}, {}", dest, pred, lhs.ty(), lhs, rhs),
            Instruction::FNeg { dest, operand } => {
                write!(f, "{} = fneg {} {}", dest, operand.ty(), operand)
            }
            Instruction::Alloca { dest, ty } => write!(f, "{} = alloca {}", dest, ty),
            Instruction::Load { dest, ptr } => {
                write!(f, "{} = load {}, ptr {}", dest, dest.ty, ptr)
            }
            Instruction::Store { ptr, value } => {
                write!(f, "store {} {}, ptr {}", value.ty(), value, ptr)
            }
            Instruction::Call {
                dest,
                callee,
                return_type,
                args,
            } => {
                if let Some(dest) = dest {
                    write!(f, "{} = ", dest)?;
                }
                write!(f, "call {} @{}(", return_type, callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", arg.ty(), arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

struct TerminatorDisplay<'a> {
    term: &'a Terminator,
    function: &'a Function,
}

impl fmt::Display for TerminatorDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = |id: &BlockId| {
            self.function
                .blocks
                .get(id.0)
                .map(|block| block.label.as_str())
                .unwrap_or("?")
        };
        match self.term {
            Terminator::Return(None) => write!(f, "ret void"),
            Terminator::Return(Some(value)) => write!(f, "ret {} {}", value.ty(), value),
            Terminator::Branch(target) => write!(f, "br label %{}", label(target)),
            Terminator::CondBranch {
                cond,
                then_block,
                else_block,
            } => write!(
                f,
                "br i1 {}, label %{}, label %{}",
                cond,
                label(then_block),
                label(else_block)
            ),
            Terminator::Unreachable => write!(f, "unreachable"),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        for func in &self.functions {
            writeln!(f)?;
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "define {} @{}(", self.return_type, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} %arg.{}", param.ty, param.name)?;
        }
        writeln!(f, ") {{")?;

        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", block.label)?;
            for inst in &block.instructions {
                writeln!(f, "  {}", inst)?;
            }
            if let Some(term) = &block.terminator {
                writeln!(
                    f,
                    "  {}",
                    TerminatorDisplay {
                        term,
                        function: self,
                    }
                )?;
            }
        }

        writeln!(f, "}}")
    }
}

/// Render a module as text
pub fn render(module: &Module) -> String {
    module.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_constants_print_as_hex_bits() {
        assert_eq!(Value::Float(1.0).to_string(), "0x3FF0000000000000");
    }

    #[test]
    fn call_lists_typed_arguments() {
        let inst = Instruction::Call {
            dest: Some(Register {
                id: 3,
                ty: Type::Int,
            }),
            callee: "fib".to_string(),
            return_type: Type::Int,
            args: vec![Value::Int(10)],
        };
        assert_eq!(inst.to_string(), "%t3 = call i64 @fib(i64 10)");
    }
}
