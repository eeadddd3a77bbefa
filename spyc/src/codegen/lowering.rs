//! AST to IR lowering
//!
//! Every lowering step takes the scope it runs in and hands back the scope
//! that following code continues in, together with the value it produced.
//! Control flow moves the continuation into the join block of an `if` or
//! the exit block of a `while`.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use spython::parser::ast::{
    Block, Expr, ExprKind, FunctionLiteral, InfixOp, PrefixOp, Program, Span, Stmt, StmtKind,
};

use super::context::{Binding, ScopeArena, ScopeId};
use super::types::TypeCatalog;
use super::{CodegenError, CodegenOptions};
use crate::ir::builder::{FunctionBuilder, ModuleBuilder};
use crate::ir::*;

/// Outcome of lowering one node.
#[derive(Debug, Clone)]
pub struct Lowered {
    /// Produced value; `None` for statements and `none`-typed calls
    pub value: Option<Value>,
    /// Scope subsequent code is lowered in
    pub scope: ScopeId,
}

impl Lowered {
    fn value(value: Value, scope: ScopeId) -> Self {
        Self {
            value: Some(value),
            scope,
        }
    }

    fn empty(scope: ScopeId) -> Self {
        Self { value: None, scope }
    }
}

#[derive(Debug)]
struct Signature {
    params: Vec<Parameter>,
    defaults: Vec<Option<Expr>>,
    return_type: Type,
    /// Where the `def` that declared it sits
    span: Span,
}

/// Builder and scopes of the function currently being lowered.
struct FunctionState {
    builder: FunctionBuilder,
    scopes: ScopeArena,
}

impl FunctionState {
    fn new(name: String, params: Vec<Parameter>, return_type: Type) -> (Self, ScopeId) {
        let mut builder = FunctionBuilder::new(name, params, return_type);
        let entry = builder.create_block("entry".to_string());
        builder.switch_to_block(entry);
        let mut scopes = ScopeArena::new();
        let root = scopes.root(entry);
        (Self { builder, scopes }, root)
    }

    fn emit(&mut self, scope: ScopeId, inst: Instruction) -> Result<(), CodegenError> {
        self.builder.switch_to_block(self.scopes.block(scope));
        self.builder.add_instruction(inst)?;
        Ok(())
    }

    fn terminate(&mut self, scope: ScopeId, term: Terminator) -> Result<(), CodegenError> {
        self.builder.switch_to_block(self.scopes.block(scope));
        self.builder.set_terminator(term)?;
        Ok(())
    }

    /// Close an open block with a jump to `target`.
    ///
    /// A block control never reaches ends in `unreachable` instead, so it
    /// does not count as a way into `target`.
    fn branch_if_open(&mut self, scope: ScopeId, target: BlockId) -> Result<(), CodegenError> {
        if self.is_terminated(scope) {
            return Ok(());
        }
        let term = if self.is_reachable(scope) {
            Terminator::Branch(target)
        } else {
            Terminator::Unreachable
        };
        self.terminate(scope, term)
    }

    /// Fresh block for statements that follow a terminator.
    fn dead_scope(&mut self, scope: ScopeId) -> ScopeId {
        let suffix = self.builder.next_label_suffix();
        let block = self.builder.create_block(format!("dead{}", suffix));
        self.scopes.child(scope, block)
    }

    fn is_terminated(&self, scope: ScopeId) -> bool {
        self.builder.is_terminated(self.scopes.block(scope))
    }

    fn is_reachable(&self, scope: ScopeId) -> bool {
        self.builder.is_reachable(self.scopes.block(scope))
    }
}

enum Selected {
    Binary(BinOp),
    ICmp(IntPredicate),
    FCmp(FloatPredicate),
}

/// Lower a parsed program into one module.
pub struct Lowering<'a> {
    options: &'a CodegenOptions,
    catalog: &'a TypeCatalog,
    module: ModuleBuilder,
    signatures: HashMap<String, Rc<Signature>>,
    defined: HashSet<String>,
}

impl<'a> Lowering<'a> {
    /// Create a new lowering context.
    pub fn new(options: &'a CodegenOptions, catalog: &'a TypeCatalog, module_name: &str) -> Self {
        Self {
            options,
            catalog,
            module: ModuleBuilder::new(module_name.to_string()),
            signatures: HashMap::new(),
            defined: HashSet::new(),
        }
    }

    /// Lower a parsed program.
    pub fn lower_program(mut self, program: &Program) -> Result<Module, CodegenError> {
        self.defined.insert(self.options.entry_name.clone());
        if self.options.predeclare_functions {
            self.predeclare(program)?;
        }

        let (mut main, root) =
            FunctionState::new(self.options.entry_name.clone(), Vec::new(), Type::Int);
        let mut scope = root;
        let mut exit_value = None;

        for stmt in &program.statements {
            if main.is_terminated(scope) {
                scope = main.dead_scope(scope);
            }
            let lowered = self.lower_stmt(&mut main, stmt, scope)?;
            scope = lowered.scope;
            if let (StmtKind::Expr(_), Some(value)) = (&stmt.kind, lowered.value) {
                if value.ty() == Type::Int {
                    exit_value = Some(value);
                }
            }
        }

        if !main.is_terminated(scope) {
            let term = if main.is_reachable(scope) {
                Terminator::Return(Some(exit_value.unwrap_or(Value::Int(0))))
            } else {
                Terminator::Unreachable
            };
            main.terminate(scope, term)?;
        }

        self.module.add_function(main.builder.build());
        Ok(self.module.build())
    }

    fn predeclare(&mut self, program: &Program) -> Result<(), CodegenError> {
        for stmt in &program.statements {
            let StmtKind::Expr(Expr {
                kind: ExprKind::Function(function),
                span,
            }) = &stmt.kind
            else {
                continue;
            };

            if self.signatures.contains_key(&function.name)
                || function.name == self.options.entry_name
            {
                return Err(already_defined(&function.name, *span));
            }
            let signature = self.declare(function, *span)?;
            self.signatures
                .insert(function.name.clone(), Rc::new(signature));
        }
        Ok(())
    }

    fn declare(&self, function: &FunctionLiteral, span: Span) -> Result<Signature, CodegenError> {
        let mut params = Vec::with_capacity(function.params.len());
        let mut seen = HashSet::new();
        let mut saw_default = false;

        for param in &function.params {
            if !seen.insert(param.name.as_str()) {
                return Err(CodegenError::name(
                    format!(
                        "duplicate parameter '{}' in function '{}'",
                        param.name, function.name
                    ),
                    param.span,
                ));
            }

            let ty = self.catalog.resolve(&param.type_name).cloned().ok_or_else(|| {
                CodegenError::name(
                    format!(
                        "type '{}' of parameter '{}' in function '{}' is not defined",
                        param.type_name, param.name, function.name
                    ),
                    param.span,
                )
            })?;
            if ty == Type::Void {
                return Err(CodegenError::type_error(
                    format!(
                        "parameter '{}' of function '{}' cannot have type {}",
                        param.name, function.name, param.type_name
                    ),
                    param.span,
                ));
            }

            if param.default.is_some() {
                saw_default = true;
            } else if saw_default {
                return Err(CodegenError::type_error(
                    format!(
                        "parameter '{}' of function '{}' needs a default value",
                        param.name, function.name
                    ),
                    param.span,
                ));
            }

            params.push(Parameter {
                name: param.name.clone(),
                ty,
            });
        }

        let return_type = self
            .catalog
            .resolve(function.return_type_name())
            .cloned()
            .ok_or_else(|| {
                CodegenError::name(
                    format!(
                        "return type for function '{}' is not a valid type",
                        function.name
                    ),
                    span,
                )
            })?;

        Ok(Signature {
            params,
            defaults: function.params.iter().map(|p| p.default.clone()).collect(),
            return_type,
            span,
        })
    }

    fn lower_function(
        &mut self,
        function: &FunctionLiteral,
        span: Span,
    ) -> Result<(), CodegenError> {
        if !self.defined.insert(function.name.clone()) {
            return Err(already_defined(&function.name, span));
        }

        // declared before the body so the function can call itself
        let signature = match self.signatures.get(&function.name) {
            Some(signature) if signature.span == span => Rc::clone(signature),
            Some(_) => return Err(already_defined(&function.name, span)),
            None => {
                let signature = Rc::new(self.declare(function, span)?);
                self.signatures
                    .insert(function.name.clone(), Rc::clone(&signature));
                signature
            }
        };

        let (mut state, root) = FunctionState::new(
            function.name.clone(),
            signature.params.clone(),
            signature.return_type.clone(),
        );

        let assigned = assigned_names(&function.body);
        for param in &signature.params {
            let value = Value::Param {
                name: param.name.clone(),
                ty: param.ty.clone(),
            };
            if assigned.contains(&param.name) {
                let ptr = state.builder.entry_alloca(param.ty.clone())?;
                state.emit(
                    root,
                    Instruction::Store {
                        ptr: Value::Register(ptr.clone()),
                        value,
                    },
                )?;
                state.scopes.bind(
                    root,
                    param.name.clone(),
                    Binding::Slot {
                        ptr,
                        ty: param.ty.clone(),
                    },
                );
            } else {
                state
                    .scopes
                    .bind(root, param.name.clone(), Binding::Direct(value));
            }
        }

        let exit = self.lower_block(&mut state, &function.body, root)?;
        if !state.is_terminated(exit) {
            if !state.is_reachable(exit) {
                state.terminate(exit, Terminator::Unreachable)?;
            } else if signature.return_type == Type::Void {
                state.terminate(exit, Terminator::Return(None))?;
            } else {
                return Err(CodegenError::type_error(
                    format!(
                        "function '{}' must return a value of type {}",
                        function.name,
                        self.catalog.name_of(&signature.return_type)
                    ),
                    span,
                ));
            }
        }

        self.module.add_function(state.builder.build());
        Ok(())
    }

    fn lower_block(
        &mut self,
        state: &mut FunctionState,
        block: &Block,
        scope: ScopeId,
    ) -> Result<ScopeId, CodegenError> {
        let mut scope = scope;
        for stmt in &block.statements {
            // still checked after a return, but never executed
            if state.is_terminated(scope) {
                scope = state.dead_scope(scope);
            }
            scope = self.lower_stmt(state, stmt, scope)?.scope;
        }
        Ok(scope)
    }

    fn lower_stmt(
        &mut self,
        state: &mut FunctionState,
        stmt: &Stmt,
        scope: ScopeId,
    ) -> Result<Lowered, CodegenError> {
        match &stmt.kind {
            StmtKind::Expr(expr) => self.lower_expr(state, expr, scope),
            StmtKind::Return(value) => self.lower_return(state, value.as_ref(), scope, stmt.span),
        }
    }

    fn lower_return(
        &mut self,
        state: &mut FunctionState,
        value: Option<&Expr>,
        scope: ScopeId,
        span: Span,
    ) -> Result<Lowered, CodegenError> {
        let (value, scope) = match value {
            Some(expr) => {
                let lowered = self.lower_expr(state, expr, scope)?;
                (lowered.value, lowered.scope)
            }
            None => (None, scope),
        };

        let expected = state.builder.return_type().clone();
        let actual = value.as_ref().map(Value::ty).unwrap_or(Type::Void);
        if actual != expected {
            return Err(CodegenError::type_error(
                format!(
                    "function '{}' declared return type '{}' does not match actual return type '{}'",
                    state.builder.name(),
                    self.catalog.name_of(&expected),
                    self.catalog.name_of(&actual)
                ),
                span,
            ));
        }

        if !state.is_terminated(scope) {
            state.terminate(scope, Terminator::Return(value))?;
        }
        Ok(Lowered::empty(scope))
    }

    fn lower_expr(
        &mut self,
        state: &mut FunctionState,
        expr: &Expr,
        scope: ScopeId,
    ) -> Result<Lowered, CodegenError> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Int(value) => Ok(Lowered::value(Value::Int(*value), scope)),
            ExprKind::Float(value) => Ok(Lowered::value(Value::Float(*value), scope)),
            ExprKind::Bool(value) => Ok(Lowered::value(Value::Bool(*value), scope)),
            ExprKind::String(_) => Err(no_lowering("string values", span)),
            ExprKind::Array(_) => Err(no_lowering("array values", span)),
            ExprKind::Hash(_) => Err(no_lowering("hash values", span)),
            ExprKind::Index { .. } => Err(no_lowering("index expressions", span)),
            ExprKind::Identifier(name) => self.lower_identifier(state, name, scope, span),
            ExprKind::Prefix { op, rhs } => self.lower_prefix(state, *op, rhs, scope, span),
            ExprKind::Infix {
                lhs,
                op: InfixOp::Assign,
                rhs,
            } => self.lower_assign(state, lhs, rhs, scope, span),
            ExprKind::Infix { lhs, op, rhs } => self.lower_infix(state, lhs, *op, rhs, scope, span),
            ExprKind::If {
                condition,
                consequence,
                alternative,
            } => self.lower_if(state, condition, consequence, alternative.as_ref(), scope),
            ExprKind::While { condition, body } => self.lower_while(state, condition, body, scope),
            ExprKind::Function(function) => {
                self.lower_function(function, span)?;
                Ok(Lowered::empty(scope))
            }
            ExprKind::Call { callee, args } => self.lower_call(state, callee, args, scope, span),
        }
    }

    fn lower_identifier(
        &mut self,
        state: &mut FunctionState,
        name: &str,
        scope: ScopeId,
        span: Span,
    ) -> Result<Lowered, CodegenError> {
        match state.scopes.lookup(scope, name).cloned() {
            Some(Binding::Slot { ptr, ty }) => {
                let dest = state.builder.fresh_register(ty);
                state.emit(
                    scope,
                    Instruction::Load {
                        dest: dest.clone(),
                        ptr: Value::Register(ptr),
                    },
                )?;
                Ok(Lowered::value(Value::Register(dest), scope))
            }
            Some(Binding::Direct(value)) => Ok(Lowered::value(value, scope)),
            None => Err(CodegenError::name(
                format!("variable {} is not defined", name),
                span,
            )),
        }
    }

    fn lower_prefix(
        &mut self,
        state: &mut FunctionState,
        op: PrefixOp,
        rhs: &Expr,
        scope: ScopeId,
        span: Span,
    ) -> Result<Lowered, CodegenError> {
        let lowered = self.lower_expr(state, rhs, scope)?;
        let (operand, scope) = expect_value(lowered, rhs.span, &format!("operand of '{}'", op))?;
        let ty = operand.ty();

        let inst = match (op, &ty) {
            (PrefixOp::Negate, Type::Int) => Instruction::Binary {
                dest: state.builder.fresh_register(Type::Int),
                op: BinOp::Sub,
                lhs: Value::Int(0),
                rhs: operand,
            },
            (PrefixOp::Negate, Type::Float) => Instruction::FNeg {
                dest: state.builder.fresh_register(Type::Float),
                operand,
            },
            (PrefixOp::Not, Type::Bool) => Instruction::Binary {
                dest: state.builder.fresh_register(Type::Bool),
                op: BinOp::Xor,
                lhs: operand,
                rhs: Value::Bool(true),
            },
            _ => {
                return Err(CodegenError::unsupported(
                    format!(
                        "operator '{}' is not supported for type {}",
                        op,
                        self.catalog.name_of(&ty)
                    ),
                    span,
                ))
            }
        };

        let dest = result_register(&inst);
        state.emit(scope, inst)?;
        Ok(Lowered {
            value: dest.map(Value::Register),
            scope,
        })
    }

    fn lower_infix(
        &mut self,
        state: &mut FunctionState,
        lhs: &Expr,
        op: InfixOp,
        rhs: &Expr,
        scope: ScopeId,
        span: Span,
    ) -> Result<Lowered, CodegenError> {
        let what = format!("operand of '{}'", op);
        let lowered = self.lower_expr(state, lhs, scope)?;
        let (left, scope) = expect_value(lowered, lhs.span, &what)?;
        let lowered = self.lower_expr(state, rhs, scope)?;
        let (right, scope) = expect_value(lowered, rhs.span, &what)?;

        let ty = left.ty();
        if ty != right.ty() {
            return Err(CodegenError::type_error(
                format!(
                    "mismatched types {} and {} for operator '{}'",
                    self.catalog.name_of(&ty),
                    self.catalog.name_of(&right.ty()),
                    op
                ),
                span,
            ));
        }

        let inst = match select(op, &ty) {
            Some(Selected::Binary(bin_op)) => Instruction::Binary {
                dest: state.builder.fresh_register(ty.clone()),
                op: bin_op,
                lhs: left,
                rhs: right,
            },
            Some(Selected::ICmp(pred)) => Instruction::ICmp {
                dest: state.builder.fresh_register(Type::Bool),
                pred,
                lhs: left,
                rhs: right,
            },
            Some(Selected::FCmp(pred)) => Instruction::FCmp {
                dest: state.builder.fresh_register(Type::Bool),
                pred,
                lhs: left,
                rhs: right,
            },
            None => {
                return Err(CodegenError::unsupported(
                    format!(
                        "operator '{}' is not supported for type {}",
                        op,
                        self.catalog.name_of(&ty)
                    ),
                    span,
                ))
            }
        };

        let dest = result_register(&inst);
        state.emit(scope, inst)?;
        Ok(Lowered {
            value: dest.map(Value::Register),
            scope,
        })
    }

    fn lower_assign(
        &mut self,
        state: &mut FunctionState,
        target: &Expr,
        value: &Expr,
        scope: ScopeId,
        span: Span,
    ) -> Result<Lowered, CodegenError> {
        let lowered = self.lower_expr(state, value, scope)?;
        let ExprKind::Identifier(name) = &target.kind else {
            return Err(CodegenError::type_error(
                "can assign only into identifier",
                target.span,
            ));
        };
        let scope = lowered.scope;
        let Some(value) = lowered.value else {
            return Err(CodegenError::type_error(
                format!("can not assign a value of type none into {}", name),
                span,
            ));
        };
        let value_ty = value.ty();

        let ptr = match state.scopes.lookup(scope, name).cloned() {
            None => {
                let ptr = state.builder.entry_alloca(value_ty.clone())?;
                state.scopes.bind(
                    scope,
                    name.clone(),
                    Binding::Slot {
                        ptr: ptr.clone(),
                        ty: value_ty,
                    },
                );
                ptr
            }
            Some(Binding::Slot { ptr, ty }) => {
                if ty != value_ty {
                    return Err(CodegenError::type_error(
                        format!(
                            "can not assign type {} into {}",
                            self.catalog.name_of(&value_ty),
                            name
                        ),
                        span,
                    ));
                }
                ptr
            }
            Some(Binding::Direct(_)) => {
                return Err(CodegenError::type_error(
                    format!("can not assign into {}", name),
                    span,
                ))
            }
        };

        state.emit(
            scope,
            Instruction::Store {
                ptr: Value::Register(ptr),
                value,
            },
        )?;
        Ok(Lowered::empty(scope))
    }

    fn lower_if(
        &mut self,
        state: &mut FunctionState,
        condition: &Expr,
        consequence: &Block,
        alternative: Option<&Block>,
        scope: ScopeId,
    ) -> Result<Lowered, CodegenError> {
        let lowered = self.lower_expr(state, condition, scope)?;
        let (cond, scope) = self.expect_bool(lowered, condition.span, "if")?;

        let suffix = state.builder.next_label_suffix();
        let then_block = state.builder.create_block(format!("then{}", suffix));
        let then_scope = state.scopes.child(scope, then_block);
        let else_part = alternative.map(|block| {
            let else_block = state.builder.create_block(format!("else{}", suffix));
            (block, else_block, state.scopes.child(scope, else_block))
        });
        let end_block = state.builder.create_block(format!("end{}", suffix));
        let end_scope = state.scopes.child(scope, end_block);

        state.terminate(
            scope,
            Terminator::CondBranch {
                cond,
                then_block,
                else_block: else_part.map(|(_, block, _)| block).unwrap_or(end_block),
            },
        )?;

        let then_exit = self.lower_block(state, consequence, then_scope)?;
        state.branch_if_open(then_exit, end_block)?;

        if let Some((block, _, else_scope)) = else_part {
            let else_exit = self.lower_block(state, block, else_scope)?;
            state.branch_if_open(else_exit, end_block)?;
        }

        Ok(Lowered::empty(end_scope))
    }

    fn lower_while(
        &mut self,
        state: &mut FunctionState,
        condition: &Expr,
        body: &Block,
        scope: ScopeId,
    ) -> Result<Lowered, CodegenError> {
        let suffix = state.builder.next_label_suffix();
        let cond_block = state.builder.create_block(format!("cond{}", suffix));
        let cond_scope = state.scopes.child(scope, cond_block);
        let loop_block = state.builder.create_block(format!("loop{}", suffix));
        let loop_scope = state.scopes.child(scope, loop_block);
        let end_block = state.builder.create_block(format!("end{}", suffix));
        let end_scope = state.scopes.child(scope, end_block);

        state.terminate(scope, Terminator::Branch(cond_block))?;

        let lowered = self.lower_expr(state, condition, cond_scope)?;
        let (cond, cond_exit) = self.expect_bool(lowered, condition.span, "while")?;
        state.terminate(
            cond_exit,
            Terminator::CondBranch {
                cond,
                then_block: loop_block,
                else_block: end_block,
            },
        )?;

        let body_exit = self.lower_block(state, body, loop_scope)?;
        state.branch_if_open(body_exit, cond_block)?;

        Ok(Lowered::empty(end_scope))
    }

    fn lower_call(
        &mut self,
        state: &mut FunctionState,
        callee: &Expr,
        args: &[Expr],
        scope: ScopeId,
        span: Span,
    ) -> Result<Lowered, CodegenError> {
        let ExprKind::Identifier(name) = &callee.kind else {
            return Err(no_lowering("calls through expressions", callee.span));
        };
        let signature = self.signatures.get(name).cloned().ok_or_else(|| {
            CodegenError::name(format!("function '{}' was not found", name), callee.span)
        })?;

        if args.len() > signature.params.len() {
            return Err(CodegenError::type_error(
                format!(
                    "function '{}' takes {} arguments but {} were given",
                    name,
                    signature.params.len(),
                    args.len()
                ),
                span,
            ));
        }

        let mut scope = scope;
        let mut values = Vec::with_capacity(signature.params.len());
        for arg in args {
            let lowered = self.lower_expr(state, arg, scope)?;
            let (value, next) = expect_value(lowered, arg.span, "call argument")?;
            values.push(value);
            scope = next;
        }

        // missing trailing arguments come from defaults, evaluated here
        let missing = signature.params.iter().zip(&signature.defaults).skip(args.len());
        for (param, default) in missing {
            let Some(default) = default else {
                return Err(CodegenError::type_error(
                    format!("missing argument '{}' in call to '{}'", param.name, name),
                    span,
                ));
            };
            let lowered = self.lower_expr(state, default, scope)?;
            let (value, next) = expect_value(lowered, default.span, "default argument")?;
            values.push(value);
            scope = next;
        }

        for (param, value) in signature.params.iter().zip(&values) {
            if value.ty() != param.ty {
                return Err(CodegenError::type_error(
                    format!(
                        "argument '{}' of function '{}' expects type {}, got {}",
                        param.name,
                        name,
                        self.catalog.name_of(&param.ty),
                        self.catalog.name_of(&value.ty())
                    ),
                    span,
                ));
            }
        }

        let dest = if signature.return_type == Type::Void {
            None
        } else {
            Some(state.builder.fresh_register(signature.return_type.clone()))
        };
        state.emit(
            scope,
            Instruction::Call {
                dest: dest.clone(),
                callee: name.clone(),
                return_type: signature.return_type.clone(),
                args: values,
            },
        )?;

        Ok(Lowered {
            value: dest.map(Value::Register),
            scope,
        })
    }

    fn expect_bool(
        &self,
        lowered: Lowered,
        span: Span,
        construct: &str,
    ) -> Result<(Value, ScopeId), CodegenError> {
        let (value, scope) = expect_value(lowered, span, &format!("{} condition", construct))?;
        if value.ty() != Type::Bool {
            return Err(CodegenError::type_error(
                format!(
                    "{} condition must be bool, got {}",
                    construct,
                    self.catalog.name_of(&value.ty())
                ),
                span,
            ));
        }
        Ok((value, scope))
    }
}

fn expect_value(
    lowered: Lowered,
    span: Span,
    what: &str,
) -> Result<(Value, ScopeId), CodegenError> {
    match lowered.value {
        Some(value) => Ok((value, lowered.scope)),
        None => Err(CodegenError::type_error(
            format!("{} has no value", what),
            span,
        )),
    }
}

fn already_defined(name: &str, span: Span) -> CodegenError {
    CodegenError::name(format!("function '{}' is already defined", name), span)
}

fn no_lowering(what: &str, span: Span) -> CodegenError {
    CodegenError::unsupported(format!("{} are not supported by the code generator", what), span)
}

fn result_register(inst: &Instruction) -> Option<Register> {
    match inst {
        Instruction::Binary { dest, .. }
        | Instruction::ICmp { dest, .. }
        | Instruction::FCmp { dest, .. }
        | Instruction::FNeg { dest, .. }
        | Instruction::Alloca { dest, .. }
        | Instruction::Load { dest, .. } => Some(dest.clone()),
        Instruction::Call { dest, .. } => dest.clone(),
        Instruction::Store { .. } => None,
    }
}

fn select(op: InfixOp, ty: &Type) -> Option<Selected> {
    match ty {
        Type::Int => match op {
            InfixOp::Add => Some(Selected::Binary(BinOp::Add)),
            InfixOp::Subtract => Some(Selected::Binary(BinOp::Sub)),
            InfixOp::Multiply => Some(Selected::Binary(BinOp::Mul)),
            InfixOp::Divide => Some(Selected::Binary(BinOp::SDiv)),
            InfixOp::Modulo => Some(Selected::Binary(BinOp::SRem)),
            _ => int_predicate(op).map(Selected::ICmp),
        },
        Type::Float => match op {
            InfixOp::Add => Some(Selected::Binary(BinOp::FAdd)),
            InfixOp::Subtract => Some(Selected::Binary(BinOp::FSub)),
            InfixOp::Multiply => Some(Selected::Binary(BinOp::FMul)),
            InfixOp::Divide => Some(Selected::Binary(BinOp::FDiv)),
            InfixOp::Modulo => Some(Selected::Binary(BinOp::FRem)),
            _ => float_predicate(op).map(Selected::FCmp),
        },
        Type::Bool => match op {
            InfixOp::And => Some(Selected::Binary(BinOp::And)),
            InfixOp::Or => Some(Selected::Binary(BinOp::Or)),
            InfixOp::Equal => Some(Selected::ICmp(IntPredicate::Eq)),
            InfixOp::NotEqual => Some(Selected::ICmp(IntPredicate::Ne)),
            _ => None,
        },
        Type::Void | Type::Ptr(_) => None,
    }
}

fn int_predicate(op: InfixOp) -> Option<IntPredicate> {
    match op {
        InfixOp::Equal => Some(IntPredicate::Eq),
        InfixOp::NotEqual => Some(IntPredicate::Ne),
        InfixOp::Less => Some(IntPredicate::Slt),
        InfixOp::LessEqual => Some(IntPredicate::Sle),
        InfixOp::Greater => Some(IntPredicate::Sgt),
        InfixOp::GreaterEqual => Some(IntPredicate::Sge),
        _ => None,
    }
}

fn float_predicate(op: InfixOp) -> Option<FloatPredicate> {
    match op {
        InfixOp::Equal => Some(FloatPredicate::Oeq),
        InfixOp::NotEqual => Some(FloatPredicate::One),
        InfixOp::Less => Some(FloatPredicate::Olt),
        InfixOp::LessEqual => Some(FloatPredicate::Ole),
        InfixOp::Greater => Some(FloatPredicate::Ogt),
        InfixOp::GreaterEqual => Some(FloatPredicate::Oge),
        _ => None,
    }
}

/// Names a function body assigns to, not counting nested `def`s.
fn assigned_names(block: &Block) -> HashSet<String> {
    let mut names = HashSet::new();
    collect_block(block, &mut names);
    names
}

fn collect_block(block: &Block, names: &mut HashSet<String>) {
    for stmt in &block.statements {
        match &stmt.kind {
            StmtKind::Expr(expr) | StmtKind::Return(Some(expr)) => collect_expr(expr, names),
            StmtKind::Return(None) => {}
        }
    }
}

fn collect_expr(expr: &Expr, names: &mut HashSet<String>) {
    match &expr.kind {
        ExprKind::Infix { lhs, op, rhs } => {
            if let (InfixOp::Assign, ExprKind::Identifier(name)) = (op, &lhs.kind) {
                names.insert(name.clone());
            }
            collect_expr(lhs, names);
            collect_expr(rhs, names);
        }
        ExprKind::Prefix { rhs, .. } => collect_expr(rhs, names),
        ExprKind::If {
            condition,
            consequence,
            alternative,
        } => {
            collect_expr(condition, names);
            collect_block(consequence, names);
            if let Some(alternative) = alternative {
                collect_block(alternative, names);
            }
        }
        ExprKind::While { condition, body } => {
            collect_expr(condition, names);
            collect_block(body, names);
        }
        ExprKind::Call { callee, args } => {
            collect_expr(callee, names);
            args.iter().for_each(|arg| collect_expr(arg, names));
        }
        ExprKind::Index { object, index } => {
            collect_expr(object, names);
            collect_expr(index, names);
        }
        ExprKind::Array(items) => items.iter().for_each(|item| collect_expr(item, names)),
        ExprKind::Hash(pairs) => pairs.iter().for_each(|(key, value)| {
            collect_expr(key, names);
            collect_expr(value, names);
        }),
        ExprKind::Function(_)
        | ExprKind::Identifier(_)
        | ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::String(_)
        | ExprKind::Bool(_) => {}
    }
}
