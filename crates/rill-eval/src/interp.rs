//! The tree-walking evaluator.
//!
//! Dispatches on syntax node kind with one match arm per variant. The
//! current scope is a shared handle; function and lambda values capture it
//! by reference, producing closures. Control flow unwinds through the
//! [`Signal`] side of [`Exec`] until the owning construct catches it.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use rill_common::error::{RuntimeError, RuntimeErrorKind};
use rill_common::span::Span;
use rill_parser::ast::{
    AssignOp, BindKind, BinOp, Block, CaseBody, CheckExpr, ClassDecl, ClassMember,
    DestructurePattern, ElseArm, Expr, ExprKind, FunctionDecl, Lit, LogicOp, Param, Pattern,
    PatternKind, Program, Stmt, StmtKind, TemplatePart,
};

use crate::env::{Scope, ScopeRef, SetError};
use crate::generator;
use crate::methods;
use crate::modules;
use crate::ops;
use crate::signal::{error_at, with_span, Exec, Signal};
use crate::value::{
    check_type, range_items, values_equal, BoundMethod, Class, Function, Instance, LambdaValue,
    Value, ValueMap,
};

/// One interpreter instance: a global scope, the current scope handle, and
/// the per-interpreter module cache.
pub struct Interpreter {
    pub globals: ScopeRef,
    env: ScopeRef,
    modules: FxHashMap<String, Value>,
    exports: Vec<String>,
    module_base: Option<PathBuf>,
    loading: Vec<String>,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Scope::root();
        crate::builtins::install_constants(&globals);
        crate::builtins::install(&globals);
        Self {
            env: globals.clone(),
            globals,
            modules: FxHashMap::default(),
            exports: Vec::new(),
            module_base: None,
            loading: Vec::new(),
        }
    }

    /// An interpreter whose current scope is an existing chain; the
    /// generator driver evaluates suspended bodies through one of these.
    pub(crate) fn for_generator(env: ScopeRef, module_base: Option<PathBuf>) -> Self {
        Self {
            globals: env.clone(),
            env,
            modules: FxHashMap::default(),
            exports: Vec::new(),
            module_base,
            loading: Vec::new(),
        }
    }

    /// Enable the user-module file loader rooted at a directory; `grab x`
    /// then also resolves `<dir>/x.rill`.
    pub fn set_module_base(&mut self, dir: PathBuf) {
        self.module_base = Some(dir);
    }

    /// Names recorded by `share` statements during execution.
    pub fn exports(&self) -> &[String] {
        &self.exports
    }

    /// Execute a program; the result is the value of its last statement.
    pub fn run(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        let mut result = Value::None;
        for stmt in &program.body {
            match self.exec_stmt(stmt) {
                Ok(value) => result = value,
                Err(Signal::Error(e)) => return Err(e),
                Err(Signal::Return(value)) => return Ok(value),
                Err(Signal::Break) => {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::Runtime,
                        "'stop' outside of a loop",
                    ))
                }
                Err(Signal::Continue) => {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::Runtime,
                        "'next' outside of a loop",
                    ))
                }
                Err(Signal::Yield(_)) => {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::Runtime,
                        "'yield' outside of a generator",
                    ))
                }
            }
        }
        Ok(result)
    }

    /// Swap the current scope for the duration of `f`.
    fn with_env<T>(
        &mut self,
        env: ScopeRef,
        f: impl FnOnce(&mut Self) -> Exec<T>,
    ) -> Exec<T> {
        let prev = std::mem::replace(&mut self.env, env);
        let result = f(self);
        self.env = prev;
        result
    }

    /// Evaluate a block; its value is the value of the last statement.
    pub(crate) fn exec_block(&mut self, block: &Block) -> Exec<Value> {
        let mut result = Value::None;
        for stmt in &block.stmts {
            result = self.exec_stmt(stmt)?;
        }
        Ok(result)
    }

    // ── Statements ────────────────────────────────────────────────────

    fn exec_stmt(&mut self, stmt: &Stmt) -> Exec<Value> {
        match &stmt.kind {
            StmtKind::Expr(expr) => self.eval_expr(expr),

            StmtKind::VarDecl {
                kind,
                name,
                type_hint,
                init,
            } => {
                let value = match init {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::None,
                };
                if let Some(hint) = type_hint {
                    if !matches!(value, Value::None) && !check_type(&value, hint) {
                        return Err(error_at(
                            RuntimeErrorKind::Type,
                            format!("Expected type '{hint}', got '{}'", value.type_name()),
                            stmt.span,
                        ));
                    }
                }
                self.env.borrow_mut().define(
                    name.clone(),
                    value,
                    *kind == BindKind::Mut,
                    *kind == BindKind::Const,
                    type_hint.clone(),
                );
                Ok(Value::None)
            }

            StmtKind::Destructure {
                kind,
                pattern,
                value,
            } => self.exec_destructure(*kind, pattern, value, stmt.span),

            StmtKind::FuncDecl(decl) => {
                let func = Value::Function(Rc::new(Function {
                    decl: decl.clone(),
                    closure: self.env.clone(),
                    is_method: false,
                }));
                self.env
                    .borrow_mut()
                    .define(decl.name.clone(), func, false, false, None);
                Ok(Value::None)
            }

            StmtKind::ClassDecl(decl) => self.exec_class_decl(decl, stmt.span),

            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval_expr(cond)?.is_truthy() {
                    self.exec_block(then_branch)
                } else {
                    match else_branch {
                        Some(ElseArm::Block(block)) => self.exec_block(block),
                        Some(ElseArm::If(chained)) => self.exec_stmt(chained),
                        None => Ok(Value::None),
                    }
                }
            }

            StmtKind::While { cond, body } => {
                let mut result = Value::None;
                while self.eval_expr(cond)?.is_truthy() {
                    let env = Scope::child(&self.env);
                    match self.with_env(env, |interp| interp.exec_block(body)) {
                        Ok(value) => result = value,
                        Err(Signal::Break) => break,
                        Err(Signal::Continue) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Ok(result)
            }

            StmtKind::Repeat {
                binding,
                index_binding,
                iterable,
                body,
            } => {
                let subject = self.eval_expr(iterable)?;
                let items = self.iter_values(&subject, iterable.span)?;
                let mut result = Value::None;
                for (index, item) in items.into_iter().enumerate() {
                    let env = Scope::child(&self.env);
                    {
                        let mut scope = env.borrow_mut();
                        if let Some(index_name) = index_binding {
                            scope.define(
                                index_name.clone(),
                                Value::Int(index as i64),
                                false,
                                false,
                                None,
                            );
                        }
                        scope.define(binding.clone(), item, false, false, None);
                    }
                    match self.with_env(env, |interp| interp.exec_block(body)) {
                        Ok(value) => result = value,
                        Err(Signal::Break) => break,
                        Err(Signal::Continue) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Ok(result)
            }

            StmtKind::Try {
                body,
                catch,
                finally,
            } => {
                let mut outcome = self.exec_block(body);
                // Only genuine failures enter the catch path; control-flow
                // signals pass through untouched.
                if let Err(Signal::Error(failure)) = &outcome {
                    if let Some(clause) = catch {
                        let failure = failure.clone();
                        let env = Scope::child(&self.env);
                        if let Some(name) = &clause.binding {
                            env.borrow_mut().define(
                                name.clone(),
                                Value::text(failure.message),
                                false,
                                false,
                                None,
                            );
                        }
                        outcome = self.with_env(env, |interp| interp.exec_block(&clause.body));
                    }
                }
                if let Some(finally_block) = finally {
                    self.exec_block(finally_block)?;
                }
                outcome
            }

            StmtKind::Fail(expr) => {
                let value = self.eval_expr(expr)?;
                Err(error_at(
                    RuntimeErrorKind::Runtime,
                    value.to_text(),
                    stmt.span,
                ))
            }

            StmtKind::Give(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::None,
                };
                Err(Signal::Return(value))
            }

            StmtKind::Stop => Err(Signal::Break),
            StmtKind::Next => Err(Signal::Continue),

            StmtKind::Import {
                module,
                items,
                alias,
                wildcard,
            } => self.exec_import(module, items, alias.as_deref(), *wildcard, stmt.span),

            StmtKind::Export { decl, names } => {
                if let Some(decl) = decl {
                    self.exports.extend(declared_names(decl));
                    self.exec_stmt(decl)?;
                }
                self.exports.extend(names.iter().cloned());
                Ok(Value::None)
            }
        }
    }

    fn exec_destructure(
        &mut self,
        kind: BindKind,
        pattern: &DestructurePattern,
        value_expr: &Expr,
        span: Span,
    ) -> Exec<Value> {
        let value = self.eval_expr(value_expr)?;
        let mutable = kind == BindKind::Mut;
        let constant = kind == BindKind::Const;

        match pattern {
            DestructurePattern::List(bindings) => {
                let Value::List(items) = &value else {
                    return Err(error_at(
                        RuntimeErrorKind::Type,
                        format!("Cannot destructure non-list value: {}", value.type_name()),
                        span,
                    ));
                };
                let items = items.borrow().clone();
                let mut scope = self.env.borrow_mut();
                for (i, binding) in bindings.iter().enumerate() {
                    if binding.rest {
                        let rest = items.get(i..).unwrap_or(&[]).to_vec();
                        scope.define(
                            binding.name.clone(),
                            Value::list(rest),
                            mutable,
                            constant,
                            None,
                        );
                        break;
                    }
                    let element = items.get(i).cloned().unwrap_or(Value::None);
                    scope.define(binding.name.clone(), element, mutable, constant, None);
                }
            }
            DestructurePattern::Map(bindings) => {
                let Value::Map(map) = &value else {
                    return Err(error_at(
                        RuntimeErrorKind::Type,
                        format!("Cannot destructure non-map value: {}", value.type_name()),
                        span,
                    ));
                };
                let map = map.borrow();
                let mut scope = self.env.borrow_mut();
                for binding in bindings {
                    let entry = map.get_str(&binding.key).cloned().unwrap_or(Value::None);
                    scope.define(binding.alias.clone(), entry, mutable, constant, None);
                }
            }
        }
        Ok(Value::None)
    }

    fn exec_class_decl(&mut self, decl: &Rc<ClassDecl>, span: Span) -> Exec<Value> {
        let parent = match &decl.parent {
            Some(name) => {
                let value = Scope::get(&self.env, name).ok_or_else(|| {
                    error_at(
                        RuntimeErrorKind::Name,
                        format!("Undefined variable '{name}'"),
                        span,
                    )
                })?;
                let Value::Class(class) = value else {
                    return Err(error_at(
                        RuntimeErrorKind::Type,
                        format!("Cannot extend non-class '{name}'"),
                        span,
                    ));
                };
                Some(class)
            }
            None => None,
        };

        let mut methods = FxHashMap::default();
        let mut static_methods = FxHashMap::default();
        let mut properties = FxHashMap::default();
        let mut static_properties = FxHashMap::default();
        let mut constructor = None;

        for member in &decl.members {
            match member {
                ClassMember::Constructor(ctor) => constructor = Some(ctor.clone()),
                ClassMember::Method(method) => {
                    let func_decl = Rc::new(FunctionDecl {
                        name: method.name.clone(),
                        params: method.params.clone(),
                        body: method.body.clone(),
                        is_async: method.is_async,
                        is_generator: false,
                        return_type: None,
                        span: method.span,
                    });
                    let func = Rc::new(Function {
                        decl: func_decl,
                        closure: self.env.clone(),
                        is_method: true,
                    });
                    if method.is_static {
                        static_methods.insert(method.name.clone(), func);
                    } else {
                        methods.insert(method.name.clone(), func);
                    }
                }
                ClassMember::Property(prop) => {
                    let value = match &prop.value {
                        Some(expr) => self.eval_expr(expr)?,
                        None => Value::None,
                    };
                    if prop.is_static {
                        static_properties.insert(prop.name.clone(), value);
                    } else {
                        properties.insert(prop.name.clone(), value);
                    }
                }
            }
        }

        let class = Rc::new(Class {
            name: decl.name.clone(),
            methods,
            properties,
            parent,
            static_methods,
            static_properties,
            constructor,
            closure: self.env.clone(),
        });
        self.env
            .borrow_mut()
            .define(decl.name.clone(), Value::Class(class), false, false, None);
        Ok(Value::None)
    }

    // ── Modules ───────────────────────────────────────────────────────

    fn exec_import(
        &mut self,
        module: &str,
        items: &[String],
        alias: Option<&str>,
        wildcard: bool,
        span: Span,
    ) -> Exec<Value> {
        let mapping = self.load_module(module, span)?;
        let Value::Map(map) = &mapping else {
            return Err(error_at(
                RuntimeErrorKind::Import,
                format!("Module '{module}' did not produce a mapping"),
                span,
            ));
        };

        if wildcard {
            let entries: Vec<(Value, Value)> =
                map.borrow().iter().cloned().collect();
            let mut scope = self.env.borrow_mut();
            for (key, value) in entries {
                if let Value::Text(name) = &key {
                    scope.define(name.to_string(), value, false, false, None);
                }
            }
        } else if !items.is_empty() {
            for item in items {
                let value = map.borrow().get_str(item).cloned();
                match value {
                    Some(value) => {
                        self.env
                            .borrow_mut()
                            .define(item.clone(), value, false, false, None)
                    }
                    None => {
                        return Err(error_at(
                            RuntimeErrorKind::Import,
                            format!("Module '{module}' has no export '{item}'"),
                            span,
                        ))
                    }
                }
            }
        } else {
            let name = alias
                .map(str::to_string)
                .unwrap_or_else(|| module.rsplit('.').next().unwrap_or(module).to_string());
            self.env
                .borrow_mut()
                .define(name, mapping.clone(), false, false, None);
        }
        Ok(Value::None)
    }

    /// Resolve a module name: the standard-library registry first, then the
    /// optional file loader. Modules are cached per interpreter.
    fn load_module(&mut self, name: &str, span: Span) -> Exec<Value> {
        if let Some(cached) = self.modules.get(name) {
            return Ok(cached.clone());
        }

        if let Some(map) = modules::load_stdlib(name) {
            let value = Value::map(map);
            self.modules.insert(name.to_string(), value.clone());
            return Ok(value);
        }

        if let Some(base) = self.module_base.clone() {
            let path = base.join(format!("{}.rill", name.replace('.', "/")));
            if path.exists() {
                if self.loading.iter().any(|loading| loading == name) {
                    return Err(error_at(
                        RuntimeErrorKind::Import,
                        format!("Cyclic import of module '{name}'"),
                        span,
                    ));
                }
                self.loading.push(name.to_string());
                let loaded = self.load_module_file(&path);
                self.loading.pop();
                let map = loaded.map_err(|message| {
                    error_at(
                        RuntimeErrorKind::Import,
                        format!("Failed to load module '{name}': {message}"),
                        span,
                    )
                })?;
                let value = Value::map(map);
                self.modules.insert(name.to_string(), value.clone());
                return Ok(value);
            }
        }

        Err(error_at(
            RuntimeErrorKind::Import,
            format!("Unknown module '{name}'"),
            span,
        ))
    }

    /// Run a user module in a child interpreter and collect its `share`d
    /// names into a mapping.
    fn load_module_file(&mut self, path: &Path) -> Result<ValueMap, String> {
        let source = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let program = rill_parser::parse(&source).map_err(|e| e.to_string())?;

        let mut child = Interpreter::new();
        child.module_base = self.module_base.clone();
        child.loading = self.loading.clone();
        child.run(&program).map_err(|e| e.message)?;

        let mut map = ValueMap::new();
        for name in &child.exports {
            if let Some(value) = Scope::get(&child.globals, name) {
                map.insert_str(name, value);
            }
        }
        Ok(map)
    }

    // ── Expressions ───────────────────────────────────────────────────

    pub fn eval_expr(&mut self, expr: &Expr) -> Exec<Value> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(lit_value(lit)),

            ExprKind::Ident(name) => Scope::get(&self.env, name).ok_or_else(|| {
                error_at(
                    RuntimeErrorKind::Name,
                    format!("Undefined variable '{name}'"),
                    expr.span,
                )
            }),

            ExprKind::Binary { op, lhs, rhs } => {
                let left = self.eval_expr(lhs)?;
                let right = self.eval_expr(rhs)?;
                ops::binary(*op, left, right).map_err(|s| with_span(s, expr.span))
            }

            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                ops::unary(*op, value).map_err(|s| with_span(s, expr.span))
            }

            ExprKind::Comparison { ops: chain, operands } => {
                let mut prev = self.eval_expr(&operands[0])?;
                for (op, operand) in chain.iter().zip(operands[1..].iter()) {
                    let next = self.eval_expr(operand)?;
                    if !ops::compare(*op, &prev, &next).map_err(|s| with_span(s, expr.span))? {
                        return Ok(Value::Bool(false));
                    }
                    prev = next;
                }
                Ok(Value::Bool(true))
            }

            ExprKind::Logical { op, lhs, rhs } => {
                let left = self.eval_expr(lhs)?;
                match op {
                    LogicOp::And if !left.is_truthy() => Ok(left),
                    LogicOp::Or if left.is_truthy() => Ok(left),
                    _ => self.eval_expr(rhs),
                }
            }

            ExprKind::Assign { op, target, value } => {
                self.eval_assign(*op, target, value, expr.span)
            }

            ExprKind::Call { callee, args } => {
                let callee_value = self.eval_expr(callee)?;
                let arg_values = self.eval_args(args)?;
                self.call_value(callee_value, arg_values, expr.span)
            }

            ExprKind::Member {
                object,
                property,
                safe,
            } => {
                let obj = self.eval_expr(object)?;
                self.member_access(obj, property, *safe, expr.span)
            }

            ExprKind::Index {
                object,
                index,
                safe,
            } => {
                let obj = self.eval_expr(object)?;
                if matches!(obj, Value::None) {
                    if *safe {
                        return Ok(Value::None);
                    }
                    return Err(error_at(
                        RuntimeErrorKind::Type,
                        "Cannot index none",
                        expr.span,
                    ));
                }
                let index_value = self.eval_expr(index)?;
                self.index_access(obj, index_value, *safe, expr.span)
            }

            ExprKind::StaticMember { object, property } => {
                let obj = self.eval_expr(object)?;
                self.static_access(obj, property, expr.span)
            }

            ExprKind::List(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    if let ExprKind::Spread(inner) = &element.kind {
                        let value = self.eval_expr(inner)?;
                        match spread_values(&value)? {
                            Some(values) => items.extend(values),
                            None => items.push(value),
                        }
                    } else {
                        items.push(self.eval_expr(element)?);
                    }
                }
                Ok(Value::list(items))
            }

            ExprKind::MapLit(entries) => {
                let mut map = ValueMap::new();
                for entry in entries {
                    match &entry.key {
                        Some(key_expr) => {
                            let key = self.eval_expr(key_expr)?;
                            let value = self.eval_expr(&entry.value)?;
                            map.insert(key, value);
                        }
                        None => {
                            let ExprKind::Spread(inner) = &entry.value.kind else {
                                continue;
                            };
                            let value = self.eval_expr(inner)?;
                            if let Value::Map(other) = &value {
                                map.extend_from(&other.borrow());
                            }
                        }
                    }
                }
                Ok(Value::map(map))
            }

            ExprKind::Range { start, end, .. } => {
                let start = self.eval_expr(start)?;
                let end = self.eval_expr(end)?;
                match (start, end) {
                    (Value::Int(a), Value::Int(b)) => Ok(Value::Range(a, b)),
                    _ => Err(error_at(
                        RuntimeErrorKind::Type,
                        "Range bounds must be integers",
                        expr.span,
                    )),
                }
            }

            ExprKind::Pipeline {
                seed,
                stages,
                is_async,
            } => self.eval_pipeline(seed, stages, *is_async),

            ExprKind::Lambda(decl) => Ok(Value::Lambda(Rc::new(LambdaValue {
                decl: decl.clone(),
                closure: self.env.clone(),
            }))),

            ExprKind::Ternary {
                cond,
                then,
                otherwise,
            } => {
                if self.eval_expr(cond)?.is_truthy() {
                    self.eval_expr(then)
                } else {
                    self.eval_expr(otherwise)
                }
            }

            ExprKind::NullCoalesce { lhs, rhs } => {
                let left = self.eval_expr(lhs)?;
                if matches!(left, Value::None) {
                    self.eval_expr(rhs)
                } else {
                    Ok(left)
                }
            }

            ExprKind::Spread(inner) => self.eval_expr(inner),

            ExprKind::Await(inner) => {
                let value = self.eval_expr(inner)?;
                self.drive_task(value)
            }

            ExprKind::Yield(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::None,
                };
                // Suspend the innermost running generator; outside any
                // driver the yield unwinds as a signal instead.
                match generator::try_suspend(value) {
                    Ok(()) => Ok(Value::None),
                    Err(value) => Err(Signal::Yield(value)),
                }
            }

            ExprKind::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => out.push_str(text),
                        TemplatePart::Expr(inner) => {
                            let value = self.eval_expr(inner)?;
                            out.push_str(&value.to_text());
                        }
                    }
                }
                Ok(Value::text(out))
            }

            ExprKind::Check(check) => self.eval_check(check),

            ExprKind::SelfRef => Scope::get(&self.env, "me").ok_or_else(|| {
                error_at(
                    RuntimeErrorKind::Name,
                    "'me' can only be used inside a class method",
                    expr.span,
                )
            }),

            ExprKind::ParentRef => {
                let me = Scope::get(&self.env, "me").ok_or_else(|| {
                    error_at(
                        RuntimeErrorKind::Name,
                        "'parent' can only be used inside a class method",
                        expr.span,
                    )
                })?;
                if let Value::Instance(instance) = &me {
                    if let Some(parent) = &instance.class.parent {
                        return Ok(Value::Class(parent.clone()));
                    }
                }
                Err(error_at(RuntimeErrorKind::Name, "No parent class", expr.span))
            }
        }
    }

    // ── Assignment ────────────────────────────────────────────────────

    fn eval_assign(
        &mut self,
        op: AssignOp,
        target: &Expr,
        value_expr: &Expr,
        span: Span,
    ) -> Exec<Value> {
        let mut value = self.eval_expr(value_expr)?;

        if op != AssignOp::Assign {
            let old = self.eval_expr(target)?;
            let base = match op {
                AssignOp::Add => BinOp::Add,
                AssignOp::Sub => BinOp::Sub,
                AssignOp::Mul => BinOp::Mul,
                AssignOp::Div => BinOp::Div,
                AssignOp::Assign => unreachable!(),
            };
            value = ops::binary(base, old, value).map_err(|s| with_span(s, span))?;
        }

        match &target.kind {
            ExprKind::Ident(name) => {
                Scope::set(&self.env, name, value.clone()).map_err(|e| match e {
                    SetError::Undefined => error_at(
                        RuntimeErrorKind::Name,
                        format!("Undefined variable '{name}'"),
                        span,
                    ),
                    SetError::Immutable => error_at(
                        RuntimeErrorKind::Assign,
                        format!(
                            "Cannot reassign immutable variable '{name}' (use 'mut' to make it mutable)"
                        ),
                        span,
                    ),
                    SetError::Constant => error_at(
                        RuntimeErrorKind::Assign,
                        format!("Cannot reassign constant '{name}'"),
                        span,
                    ),
                })?;
            }
            ExprKind::Member {
                object, property, ..
            } => {
                let obj = self.eval_expr(object)?;
                match obj {
                    Value::Instance(instance) => {
                        instance
                            .props
                            .borrow_mut()
                            .insert(property.clone(), value.clone());
                    }
                    Value::Map(map) => {
                        map.borrow_mut()
                            .insert(Value::text(property.clone()), value.clone());
                    }
                    other => {
                        return Err(error_at(
                            RuntimeErrorKind::Type,
                            format!("Cannot set property on {}", other.type_name()),
                            span,
                        ))
                    }
                }
            }
            ExprKind::Index { object, index, .. } => {
                let obj = self.eval_expr(object)?;
                let index_value = self.eval_expr(index)?;
                match obj {
                    Value::List(items) => {
                        let mut items = items.borrow_mut();
                        let len = items.len();
                        let slot = resolve_index(&index_value, len, span)?;
                        items[slot] = value.clone();
                    }
                    Value::Map(map) => {
                        map.borrow_mut().insert(index_value, value.clone());
                    }
                    other => {
                        return Err(error_at(
                            RuntimeErrorKind::Type,
                            format!("Cannot index {}", other.type_name()),
                            span,
                        ))
                    }
                }
            }
            _ => {
                return Err(error_at(
                    RuntimeErrorKind::Type,
                    "Invalid assignment target",
                    span,
                ))
            }
        }

        Ok(value)
    }

    // ── Calls ─────────────────────────────────────────────────────────

    /// Evaluate call arguments, flattening spread elements.
    fn eval_args(&mut self, args: &[Expr]) -> Exec<Vec<Value>> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            if let ExprKind::Spread(inner) = &arg.kind {
                let value = self.eval_expr(inner)?;
                match spread_values(&value)? {
                    Some(values) => out.extend(values),
                    None => out.push(value),
                }
            } else {
                out.push(self.eval_expr(arg)?);
            }
        }
        Ok(out)
    }

    /// Dispatch a call by callee kind.
    pub fn call_value(&mut self, callee: Value, args: Vec<Value>, span: Span) -> Exec<Value> {
        match callee {
            Value::HostFn(host) => host
                .call(self, args)
                .map_err(|s| with_span(s, span)),
            Value::Function(func) => self
                .call_function(&func, args, None)
                .map_err(|s| with_span(s, span)),
            Value::Lambda(lambda) => self
                .call_lambda(&lambda, args)
                .map_err(|s| with_span(s, span)),
            Value::BoundMethod(bound) => self
                .call_function(
                    &bound.function,
                    args,
                    Some(Value::Instance(bound.instance.clone())),
                )
                .map_err(|s| with_span(s, span)),
            Value::Class(class) => self.instantiate(class, args, span),
            Value::Map(_) => Err(error_at(
                RuntimeErrorKind::Type,
                "Cannot call a map directly; use 'namespace.function()'",
                span,
            )),
            other => Err(error_at(
                RuntimeErrorKind::Type,
                format!("Cannot call {}", other.type_name()),
                span,
            )),
        }
    }

    /// Call without a source position; used by builtins invoking user
    /// callables on the host's behalf.
    pub(crate) fn call_host(&mut self, callee: Value, args: Vec<Value>) -> Exec<Value> {
        self.call_value(callee, args, Span::point(0))
    }

    fn call_function(
        &mut self,
        func: &Rc<Function>,
        args: Vec<Value>,
        me: Option<Value>,
    ) -> Exec<Value> {
        if func.decl.is_generator {
            return self.run_generator(func, args, me);
        }

        let env = Scope::child(&func.closure);
        if let Some(me_value) = me {
            env.borrow_mut().define("me", me_value, false, false, None);
        }
        self.bind_params(&env, &func.decl.params, &args)?;

        match self.with_env(env, |interp| interp.exec_block(&func.decl.body)) {
            Ok(value) => Ok(value),
            Err(Signal::Return(value)) => Ok(value),
            Err(other) => Err(other),
        }
    }

    fn call_lambda(&mut self, lambda: &Rc<LambdaValue>, args: Vec<Value>) -> Exec<Value> {
        let env = Scope::child(&lambda.closure);
        self.bind_params(&env, &lambda.decl.params, &args)?;

        let decl = lambda.decl.clone();
        let result = self.with_env(env, |interp| match &decl.body {
            rill_parser::ast::LambdaBody::Expr(expr) => interp.eval_expr(expr),
            rill_parser::ast::LambdaBody::Block(block) => interp.exec_block(block),
        });
        match result {
            Ok(value) => Ok(value),
            Err(Signal::Return(value)) => Ok(value),
            Err(other) => Err(other),
        }
    }

    /// Bind arguments into a fresh scope: positional up to the rest
    /// parameter (which absorbs the remainder as a sequence), defaults
    /// evaluated in the new scope, missing parameters bound to none, extra
    /// arguments discarded.
    fn bind_params(&mut self, env: &ScopeRef, params: &[Param], args: &[Value]) -> Exec<()> {
        for (i, param) in params.iter().enumerate() {
            if param.rest {
                let rest = args.get(i..).unwrap_or(&[]).to_vec();
                env.borrow_mut()
                    .define(param.name.clone(), Value::list(rest), false, false, None);
                break;
            }
            let value = if i < args.len() {
                args[i].clone()
            } else if let Some(default) = &param.default {
                self.with_env(env.clone(), |interp| interp.eval_expr(default))?
            } else {
                Value::None
            };
            env.borrow_mut()
                .define(param.name.clone(), value, false, false, None);
        }
        Ok(())
    }

    fn instantiate(&mut self, class: Rc<Class>, args: Vec<Value>, span: Span) -> Exec<Value> {
        let instance = Rc::new(Instance::new(class.clone()));

        if let Some(constructor) = &class.constructor {
            let env = Scope::child(&class.closure);
            env.borrow_mut().define(
                "me",
                Value::Instance(instance.clone()),
                false,
                false,
                None,
            );
            self.bind_params(&env, &constructor.params, &args)?;
            match self.with_env(env, |interp| interp.exec_block(&constructor.body)) {
                Ok(_) | Err(Signal::Return(_)) => {}
                Err(other) => return Err(with_span(other, span)),
            }
        }

        Ok(Value::Instance(instance))
    }

    /// Generator call: bind parameters, then package the body as a
    /// suspended coroutine. Nothing runs until the first request; each
    /// request resumes evaluation until the next yield or normal exit.
    fn run_generator(
        &mut self,
        func: &Rc<Function>,
        args: Vec<Value>,
        me: Option<Value>,
    ) -> Exec<Value> {
        let env = Scope::child(&func.closure);
        if let Some(me_value) = me {
            env.borrow_mut().define("me", me_value, false, false, None);
        }
        self.bind_params(&env, &func.decl.params, &args)?;

        let state = generator::spawn(func.clone(), env, self.module_base.clone());
        Ok(Value::Generator(Rc::new(RefCell::new(state))))
    }

    /// If the value is a host task, drive it to completion and return its
    /// result; any other value passes through unchanged.
    pub fn drive_task(&mut self, value: Value) -> Exec<Value> {
        let Value::Task(task) = &value else {
            return Ok(value);
        };
        let cached = task.borrow().result.clone();
        if let Some(result) = cached {
            return Ok(result);
        }
        let thunk = task.borrow_mut().thunk.take();
        let result = match thunk {
            Some(callable) => self.call_host(callable, Vec::new())?,
            None => Value::None,
        };
        task.borrow_mut().result = Some(result.clone());
        Ok(result)
    }

    // ── Member and index access ───────────────────────────────────────

    fn member_access(
        &mut self,
        obj: Value,
        property: &str,
        safe: bool,
        span: Span,
    ) -> Exec<Value> {
        if matches!(obj, Value::None) {
            if safe {
                return Ok(Value::None);
            }
            return Err(error_at(
                RuntimeErrorKind::Type,
                format!("Cannot access property '{property}' of none"),
                span,
            ));
        }

        match &obj {
            Value::Instance(instance) => {
                if let Some(value) = instance.props.borrow().get(property) {
                    return Ok(value.clone());
                }
                if let Some(method) = instance.class.find_method(property) {
                    return Ok(Value::BoundMethod(Rc::new(BoundMethod {
                        instance: instance.clone(),
                        function: method,
                    })));
                }
                Err(error_at(
                    RuntimeErrorKind::Name,
                    format!(
                        "'{}' has no property or method '{property}'",
                        instance.class.name
                    ),
                    span,
                ))
            }
            Value::Class(class) => {
                if let Some(value) = class.static_properties.get(property) {
                    return Ok(value.clone());
                }
                if let Some(method) = class.static_methods.get(property) {
                    return Ok(Value::Function(method.clone()));
                }
                Err(error_at(
                    RuntimeErrorKind::Name,
                    format!("Class '{}' has no static member '{property}'", class.name),
                    span,
                ))
            }
            Value::Map(map) => {
                let value = map.borrow().get_str(property).cloned();
                match value {
                    Some(value) => Ok(value),
                    None if safe => Ok(Value::None),
                    None => Err(error_at(
                        RuntimeErrorKind::Name,
                        format!("Key '{property}' not found in map"),
                        span,
                    )),
                }
            }
            Value::Text(_) | Value::List(_) | Value::Generator(_) => {
                let kind = match &obj {
                    Value::Text(_) => "Text",
                    Value::List(_) => "List",
                    _ => "Generator",
                };
                methods::host_member(&obj, property).ok_or_else(|| {
                    error_at(
                        RuntimeErrorKind::Name,
                        format!("{kind} has no method '{property}'"),
                        span,
                    )
                })
            }
            other => Err(error_at(
                RuntimeErrorKind::Type,
                format!(
                    "Cannot access property '{property}' of {}",
                    other.type_name()
                ),
                span,
            )),
        }
    }

    fn index_access(&mut self, obj: Value, index: Value, safe: bool, span: Span) -> Exec<Value> {
        match &obj {
            Value::List(items) => {
                let items = items.borrow();
                match try_index(&index, items.len()) {
                    IndexOutcome::At(i) => Ok(items[i].clone()),
                    IndexOutcome::OutOfRange if safe => Ok(Value::None),
                    IndexOutcome::OutOfRange => Err(error_at(
                        RuntimeErrorKind::Index,
                        format!("Index {} out of range", index.to_text()),
                        span,
                    )),
                    IndexOutcome::NotAnInt => Err(error_at(
                        RuntimeErrorKind::Type,
                        format!("Sequence index must be an integer, got {}", index.type_name()),
                        span,
                    )),
                }
            }
            Value::Text(s) => {
                let chars: Vec<char> = s.chars().collect();
                match try_index(&index, chars.len()) {
                    IndexOutcome::At(i) => Ok(Value::text(chars[i].to_string())),
                    IndexOutcome::OutOfRange if safe => Ok(Value::None),
                    IndexOutcome::OutOfRange => Err(error_at(
                        RuntimeErrorKind::Index,
                        format!("Index {} out of range", index.to_text()),
                        span,
                    )),
                    IndexOutcome::NotAnInt => Err(error_at(
                        RuntimeErrorKind::Type,
                        format!("Text index must be an integer, got {}", index.type_name()),
                        span,
                    )),
                }
            }
            Value::Map(map) => {
                let value = map.borrow().get(&index).cloned();
                match value {
                    Some(value) => Ok(value),
                    None if safe => Ok(Value::None),
                    None => Err(error_at(
                        RuntimeErrorKind::Key,
                        format!("Key {} not found in map", index.repr_text()),
                        span,
                    )),
                }
            }
            other => Err(error_at(
                RuntimeErrorKind::Type,
                format!("Cannot index {}", other.type_name()),
                span,
            )),
        }
    }

    fn static_access(&mut self, obj: Value, property: &str, span: Span) -> Exec<Value> {
        match &obj {
            Value::Class(class) => {
                if let Some(method) = class.static_methods.get(property) {
                    return Ok(Value::Function(method.clone()));
                }
                if let Some(value) = class.static_properties.get(property) {
                    return Ok(value.clone());
                }
                Err(error_at(
                    RuntimeErrorKind::Name,
                    format!("Class '{}' has no static member '{property}'", class.name),
                    span,
                ))
            }
            Value::Map(map) => Ok(map.borrow().get_str(property).cloned().unwrap_or(Value::None)),
            other => Err(error_at(
                RuntimeErrorKind::Type,
                format!("Cannot use '::' on {}", other.type_name()),
                span,
            )),
        }
    }

    // ── Pattern matching ──────────────────────────────────────────────

    fn eval_check(&mut self, check: &CheckExpr) -> Exec<Value> {
        let subject = self.eval_expr(&check.subject)?;

        for case in &check.cases {
            let Some(bindings) = self.match_pattern(&case.pattern, &subject)? else {
                continue;
            };

            if let Some(guard) = &case.guard {
                let env = Scope::child(&self.env);
                {
                    let mut scope = env.borrow_mut();
                    for (name, value) in &bindings {
                        scope.define(name.clone(), value.clone(), false, false, None);
                    }
                }
                if !self.with_env(env, |interp| interp.eval_expr(guard))?.is_truthy() {
                    continue;
                }
            }

            let env = Scope::child(&self.env);
            {
                let mut scope = env.borrow_mut();
                for (name, value) in bindings {
                    scope.define(name, value, false, false, None);
                }
            }
            return self.with_env(env, |interp| match &case.body {
                CaseBody::Expr(expr) => interp.eval_expr(expr),
                CaseBody::Block(block) => interp.exec_block(block),
            });
        }

        Ok(Value::None)
    }

    /// Attempt to match a pattern, producing the collected bindings.
    fn match_pattern(
        &mut self,
        pattern: &Pattern,
        value: &Value,
    ) -> Exec<Option<Vec<(String, Value)>>> {
        match &pattern.kind {
            PatternKind::Wildcard => Ok(Some(Vec::new())),

            PatternKind::Literal(lit) => {
                Ok(values_equal(&lit_value(lit), value).then(Vec::new))
            }

            PatternKind::Binding(name) => Ok(Some(vec![(name.clone(), value.clone())])),

            PatternKind::Range { start, end } => {
                let start = self.eval_expr(start)?;
                let end = self.eval_expr(end)?;
                let (Some(lo), Some(hi)) = (ops::as_f64(&start), ops::as_f64(&end)) else {
                    return Ok(None);
                };
                let Some(v) = ops::as_f64(value) else {
                    return Ok(None);
                };
                Ok((lo <= v && v <= hi).then(Vec::new))
            }

            PatternKind::List(patterns) => {
                let Value::List(items) = value else {
                    return Ok(None);
                };
                let items = items.borrow().clone();
                if items.len() != patterns.len() {
                    return Ok(None);
                }
                let mut bindings = Vec::new();
                for (sub_pattern, item) in patterns.iter().zip(items.iter()) {
                    match self.match_pattern(sub_pattern, item)? {
                        Some(sub) => bindings.extend(sub),
                        None => return Ok(None),
                    }
                }
                Ok(Some(bindings))
            }

            PatternKind::Map(pairs) => {
                let Value::Map(map) = value else {
                    return Ok(None);
                };
                let mut bindings = Vec::new();
                for (key_expr, sub_pattern) in pairs {
                    let key = self.eval_expr(key_expr)?;
                    let entry = map.borrow().get(&key).cloned();
                    let Some(entry) = entry else {
                        return Ok(None);
                    };
                    match self.match_pattern(sub_pattern, &entry)? {
                        Some(sub) => bindings.extend(sub),
                        None => return Ok(None),
                    }
                }
                Ok(Some(bindings))
            }

            PatternKind::Expr(expr) => match self.eval_expr(expr) {
                Ok(candidate) => Ok(values_equal(&candidate, value).then(Vec::new)),
                // A constant reference that fails to evaluate simply does
                // not match; control signals still unwind.
                Err(Signal::Error(_)) => Ok(None),
                Err(other) => Err(other),
            },
        }
    }

    // ── Pipelines ─────────────────────────────────────────────────────

    fn eval_pipeline(&mut self, seed: &Expr, stages: &[Expr], is_async: bool) -> Exec<Value> {
        let mut value = self.eval_expr(seed)?;
        if is_async {
            value = self.drive_task(value)?;
        }
        for stage in stages {
            value = self.eval_stage(stage, value)?;
            if is_async {
                value = self.drive_task(value)?;
            }
        }
        Ok(value)
    }

    /// Resolve and apply one pipeline stage.
    ///
    /// A call-shaped stage with a bare-identifier callee prefers a callable
    /// member of the piped value (`value.m(args)`); only if no such member
    /// exists does it fall back to a function in scope, invoked with the
    /// piped value appended as the last argument (`m(args..., value)`).
    fn eval_stage(&mut self, stage: &Expr, value: Value) -> Exec<Value> {
        match &stage.kind {
            ExprKind::Call { callee, args } if matches!(callee.kind, ExprKind::Ident(_)) => {
                let ExprKind::Ident(name) = &callee.kind else {
                    unreachable!("guarded by the match arm");
                };
                let arg_values = self.eval_args(args)?;
                if let Some(method) = self.try_get_method(&value, name) {
                    return self.call_value(method, arg_values, stage.span);
                }
                match Scope::get(&self.env, name) {
                    Some(func) => {
                        let mut all = arg_values;
                        all.push(value);
                        self.call_value(func, all, stage.span)
                    }
                    None => Err(error_at(
                        RuntimeErrorKind::Name,
                        format!(
                            "'{name}' is not a method of {} or a defined function",
                            value.type_name()
                        ),
                        stage.span,
                    )),
                }
            }
            ExprKind::Call { callee, args } => {
                let callee_value = self.eval_expr(callee)?;
                let mut arg_values = self.eval_args(args)?;
                arg_values.push(value);
                self.call_value(callee_value, arg_values, stage.span)
            }
            ExprKind::Ident(name) => {
                if let Some(method) = self.try_get_method(&value, name) {
                    return self.call_value(method, Vec::new(), stage.span);
                }
                let func = Scope::get(&self.env, name).ok_or_else(|| {
                    error_at(
                        RuntimeErrorKind::Name,
                        format!(
                            "'{name}' is not a method of {} or a defined function",
                            value.type_name()
                        ),
                        stage.span,
                    )
                })?;
                self.call_value(func, vec![value], stage.span)
            }
            _ => {
                let callable = self.eval_expr(stage)?;
                self.call_value(callable, vec![value], stage.span)
            }
        }
    }

    /// A callable member of `value` named `name`, if any: an instance
    /// method, a host method surface entry, or a callable map entry.
    fn try_get_method(&self, value: &Value, name: &str) -> Option<Value> {
        match value {
            Value::Instance(instance) => instance.class.find_method(name).map(|method| {
                Value::BoundMethod(Rc::new(BoundMethod {
                    instance: instance.clone(),
                    function: method,
                }))
            }),
            Value::Text(_) | Value::List(_) | Value::Generator(_) => {
                methods::host_member(value, name).filter(|v| v.is_callable())
            }
            Value::Map(map) => map.borrow().get_str(name).cloned().filter(|v| v.is_callable()),
            _ => None,
        }
    }

    // ── Iteration ─────────────────────────────────────────────────────

    /// Acceptable `repeat` iterables: sequences, text (by code point), maps
    /// (as key/value pairs), integer ranges, and generators (driven to
    /// exhaustion).
    fn iter_values(&self, value: &Value, span: Span) -> Exec<Vec<Value>> {
        if let Value::Map(map) = value {
            return Ok(map
                .borrow()
                .iter()
                .map(|(k, v)| Value::list(vec![k.clone(), v.clone()]))
                .collect());
        }
        if let Value::Generator(state) = value {
            return generator::drain(state);
        }
        match value {
            Value::List(items) => Ok(items.borrow().clone()),
            Value::Text(s) => Ok(s.chars().map(|c| Value::text(c.to_string())).collect()),
            Value::Range(start, end) => Ok(range_items(*start, *end)),
            other => Err(error_at(
                RuntimeErrorKind::Type,
                format!("Cannot iterate over {}", other.type_name()),
                span,
            )),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

// ── Free helpers ──────────────────────────────────────────────────────

pub(crate) fn lit_value(lit: &Lit) -> Value {
    match lit {
        Lit::None => Value::None,
        Lit::Bool(b) => Value::Bool(*b),
        Lit::Int(i) => Value::Int(*i),
        Lit::Float(f) => Value::Float(*f),
        Lit::Text(s) => Value::text(s.clone()),
    }
}

/// Values a spread element expands: sequences, ranges, generators (driven
/// to exhaustion), and maps (by key). Text is spread-opaque.
fn spread_values(value: &Value) -> Exec<Option<Vec<Value>>> {
    match value {
        Value::Text(_) => Ok(None),
        Value::Generator(state) => Ok(Some(generator::drain(state)?)),
        other => Ok(crate::value::generic_iter(other)),
    }
}

enum IndexOutcome {
    At(usize),
    OutOfRange,
    NotAnInt,
}

/// Resolve an integer index against a length, counting negatives from the
/// end.
fn try_index(index: &Value, len: usize) -> IndexOutcome {
    let Value::Int(i) = index else {
        return IndexOutcome::NotAnInt;
    };
    let resolved = if *i < 0 { *i + len as i64 } else { *i };
    if resolved < 0 || resolved >= len as i64 {
        return IndexOutcome::OutOfRange;
    }
    IndexOutcome::At(resolved as usize)
}

fn resolve_index(index: &Value, len: usize, span: Span) -> Exec<usize> {
    match try_index(index, len) {
        IndexOutcome::At(i) => Ok(i),
        IndexOutcome::OutOfRange => Err(error_at(
            RuntimeErrorKind::Index,
            format!("Index {} out of range", index.to_text()),
            span,
        )),
        IndexOutcome::NotAnInt => Err(error_at(
            RuntimeErrorKind::Type,
            format!("Sequence index must be an integer, got {}", index.type_name()),
            span,
        )),
    }
}

/// Names a declaration statement introduces, for `share <decl>` export
/// recording.
fn declared_names(stmt: &Stmt) -> Vec<String> {
    match &stmt.kind {
        StmtKind::VarDecl { name, .. } => vec![name.clone()],
        StmtKind::FuncDecl(decl) => vec![decl.name.clone()],
        StmtKind::ClassDecl(decl) => vec![decl.name.clone()],
        StmtKind::Destructure { pattern, .. } => match pattern {
            DestructurePattern::List(bindings) => {
                bindings.iter().map(|b| b.name.clone()).collect()
            }
            DestructurePattern::Map(bindings) => {
                bindings.iter().map(|b| b.alias.clone()).collect()
            }
        },
        _ => Vec::new(),
    }
}
