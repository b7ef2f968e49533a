//! Tree-walking evaluator
//!
//! Executes parsed statements one at a time, driving the object model.
//! Strictness is ambient per call site: the interpreter threads the active
//! strict flag into every mutation, never inferring it from the target
//! object. Before each statement it bumps the statement counter and fires
//! the subscribed step hooks.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use stoat_ast::{
    BinaryOp, Expression, FunctionLiteral, LogicalOp, MemberProperty, ObjectPropertyKind, Program,
    Statement, StatementKind, UnaryOp, UpdateOp,
};

use crate::debug::{self, DebugSnapshot, StepHook};
use crate::environment::Environment;
use crate::error::{VmError, VmResult};
use crate::function::{FunctionData, FunctionKind, ScriptFunction};
use crate::object::JsObject;
use crate::property::{PropertyAttributes, PropertyDescriptor, PropertyKey};
use crate::value::{Value, number_to_string};

/// Step notifications nested deeper than this are skipped. An observer may
/// drive further evaluation from its callback; this caps runaway reentry
/// without rejecting legitimate nesting.
const MAX_STEP_REENTRY: usize = 32;

/// Normal or abrupt statement completion. A `Normal` completion carries the
/// statement's value when it has one (expression statements).
pub(crate) enum Completion {
    Normal(Option<Value>),
    Return(Value),
    Break,
    Continue,
}

/// ToPrimitive hint.
#[derive(Clone, Copy)]
enum Hint {
    Number,
    String,
}

/// A resolved assignment target: a named binding, or a member reference
/// whose base and key have already been evaluated.
enum AssignTarget {
    Binding(String),
    Member { base: Value, key: PropertyKey },
}

/// The evaluator plus the realm state it executes against.
pub struct Interpreter {
    global: Arc<JsObject>,
    global_env: Arc<Environment>,
    object_prototype: Arc<JsObject>,
    function_prototype: Arc<JsObject>,
    max_call_depth: usize,
    call_depth: AtomicUsize,
    statements_executed: AtomicU64,
    step_hooks: RwLock<Vec<StepHook>>,
    step_reentry: AtomicUsize,
    call_expression_stack: RwLock<Vec<String>>,
    frames: RwLock<Vec<Arc<Environment>>>,
}

impl Interpreter {
    /// Create an interpreter with a freshly bootstrapped realm:
    /// `Object.prototype`, `Function.prototype`, and an empty global object.
    pub fn new(max_call_depth: usize) -> Self {
        let object_prototype = JsObject::with_class(None, "Object");
        let function_prototype =
            JsObject::with_class(Some(object_prototype.clone()), "Function");
        let global = JsObject::new(Some(object_prototype.clone()));
        Self {
            global,
            global_env: Environment::global(),
            object_prototype,
            function_prototype,
            max_call_depth,
            call_depth: AtomicUsize::new(0),
            statements_executed: AtomicU64::new(0),
            step_hooks: RwLock::new(Vec::new()),
            step_reentry: AtomicUsize::new(0),
            call_expression_stack: RwLock::new(Vec::new()),
            frames: RwLock::new(Vec::new()),
        }
    }

    /// The global object.
    pub fn global(&self) -> &Arc<JsObject> {
        &self.global
    }

    /// The global environment.
    pub fn global_env(&self) -> &Arc<Environment> {
        &self.global_env
    }

    /// The realm's `Object.prototype`.
    pub fn object_prototype(&self) -> &Arc<JsObject> {
        &self.object_prototype
    }

    /// The realm's `Function.prototype`.
    pub fn function_prototype(&self) -> &Arc<JsObject> {
        &self.function_prototype
    }

    /// Statements executed since the interpreter was created. Monotonic;
    /// never consulted by engine logic.
    pub fn statement_count(&self) -> u64 {
        self.statements_executed.load(Ordering::Relaxed)
    }

    /// Subscribe a step hook, invoked synchronously before each statement.
    pub fn add_step_hook(&self, hook: StepHook) {
        self.step_hooks.write().push(hook);
    }

    /// Build a snapshot of live execution state for `statement`.
    pub fn snapshot(&self, statement: &Statement) -> DebugSnapshot {
        let mut locals = FxHashMap::default();
        if let Some(frame) = self.frames.read().last() {
            let mut env = Some(frame.clone());
            while let Some(current) = env {
                // The global environment is reported separately.
                if Arc::ptr_eq(&current, &self.global_env) {
                    break;
                }
                current.collect_into(&mut locals);
                env = current.parent().cloned();
            }
        }
        locals.remove("this");

        let mut globals = FxHashMap::default();
        self.global_env.collect_into(&mut globals);

        DebugSnapshot {
            statement: statement.clone(),
            call_stack: self.call_expression_stack.read().clone(),
            locals,
            globals,
        }
    }

    /// Execute a parsed program against the accumulated global state.
    pub fn execute_program(&self, program: &Program) -> VmResult<Value> {
        Self::hoist_var_declarations(&self.global_env, &program.body);
        let completion = self.exec_statements(&program.body, &self.global_env, program.strict)?;
        Ok(match completion {
            Completion::Normal(value) => value.unwrap_or_default(),
            Completion::Return(value) => value,
            Completion::Break | Completion::Continue => Value::undefined(),
        })
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Bind every `var`-declared name in a function (or program) body to
    /// `undefined` before execution. `var` scoping is function-level, so
    /// the walk descends into blocks, loops, and try arms but never into
    /// nested function bodies. Already-present bindings are left alone.
    fn hoist_var_declarations(env: &Arc<Environment>, statements: &[Statement]) {
        for statement in statements {
            Self::hoist_vars_in(env, statement);
        }
    }

    fn hoist_vars_in(env: &Arc<Environment>, statement: &Statement) {
        match &statement.kind {
            StatementKind::VarDeclaration(declarators) => {
                for declarator in declarators {
                    if !env.has_own(&declarator.name) {
                        env.declare(declarator.name.clone(), Value::undefined());
                    }
                }
            }
            StatementKind::Block(body) => Self::hoist_var_declarations(env, body),
            StatementKind::If {
                consequent,
                alternate,
                ..
            } => {
                Self::hoist_vars_in(env, consequent);
                if let Some(alternate) = alternate {
                    Self::hoist_vars_in(env, alternate);
                }
            }
            StatementKind::While { body, .. } | StatementKind::DoWhile { body, .. } => {
                Self::hoist_vars_in(env, body);
            }
            StatementKind::For { init, body, .. } => {
                if let Some(init) = init {
                    Self::hoist_vars_in(env, init);
                }
                Self::hoist_vars_in(env, body);
            }
            StatementKind::Try {
                block,
                handler,
                finalizer,
                ..
            } => {
                Self::hoist_var_declarations(env, block);
                if let Some(handler) = handler {
                    Self::hoist_var_declarations(env, handler);
                }
                if let Some(finalizer) = finalizer {
                    Self::hoist_var_declarations(env, finalizer);
                }
            }
            _ => {}
        }
    }

    fn notify_step(&self, statement: &Statement) {
        self.statements_executed.fetch_add(1, Ordering::Relaxed);

        if self.step_reentry.load(Ordering::Relaxed) >= MAX_STEP_REENTRY {
            return;
        }
        // Clone the hook list so no lock is held while observers run; an
        // observer may itself drive nested evaluation.
        let hooks: Vec<StepHook> = self.step_hooks.read().clone();
        if hooks.is_empty() {
            return;
        }
        self.step_reentry.fetch_add(1, Ordering::Relaxed);
        for hook in &hooks {
            hook(statement);
        }
        self.step_reentry.fetch_sub(1, Ordering::Relaxed);
    }

    fn exec_statements(
        &self,
        statements: &[Statement],
        env: &Arc<Environment>,
        strict: bool,
    ) -> VmResult<Completion> {
        // Function declarations hoist to the top of their statement list.
        for statement in statements {
            if let StatementKind::FunctionDeclaration(literal) = &statement.kind {
                let function = self.instantiate_function(literal, env, strict);
                let name = literal.name.clone().unwrap_or_default();
                env.declare(name, Value::object(function));
            }
        }

        let mut last = None;
        for statement in statements {
            match self.run_statement(statement, env, strict)? {
                Completion::Normal(value) => {
                    if value.is_some() {
                        last = value;
                    }
                }
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal(last))
    }

    fn run_statement(
        &self,
        statement: &Statement,
        env: &Arc<Environment>,
        strict: bool,
    ) -> VmResult<Completion> {
        self.notify_step(statement);
        self.exec_statement(statement, env, strict)
    }

    fn exec_statement(
        &self,
        statement: &Statement,
        env: &Arc<Environment>,
        strict: bool,
    ) -> VmResult<Completion> {
        match &statement.kind {
            StatementKind::Expression(expression) => {
                let value = self.eval_expression(expression, env, strict)?;
                Ok(Completion::Normal(Some(value)))
            }
            StatementKind::VarDeclaration(declarators) => {
                for declarator in declarators {
                    match &declarator.init {
                        Some(init) => {
                            let value = self.eval_expression(init, env, strict)?;
                            env.declare(declarator.name.clone(), value);
                        }
                        // A bare redeclaration must not clobber an
                        // existing binding.
                        None if env.has_own(&declarator.name) => {}
                        None => env.declare(declarator.name.clone(), Value::undefined()),
                    }
                }
                Ok(Completion::Normal(None))
            }
            StatementKind::FunctionDeclaration(_) => Ok(Completion::Normal(None)),
            StatementKind::Block(statements) => self.exec_statements(statements, env, strict),
            StatementKind::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval_expression(test, env, strict)?.to_boolean() {
                    self.run_statement(consequent, env, strict)
                } else if let Some(alternate) = alternate {
                    self.run_statement(alternate, env, strict)
                } else {
                    Ok(Completion::Normal(None))
                }
            }
            StatementKind::While { test, body } => {
                loop {
                    if !self.eval_expression(test, env, strict)?.to_boolean() {
                        break;
                    }
                    match self.run_statement(body, env, strict)? {
                        Completion::Break => break,
                        Completion::Continue | Completion::Normal(_) => {}
                        abrupt => return Ok(abrupt),
                    }
                }
                Ok(Completion::Normal(None))
            }
            StatementKind::DoWhile { body, test } => {
                loop {
                    match self.run_statement(body, env, strict)? {
                        Completion::Break => break,
                        Completion::Continue | Completion::Normal(_) => {}
                        abrupt => return Ok(abrupt),
                    }
                    if !self.eval_expression(test, env, strict)?.to_boolean() {
                        break;
                    }
                }
                Ok(Completion::Normal(None))
            }
            StatementKind::For {
                init,
                test,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.run_statement(init, env, strict)?;
                }
                loop {
                    if let Some(test) = test
                        && !self.eval_expression(test, env, strict)?.to_boolean()
                    {
                        break;
                    }
                    match self.run_statement(body, env, strict)? {
                        Completion::Break => break,
                        Completion::Continue | Completion::Normal(_) => {}
                        abrupt => return Ok(abrupt),
                    }
                    if let Some(update) = update {
                        self.eval_expression(update, env, strict)?;
                    }
                }
                Ok(Completion::Normal(None))
            }
            StatementKind::Return(argument) => {
                let value = match argument {
                    Some(expression) => self.eval_expression(expression, env, strict)?,
                    None => Value::undefined(),
                };
                Ok(Completion::Return(value))
            }
            StatementKind::Throw(expression) => {
                let value = self.eval_expression(expression, env, strict)?;
                Err(VmError::exception(value))
            }
            StatementKind::Try {
                block,
                param,
                handler,
                finalizer,
            } => self.exec_try(block, param.as_deref(), handler, finalizer, env, strict),
            StatementKind::Break => Ok(Completion::Break),
            StatementKind::Continue => Ok(Completion::Continue),
            StatementKind::Empty => Ok(Completion::Normal(None)),
        }
    }

    fn exec_try(
        &self,
        block: &[Statement],
        param: Option<&str>,
        handler: &Option<Vec<Statement>>,
        finalizer: &Option<Vec<Statement>>,
        env: &Arc<Environment>,
        strict: bool,
    ) -> VmResult<Completion> {
        let mut result = self.exec_statements(block, env, strict);

        if let Err(error) = &result
            && let Some(handler) = handler
            // Engine-invariant failures are implementation bugs, not
            // language-level errors; script may not catch them.
            && !matches!(error, VmError::InternalError(_))
        {
            let thrown = self.error_value(error);
            let catch_env = Environment::child(env);
            if let Some(param) = param {
                catch_env.declare(param, thrown);
            }
            result = self.exec_statements(handler, &catch_env, strict);
        }

        if let Some(finalizer) = finalizer {
            match self.exec_statements(finalizer, env, strict)? {
                // An abrupt finally completion overrides the try result.
                Completion::Normal(_) => {}
                abrupt => return Ok(abrupt),
            }
        }

        result
    }

    /// Convert a language-level failure into the value `catch` binds.
    /// Thrown values pass through unchanged; spec-mandated errors
    /// materialize as `Error`-class objects with `name` and `message`.
    pub fn error_value(&self, error: &VmError) -> Value {
        if let VmError::Exception(thrown) = error {
            return thrown.value.clone();
        }
        let message = match error {
            VmError::TypeError(m)
            | VmError::ReferenceError(m)
            | VmError::RangeError(m)
            | VmError::SyntaxError(m)
            | VmError::InternalError(m) => m.clone(),
            VmError::StackOverflow => "Maximum call stack size exceeded".to_string(),
            VmError::Exception(_) => unreachable!("handled above"),
        };
        let object = JsObject::with_class(Some(self.object_prototype.clone()), "Error");
        object.define_data("name", Value::string(error.kind_name()));
        object.define_data("message", Value::string(message));
        Value::object(object)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn eval_expression(
        &self,
        expression: &Expression,
        env: &Arc<Environment>,
        strict: bool,
    ) -> VmResult<Value> {
        match expression {
            Expression::Number(n) => Ok(Value::number(*n)),
            Expression::String(s) => Ok(Value::string(s.as_str())),
            Expression::Boolean(b) => Ok(Value::boolean(*b)),
            Expression::Null => Ok(Value::null()),
            Expression::This => Ok(env
                .lookup("this")
                .unwrap_or_else(|| Value::object(self.global.clone()))),
            Expression::Identifier(name) => env
                .lookup(name)
                .ok_or_else(|| VmError::reference_error(format!("{name} is not defined"))),
            Expression::Array(elements) => self.eval_array_literal(elements, env, strict),
            Expression::Object(properties) => self.eval_object_literal(properties, env, strict),
            Expression::Function(literal) => {
                Ok(Value::object(self.instantiate_function(literal, env, strict)))
            }
            Expression::Unary { op, operand } => self.eval_unary(*op, operand, env, strict),
            Expression::Update { op, prefix, target } => {
                self.eval_update(*op, *prefix, target, env, strict)
            }
            Expression::Binary { op, left, right } => {
                let left = self.eval_expression(left, env, strict)?;
                let right = self.eval_expression(right, env, strict)?;
                self.apply_binary(*op, left, right)
            }
            Expression::Logical { op, left, right } => {
                let left = self.eval_expression(left, env, strict)?;
                match op {
                    LogicalOp::And if !left.to_boolean() => Ok(left),
                    LogicalOp::Or if left.to_boolean() => Ok(left),
                    _ => self.eval_expression(right, env, strict),
                }
            }
            Expression::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval_expression(test, env, strict)?.to_boolean() {
                    self.eval_expression(consequent, env, strict)
                } else {
                    self.eval_expression(alternate, env, strict)
                }
            }
            Expression::Assign { op, target, value } => {
                let target = self.resolve_target(target, env, strict)?;
                let value = match op {
                    None => self.eval_expression(value, env, strict)?,
                    Some(op) => {
                        let current = self.read_target(&target, env)?;
                        let operand = self.eval_expression(value, env, strict)?;
                        self.apply_binary(*op, current, operand)?
                    }
                };
                self.write_target(&target, value.clone(), env, strict)?;
                Ok(value)
            }
            Expression::Call { callee, args } => self.eval_call(callee, args, env, strict),
            Expression::New { callee, args } => {
                let constructor = self.eval_expression(callee, env, strict)?;
                let mut argv: SmallVec<[Value; 8]> = SmallVec::new();
                for arg in args {
                    argv.push(self.eval_expression(arg, env, strict)?);
                }
                self.construct(&constructor, &argv)
            }
            Expression::Member { object, property } => {
                let base = self.eval_expression(object, env, strict)?;
                let key = self.member_key(property, env, strict)?;
                self.get_member(&base, &key)
            }
        }
    }

    fn eval_array_literal(
        &self,
        elements: &[Expression],
        env: &Arc<Environment>,
        strict: bool,
    ) -> VmResult<Value> {
        let array = JsObject::with_class(Some(self.object_prototype.clone()), "Array");
        for (index, element) in elements.iter().enumerate() {
            let value = self.eval_expression(element, env, strict)?;
            array.define_data(index as u32, value);
        }
        array.define_own_property(
            PropertyKey::string("length"),
            PropertyDescriptor::data_with_attrs(
                Value::number(elements.len() as f64),
                PropertyAttributes {
                    writable: true,
                    enumerable: false,
                    configurable: false,
                },
            ),
        );
        Ok(Value::object(array))
    }

    fn eval_object_literal(
        &self,
        properties: &[stoat_ast::ObjectProperty],
        env: &Arc<Environment>,
        strict: bool,
    ) -> VmResult<Value> {
        let object = JsObject::new(Some(self.object_prototype.clone()));
        for property in properties {
            let key = PropertyKey::string(&property.name.as_key_string());
            match &property.kind {
                ObjectPropertyKind::Init(value) => {
                    let value = self.eval_expression(value, env, strict)?;
                    object.define_own_property(key, PropertyDescriptor::data(value));
                }
                ObjectPropertyKind::Get(literal) => {
                    let getter = self.instantiate_function(literal, env, strict);
                    if let Some(data) = getter.function_data() {
                        data.set_function_name(&key, false)?;
                    }
                    let descriptor =
                        PropertyDescriptor::accessor(Some(Value::object(getter)), None);
                    object.define_own_property(key, descriptor);
                }
                ObjectPropertyKind::Set(literal) => {
                    let setter = self.instantiate_function(literal, env, strict);
                    if let Some(data) = setter.function_data() {
                        data.set_function_name(&key, false)?;
                    }
                    let descriptor =
                        PropertyDescriptor::accessor(None, Some(Value::object(setter)));
                    object.define_own_property(key, descriptor);
                }
            }
        }
        Ok(Value::object(object))
    }

    fn eval_unary(
        &self,
        op: UnaryOp,
        operand: &Expression,
        env: &Arc<Environment>,
        strict: bool,
    ) -> VmResult<Value> {
        match op {
            UnaryOp::TypeOf => {
                // `typeof unresolvable` is "undefined", not a ReferenceError.
                if let Expression::Identifier(name) = operand {
                    return Ok(Value::string(
                        env.lookup(name).map_or("undefined", |v| v.type_of()),
                    ));
                }
                let value = self.eval_expression(operand, env, strict)?;
                Ok(Value::string(value.type_of()))
            }
            UnaryOp::Delete => self.eval_delete(operand, env, strict),
            UnaryOp::Minus => {
                let value = self.eval_expression(operand, env, strict)?;
                Ok(Value::number(-self.to_number_value(&value)?))
            }
            UnaryOp::Plus => {
                let value = self.eval_expression(operand, env, strict)?;
                Ok(Value::number(self.to_number_value(&value)?))
            }
            UnaryOp::Not => {
                let value = self.eval_expression(operand, env, strict)?;
                Ok(Value::boolean(!value.to_boolean()))
            }
            UnaryOp::Void => {
                self.eval_expression(operand, env, strict)?;
                Ok(Value::undefined())
            }
        }
    }

    fn eval_delete(
        &self,
        operand: &Expression,
        env: &Arc<Environment>,
        strict: bool,
    ) -> VmResult<Value> {
        match operand {
            Expression::Member { object, property } => {
                let base = self.eval_expression(object, env, strict)?;
                let key = self.member_key(property, env, strict)?;
                let Some(target) = base.as_object() else {
                    return Ok(Value::boolean(true));
                };
                let removed = target.remove_own_property(&key);
                if !removed && strict {
                    return Err(VmError::type_error(format!(
                        "Cannot delete property '{key}' of {}",
                        base.to_display_string()
                    )));
                }
                Ok(Value::boolean(removed))
            }
            // `delete name` is false for bound names, true otherwise.
            Expression::Identifier(name) => Ok(Value::boolean(!env.has(name))),
            other => {
                self.eval_expression(other, env, strict)?;
                Ok(Value::boolean(true))
            }
        }
    }

    fn eval_update(
        &self,
        op: UpdateOp,
        prefix: bool,
        target: &Expression,
        env: &Arc<Environment>,
        strict: bool,
    ) -> VmResult<Value> {
        let target = self.resolve_target(target, env, strict)?;
        let current = self.read_target(&target, env)?;
        let old = self.to_number_value(&current)?;
        let new = match op {
            UpdateOp::Increment => old + 1.0,
            UpdateOp::Decrement => old - 1.0,
        };
        self.write_target(&target, Value::number(new), env, strict)?;
        Ok(Value::number(if prefix { new } else { old }))
    }

    /// Evaluate an assignment target's base and key exactly once, so a
    /// read-modify-write never reruns their side effects.
    fn resolve_target(
        &self,
        target: &Expression,
        env: &Arc<Environment>,
        strict: bool,
    ) -> VmResult<AssignTarget> {
        match target {
            Expression::Identifier(name) => Ok(AssignTarget::Binding(name.clone())),
            Expression::Member { object, property } => {
                let base = self.eval_expression(object, env, strict)?;
                let key = self.member_key(property, env, strict)?;
                Ok(AssignTarget::Member { base, key })
            }
            _ => Err(VmError::type_error("invalid assignment target")),
        }
    }

    fn read_target(&self, target: &AssignTarget, env: &Arc<Environment>) -> VmResult<Value> {
        match target {
            AssignTarget::Binding(name) => env
                .lookup(name)
                .ok_or_else(|| VmError::reference_error(format!("{name} is not defined"))),
            AssignTarget::Member { base, key } => self.get_member(base, key),
        }
    }

    fn write_target(
        &self,
        target: &AssignTarget,
        value: Value,
        env: &Arc<Environment>,
        strict: bool,
    ) -> VmResult<()> {
        match target {
            AssignTarget::Binding(name) => {
                if env.assign(name, value.clone()) {
                    return Ok(());
                }
                if strict {
                    return Err(VmError::reference_error(format!("{name} is not defined")));
                }
                // Sloppy assignment to an unresolvable name creates a global.
                self.global_env.declare(name.clone(), value);
                Ok(())
            }
            AssignTarget::Member { base, key } => {
                self.set_member(base, key.clone(), value, strict)
            }
        }
    }

    fn member_key(
        &self,
        property: &MemberProperty,
        env: &Arc<Environment>,
        strict: bool,
    ) -> VmResult<PropertyKey> {
        match property {
            MemberProperty::Dot(name) => Ok(PropertyKey::string(name)),
            MemberProperty::Computed(expression) => {
                let value = self.eval_expression(expression, env, strict)?;
                self.to_property_key(&value)
            }
        }
    }

    /// ToPropertyKey.
    pub fn to_property_key(&self, value: &Value) -> VmResult<PropertyKey> {
        match value {
            Value::String(s) => Ok(PropertyKey::string(s)),
            Value::Symbol(s) => Ok(PropertyKey::symbol(s.clone())),
            Value::Number(n) => {
                if n.fract() == 0.0 && *n >= 0.0 && *n < u32::MAX as f64 {
                    Ok(PropertyKey::index(*n as u32))
                } else {
                    Ok(PropertyKey::string(&number_to_string(*n)))
                }
            }
            other => {
                let primitive = self.to_primitive(other, Hint::String)?;
                if let Value::Symbol(s) = &primitive {
                    Ok(PropertyKey::symbol(s.clone()))
                } else {
                    Ok(PropertyKey::string(&primitive.to_js_string()?))
                }
            }
        }
    }

    /// Property read through an arbitrary base value. Primitives other than
    /// `undefined`/`null` have no own properties here (no wrapper objects),
    /// so reads on them resolve to `undefined`.
    pub fn get_member(&self, base: &Value, key: &PropertyKey) -> VmResult<Value> {
        match base {
            Value::Object(object) => object.get(key, base, self),
            Value::Undefined | Value::Null => Err(VmError::type_error(format!(
                "Cannot read property '{key}' of {}",
                base.to_display_string()
            ))),
            _ => Ok(Value::undefined()),
        }
    }

    /// Property write through an arbitrary base value.
    pub fn set_member(
        &self,
        base: &Value,
        key: PropertyKey,
        value: Value,
        strict: bool,
    ) -> VmResult<()> {
        match base {
            Value::Object(object) => object.set(key, value, base, strict, self),
            Value::Undefined | Value::Null => Err(VmError::type_error(format!(
                "Cannot set property '{key}' of {}",
                base.to_display_string()
            ))),
            _ if strict => Err(VmError::type_error(format!(
                "Cannot create property '{key}' on {}",
                base.type_of()
            ))),
            _ => Ok(()),
        }
    }

    fn eval_call(
        &self,
        callee: &Expression,
        args: &[Expression],
        env: &Arc<Environment>,
        strict: bool,
    ) -> VmResult<Value> {
        let (function, this) = match callee {
            Expression::Member { object, property } => {
                let base = self.eval_expression(object, env, strict)?;
                let key = self.member_key(property, env, strict)?;
                let function = self.get_member(&base, &key)?;
                (function, base)
            }
            _ => (self.eval_expression(callee, env, strict)?, Value::undefined()),
        };

        let mut argv: SmallVec<[Value; 8]> = SmallVec::new();
        for arg in args {
            argv.push(self.eval_expression(arg, env, strict)?);
        }

        self.call_expression_stack
            .write()
            .push(debug::render_call_expression(callee, args));
        let result = self.call_function(&function, this, &argv);
        self.call_expression_stack.write().pop();
        result
    }

    /// The call protocol shared by expression evaluation, accessors, and
    /// `construct`. Thrown values propagate unchanged.
    pub fn call_function(&self, callee: &Value, this: Value, args: &[Value]) -> VmResult<Value> {
        let Some(function) = callee.as_object().filter(|o| o.is_function()) else {
            return Err(VmError::type_error(format!(
                "{} is not a function",
                callee.to_display_string()
            )));
        };
        let data = function
            .function_data()
            .ok_or_else(|| VmError::internal("callable object lost its function data"))?;

        if self.call_depth.fetch_add(1, Ordering::Relaxed) >= self.max_call_depth {
            self.call_depth.fetch_sub(1, Ordering::Relaxed);
            return Err(VmError::StackOverflow);
        }
        let result = match data.kind() {
            FunctionKind::Native(native) => native(self, &this, args),
            FunctionKind::Script(script) => self.call_script(script, data, this, args),
        };
        self.call_depth.fetch_sub(1, Ordering::Relaxed);
        result
    }

    fn call_script(
        &self,
        script: &ScriptFunction,
        data: &FunctionData,
        this: Value,
        args: &[Value],
    ) -> VmResult<Value> {
        let env = Environment::child(&script.scope);

        // Strict callees see `this` as passed; sloppy callees substitute
        // the global object for a nullish `this`.
        let this = if data.is_strict() || !this.is_nullish() {
            this
        } else {
            Value::object(self.global.clone())
        };
        env.declare("this", this);

        for (index, param) in script.params.iter().enumerate() {
            env.declare(param.clone(), args.get(index).cloned().unwrap_or_default());
        }
        if !env.has_own("arguments") {
            env.declare("arguments", self.make_arguments_object(args));
        }
        Self::hoist_var_declarations(&env, &script.body);

        self.frames.write().push(env.clone());
        let completion = self.exec_statements(&script.body, &env, data.is_strict());
        self.frames.write().pop();

        Ok(match completion? {
            Completion::Return(value) => value,
            _ => Value::undefined(),
        })
    }

    fn make_arguments_object(&self, args: &[Value]) -> Value {
        let arguments = JsObject::with_class(Some(self.object_prototype.clone()), "Arguments");
        for (index, value) in args.iter().enumerate() {
            arguments.define_data(index as u32, value.clone());
        }
        arguments.define_own_property(
            PropertyKey::string("length"),
            PropertyDescriptor::data_with_attrs(
                Value::number(args.len() as f64),
                PropertyAttributes::hidden(),
            ),
        );
        Value::object(arguments)
    }

    /// The `new` protocol: allocate an instance linked to the constructor's
    /// `.prototype`, call, and keep an explicit object return if there is one.
    pub fn construct(&self, callee: &Value, args: &[Value]) -> VmResult<Value> {
        let Some(function) = callee.as_object().filter(|o| o.is_function()) else {
            return Err(VmError::type_error(format!(
                "{} is not a constructor",
                callee.to_display_string()
            )));
        };

        let prototype = function.get(&PropertyKey::string("prototype"), callee, self)?;
        let prototype = prototype
            .as_object()
            .cloned()
            .unwrap_or_else(|| self.object_prototype.clone());
        let instance = JsObject::new(Some(prototype));

        let result = self.call_function(callee, Value::object(instance.clone()), args)?;
        Ok(if result.is_object() {
            result
        } else {
            Value::object(instance)
        })
    }

    /// Create a script function object: callable payload, `length`,
    /// `.prototype` with a `constructor` back-reference, and `name`.
    pub fn instantiate_function(
        &self,
        literal: &FunctionLiteral,
        env: &Arc<Environment>,
        ambient_strict: bool,
    ) -> Arc<JsObject> {
        let strict = literal.strict || ambient_strict;
        let script = ScriptFunction {
            params: literal.params.clone(),
            body: literal.body.clone(),
            scope: env.clone(),
        };
        let data = FunctionData::script(script, strict);
        data.set_length(literal.params.len() as u32);

        let function = JsObject::function(Some(self.function_prototype.clone()), data);

        let prototype = JsObject::new(Some(self.object_prototype.clone()));
        prototype.define_own_property(
            PropertyKey::string("constructor"),
            PropertyDescriptor::data_with_attrs(
                Value::object(function.clone()),
                PropertyAttributes::hidden(),
            ),
        );
        if let Some(data) = function.function_data() {
            data.set_prototype_property(Value::object(prototype));
            if let Some(name) = &literal.name {
                // Infallible without throw_if_exists.
                let _ = data.set_function_name(&PropertyKey::string(name), false);
            }
        }
        function
    }

    /// Create a native function object with `length` and `name` installed.
    pub fn create_native_function(
        &self,
        name: &str,
        length: u32,
        body: crate::function::NativeFn,
    ) -> Arc<JsObject> {
        let data = FunctionData::native(body);
        data.set_length(length);
        let _ = data.set_function_name(&PropertyKey::string(name), false);
        JsObject::function(Some(self.function_prototype.clone()), data)
    }

    // ------------------------------------------------------------------
    // Abstract operations
    // ------------------------------------------------------------------

    /// ToPrimitive: try `valueOf`/`toString` (order per hint) until one
    /// returns a primitive.
    fn to_primitive(&self, value: &Value, hint: Hint) -> VmResult<Value> {
        if !value.is_object() {
            return Ok(value.clone());
        }
        let methods: [&str; 2] = match hint {
            Hint::Number => ["valueOf", "toString"],
            Hint::String => ["toString", "valueOf"],
        };
        for name in methods {
            let method = self.get_member(value, &PropertyKey::string(name))?;
            if method.is_callable() {
                let result = self.call_function(&method, value.clone(), &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        // No own conversion methods; fall back to the class tag rendering.
        value.to_js_string().map(Value::String)
    }

    fn to_number_value(&self, value: &Value) -> VmResult<f64> {
        self.to_primitive(value, Hint::Number)?.to_number()
    }

    fn apply_binary(&self, op: BinaryOp, left: Value, right: Value) -> VmResult<Value> {
        match op {
            BinaryOp::Add => {
                let left = self.to_primitive(&left, Hint::Number)?;
                let right = self.to_primitive(&right, Hint::Number)?;
                if left.as_str().is_some() || right.as_str().is_some() {
                    let mut result = left.to_js_string()?.to_string();
                    result.push_str(&right.to_js_string()?);
                    Ok(Value::string(result))
                } else {
                    Ok(Value::number(left.to_number()? + right.to_number()?))
                }
            }
            BinaryOp::Sub => Ok(Value::number(
                self.to_number_value(&left)? - self.to_number_value(&right)?,
            )),
            BinaryOp::Mul => Ok(Value::number(
                self.to_number_value(&left)? * self.to_number_value(&right)?,
            )),
            BinaryOp::Div => Ok(Value::number(
                self.to_number_value(&left)? / self.to_number_value(&right)?,
            )),
            BinaryOp::Mod => Ok(Value::number(
                self.to_number_value(&left)? % self.to_number_value(&right)?,
            )),
            BinaryOp::Eq => Ok(Value::boolean(self.loosely_equals(&left, &right)?)),
            BinaryOp::NotEq => Ok(Value::boolean(!self.loosely_equals(&left, &right)?)),
            BinaryOp::StrictEq => Ok(Value::boolean(left.strict_equals(&right))),
            BinaryOp::StrictNotEq => Ok(Value::boolean(!left.strict_equals(&right))),
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                self.compare(op, left, right)
            }
            BinaryOp::InstanceOf => {
                let Some(function) = right.as_object().filter(|o| o.is_function()) else {
                    return Err(VmError::type_error(
                        "Right-hand side of 'instanceof' is not callable",
                    ));
                };
                Ok(Value::boolean(function.has_instance(self, &right, &left)?))
            }
            BinaryOp::In => {
                let Some(object) = right.as_object() else {
                    return Err(VmError::type_error(
                        "Cannot use 'in' operator to search for a property in a non-object",
                    ));
                };
                let key = self.to_property_key(&left)?;
                Ok(Value::boolean(object.has_property(&key)?))
            }
        }
    }

    fn compare(&self, op: BinaryOp, left: Value, right: Value) -> VmResult<Value> {
        let left = self.to_primitive(&left, Hint::Number)?;
        let right = self.to_primitive(&right, Hint::Number)?;

        if let (Some(a), Some(b)) = (left.as_str(), right.as_str()) {
            let result = match op {
                BinaryOp::Lt => a < b,
                BinaryOp::LtEq => a <= b,
                BinaryOp::Gt => a > b,
                BinaryOp::GtEq => a >= b,
                _ => unreachable!(),
            };
            return Ok(Value::boolean(result));
        }

        let a = left.to_number()?;
        let b = right.to_number()?;
        if a.is_nan() || b.is_nan() {
            return Ok(Value::boolean(false));
        }
        let result = match op {
            BinaryOp::Lt => a < b,
            BinaryOp::LtEq => a <= b,
            BinaryOp::Gt => a > b,
            BinaryOp::GtEq => a >= b,
            _ => unreachable!(),
        };
        Ok(Value::boolean(result))
    }

    /// Abstract (loose) equality.
    fn loosely_equals(&self, left: &Value, right: &Value) -> VmResult<bool> {
        match (left, right) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => Ok(true),
            (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Boolean(_), Value::Boolean(_))
            | (Value::Symbol(_), Value::Symbol(_))
            | (Value::Object(_), Value::Object(_)) => Ok(left.strict_equals(right)),
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                Ok(left.to_number()? == right.to_number()?)
            }
            (Value::Boolean(_), _) => {
                self.loosely_equals(&Value::number(left.to_number()?), right)
            }
            (_, Value::Boolean(_)) => {
                self.loosely_equals(left, &Value::number(right.to_number()?))
            }
            (Value::Number(_) | Value::String(_) | Value::Symbol(_), Value::Object(_)) => {
                let primitive = self.to_primitive(right, Hint::Number)?;
                self.loosely_equals(left, &primitive)
            }
            (Value::Object(_), Value::Number(_) | Value::String(_) | Value::Symbol(_)) => {
                let primitive = self.to_primitive(left, Hint::Number)?;
                self.loosely_equals(&primitive, right)
            }
            _ => Ok(false),
        }
    }
}
