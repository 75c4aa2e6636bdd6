//! Tree-walking interpreter for the Tran language.
//!
//! Execution starts at the unique shared, non-private, parameterless entry
//! method (`start` by default). Every call gets a fresh local scope; instance
//! code also sees the members of its receiving object. Any failure aborts the
//! whole run.

use std::collections::HashMap;

use crate::ast::*;
use crate::config::RunOptions;
use crate::error::{Error, Result};
use crate::stdlib::{Host, LibraryEnv, LibraryRegistry, StdoutHost};
use crate::value::{Heap, ObjectId, Value, ValueKind};

/// Scope of one executing method or constructor.
struct Frame<'a> {
    /// Class whose code is running
    class: &'a ClassDecl,
    /// Receiving object; `None` in shared methods
    this: Option<ObjectId>,
    locals: HashMap<String, Value>,
}

/// What a call site resolved to.
enum Callee<'a> {
    User {
        class: &'a ClassDecl,
        method: &'a MethodDecl,
        this: Option<ObjectId>,
    },
    Builtin {
        library: String,
    },
}

/// The Tran interpreter.
pub struct Interpreter<'a> {
    unit: &'a TranUnit,
    libraries: LibraryRegistry,
    heap: Heap,
    host: &'a mut dyn Host,
    options: RunOptions,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(unit: &'a TranUnit, host: &'a mut dyn Host) -> Self {
        Self::with_options(unit, host, RunOptions::default())
    }

    pub fn with_options(unit: &'a TranUnit, host: &'a mut dyn Host, options: RunOptions) -> Self {
        Self {
            unit,
            libraries: LibraryRegistry::new(),
            heap: Heap::new(),
            host,
            options,
            depth: 0,
        }
    }

    /// Find the entry method and execute it.
    pub fn run(&mut self) -> Result<()> {
        let unit = self.unit;

        for class in &unit.classes {
            if self.libraries.has(&class.name.name) {
                return Err(Error::runtime(format!(
                    "class '{}' conflicts with a built-in class",
                    class.name.name
                )));
            }
        }

        let (class, method) = find_entry(unit, &self.options.entry)?;
        tracing::debug!(class = %class.name.name, method = %method.name(), "resolved entry method");
        self.invoke_method(class, method, None, Vec::new())?;
        Ok(())
    }

    /// Execute a method body and return its return variables in declaration order.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(class = %class.name.name, method = %method.name(), args = args.len())
    )]
    fn invoke_method(
        &mut self,
        class: &'a ClassDecl,
        method: &'a MethodDecl,
        this: Option<ObjectId>,
        args: Vec<Value>,
    ) -> Result<Vec<Value>> {
        let mut locals = HashMap::new();
        bind_parameters(&mut locals, method.parameters(), args)?;
        declare(&mut locals, method.returns());
        declare(&mut locals, &method.locals);

        let mut frame = Frame {
            class,
            this: if method.is_shared { None } else { this },
            locals,
        };

        self.enter()?;
        let result = self.execute_block(&mut frame, &method.statements);
        self.depth -= 1;
        result?;

        Ok(method
            .returns()
            .iter()
            .map(|r| {
                frame
                    .locals
                    .get(&r.name.name)
                    .cloned()
                    .unwrap_or_else(|| Value::default_for(&r.type_name.name))
            })
            .collect())
    }

    /// Allocate an instance of `class_name` and run its matching constructor.
    fn instantiate(&mut self, class_name: &str, args: Vec<Value>) -> Result<Value> {
        let unit = self.unit;
        let Some(class) = unit.class(class_name) else {
            if self.libraries.has(class_name) {
                return Err(Error::runtime(format!(
                    "cannot instantiate built-in class '{}'",
                    class_name
                )));
            }
            return Err(Error::runtime(format!("unknown class '{}'", class_name)));
        };

        let id = self.heap.allocate(class);
        tracing::debug!(class = %class_name, object = ?id, "allocated object");

        if class.constructors.is_empty() {
            if !args.is_empty() {
                return Err(Error::runtime(format!(
                    "class '{}' has no constructor taking ({})",
                    class_name,
                    kind_list(&args)
                )));
            }
            return Ok(Value::Object(id));
        }

        let Some(constructor) = class
            .constructors
            .iter()
            .find(|c| parameters_match(&c.parameters, &args))
        else {
            return Err(Error::runtime(format!(
                "no constructor of '{}' matches ({})",
                class_name,
                kind_list(&args)
            )));
        };

        tracing::debug!(class = %class_name, args = args.len(), "running constructor");
        let mut locals = HashMap::new();
        bind_parameters(&mut locals, &constructor.parameters, args)?;
        declare(&mut locals, &constructor.locals);
        let mut frame = Frame {
            class,
            this: Some(id),
            locals,
        };

        self.enter()?;
        let result = self.execute_block(&mut frame, &constructor.statements);
        self.depth -= 1;
        result?;

        Ok(Value::Object(id))
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.options.max_call_depth {
            return Err(Error::runtime(format!(
                "call depth limit of {} exceeded",
                self.options.max_call_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn execute_block(&mut self, frame: &mut Frame<'a>, statements: &'a [Statement]) -> Result<()> {
        for statement in statements {
            self.execute(frame, statement)?;
        }
        Ok(())
    }

    fn execute(&mut self, frame: &mut Frame<'a>, statement: &'a Statement) -> Result<()> {
        match statement {
            Statement::Assignment(assign) => {
                let value = self.evaluate(frame, &assign.expression)?;
                self.store(frame, &assign.target.name, value)
            }
            Statement::MethodCall(stmt) => {
                let values = self.call(frame, &stmt.call)?;
                if stmt.results.len() > values.len() {
                    return Err(Error::runtime(format!(
                        "'{}' returns {} value(s) but {} were bound",
                        stmt.call.display_name(),
                        values.len(),
                        stmt.results.len()
                    )));
                }
                for (target, value) in stmt.results.iter().zip(values) {
                    self.store(frame, &target.name, value)?;
                }
                Ok(())
            }
            Statement::If(stmt) => {
                if self.condition(frame, &stmt.condition, "if")? {
                    self.execute_block(frame, &stmt.statements)
                } else if let Some(else_statements) = &stmt.else_statements {
                    self.execute_block(frame, else_statements)
                } else {
                    Ok(())
                }
            }
            Statement::Loop(stmt) => self.execute_loop(frame, stmt),
        }
    }

    fn execute_loop(&mut self, frame: &mut Frame<'a>, stmt: &'a LoopStatement) -> Result<()> {
        match &stmt.control {
            LoopControl::Condition(condition) => loop {
                let keep_going = match self.evaluate(frame, condition)? {
                    Value::Boolean(b) => b,
                    other => {
                        return Err(Error::runtime(format!(
                            "loop condition must be boolean, found {}",
                            other.kind()
                        )))
                    }
                };
                if let Some(variable) = &stmt.variable {
                    self.store(frame, &variable.name, Value::Boolean(keep_going))?;
                }
                if !keep_going {
                    return Ok(());
                }
                tracing::trace!("loop iteration");
                self.execute_block(frame, &stmt.statements)?;
            },
            LoopControl::Times(count) => {
                let bound = match self.evaluate(frame, count)? {
                    Value::Number(n) => n,
                    other => {
                        return Err(Error::runtime(format!(
                            "times loop count must be a number, found {}",
                            other.kind()
                        )))
                    }
                };
                let mut counter = 1.0;
                while counter <= bound {
                    if let Some(variable) = &stmt.variable {
                        self.store(frame, &variable.name, Value::Number(counter))?;
                    }
                    tracing::trace!(counter, "loop iteration");
                    self.execute_block(frame, &stmt.statements)?;
                    counter += 1.0;
                }
                Ok(())
            }
        }
    }

    fn condition(&mut self, frame: &mut Frame<'a>, expr: &'a Expression, owner: &str) -> Result<bool> {
        match self.evaluate(frame, expr)? {
            Value::Boolean(b) => Ok(b),
            other => Err(Error::runtime(format!(
                "{} condition must be boolean, found {}",
                owner,
                other.kind()
            ))),
        }
    }

    fn evaluate(&mut self, frame: &mut Frame<'a>, expr: &'a Expression) -> Result<Value> {
        match expr {
            Expression::Number(n) => Ok(Value::Number(n.value)),
            Expression::String(s) => Ok(Value::String(s.value.clone())),
            Expression::Character(c) => Ok(Value::Character(c.value)),
            Expression::Boolean(b) => Ok(Value::Boolean(b.value)),
            Expression::Variable(var) => self.load(frame, &var.name),
            Expression::MethodCall(call) => {
                let values = self.call(frame, call)?;
                values.into_iter().next().ok_or_else(|| {
                    Error::runtime(format!(
                        "'{}' returns no value and cannot be used in an expression",
                        call.display_name()
                    ))
                })
            }
            Expression::New(new) => {
                let args = self.evaluate_all(frame, &new.arguments)?;
                self.instantiate(&new.class_name.name, args)
            }
            Expression::MathOp { left, op, right, .. } => {
                let left = self.evaluate(frame, left)?;
                let right = self.evaluate(frame, right)?;
                math(*op, left, right)
            }
            Expression::Compare { left, op, right, .. } => {
                let left = self.evaluate(frame, left)?;
                let right = self.evaluate(frame, right)?;
                compare(*op, &left, &right).map(Value::Boolean)
            }
            Expression::BooleanOp { left, op, right, .. } => {
                let left = self.boolean_operand(frame, left, *op)?;
                match (op, right) {
                    (BooleanOperator::Not, _) => Ok(Value::Boolean(!left)),
                    (BooleanOperator::And, _) if !left => Ok(Value::Boolean(false)),
                    (BooleanOperator::Or, _) if left => Ok(Value::Boolean(true)),
                    (_, Some(right)) => {
                        let right = self.boolean_operand(frame, right, *op)?;
                        Ok(Value::Boolean(right))
                    }
                    (_, None) => Err(Error::runtime(format!(
                        "operator '{}' is missing its right operand",
                        op.symbol()
                    ))),
                }
            }
        }
    }

    fn boolean_operand(
        &mut self,
        frame: &mut Frame<'a>,
        expr: &'a Expression,
        op: BooleanOperator,
    ) -> Result<bool> {
        match self.evaluate(frame, expr)? {
            Value::Boolean(b) => Ok(b),
            other => Err(Error::runtime(format!(
                "operator '{}' cannot be applied to {}",
                op.symbol(),
                other.kind()
            ))),
        }
    }

    fn evaluate_all(&mut self, frame: &mut Frame<'a>, exprs: &'a [Expression]) -> Result<Vec<Value>> {
        exprs.iter().map(|e| self.evaluate(frame, e)).collect()
    }

    /// Evaluate the arguments, resolve the target method and invoke it.
    fn call(&mut self, frame: &mut Frame<'a>, call: &'a MethodCall) -> Result<Vec<Value>> {
        let args = self.evaluate_all(frame, &call.arguments)?;
        match self.resolve_call(frame, call, &args)? {
            Callee::User {
                class,
                method,
                this,
            } => self.invoke_method(class, method, this, args),
            Callee::Builtin { library } => {
                let Some(lib) = self.libraries.get_mut(&library) else {
                    return Err(Error::runtime(format!("unknown class '{}'", library)));
                };
                tracing::debug!(class = %library, method = %call.method.name, args = args.len(), "calling built-in");
                let mut env = LibraryEnv {
                    heap: &self.heap,
                    host: &mut *self.host,
                };
                lib.call(&call.method.name, &args, &mut env)
            }
        }
    }

    /// Pick the first method, in declaration order, that structurally matches the call.
    fn resolve_call(&mut self, frame: &mut Frame<'a>, call: &'a MethodCall, args: &[Value]) -> Result<Callee<'a>> {
        let unit = self.unit;
        let name = call.method.name.as_str();

        let (class, this, shared_only) = match &call.receiver {
            None => (frame.class, frame.this, frame.this.is_none()),
            Some(receiver) => {
                let receiver = receiver.name.as_str();
                if let Some(value) = find_slot(&mut self.heap, frame, receiver) {
                    let value = value.clone();
                    let Some(id) = value.object_id() else {
                        return Err(match value.kind() {
                            ValueKind::Object => {
                                Error::runtime(format!("'{}' does not refer to an object", receiver))
                            }
                            kind => Error::runtime(format!("'{}' is a {}, not an object", receiver, kind)),
                        });
                    };
                    let class = self.class_of(id)?;
                    (class, Some(id), false)
                } else if let Some(class) = unit.class(receiver) {
                    (class, None, true)
                } else if let Some(library) = self.libraries.get(receiver) {
                    let found = library
                        .methods()
                        .iter()
                        .any(|m| m.name == name && m.shared && m.accepts(args.len()));
                    if !found {
                        return Err(Error::runtime(format!(
                            "no method matching {}({}) in class '{}'",
                            call.display_name(),
                            kind_list(args),
                            receiver
                        )));
                    }
                    return Ok(Callee::Builtin {
                        library: receiver.to_string(),
                    });
                } else {
                    return Err(Error::runtime(format!("unknown variable or class '{}'", receiver)));
                }
            }
        };

        let same_class = class.name.name == frame.class.name.name;
        let method = class.methods.iter().find(|m| {
            m.name() == name
                && (!shared_only || m.is_shared)
                && (!m.is_private || same_class)
                && parameters_match(m.parameters(), args)
        });

        match method {
            Some(method) => Ok(Callee::User {
                class,
                method,
                this,
            }),
            None => Err(Error::runtime(format!(
                "no method matching {}({}) in class '{}'",
                call.display_name(),
                kind_list(args),
                class.name.name
            ))),
        }
    }

    fn class_of(&self, id: ObjectId) -> Result<&'a ClassDecl> {
        let unit = self.unit;
        let object = self
            .heap
            .get(id)
            .ok_or_else(|| Error::runtime("reference to a missing object"))?;
        unit.class(&object.class_name)
            .ok_or_else(|| Error::runtime(format!("unknown class '{}'", object.class_name)))
    }

    fn load(&mut self, frame: &mut Frame<'a>, name: &str) -> Result<Value> {
        find_slot(&mut self.heap, frame, name)
            .map(|slot| slot.clone())
            .ok_or_else(|| unknown_variable(name))
    }

    fn store(&mut self, frame: &mut Frame<'a>, name: &str, value: Value) -> Result<()> {
        let slot = find_slot(&mut self.heap, frame, name).ok_or_else(|| unknown_variable(name))?;
        slot.assign(value, name)
    }
}

/// Locate the unique shared, non-private, parameterless method called `entry`.
pub fn find_entry<'u>(unit: &'u TranUnit, entry: &str) -> Result<(&'u ClassDecl, &'u MethodDecl)> {
    let mut candidates = unit.classes.iter().flat_map(|class| {
        class
            .methods
            .iter()
            .filter(move |m| m.name() == entry && m.is_shared && !m.is_private && m.parameters().is_empty())
            .map(move |m| (class, m))
    });

    let Some(found) = candidates.next() else {
        return Err(Error::runtime(format!(
            "no entry method found: expected a shared, non-private method '{}()'",
            entry
        )));
    };
    if let Some((other, _)) = candidates.next() {
        return Err(Error::runtime(format!(
            "entry method '{}' is declared in both '{}' and '{}'",
            entry, found.0.name.name, other.name.name
        )));
    }
    Ok(found)
}

/// Resolve a bare name: locals first, then the receiving object's members.
fn find_slot<'f>(heap: &'f mut Heap, frame: &'f mut Frame<'_>, name: &str) -> Option<&'f mut Value> {
    if frame.locals.contains_key(name) {
        return frame.locals.get_mut(name);
    }
    let id = frame.this?;
    heap.get_mut(id)?.members.get_mut(name)
}

fn unknown_variable(name: &str) -> Error {
    Error::runtime(format!("unknown variable '{}'", name))
}

fn declare(locals: &mut HashMap<String, Value>, decls: &[VariableDecl]) {
    for decl in decls {
        locals.insert(decl.name.name.clone(), Value::default_for(&decl.type_name.name));
    }
}

fn bind_parameters(locals: &mut HashMap<String, Value>, params: &[VariableDecl], args: Vec<Value>) -> Result<()> {
    for (param, arg) in params.iter().zip(args) {
        let mut slot = Value::default_for(&param.type_name.name);
        slot.assign(arg, &param.name.name)?;
        locals.insert(param.name.name.clone(), slot);
    }
    Ok(())
}

/// Same arity, and each argument has the kind of its parameter's default value.
fn parameters_match(params: &[VariableDecl], args: &[Value]) -> bool {
    params.len() == args.len()
        && params
            .iter()
            .zip(args)
            .all(|(param, arg)| ValueKind::of_type(&param.type_name.name) == arg.kind())
}

fn kind_list(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.kind().name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn math(op: MathOperator, left: Value, right: Value) -> Result<Value> {
    match (op, left, right) {
        (MathOperator::Add, Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        (op, Value::Number(a), Value::Number(b)) => match op {
            MathOperator::Add => Ok(Value::Number(a + b)),
            MathOperator::Subtract => Ok(Value::Number(a - b)),
            MathOperator::Multiply => Ok(Value::Number(a * b)),
            MathOperator::Divide | MathOperator::Modulo if b == 0.0 => {
                Err(Error::runtime(format!("division by zero in '{}'", op.symbol())))
            }
            MathOperator::Divide => Ok(Value::Number(a / b)),
            MathOperator::Modulo => Ok(Value::Number(a % b)),
        },
        (op, left, right) => Err(Error::runtime(format!(
            "operator '{}' cannot be applied to {} and {}",
            op.symbol(),
            left.kind(),
            right.kind()
        ))),
    }
}

fn compare(op: CompareOperator, left: &Value, right: &Value) -> Result<bool> {
    let mismatch = || {
        Error::runtime(format!(
            "operator '{}' cannot be applied to {} and {}",
            op.symbol(),
            left.kind(),
            right.kind()
        ))
    };

    match op {
        CompareOperator::Eq => left.same_as(right).ok_or_else(mismatch),
        CompareOperator::Ne => left.same_as(right).map(|same| !same).ok_or_else(mismatch),
        _ => {
            let ordering = match (left, right) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                (Value::Character(a), Value::Character(b)) => Some(a.cmp(b)),
                _ => return Err(mismatch()),
            };
            let Some(ordering) = ordering else {
                return Ok(false);
            };
            Ok(match op {
                CompareOperator::Lt => ordering.is_lt(),
                CompareOperator::Le => ordering.is_le(),
                CompareOperator::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
    }
}

/// Run a parsed program, writing console output to stdout.
pub fn run(unit: &TranUnit) -> Result<()> {
    let mut host = StdoutHost;
    run_with(unit, &mut host, RunOptions::default())
}

/// Run a parsed program against the given host.
pub fn run_with(unit: &TranUnit, host: &mut dyn Host, options: RunOptions) -> Result<()> {
    Interpreter::with_options(unit, host, options).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;
    use crate::stdlib::CaptureHost;

    fn run_capture(source: &str) -> Result<Vec<String>> {
        run_capture_with(source, RunOptions::default())
    }

    fn run_capture_with(source: &str, options: RunOptions) -> Result<Vec<String>> {
        let unit = parse(lex(source)?)?;
        let mut host = CaptureHost::new();
        run_with(&unit, &mut host, options)?;
        Ok(host.writes)
    }

    /// A program whose `start` method holds the given locals and body lines.
    fn program(locals: &[&str], lines: &str) -> String {
        let mut source = String::from("class Main\n    shared start()\n");
        for local in locals {
            source.push_str(&format!("        {local}\n"));
        }
        for line in lines.lines() {
            source.push_str(&format!("        {line}\n"));
        }
        source
    }

    fn runtime_message(source: &str) -> String {
        let err = run_capture(source).unwrap_err();
        assert!(err.is_runtime(), "expected runtime error, got {err:?}");
        err.message().to_string()
    }

    #[test]
    fn test_hello_world() {
        let writes = run_capture("class Hello\n    shared start()\n        console.write(\"hello\")\n").unwrap();
        assert_eq!(writes, vec!["hello"]);
    }

    #[test]
    fn test_times_loop_counts_from_one() {
        let writes = run_capture(&program(&["number i"], "loop i = 3.times\n    console.write(i)")).unwrap();
        assert_eq!(writes, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_times_loop_with_variable_bound() {
        let source = program(
            &["number n", "number total"],
            "n = 4\nloop n.times\n    total = total + 2\nconsole.write(total)",
        );
        assert_eq!(run_capture(&source).unwrap(), vec!["8"]);
    }

    #[test]
    fn test_missing_start_fails() {
        let message = runtime_message("class A\n    helper()\n        x = 1\n");
        assert!(message.contains("no entry method"));
    }

    #[test]
    fn test_start_must_be_shared_and_parameterless() {
        assert!(runtime_message("class A\n    start()\n        console.write(1)\n").contains("no entry method"));
        let source = "class A\n    shared start(number n)\n        console.write(n)\n";
        assert!(runtime_message(source).contains("no entry method"));
    }

    #[test]
    fn test_duplicate_start_fails() {
        let source = "class A\n    shared start()\n        console.write(1)\nclass B\n    shared start()\n        console.write(2)\n";
        assert!(runtime_message(source).contains("declared in both 'A' and 'B'"));
    }

    #[test]
    fn test_custom_entry_method() {
        let source = "class A\n    shared main()\n        console.write(\"main\")\n";
        let options = RunOptions {
            entry: "main".to_string(),
            ..RunOptions::default()
        };
        assert_eq!(run_capture_with(source, options).unwrap(), vec!["main"]);
    }

    #[test]
    fn test_boolean_loop() {
        let source = program(
            &["number n", "boolean keepGoing"],
            "keepGoing = true\nloop keepGoing\n    n = n + 5\n    if n >= 15\n        keepGoing = false\nconsole.write(n)",
        );
        assert_eq!(run_capture(&source).unwrap(), vec!["15"]);
    }

    #[test]
    fn test_boolean_loop_binds_condition() {
        let source = program(
            &["number n", "boolean going"],
            "loop going = n < 2\n    n = n + 1\nconsole.write(going, n)",
        );
        assert_eq!(run_capture(&source).unwrap(), vec!["false", "2"]);
    }

    #[test]
    fn test_if_else_branches() {
        let source = program(
            &["number x"],
            "x = 7\nif x % 2 == 0\n    console.write(\"even\")\nelse\n    console.write(\"odd\")\nif x > 100\n    console.write(\"big\")",
        );
        assert_eq!(run_capture(&source).unwrap(), vec!["odd"]);
    }

    #[test]
    fn test_arithmetic_and_strings() {
        let source = program(
            &["number a", "string s"],
            "a = (1 + 2) * 4 - 10 / 4\ns = \"ab\" + \"cd\"\nconsole.write(a, s, 'z', true)",
        );
        assert_eq!(run_capture(&source).unwrap(), vec!["9.5", "abcd", "z", "true"]);
    }

    #[test]
    fn test_operator_type_mismatch_fails() {
        let message = runtime_message(&program(&["number a"], "a = 1 + \"one\""));
        assert_eq!(message, "operator '+' cannot be applied to number and string");
        let message = runtime_message(&program(&["boolean b"], "b = 1 < 'c'"));
        assert!(message.contains("'<'"));
        let message = runtime_message(&program(&["boolean b"], "b = 1 and true"));
        assert!(message.contains("'and'"));
    }

    #[test]
    fn test_division_by_zero_fails() {
        let message = runtime_message(&program(&["number a"], "a = 1 / 0"));
        assert!(message.contains("division by zero"));
    }

    #[test]
    fn test_short_circuit_boolean_operators() {
        let source = program(
            &["boolean b"],
            "b = false and missing\nconsole.write(b)\nb = true or missing\nconsole.write(b)\nb = not b\nconsole.write(b)",
        );
        assert_eq!(run_capture(&source).unwrap(), vec!["false", "true", "false"]);
    }

    #[test]
    fn test_unknown_variable_fails() {
        let message = runtime_message(&program(&[], "x = 1"));
        assert_eq!(message, "unknown variable 'x'");
    }

    #[test]
    fn test_assignment_keeps_declared_kind() {
        let message = runtime_message(&program(&["number n"], "n = \"hello\"\nconsole.write(n)"));
        assert_eq!(message, "cannot assign string to number variable 'n'");

        let source = "\
class Box
    shared start()
        Box b
        b = new Box()
        b = 5
        console.write(b)
";
        assert_eq!(runtime_message(source), "cannot assign number to object variable 'b'");
    }

    #[test]
    fn test_result_binding_keeps_declared_kind() {
        let source = with_counter(
            &["Counter c", "number t"],
            "c = new Counter()\nt = c.describe()",
        );
        assert_eq!(runtime_message(&source), "cannot assign string to number variable 't'");

        let source = program(&["string i"], "loop i = 2.times\n    console.write(i)");
        assert_eq!(runtime_message(&source), "cannot assign number to string variable 'i'");
    }

    #[test]
    fn test_condition_must_be_boolean() {
        let message = runtime_message(&program(&["number n"], "if n\n    console.write(n)"));
        assert!(message.contains("if condition must be boolean"));
    }

    const COUNTER: &str = "\
class Counter
    number count
    string label
    construct()
        label = \"default\"
    construct(string name)
        label = name
    increment()
        count = count + 1
    describe() : string text, number value
        text = label
        value = count
    private secret() : number n
        n = 42
    shared make(string name) : Counter c
        c = new Counter(name)
";

    fn with_counter(locals: &[&str], lines: &str) -> String {
        format!("{}{}", COUNTER, program(locals, lines))
    }

    #[test]
    fn test_objects_and_multi_value_results() {
        let source = with_counter(
            &["Counter c", "string t", "number v"],
            "c = new Counter(\"clicks\")\nc.increment()\nc.increment()\nt, v = c.describe()\nconsole.write(t, v)",
        );
        assert_eq!(run_capture(&source).unwrap(), vec!["clicks", "2"]);
    }

    #[test]
    fn test_constructor_overloads_match_by_kind() {
        let source = with_counter(
            &["Counter c", "string t"],
            "c = new Counter()\nt = c.describe()\nconsole.write(t)",
        );
        assert_eq!(run_capture(&source).unwrap(), vec!["default"]);

        let message = runtime_message(&with_counter(&["Counter c"], "c = new Counter(5)"));
        assert_eq!(message, "no constructor of 'Counter' matches (number)");
    }

    #[test]
    fn test_shared_method_called_through_class() {
        let source = with_counter(
            &["Counter c", "string t"],
            "c = Counter.make(\"made\")\nt = c.describe()\nconsole.write(t, c)",
        );
        assert_eq!(run_capture(&source).unwrap(), vec!["made", "<Counter object>"]);
    }

    #[test]
    fn test_instance_method_not_reachable_through_class() {
        let message = runtime_message(&with_counter(&[], "Counter.increment()"));
        assert!(message.contains("no method matching Counter.increment()"));
    }

    #[test]
    fn test_private_method_hidden_from_other_classes() {
        let source = with_counter(
            &["Counter c", "number n"],
            "c = new Counter()\nn = c.secret()",
        );
        assert!(runtime_message(&source).contains("no method matching c.secret()"));
    }

    #[test]
    fn test_objects_are_shared_by_reference() {
        let source = with_counter(
            &["Counter a", "Counter b", "string t", "number v"],
            "a = new Counter()\nb = a\nb.increment()\nt, v = a.describe()\nconsole.write(v, a == b)",
        );
        assert_eq!(run_capture(&source).unwrap(), vec!["1", "true"]);
    }

    #[test]
    fn test_unbound_reference_receiver_fails() {
        let message = runtime_message(&with_counter(&["Counter c"], "c.increment()"));
        assert_eq!(message, "'c' does not refer to an object");
    }

    #[test]
    fn test_too_many_result_bindings_fail() {
        let source = with_counter(
            &["Counter c", "string a", "number b", "number x"],
            "c = new Counter()\na, b, x = c.describe()",
        );
        assert!(runtime_message(&source).contains("returns 2 value(s) but 3 were bound"));
    }

    #[test]
    fn test_void_call_in_expression_fails() {
        let source = with_counter(&["Counter c", "number n"], "c = new Counter()\nn = c.increment() + 1");
        assert!(runtime_message(&source).contains("returns no value"));
    }

    #[test]
    fn test_argument_kinds_select_method() {
        let source = "\
class Printer
    shared show(number n)
        console.write(\"number\")
    shared show(string s)
        console.write(\"string\")
    shared start()
        show(\"x\")
        show(1)
        Printer.show('c')
";
        let err = run_capture(source).unwrap_err();
        assert_eq!(err.message(), "no method matching Printer.show(character) in class 'Printer'");
    }

    #[test]
    fn test_methods_call_siblings_without_receiver() {
        let source = "\
class Math
    shared square(number x) : number y
        y = x * x
    shared start()
        number r
        r = square(6)
        console.write(r)
";
        assert_eq!(run_capture(source).unwrap(), vec!["36"]);
    }

    #[test]
    fn test_recursion_hits_depth_limit() {
        let source = "\
class Spin
    shared forever()
        forever()
    shared start()
        forever()
";
        let options = RunOptions {
            max_call_depth: 16,
            ..RunOptions::default()
        };
        let err = run_capture_with(source, options).unwrap_err();
        assert_eq!(err.message(), "call depth limit of 16 exceeded");
    }

    #[test]
    fn test_recursion_with_results() {
        let source = "\
class Fact
    shared fact(number n) : number r
        r = 1
        if n > 1
            r = n * fact(n - 1)
    shared start()
        number x
        x = fact(5)
        console.write(x)
";
        assert_eq!(run_capture(source).unwrap(), vec!["120"]);
    }

    #[test]
    fn test_builtin_class_name_is_reserved() {
        let source = "class console\n    shared start()\n        x = 1\n";
        assert!(runtime_message(source).contains("conflicts with a built-in class"));
    }

    #[test]
    fn test_unknown_class_fails() {
        let message = runtime_message(&program(&["Thing t"], "t = new Thing()"));
        assert_eq!(message, "unknown class 'Thing'");
        let message = runtime_message(&program(&[], "nowhere.go()"));
        assert_eq!(message, "unknown variable or class 'nowhere'");
    }

    #[test]
    fn test_members_visible_in_instance_methods() {
        let source = "\
class Box
    number size
    construct(number s)
        size = s
    grow()
        size = size * 2
    report()
        console.write(size)
    shared start()
        Box b
        b = new Box(3)
        b.grow()
        b.report()
";
        assert_eq!(run_capture(source).unwrap(), vec!["6"]);
    }
}
