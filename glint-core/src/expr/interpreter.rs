//! Tree-Walking Interpreter
//!
//! Walks a parsed [`Expr`] or [`Program`] against a [`Scope`].
//!
//! # How Resolution Works
//!
//! A free identifier is looked up in three places, first match wins:
//!
//! 1. handler locals declared with `let`/`const` during this run
//! 2. the scope (the bound event, then store keys)
//! 3. the built-in globals
//!
//! Anything else is a reference error, except directly under `typeof`.
//!
//! # How Assignment Works
//!
//! Targets are an identifier or a member chain rooted at one. The root value
//! is read, the nested field replaced with [`Arc::make_mut`], and the whole
//! root written back. The rewritten root is a fresh allocation whenever it
//! was shared (which it always is when it came out of a store), so the store
//! observes a new identity and notifies.

use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::ast::{
    AssignOp, BinaryOp, Expr, Literal, LogicalOp, Program, Property, Stmt, TemplatePart,
    UnaryOp, UpdateOp,
};
use super::builtins::{self, canonical_index};
use super::scope::Scope;
use crate::error::ExprError;
use crate::value::Value;

/// Furthest past the end an array write may extend it.
const MAX_ARRAY_GROWTH: usize = 1 << 16;

type Args = SmallVec<[Value; 4]>;

/// A resolved assignment target: root name plus evaluated keys.
struct Place {
    root: String,
    path: Args,
}

pub struct Interpreter<'a> {
    scope: &'a mut dyn Scope,
    locals: IndexMap<String, Value>,
}

impl<'a> Interpreter<'a> {
    pub fn new(scope: &'a mut dyn Scope) -> Self {
        Self {
            scope,
            locals: IndexMap::new(),
        }
    }

    /// Run a statement sequence; returns the value of the last expression
    /// statement executed, or `undefined`.
    pub fn exec(&mut self, program: &Program) -> Result<Value, ExprError> {
        let mut completion = Value::Undefined;
        for stmt in &program.body {
            self.exec_stmt(stmt, &mut completion)?;
        }
        Ok(completion)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, completion: &mut Value) -> Result<(), ExprError> {
        match stmt {
            Stmt::Expr(expr) => *completion = self.eval(expr)?,
            Stmt::Let { name, init } => {
                let value = match init {
                    Some(init) => self.eval(init)?,
                    None => Value::Undefined,
                };
                self.locals.insert(name.clone(), value);
            }
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.truthy() {
                    self.exec_stmt(consequent, completion)?;
                } else if let Some(alternate) = alternate {
                    self.exec_stmt(alternate, completion)?;
                }
            }
            Stmt::Block(body) => {
                for stmt in body {
                    self.exec_stmt(stmt, completion)?;
                }
            }
            Stmt::Empty => {}
        }
        Ok(())
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<Value, ExprError> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => out.push_str(text),
                        TemplatePart::Expr(expr) => out.push_str(&self.eval(expr)?.to_string()),
                    }
                }
                Ok(Value::from(out))
            }
            Expr::Ident(name) => self.resolve(name),
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item)?);
                }
                Ok(Value::from(values))
            }
            Expr::Object(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let value = self.eval(value)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::Object(Arc::new(map)))
            }
            Expr::Unary { op, operand } => self.unary(*op, operand),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(binary(*op, &left, &right))
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                let take_left = match op {
                    LogicalOp::And => !left.truthy(),
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if take_left {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.truthy() {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
            Expr::Member { .. } | Expr::Call { .. } => Ok(self.eval_chain(expr)?.unwrap_or_default()),
            Expr::Assign { op, target, value } => self.assign(*op, target, value),
            Expr::Update { op, prefix, target } => {
                let place = self.place(target)?;
                let old = self.read_place(&place)?.to_number();
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.write_place(&place, Value::from(new))?;
                Ok(Value::from(if *prefix { new } else { old }))
            }
        }
    }

    /// Evaluate a member/call chain. `None` means an optional link hit a
    /// nullish value and the rest of the chain was skipped.
    fn eval_chain(&mut self, expr: &Expr) -> Result<Option<Value>, ExprError> {
        match expr {
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let Some(base) = self.eval_chain(object)? else {
                    return Ok(None);
                };
                if *optional && base.is_nullish() {
                    return Ok(None);
                }
                let key = self.property_key(property)?;
                get_property(&base, &key).map(Some)
            }
            Expr::Call {
                callee,
                args,
                optional,
            } => match callee.as_ref() {
                Expr::Member {
                    object,
                    property,
                    optional: member_optional,
                } => {
                    let Some(base) = self.eval_chain(object)? else {
                        return Ok(None);
                    };
                    if *member_optional && base.is_nullish() {
                        return Ok(None);
                    }
                    let key = self.property_key(property)?;
                    if base.is_nullish() {
                        return get_property(&base, &key).map(Some);
                    }
                    if *optional && get_property(&base, &key)?.is_nullish() {
                        return Ok(None);
                    }
                    let args = self.eval_args(args)?;
                    builtins::call_method(&base, &key.to_string(), &args).map(Some)
                }
                _ => {
                    let Some(function) = self.eval_chain(callee)? else {
                        return Ok(None);
                    };
                    if *optional && function.is_nullish() {
                        return Ok(None);
                    }
                    let args = self.eval_args(args)?;
                    call_value(callee, &function, &args).map(Some)
                }
            },
            other => self.eval(other).map(Some),
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Args, ExprError> {
        let mut values = Args::new();
        for arg in args {
            values.push(self.eval(arg)?);
        }
        Ok(values)
    }

    fn property_key(&mut self, property: &Property) -> Result<Value, ExprError> {
        match property {
            Property::Named(name) => Ok(Value::from(name.as_str())),
            Property::Computed(expr) => self.eval(expr),
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<Value, ExprError> {
        if op == UnaryOp::TypeOf {
            if let Expr::Ident(name) = operand {
                let value = self.try_resolve(name).unwrap_or_default();
                return Ok(Value::from(value.type_of()));
            }
        }
        let value = self.eval(operand)?;
        Ok(match op {
            UnaryOp::Not => Value::from(!value.truthy()),
            UnaryOp::Neg => Value::from(-value.to_number()),
            UnaryOp::Plus => Value::from(value.to_number()),
            UnaryOp::TypeOf => Value::from(value.type_of()),
        })
    }

    fn assign(&mut self, op: AssignOp, target: &Expr, value: &Expr) -> Result<Value, ExprError> {
        let place = self.place(target)?;
        let new = match op {
            AssignOp::Assign => self.eval(value)?,
            AssignOp::Compound(op) => {
                let current = self.read_place(&place)?;
                let rhs = self.eval(value)?;
                binary(op, &current, &rhs)
            }
            AssignOp::Nullish => {
                let current = self.read_place(&place)?;
                if !current.is_nullish() {
                    return Ok(current);
                }
                self.eval(value)?
            }
        };
        self.write_place(&place, new.clone())?;
        Ok(new)
    }

    fn place(&mut self, target: &Expr) -> Result<Place, ExprError> {
        match target {
            Expr::Ident(name) => Ok(Place {
                root: name.clone(),
                path: Args::new(),
            }),
            Expr::Member {
                object,
                property,
                optional: false,
            } => {
                let mut place = self.place(object)?;
                let key = self.property_key(property)?;
                place.path.push(key);
                Ok(place)
            }
            _ => Err(ExprError::type_error("invalid assignment target")),
        }
    }

    fn read_place(&mut self, place: &Place) -> Result<Value, ExprError> {
        let mut value = self.resolve(&place.root)?;
        for key in &place.path {
            value = get_property(&value, key)?;
        }
        Ok(value)
    }

    fn write_place(&mut self, place: &Place, value: Value) -> Result<(), ExprError> {
        if place.path.is_empty() {
            return self.assign_name(&place.root, value);
        }
        let mut root = self.resolve(&place.root)?;
        set_path(&mut root, &place.path, value)?;
        self.assign_name(&place.root, root)
    }

    fn assign_name(&mut self, name: &str, value: Value) -> Result<(), ExprError> {
        if let Some(slot) = self.locals.get_mut(name) {
            *slot = value;
            return Ok(());
        }
        self.scope.assign(name, value)
    }

    fn try_resolve(&self, name: &str) -> Option<Value> {
        self.locals
            .get(name)
            .cloned()
            .or_else(|| self.scope.lookup(name))
            .or_else(|| builtins::global(name))
    }

    fn resolve(&self, name: &str) -> Result<Value, ExprError> {
        self.try_resolve(name)
            .ok_or_else(|| ExprError::Reference(name.to_string()))
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Undefined => Value::Undefined,
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::from(s.as_str()),
    }
}

fn call_value(callee: &Expr, function: &Value, args: &[Value]) -> Result<Value, ExprError> {
    match function {
        Value::Function(f) => f.call(args).map_err(ExprError::Host),
        other => Err(ExprError::type_error(format!(
            "{} is not a function (got {})",
            callee_label(callee),
            other.kind()
        ))),
    }
}

fn callee_label(callee: &Expr) -> String {
    match callee {
        Expr::Ident(name) => name.clone(),
        Expr::Member {
            object,
            property: Property::Named(name),
            ..
        } => format!("{}.{name}", callee_label(object)),
        Expr::Member { object, .. } => format!("{}[...]", callee_label(object)),
        _ => "expression".to_string(),
    }
}

fn array_index(key: &Value) -> Option<usize> {
    match key {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
        Value::String(s) => canonical_index(s),
        _ => None,
    }
}

pub(crate) fn get_property(base: &Value, key: &Value) -> Result<Value, ExprError> {
    let value = match base {
        Value::Undefined | Value::Null => {
            return Err(ExprError::type_error(format!(
                "Cannot read properties of {base} (reading '{key}')"
            )))
        }
        Value::Object(map) => map.get(key.to_string().as_str()).cloned().unwrap_or_default(),
        Value::Array(items) => match key.as_str() {
            Some("length") => Value::from(items.len()),
            _ => array_index(key)
                .and_then(|i| items.get(i).cloned())
                .unwrap_or_default(),
        },
        Value::String(s) => match key.as_str() {
            Some("length") => Value::from(s.chars().count()),
            _ => array_index(key)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::from(c.to_string()))
                .unwrap_or_default(),
        },
        Value::Function(f) => match key.as_str() {
            Some("name") => Value::from(f.name()),
            _ => Value::Undefined,
        },
        Value::Bool(_) | Value::Number(_) => Value::Undefined,
    };
    Ok(value)
}

fn set_path(target: &mut Value, path: &[Value], value: Value) -> Result<(), ExprError> {
    let Some((key, rest)) = path.split_first() else {
        *target = value;
        return Ok(());
    };
    match target {
        Value::Object(map) => {
            let slot = Arc::make_mut(map).entry(key.to_string()).or_default();
            set_path(slot, rest, value)
        }
        Value::Array(items) => {
            let index = array_index(key).ok_or_else(|| {
                ExprError::type_error(format!("cannot set property '{key}' of an array"))
            })?;
            if index > items.len() + MAX_ARRAY_GROWTH {
                return Err(ExprError::type_error(format!(
                    "array index {index} is out of range"
                )));
            }
            let items = Arc::make_mut(items);
            if index >= items.len() {
                items.resize(index + 1, Value::Undefined);
            }
            set_path(&mut items[index], rest, value)
        }
        other => Err(ExprError::type_error(format!(
            "Cannot set properties of {other} (setting '{key}')"
        ))),
    }
}

/// Convert an object or array operand the way `+` and comparisons do.
fn to_primitive(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) | Value::Function(_) => Value::from(value.to_string()),
        other => other.clone(),
    }
}

pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            let (l, r) = (to_primitive(left), to_primitive(right));
            if matches!(l, Value::String(_)) || matches!(r, Value::String(_)) {
                Value::from(format!("{l}{r}"))
            } else {
                Value::from(l.to_number() + r.to_number())
            }
        }
        BinaryOp::Sub => Value::from(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::from(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::from(left.to_number() / right.to_number()),
        BinaryOp::Mod => Value::from(left.to_number() % right.to_number()),
        BinaryOp::Pow => Value::from(power(left.to_number(), right.to_number())),
        BinaryOp::Lt => Value::from(compare(left, right, |o| o.is_lt())),
        BinaryOp::Le => Value::from(compare(left, right, |o| o.is_le())),
        BinaryOp::Gt => Value::from(compare(left, right, |o| o.is_gt())),
        BinaryOp::Ge => Value::from(compare(left, right, |o| o.is_ge())),
        BinaryOp::Eq => Value::from(left.loose_equals(right)),
        BinaryOp::Ne => Value::from(!left.loose_equals(right)),
        BinaryOp::StrictEq => Value::from(left.strict_equals(right)),
        BinaryOp::StrictNe => Value::from(!left.strict_equals(right)),
    }
}

fn power(base: f64, exponent: f64) -> f64 {
    // `1 ** NaN` and `(-1) ** Infinity` are NaN here, unlike powf.
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

fn compare(left: &Value, right: &Value, test: fn(std::cmp::Ordering) -> bool) -> bool {
    let (l, r) = (to_primitive(left), to_primitive(right));
    if let (Value::String(a), Value::String(b)) = (&l, &r) {
        return test(a.cmp(b));
    }
    l.to_number()
        .partial_cmp(&r.to_number())
        .is_some_and(test)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
