//! Expression evaluation

use std::rc::Rc;

use crate::ast::{
    AssignmentExpression, AssignmentOp, AssignmentTarget, BinaryOp, CallExpression, Expression,
    FunctionDef, LiteralValue, LogicalOp, MemberExpression, MemberProperty, ObjectProperty,
    ObjectPropertyKey, PropertyKind, UnaryExpression, UnaryOp, UpdateExpression, UpdateOp,
};
use crate::error::{BindingError, JsError};
use crate::property::PropertyDescriptor;
use crate::scope::{BindingKind, ScopeFrame};
use crate::value::{CheapClone, JsString, JsValue, PropertyKey, to_int32, to_uint32};

use super::{Interpreter, PreferredType, builtins};

/// Source-like rendering of a callee for "is not a function" messages.
fn describe_callee(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(name) => name.to_string(),
        Expression::This => "this".to_string(),
        Expression::Member(member) => {
            let object = describe_callee(&member.object);
            match &member.property {
                MemberProperty::Identifier(name) => format!("{object}.{name}"),
                MemberProperty::Expression(_) => format!("{object}[...]"),
            }
        }
        Expression::Call(call) => format!("{}(...)", describe_callee(&call.callee)),
        _ => "expression".to_string(),
    }
}

impl Interpreter {
    pub fn evaluate(&mut self, expr: &Expression) -> Result<JsValue, JsError> {
        match expr {
            Expression::Literal(literal) => self.evaluate_literal(literal),
            Expression::Array(elements) => self.evaluate_array_literal(elements),
            Expression::Object(props) => self.evaluate_object_literal(props),
            Expression::Function(def) => Ok(JsValue::Object(self.instantiate_function(def)?)),
            Expression::Identifier(name) => self.read_identifier(name),
            Expression::This => self.heap.this_value(self.env),
            Expression::Unary(unary) => self.evaluate_unary(unary),
            Expression::Binary(binary) => {
                let left = self.evaluate(&binary.left)?;
                let right = self.evaluate(&binary.right)?;
                self.binary_op(binary.operator, &left, &right)
            }
            Expression::Logical(logical) => {
                let left = self.evaluate(&logical.left)?;
                let short_circuit = match logical.operator {
                    LogicalOp::And => !left.to_boolean(),
                    LogicalOp::Or => left.to_boolean(),
                    LogicalOp::NullishCoalesce => !left.is_null_or_undefined(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(&logical.right)
                }
            }
            Expression::Conditional(cond) => {
                if self.evaluate(&cond.test)?.to_boolean() {
                    self.evaluate(&cond.consequent)
                } else {
                    self.evaluate(&cond.alternate)
                }
            }
            Expression::Assignment(assign) => self.evaluate_assignment(assign),
            Expression::Update(update) => self.evaluate_update(update),
            Expression::Sequence(exprs) => {
                let mut last = JsValue::Undefined;
                for expr in exprs {
                    last = self.evaluate(expr)?;
                }
                Ok(last)
            }
            Expression::Member(member) => {
                let (base, key) = self.evaluate_member(member)?;
                self.get(&base, &key)
            }
            Expression::Call(call) => self.evaluate_call(call),
            Expression::New(call) => {
                let callee = self.evaluate(&call.callee)?;
                let args = self.evaluate_arguments(&call.arguments)?;
                if !self.is_constructor(&callee) {
                    return Err(JsError::type_error(format!(
                        "{} is not a constructor",
                        describe_callee(&call.callee)
                    )));
                }
                self.construct(&callee, &args)
            }
        }
    }

    /// Evaluate the initializer of a binding called `name`; anonymous
    /// functions take the binding's name.
    pub(crate) fn evaluate_named(&mut self, expr: &Expression, name: &JsString) -> Result<JsValue, JsError> {
        let value = self.evaluate(expr)?;
        if let (Expression::Function(def), JsValue::Object(func)) = (expr, &value)
            && def.name.is_none()
        {
            self.set_function_name(*func, name);
        }
        Ok(value)
    }

    /// A function expression. A named, non-arrow expression can refer to
    /// itself through a frame holding only its name.
    fn instantiate_function(&mut self, def: &Rc<FunctionDef>) -> Result<crate::value::ObjectId, JsError> {
        let Some(name) = def.name.as_ref().filter(|_| !def.is_arrow) else {
            return Ok(self.create_script_function(Rc::clone(def), self.env));
        };
        let frame = self
            .heap
            .alloc_frame(ScopeFrame::new(Some(self.env), false));
        let func = self.create_script_function(Rc::clone(def), frame);
        self.heap
            .declare(frame, name.cheap_clone(), JsValue::Object(func), BindingKind::Function)?;
        Ok(func)
    }

    fn evaluate_literal(&mut self, literal: &LiteralValue) -> Result<JsValue, JsError> {
        Ok(match literal {
            LiteralValue::Null => JsValue::Null,
            LiteralValue::Undefined => JsValue::Undefined,
            LiteralValue::Boolean(b) => JsValue::Boolean(*b),
            LiteralValue::Number(n) => JsValue::Number(*n),
            LiteralValue::String(s) => JsValue::String(s.cheap_clone()),
            LiteralValue::RegExp { pattern, flags } => JsValue::Object(builtins::create_regexp(
                self,
                pattern.cheap_clone(),
                flags.cheap_clone(),
            )?),
        })
    }

    /// `[a, , b]`: elisions become holes, so the length counts them.
    fn evaluate_array_literal(&mut self, elements: &[Option<Expression>]) -> Result<JsValue, JsError> {
        let array = self.create_array(Vec::new());
        for (i, element) in elements.iter().enumerate() {
            if let Some(expr) = element {
                let value = self.evaluate(expr)?;
                self.heap
                    .put_own_value(array, PropertyKey::Index(i as u32), value)?;
            }
        }
        self.heap.set_array_length(array, elements.len() as u32)?;
        Ok(JsValue::Object(array))
    }

    fn evaluate_object_literal(&mut self, props: &[ObjectProperty]) -> Result<JsValue, JsError> {
        let obj = self.create_object();
        for prop in props {
            let key = match &prop.key {
                ObjectPropertyKey::Identifier(name) => PropertyKey::from(name.cheap_clone()),
                ObjectPropertyKey::Number(n) => PropertyKey::from_value(&JsValue::Number(*n)),
                ObjectPropertyKey::Computed(expr) => {
                    let value = self.evaluate(expr)?;
                    self.to_property_key(&value)?
                }
            };
            let name = match &key {
                PropertyKey::Symbol(sym) => JsString::from(format!(
                    "[{}]",
                    sym.description().map(JsString::as_str).unwrap_or_default()
                )),
                other => JsString::from(other.to_string()),
            };
            let desc = match prop.kind {
                PropertyKind::Init => PropertyDescriptor {
                    value: Some(self.evaluate_named(&prop.value, &name)?),
                    writable: Some(true),
                    enumerable: Some(true),
                    configurable: Some(true),
                    ..PropertyDescriptor::default()
                },
                PropertyKind::Get | PropertyKind::Set => {
                    let func = self.evaluate(&prop.value)?.as_object();
                    let mut desc = PropertyDescriptor {
                        enumerable: Some(true),
                        configurable: Some(true),
                        ..PropertyDescriptor::default()
                    };
                    if prop.kind == PropertyKind::Get {
                        desc.get = Some(func);
                    } else {
                        desc.set = Some(func);
                    }
                    desc
                }
            };
            self.heap.define_own_property(obj, key, desc)?;
        }
        Ok(JsValue::Object(obj))
    }

    // ═══════════════════════════════════════════════════════════════
    // Identifiers
    // ═══════════════════════════════════════════════════════════════

    /// Resolve through the scope chain, then the global object.
    pub(crate) fn read_identifier(&mut self, name: &JsString) -> Result<JsValue, JsError> {
        match self.heap.read_binding(self.env, name) {
            Err(JsError::Binding(BindingError::Unresolved { .. })) => {
                let key = PropertyKey::from(name.cheap_clone());
                if self.heap.has_property(self.global, &key)? {
                    self.get(&JsValue::Object(self.global), &key)
                } else {
                    Err(JsError::reference_error(name.cheap_clone()))
                }
            }
            other => other,
        }
    }

    /// Assign to an existing binding (or global property). Never declares.
    pub(crate) fn assign_identifier(&mut self, name: &JsString, value: JsValue) -> Result<(), JsError> {
        match self.heap.assign(self.env, name, value.clone()) {
            Err(JsError::Binding(BindingError::Unresolved { .. })) => {
                let key = PropertyKey::from(name.cheap_clone());
                if self.heap.has_property(self.global, &key)? {
                    self.put(&JsValue::Object(self.global), key, value)
                } else {
                    Err(JsError::reference_error(name.cheap_clone()))
                }
            }
            other => other,
        }
    }

    fn is_unresolvable(&self, name: &JsString) -> Result<bool, JsError> {
        if self.heap.resolve(self.env, name).is_ok() {
            return Ok(false);
        }
        Ok(!self
            .heap
            .has_property(self.global, &PropertyKey::from(name.cheap_clone()))?)
    }

    // ═══════════════════════════════════════════════════════════════
    // Members and calls
    // ═══════════════════════════════════════════════════════════════

    fn evaluate_member(&mut self, member: &MemberExpression) -> Result<(JsValue, PropertyKey), JsError> {
        let base = self.evaluate(&member.object)?;
        let key = match &member.property {
            MemberProperty::Identifier(name) => PropertyKey::from(name.cheap_clone()),
            MemberProperty::Expression(expr) => {
                let value = self.evaluate(expr)?;
                self.to_property_key(&value)?
            }
        };
        Ok((base, key))
    }

    fn evaluate_arguments(&mut self, args: &[Expression]) -> Result<Vec<JsValue>, JsError> {
        args.iter().map(|arg| self.evaluate(arg)).collect()
    }

    /// A call through a member expression passes the base object as `this`.
    fn evaluate_call(&mut self, call: &CallExpression) -> Result<JsValue, JsError> {
        let (callee, this) = match call.callee.as_ref() {
            Expression::Member(member) => {
                let (base, key) = self.evaluate_member(member)?;
                let func = self.get(&base, &key)?;
                (func, base)
            }
            other => (self.evaluate(other)?, JsValue::Undefined),
        };
        let args = self.evaluate_arguments(&call.arguments)?;
        if !self.is_callable(&callee) {
            return Err(JsError::type_error(format!(
                "{} is not a function",
                describe_callee(&call.callee)
            )));
        }
        self.call_function(&callee, this, &args)
    }

    // ═══════════════════════════════════════════════════════════════
    // Operators
    // ═══════════════════════════════════════════════════════════════

    fn evaluate_unary(&mut self, unary: &UnaryExpression) -> Result<JsValue, JsError> {
        match unary.operator {
            UnaryOp::Typeof => {
                if let Expression::Identifier(name) = unary.argument.as_ref()
                    && self.is_unresolvable(name)?
                {
                    return Ok(JsValue::from("undefined"));
                }
                let value = self.evaluate(&unary.argument)?;
                Ok(JsValue::from(self.type_of(&value)))
            }
            UnaryOp::Delete => self.evaluate_delete(&unary.argument),
            UnaryOp::Void => {
                self.evaluate(&unary.argument)?;
                Ok(JsValue::Undefined)
            }
            UnaryOp::Not => Ok(JsValue::Boolean(!self.evaluate(&unary.argument)?.to_boolean())),
            UnaryOp::Minus => {
                let value = self.evaluate(&unary.argument)?;
                Ok(JsValue::Number(-self.to_number(&value)?))
            }
            UnaryOp::Plus => {
                let value = self.evaluate(&unary.argument)?;
                Ok(JsValue::Number(self.to_number(&value)?))
            }
            UnaryOp::BitNot => {
                let value = self.evaluate(&unary.argument)?;
                Ok(JsValue::Number(f64::from(!to_int32(self.to_number(&value)?))))
            }
        }
    }

    fn evaluate_delete(&mut self, argument: &Expression) -> Result<JsValue, JsError> {
        let Expression::Member(member) = argument else {
            self.evaluate(argument)?;
            return Ok(JsValue::Boolean(true));
        };
        let (base, key) = self.evaluate_member(member)?;
        let deleted = match &base {
            JsValue::Object(id) => self.delete_property(*id, &key)?,
            JsValue::Undefined | JsValue::Null => {
                return Err(JsError::type_error(format!(
                    "Cannot convert undefined or null to object (deleting '{key}')"
                )));
            }
            JsValue::String(s) => {
                !(key.eq_str("length") || key.as_index().is_some_and(|i| (i as usize) < s.js_len()))
            }
            _ => true,
        };
        Ok(JsValue::Boolean(deleted))
    }

    pub fn type_of(&self, value: &JsValue) -> &'static str {
        match value {
            JsValue::Undefined => "undefined",
            JsValue::Null => "object",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Symbol(_) => "symbol",
            JsValue::Object(_) if self.is_callable(value) => "function",
            JsValue::Object(_) => "object",
        }
    }

    pub fn binary_op(&mut self, op: BinaryOp, left: &JsValue, right: &JsValue) -> Result<JsValue, JsError> {
        let result = match op {
            BinaryOp::Add => return self.add_values(left, right),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Exp => {
                let a = self.to_number(left)?;
                let b = self.to_number(right)?;
                JsValue::Number(match op {
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Mod => a % b,
                    _ => exponentiate(a, b),
                })
            }
            BinaryOp::StrictEq => JsValue::Boolean(left.strict_equals(right)),
            BinaryOp::StrictNotEq => JsValue::Boolean(!left.strict_equals(right)),
            BinaryOp::Eq => JsValue::Boolean(self.loose_equals(left, right)?),
            BinaryOp::NotEq => JsValue::Boolean(!self.loose_equals(left, right)?),
            BinaryOp::Lt => JsValue::Boolean(self.less_than(left, right, true)?.unwrap_or(false)),
            BinaryOp::Gt => JsValue::Boolean(self.less_than(right, left, false)?.unwrap_or(false)),
            BinaryOp::LtEq => {
                JsValue::Boolean(self.less_than(right, left, false)?.is_some_and(|lt| !lt))
            }
            BinaryOp::GtEq => {
                JsValue::Boolean(self.less_than(left, right, true)?.is_some_and(|lt| !lt))
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::LShift | BinaryOp::RShift => {
                let a = to_int32(self.to_number(left)?);
                let b = to_int32(self.to_number(right)?);
                let shift = (b as u32) & 31;
                JsValue::Number(f64::from(match op {
                    BinaryOp::BitAnd => a & b,
                    BinaryOp::BitOr => a | b,
                    BinaryOp::BitXor => a ^ b,
                    BinaryOp::LShift => a.wrapping_shl(shift),
                    _ => a >> shift,
                }))
            }
            BinaryOp::URShift => {
                let a = to_uint32(self.to_number(left)?);
                let b = to_uint32(self.to_number(right)?) & 31;
                JsValue::Number(f64::from(a >> b))
            }
            BinaryOp::In => {
                let JsValue::Object(target) = right else {
                    return Err(JsError::type_error(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        self.display(left),
                        self.display(right)
                    )));
                };
                let key = self.to_property_key(left)?;
                JsValue::Boolean(self.heap.has_property(*target, &key)?)
            }
            BinaryOp::Instanceof => JsValue::Boolean(self.instance_of(left, right)?),
        };
        Ok(result)
    }

    fn add_values(&mut self, left: &JsValue, right: &JsValue) -> Result<JsValue, JsError> {
        if let (JsValue::Number(a), JsValue::Number(b)) = (left, right) {
            return Ok(JsValue::Number(a + b));
        }
        let left = self.to_primitive(left, PreferredType::Default)?;
        let right = self.to_primitive(right, PreferredType::Default)?;
        if matches!(left, JsValue::String(_)) || matches!(right, JsValue::String(_)) {
            let mut joined = self.to_js_string(&left)?.to_string();
            joined.push_str(self.to_js_string(&right)?.as_str());
            return Ok(JsValue::from(joined));
        }
        Ok(JsValue::Number(self.to_number(&left)? + self.to_number(&right)?))
    }

    /// Abstract relational comparison `a < b`; `None` when either side is NaN.
    /// `left_first` keeps the conversion order of the source operands.
    fn less_than(&mut self, a: &JsValue, b: &JsValue, left_first: bool) -> Result<Option<bool>, JsError> {
        let (pa, pb) = if left_first {
            let pa = self.to_primitive(a, PreferredType::Number)?;
            (pa, self.to_primitive(b, PreferredType::Number)?)
        } else {
            let pb = self.to_primitive(b, PreferredType::Number)?;
            (self.to_primitive(a, PreferredType::Number)?, pb)
        };
        if let (JsValue::String(x), JsValue::String(y)) = (&pa, &pb) {
            return Ok(Some(x.as_str().encode_utf16().lt(y.as_str().encode_utf16())));
        }
        let x = self.to_number(&pa)?;
        let y = self.to_number(&pb)?;
        if x.is_nan() || y.is_nan() {
            return Ok(None);
        }
        Ok(Some(x < y))
    }

    /// Abstract (`==`) equality.
    pub fn loose_equals(&mut self, left: &JsValue, right: &JsValue) -> Result<bool, JsError> {
        use JsValue as V;
        Ok(match (left, right) {
            (V::Undefined | V::Null, V::Undefined | V::Null) => true,
            (V::Undefined | V::Null, _) | (_, V::Undefined | V::Null) => false,
            (V::Number(_), V::String(_)) | (V::String(_), V::Number(_)) => {
                left.to_number() == right.to_number()
            }
            (V::Boolean(_), _) => {
                let n = V::Number(left.to_number());
                return self.loose_equals(&n, right);
            }
            (_, V::Boolean(_)) => {
                let n = V::Number(right.to_number());
                return self.loose_equals(left, &n);
            }
            (V::Object(_), V::Number(_) | V::String(_) | V::Symbol(_)) => {
                let prim = self.to_primitive(left, PreferredType::Default)?;
                return self.loose_equals(&prim, right);
            }
            (V::Number(_) | V::String(_) | V::Symbol(_), V::Object(_)) => {
                let prim = self.to_primitive(right, PreferredType::Default)?;
                return self.loose_equals(left, &prim);
            }
            _ => left.strict_equals(right),
        })
    }

    fn instance_of(&mut self, value: &JsValue, target: &JsValue) -> Result<bool, JsError> {
        if !self.is_callable(target) {
            return Err(JsError::type_error("Right-hand side of 'instanceof' is not callable"));
        }
        let JsValue::Object(id) = value else {
            return Ok(false);
        };
        let JsValue::Object(proto) = self.get_named(target, "prototype")? else {
            return Err(JsError::type_error(
                "Function has non-object prototype in instanceof check",
            ));
        };
        self.heap.inherits_from(*id, proto)
    }

    // ═══════════════════════════════════════════════════════════════
    // Assignment
    // ═══════════════════════════════════════════════════════════════

    /// Compute the value an assignment writes. Returns `None` when a
    /// logical assignment short-circuits and nothing is written.
    fn assigned_value(
        &mut self,
        op: AssignmentOp,
        current: Option<JsValue>,
        value: &Expression,
        name: Option<&JsString>,
    ) -> Result<Result<JsValue, JsValue>, JsError> {
        let Some(current) = current else {
            let value = match name {
                Some(name) => self.evaluate_named(value, name)?,
                None => self.evaluate(value)?,
            };
            return Ok(Ok(value));
        };
        let keep = match op {
            AssignmentOp::AndAssign => !current.to_boolean(),
            AssignmentOp::OrAssign => current.to_boolean(),
            AssignmentOp::NullishAssign => !current.is_null_or_undefined(),
            _ => false,
        };
        if keep {
            return Ok(Err(current));
        }
        let rhs = self.evaluate(value)?;
        Ok(Ok(match op.binary_op() {
            Some(binary) => self.binary_op(binary, &current, &rhs)?,
            None => rhs,
        }))
    }

    fn evaluate_assignment(&mut self, assign: &AssignmentExpression) -> Result<JsValue, JsError> {
        let plain = assign.operator == AssignmentOp::Assign;
        match &assign.target {
            AssignmentTarget::Identifier(name) => {
                let current = if plain { None } else { Some(self.read_identifier(name)?) };
                match self.assigned_value(assign.operator, current, &assign.value, Some(name))? {
                    Ok(value) => {
                        self.assign_identifier(name, value.clone())?;
                        Ok(value)
                    }
                    Err(kept) => Ok(kept),
                }
            }
            AssignmentTarget::Member(member) => {
                let (base, key) = self.evaluate_member(member)?;
                let current = if plain { None } else { Some(self.get(&base, &key)?) };
                match self.assigned_value(assign.operator, current, &assign.value, None)? {
                    Ok(value) => {
                        self.put(&base, key, value.clone())?;
                        Ok(value)
                    }
                    Err(kept) => Ok(kept),
                }
            }
        }
    }

    fn evaluate_update(&mut self, update: &UpdateExpression) -> Result<JsValue, JsError> {
        let delta = match update.operator {
            UpdateOp::Increment => 1.0,
            UpdateOp::Decrement => -1.0,
        };
        let (old, new) = match &update.argument {
            AssignmentTarget::Identifier(name) => {
                let current = self.read_identifier(name)?;
                let old = self.to_number(&current)?;
                self.assign_identifier(name, JsValue::Number(old + delta))?;
                (old, old + delta)
            }
            AssignmentTarget::Member(member) => {
                let (base, key) = self.evaluate_member(member)?;
                let current = self.get(&base, &key)?;
                let old = self.to_number(&current)?;
                self.put(&base, key, JsValue::Number(old + delta))?;
                (old, old + delta)
            }
        };
        Ok(JsValue::Number(if update.prefix { new } else { old }))
    }
}

/// `**` with the JS special cases Rust's `powf` disagrees on.
pub(crate) fn exponentiate(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}
