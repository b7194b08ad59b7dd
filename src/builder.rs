//! Helpers for constructing trees by hand
//!
//! There is no parser in this crate. Hosts that already have a front end
//! build [`crate::ast`] nodes directly; everyone else (tests, benches,
//! embedders with a handful of fixed scripts) can use these shorthands:
//!
//! ```
//! use jsrun::builder::*;
//! use jsrun::ast::BinaryOp;
//!
//! // let x = 1 + 2; x
//! let program = program(vec![
//!     let_("x", binary(BinaryOp::Add, num(1.0), num(2.0))),
//!     expr(ident("x")),
//! ]);
//! assert_eq!(program.body.len(), 2);
//! ```

use std::rc::Rc;

use crate::ast::*;
use crate::value::JsString;

pub fn program(body: Vec<Statement>) -> Program {
    Program { body }
}

// ============ LITERALS ============

pub fn num(n: f64) -> Expression {
    Expression::Literal(LiteralValue::Number(n))
}

pub fn string(s: &str) -> Expression {
    Expression::Literal(LiteralValue::String(JsString::from(s)))
}

pub fn boolean(b: bool) -> Expression {
    Expression::Literal(LiteralValue::Boolean(b))
}

pub fn null() -> Expression {
    Expression::Literal(LiteralValue::Null)
}

pub fn undefined() -> Expression {
    Expression::Literal(LiteralValue::Undefined)
}

pub fn regex(pattern: &str, flags: &str) -> Expression {
    Expression::Literal(LiteralValue::RegExp {
        pattern: JsString::from(pattern),
        flags: JsString::from(flags),
    })
}

pub fn ident(name: &str) -> Expression {
    Expression::Identifier(JsString::from(name))
}

pub fn this() -> Expression {
    Expression::This
}

/// Dense array literal.
pub fn array(elements: Vec<Expression>) -> Expression {
    Expression::Array(elements.into_iter().map(Some).collect())
}

/// Array literal where `None` marks a hole (`[1, , 3]`).
pub fn sparse_array(elements: Vec<Option<Expression>>) -> Expression {
    Expression::Array(elements)
}

/// Object literal from `key: value` pairs.
pub fn object(props: Vec<(&str, Expression)>) -> Expression {
    Expression::Object(props.into_iter().map(|(k, v)| prop(k, v)).collect())
}

pub fn object_with(props: Vec<ObjectProperty>) -> Expression {
    Expression::Object(props)
}

pub fn prop(key: &str, value: Expression) -> ObjectProperty {
    ObjectProperty {
        key: ObjectPropertyKey::Identifier(JsString::from(key)),
        value,
        kind: PropertyKind::Init,
    }
}

pub fn computed_prop(key: Expression, value: Expression) -> ObjectProperty {
    ObjectProperty {
        key: ObjectPropertyKey::Computed(Box::new(key)),
        value,
        kind: PropertyKind::Init,
    }
}

/// `get key() { body }`
pub fn getter(key: &str, body: Vec<Statement>) -> ObjectProperty {
    ObjectProperty {
        key: ObjectPropertyKey::Identifier(JsString::from(key)),
        value: func(Some(key), &[], body),
        kind: PropertyKind::Get,
    }
}

/// `set key(param) { body }`
pub fn setter(key: &str, param: &str, body: Vec<Statement>) -> ObjectProperty {
    ObjectProperty {
        key: ObjectPropertyKey::Identifier(JsString::from(key)),
        value: func(Some(key), &[param], body),
        kind: PropertyKind::Set,
    }
}

// ============ FUNCTIONS ============

fn def(name: Option<&str>, params: &[&str], body: FunctionBody, is_arrow: bool) -> Rc<FunctionDef> {
    Rc::new(FunctionDef {
        name: name.map(JsString::from),
        params: params.iter().map(|p| JsString::from(*p)).collect(),
        body,
        is_arrow,
    })
}

/// `function name(params) { body }` as an expression.
pub fn func(name: Option<&str>, params: &[&str], body: Vec<Statement>) -> Expression {
    Expression::Function(def(name, params, FunctionBody::Block(body), false))
}

/// `(params) => { body }`
pub fn arrow(params: &[&str], body: Vec<Statement>) -> Expression {
    Expression::Function(def(None, params, FunctionBody::Block(body), true))
}

/// `(params) => expr`
pub fn arrow_expr(params: &[&str], body: Expression) -> Expression {
    Expression::Function(def(
        None,
        params,
        FunctionBody::Expression(Box::new(body)),
        true,
    ))
}

/// `function name(params) { body }` as a declaration.
pub fn function(name: &str, params: &[&str], body: Vec<Statement>) -> Statement {
    Statement::FunctionDeclaration(def(Some(name), params, FunctionBody::Block(body), false))
}

// ============ OPERATORS ============

pub fn binary(operator: BinaryOp, left: Expression, right: Expression) -> Expression {
    Expression::Binary(BinaryExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn logical(operator: LogicalOp, left: Expression, right: Expression) -> Expression {
    Expression::Logical(LogicalExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn unary(operator: UnaryOp, argument: Expression) -> Expression {
    Expression::Unary(UnaryExpression {
        operator,
        argument: Box::new(argument),
    })
}

pub fn conditional(test: Expression, consequent: Expression, alternate: Expression) -> Expression {
    Expression::Conditional(ConditionalExpression {
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: Box::new(alternate),
    })
}

pub fn sequence(expressions: Vec<Expression>) -> Expression {
    Expression::Sequence(expressions)
}

impl From<&str> for AssignmentTarget {
    fn from(name: &str) -> Self {
        AssignmentTarget::Identifier(JsString::from(name))
    }
}

impl From<MemberExpression> for AssignmentTarget {
    fn from(member: MemberExpression) -> Self {
        AssignmentTarget::Member(member)
    }
}

pub fn assign(target: impl Into<AssignmentTarget>, value: Expression) -> Expression {
    assign_op(AssignmentOp::Assign, target, value)
}

pub fn assign_op(
    operator: AssignmentOp,
    target: impl Into<AssignmentTarget>,
    value: Expression,
) -> Expression {
    Expression::Assignment(AssignmentExpression {
        operator,
        target: target.into(),
        value: Box::new(value),
    })
}

pub fn update(operator: UpdateOp, prefix: bool, target: impl Into<AssignmentTarget>) -> Expression {
    Expression::Update(UpdateExpression {
        operator,
        prefix,
        argument: target.into(),
    })
}

/// `target++`
pub fn increment(target: impl Into<AssignmentTarget>) -> Expression {
    update(UpdateOp::Increment, false, target)
}

// ============ ACCESS ============

/// `object.name` as an assignable member.
pub fn dot(object: Expression, name: &str) -> MemberExpression {
    MemberExpression {
        object: Box::new(object),
        property: MemberProperty::Identifier(JsString::from(name)),
    }
}

/// `object[key]` as an assignable member.
pub fn at(object: Expression, key: Expression) -> MemberExpression {
    MemberExpression {
        object: Box::new(object),
        property: MemberProperty::Expression(Box::new(key)),
    }
}

pub fn member(object: Expression, name: &str) -> Expression {
    Expression::Member(dot(object, name))
}

pub fn index(object: Expression, key: Expression) -> Expression {
    Expression::Member(at(object, key))
}

pub fn call(callee: Expression, arguments: Vec<Expression>) -> Expression {
    Expression::Call(CallExpression {
        callee: Box::new(callee),
        arguments,
    })
}

/// `object.name(arguments)`
pub fn method(object: Expression, name: &str, arguments: Vec<Expression>) -> Expression {
    call(member(object, name), arguments)
}

pub fn new(callee: Expression, arguments: Vec<Expression>) -> Expression {
    Expression::New(CallExpression {
        callee: Box::new(callee),
        arguments,
    })
}

// ============ STATEMENTS ============

pub fn expr(expression: Expression) -> Statement {
    Statement::Expression(expression)
}

/// `console.log(arguments)`
pub fn log(arguments: Vec<Expression>) -> Statement {
    expr(method(ident("console"), "log", arguments))
}

fn declaration(kind: VariableKind, name: &str, init: Option<Expression>) -> VariableDeclaration {
    VariableDeclaration {
        kind,
        declarations: vec![VariableDeclarator {
            name: JsString::from(name),
            init,
        }],
    }
}

pub fn let_(name: &str, init: Expression) -> Statement {
    Statement::VariableDeclaration(declaration(VariableKind::Let, name, Some(init)))
}

/// `let name;`
pub fn let_uninit(name: &str) -> Statement {
    Statement::VariableDeclaration(declaration(VariableKind::Let, name, None))
}

pub fn const_(name: &str, init: Expression) -> Statement {
    Statement::VariableDeclaration(declaration(VariableKind::Const, name, Some(init)))
}

pub fn var(name: &str, init: Option<Expression>) -> Statement {
    Statement::VariableDeclaration(declaration(VariableKind::Var, name, init))
}

pub fn block(body: Vec<Statement>) -> Statement {
    Statement::Block(BlockStatement { body })
}

pub fn if_(test: Expression, consequent: Statement, alternate: Option<Statement>) -> Statement {
    Statement::If(IfStatement {
        test,
        consequent: Box::new(consequent),
        alternate: alternate.map(Box::new),
    })
}

pub fn while_(test: Expression, body: Statement) -> Statement {
    Statement::While(WhileStatement {
        test,
        body: Box::new(body),
    })
}

pub fn do_while(body: Statement, test: Expression) -> Statement {
    Statement::DoWhile(DoWhileStatement {
        body: Box::new(body),
        test,
    })
}

pub fn for_(
    init: Option<ForInit>,
    test: Option<Expression>,
    update: Option<Expression>,
    body: Statement,
) -> Statement {
    Statement::For(ForStatement {
        init,
        test,
        update,
        body: Box::new(body),
    })
}

/// `for (let name = init; test; update) body`
pub fn for_let(
    name: &str,
    init: Expression,
    test: Expression,
    update: Expression,
    body: Statement,
) -> Statement {
    for_(
        Some(ForInit::Variable(declaration(VariableKind::Let, name, Some(init)))),
        Some(test),
        Some(update),
        body,
    )
}

fn left(kind: Option<VariableKind>, name: &str) -> ForInOfLeft {
    ForInOfLeft {
        kind,
        name: JsString::from(name),
    }
}

pub fn for_in(kind: Option<VariableKind>, name: &str, right: Expression, body: Statement) -> Statement {
    Statement::ForIn(ForInStatement {
        left: left(kind, name),
        right,
        body: Box::new(body),
    })
}

pub fn for_of(kind: Option<VariableKind>, name: &str, right: Expression, body: Statement) -> Statement {
    Statement::ForOf(ForOfStatement {
        left: left(kind, name),
        right,
        body: Box::new(body),
    })
}

pub fn switch(discriminant: Expression, cases: Vec<SwitchCase>) -> Statement {
    Statement::Switch(SwitchStatement {
        discriminant,
        cases,
    })
}

pub fn case(test: Expression, consequent: Vec<Statement>) -> SwitchCase {
    SwitchCase {
        test: Some(test),
        consequent,
    }
}

pub fn default_case(consequent: Vec<Statement>) -> SwitchCase {
    SwitchCase {
        test: None,
        consequent,
    }
}

pub fn break_(label: Option<&str>) -> Statement {
    Statement::Break(label.map(JsString::from))
}

pub fn continue_(label: Option<&str>) -> Statement {
    Statement::Continue(label.map(JsString::from))
}

pub fn return_(argument: Option<Expression>) -> Statement {
    Statement::Return(argument)
}

pub fn throw(argument: Expression) -> Statement {
    Statement::Throw(argument)
}

pub fn labeled(label: &str, body: Statement) -> Statement {
    Statement::Labeled(LabeledStatement {
        label: JsString::from(label),
        body: Box::new(body),
    })
}

/// Full `try` statement; pass `None` to omit the catch or finally clause.
pub fn try_(
    block: Vec<Statement>,
    handler: Option<(Option<&str>, Vec<Statement>)>,
    finalizer: Option<Vec<Statement>>,
) -> Statement {
    Statement::Try(TryStatement {
        block: BlockStatement { body: block },
        handler: handler.map(|(param, body)| CatchClause {
            param: param.map(JsString::from),
            body: BlockStatement { body },
        }),
        finalizer: finalizer.map(|body| BlockStatement { body }),
    })
}

/// `try { block } catch (param) { handler }`
pub fn try_catch(block: Vec<Statement>, param: &str, handler: Vec<Statement>) -> Statement {
    try_(block, Some((Some(param), handler)), None)
}

/// `try { block } finally { finalizer }`
pub fn try_finally(block: Vec<Statement>, finalizer: Vec<Statement>) -> Statement {
    try_(block, None, Some(finalizer))
}
