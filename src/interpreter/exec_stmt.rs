//! Statement execution
//!
//! Every statement produces a [`Completion`]; thrown values travel as
//! `Err(JsError)` so `?` unwinds them to the nearest `try`. Loops resolve
//! `break`/`continue` against their label set through [`loop_action`].

use std::rc::Rc;

use crate::ast::{
    CatchClause, DoWhileStatement, ForInOfLeft, ForInStatement, ForInit, ForOfStatement,
    ForStatement, IfStatement, Statement, SwitchStatement, TryStatement, VariableDeclaration,
    VariableKind, WhileStatement,
};
use crate::completion::{Completion, LoopAction, loop_action};
use crate::error::JsError;
use crate::scope::{BindingKind, ScopeFrame};
use crate::value::{CheapClone, FrameId, JsString, JsValue};

use super::Interpreter;

/// Does a statement list declare anything block-scoped?
fn needs_scope(body: &[Statement]) -> bool {
    body.iter().any(|stmt| match stmt {
        Statement::VariableDeclaration(decl) => decl.kind != VariableKind::Var,
        Statement::FunctionDeclaration(_) => true,
        _ => false,
    })
}

/// Statements whose completion value replaces the running one.
fn produces_value(stmt: &Statement) -> bool {
    !matches!(
        stmt,
        Statement::VariableDeclaration(_) | Statement::FunctionDeclaration(_) | Statement::Empty
    )
}

impl Interpreter {
    /// Run `f` with `frame` as the current frame, restoring the previous
    /// frame whatever the outcome.
    pub(crate) fn with_frame<R>(
        &mut self,
        frame: FrameId,
        f: impl FnOnce(&mut Self) -> Result<R, JsError>,
    ) -> Result<R, JsError> {
        let saved = std::mem::replace(&mut self.env, frame);
        let result = f(self);
        self.env = saved;
        result
    }

    fn push_block_frame(&mut self) -> FrameId {
        self.heap
            .alloc_frame(ScopeFrame::new(Some(self.env), false))
    }

    /// Execute a statement list in the current frame. Function declarations
    /// are bound before the first statement runs.
    pub(crate) fn execute_body(&mut self, body: &[Statement]) -> Result<Completion, JsError> {
        self.hoist_functions(body)?;
        let mut last = JsValue::Undefined;
        for stmt in body {
            match self.execute_statement(stmt)? {
                Completion::Normal(value) => {
                    if produces_value(stmt) {
                        last = value;
                    }
                }
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal(last))
    }

    fn hoist_functions(&mut self, body: &[Statement]) -> Result<(), JsError> {
        for stmt in body {
            if let Statement::FunctionDeclaration(def) = stmt
                && let Some(name) = &def.name
            {
                let func = self.create_script_function(Rc::clone(def), self.env);
                self.heap.declare(
                    self.env,
                    name.cheap_clone(),
                    JsValue::Object(func),
                    BindingKind::Function,
                )?;
            }
        }
        Ok(())
    }

    fn execute_block(&mut self, body: &[Statement]) -> Result<Completion, JsError> {
        if !needs_scope(body) {
            return self.execute_body(body);
        }
        let frame = self.push_block_frame();
        self.with_frame(frame, |interp| interp.execute_body(body))
    }

    pub(crate) fn execute_statement(&mut self, stmt: &Statement) -> Result<Completion, JsError> {
        match stmt {
            Statement::VariableDeclaration(decl) => {
                self.execute_variable_declaration(decl)?;
                Ok(Completion::normal())
            }
            // bound by hoisting
            Statement::FunctionDeclaration(_) => Ok(Completion::normal()),
            Statement::Block(block) => self.execute_block(&block.body),
            Statement::If(stmt) => self.execute_if(stmt),
            Statement::Switch(_)
            | Statement::For(_)
            | Statement::ForIn(_)
            | Statement::ForOf(_)
            | Statement::While(_)
            | Statement::DoWhile(_)
            | Statement::Labeled(_) => self.execute_labeled(stmt, &[]),
            Statement::Try(stmt) => self.execute_try(stmt),
            Statement::Return(argument) => {
                let value = match argument {
                    Some(expr) => self.evaluate(expr)?,
                    None => JsValue::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Statement::Break(label) => Ok(Completion::Break(label.clone())),
            Statement::Continue(label) => Ok(Completion::Continue(label.clone())),
            Statement::Throw(expr) => {
                let value = self.evaluate(expr)?;
                Err(JsError::Thrown(value))
            }
            Statement::Expression(expr) => Ok(Completion::Normal(self.evaluate(expr)?)),
            Statement::Empty => Ok(Completion::normal()),
        }
    }

    /// Execute `stmt` carrying the labels that directly enclose it. A labeled
    /// statement consumes `break` aimed at its own label; loops also
    /// consume `continue` for any label in their set.
    fn execute_labeled(&mut self, stmt: &Statement, labels: &[JsString]) -> Result<Completion, JsError> {
        match stmt {
            Statement::Labeled(labeled) => {
                let mut own = labels.to_vec();
                own.push(labeled.label.cheap_clone());
                match self.execute_labeled(&labeled.body, &own)? {
                    Completion::Break(Some(target)) if target == labeled.label => {
                        Ok(Completion::normal())
                    }
                    other => Ok(other),
                }
            }
            Statement::For(stmt) => self.execute_for(stmt, labels),
            Statement::ForIn(stmt) => self.execute_for_in(stmt, labels),
            Statement::ForOf(stmt) => self.execute_for_of(stmt, labels),
            Statement::While(stmt) => self.execute_while(stmt, labels),
            Statement::DoWhile(stmt) => self.execute_do_while(stmt, labels),
            Statement::Switch(stmt) => self.execute_switch(stmt),
            other => self.execute_statement(other),
        }
    }

    pub(crate) fn execute_variable_declaration(
        &mut self,
        decl: &VariableDeclaration,
    ) -> Result<(), JsError> {
        for declarator in &decl.declarations {
            let init = match &declarator.init {
                Some(expr) => Some(self.evaluate_named(expr, &declarator.name)?),
                None => None,
            };
            let name = declarator.name.cheap_clone();
            match decl.kind {
                VariableKind::Var => self.heap.declare_var(self.env, name, init)?,
                VariableKind::Let => {
                    self.heap
                        .declare(self.env, name, init.unwrap_or_default(), BindingKind::Let)?
                }
                VariableKind::Const => {
                    self.heap
                        .declare(self.env, name, init.unwrap_or_default(), BindingKind::Const)?
                }
            }
        }
        Ok(())
    }

    fn execute_if(&mut self, stmt: &IfStatement) -> Result<Completion, JsError> {
        if self.evaluate(&stmt.test)?.to_boolean() {
            self.execute_statement(&stmt.consequent)
        } else if let Some(alternate) = &stmt.alternate {
            self.execute_statement(alternate)
        } else {
            Ok(Completion::normal())
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Loops
    // ═══════════════════════════════════════════════════════════════

    fn execute_while(&mut self, stmt: &WhileStatement, labels: &[JsString]) -> Result<Completion, JsError> {
        loop {
            self.check_budget()?;
            if !self.evaluate(&stmt.test)?.to_boolean() {
                break;
            }
            let completion = self.execute_statement(&stmt.body)?;
            match loop_action(completion, labels) {
                LoopAction::Next => {}
                LoopAction::Exit => break,
                LoopAction::Propagate(completion) => return Ok(completion),
            }
        }
        Ok(Completion::normal())
    }

    fn execute_do_while(
        &mut self,
        stmt: &DoWhileStatement,
        labels: &[JsString],
    ) -> Result<Completion, JsError> {
        loop {
            self.check_budget()?;
            let completion = self.execute_statement(&stmt.body)?;
            match loop_action(completion, labels) {
                LoopAction::Next => {}
                LoopAction::Exit => break,
                LoopAction::Propagate(completion) => return Ok(completion),
            }
            if !self.evaluate(&stmt.test)?.to_boolean() {
                break;
            }
        }
        Ok(Completion::normal())
    }

    fn execute_for(&mut self, stmt: &ForStatement, labels: &[JsString]) -> Result<Completion, JsError> {
        let per_iteration = matches!(
            &stmt.init,
            Some(ForInit::Variable(decl)) if decl.kind != VariableKind::Var
        );
        if !per_iteration {
            return self.run_for(stmt, labels, false);
        }
        let frame = self.push_block_frame();
        self.with_frame(frame, |interp| interp.run_for(stmt, labels, true))
    }

    fn run_for(
        &mut self,
        stmt: &ForStatement,
        labels: &[JsString],
        per_iteration: bool,
    ) -> Result<Completion, JsError> {
        match &stmt.init {
            Some(ForInit::Variable(decl)) => self.execute_variable_declaration(decl)?,
            Some(ForInit::Expression(expr)) => {
                self.evaluate(expr)?;
            }
            None => {}
        }
        // Each iteration sees its own copy of the loop bindings, so closures
        // created in the body keep the value of that iteration.
        if per_iteration {
            self.copy_iteration_frame()?;
        }
        loop {
            self.check_budget()?;
            if let Some(test) = &stmt.test
                && !self.evaluate(test)?.to_boolean()
            {
                break;
            }
            let completion = self.execute_statement(&stmt.body)?;
            match loop_action(completion, labels) {
                LoopAction::Next => {}
                LoopAction::Exit => break,
                LoopAction::Propagate(completion) => return Ok(completion),
            }
            if per_iteration {
                self.copy_iteration_frame()?;
            }
            if let Some(update) = &stmt.update {
                self.evaluate(update)?;
            }
        }
        Ok(Completion::normal())
    }

    /// Replace the current frame with a sibling holding copies of its bindings.
    fn copy_iteration_frame(&mut self) -> Result<(), JsError> {
        let current = self.heap.frame(self.env)?;
        let mut copy = ScopeFrame::new(current.outer, false);
        copy.bindings = current.bindings.clone();
        self.env = self.heap.alloc_frame(copy);
        Ok(())
    }

    /// Bind the loop variable of a `for-in`/`for-of` and run the body.
    fn bind_and_execute(
        &mut self,
        left: &ForInOfLeft,
        value: JsValue,
        body: &Statement,
    ) -> Result<Completion, JsError> {
        match left.kind {
            Some(VariableKind::Var) => {
                self.heap
                    .declare_var(self.env, left.name.cheap_clone(), Some(value))?;
                self.execute_statement(body)
            }
            Some(kind) => {
                let binding = if kind == VariableKind::Const {
                    BindingKind::Const
                } else {
                    BindingKind::Let
                };
                let mut frame = ScopeFrame::new(Some(self.env), false);
                frame.declare(left.name.cheap_clone(), value, binding)?;
                let frame = self.heap.alloc_frame(frame);
                self.with_frame(frame, |interp| interp.execute_statement(body))
            }
            None => {
                self.assign_identifier(&left.name, value)?;
                self.execute_statement(body)
            }
        }
    }

    fn execute_for_in(&mut self, stmt: &ForInStatement, labels: &[JsString]) -> Result<Completion, JsError> {
        let target = self.evaluate(&stmt.right)?;
        let mut keys = self.enumerate_keys(&target)?;
        loop {
            self.check_budget()?;
            let step = self.iterator_next(&mut keys)?;
            if step.done {
                break;
            }
            let completion = self.bind_and_execute(&stmt.left, step.value, &stmt.body)?;
            match loop_action(completion, labels) {
                LoopAction::Next => {}
                LoopAction::Exit => break,
                LoopAction::Propagate(completion) => return Ok(completion),
            }
        }
        Ok(Completion::normal())
    }

    fn execute_for_of(&mut self, stmt: &ForOfStatement, labels: &[JsString]) -> Result<Completion, JsError> {
        let iterable = self.evaluate(&stmt.right)?;
        let mut iter = self.get_iterator(&iterable)?;
        loop {
            self.check_budget()?;
            let step = self.iterator_next(&mut iter)?;
            if step.done {
                break;
            }
            let completion = match self.bind_and_execute(&stmt.left, step.value, &stmt.body) {
                Ok(completion) => completion,
                Err(err) if !err.is_catchable() => return Err(err),
                Err(err) => {
                    // the original fault wins over anything `return` throws,
                    // unless closing hit the time budget or a host failure
                    return match self.iterator_close(&iter) {
                        Err(close_err) if !close_err.is_catchable() => Err(close_err),
                        _ => Err(err),
                    };
                }
            };
            match loop_action(completion, labels) {
                LoopAction::Next => {}
                LoopAction::Exit => {
                    self.iterator_close(&iter)?;
                    break;
                }
                LoopAction::Propagate(completion) => {
                    self.iterator_close(&iter)?;
                    return Ok(completion);
                }
            }
        }
        Ok(Completion::normal())
    }

    // ═══════════════════════════════════════════════════════════════
    // Switch and try
    // ═══════════════════════════════════════════════════════════════

    fn execute_switch(&mut self, stmt: &SwitchStatement) -> Result<Completion, JsError> {
        let discriminant = self.evaluate(&stmt.discriminant)?;
        let frame = self.push_block_frame();
        self.with_frame(frame, |interp| interp.run_switch(stmt, &discriminant))
    }

    fn run_switch(&mut self, stmt: &SwitchStatement, discriminant: &JsValue) -> Result<Completion, JsError> {
        for case in &stmt.cases {
            self.hoist_functions(&case.consequent)?;
        }

        let mut start = None;
        for (i, case) in stmt.cases.iter().enumerate() {
            if let Some(test) = &case.test
                && self.evaluate(test)?.strict_equals(discriminant)
            {
                start = Some(i);
                break;
            }
        }
        let Some(start) = start.or_else(|| stmt.cases.iter().position(|c| c.test.is_none())) else {
            return Ok(Completion::normal());
        };

        let mut last = JsValue::Undefined;
        for case in stmt.cases.iter().skip(start) {
            for inner in &case.consequent {
                match self.execute_statement(inner)? {
                    Completion::Normal(value) => {
                        if produces_value(inner) {
                            last = value;
                        }
                    }
                    Completion::Break(None) => return Ok(Completion::Normal(last)),
                    abrupt => return Ok(abrupt),
                }
            }
        }
        Ok(Completion::Normal(last))
    }

    /// `try`/`catch`/`finally`. An abrupt `finally` replaces whatever the
    /// protected block produced. Timeouts and internal failures pass
    /// through both clauses untouched.
    fn execute_try(&mut self, stmt: &TryStatement) -> Result<Completion, JsError> {
        let result = match (self.execute_block(&stmt.block.body), &stmt.handler) {
            (Err(err), Some(handler)) if err.is_catchable() => match self.error_to_value(err) {
                Ok(value) => self.execute_catch(handler, value),
                Err(err) => Err(err),
            },
            (other, _) => other,
        };

        let Some(finalizer) = &stmt.finalizer else {
            return result;
        };
        if let Err(err) = &result
            && !err.is_catchable()
        {
            return result;
        }
        match self.execute_block(&finalizer.body)? {
            Completion::Normal(_) => result,
            abrupt => Ok(abrupt),
        }
    }

    fn execute_catch(&mut self, handler: &CatchClause, value: JsValue) -> Result<Completion, JsError> {
        let mut frame = ScopeFrame::new(Some(self.env), false);
        if let Some(param) = &handler.param {
            frame.declare(param.cheap_clone(), value, BindingKind::Let)?;
        }
        let frame = self.heap.alloc_frame(frame);
        self.with_frame(frame, |interp| interp.execute_block(&handler.body.body))
    }
}
