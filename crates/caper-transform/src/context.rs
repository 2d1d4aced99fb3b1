//! Per-body lowering state.
//!
//! A `FunctionContext` is created for one function body, mutated while the
//! body lowers, and consumed by [`FunctionContext::finish`]. It owns the
//! emission buffer, the scope stack, the pending-release list for borrowed
//! storage references, and the initializer's two-state `self` machine.

use crate::environment::Environment;
use crate::mangle;
use crate::typer::CanonicalType;
use caper_core::{Expression, Statement};
use std::collections::HashMap;

/// How `self` materializes in the current body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfState {
    /// Ordinary function: fields live in global storage.
    None,
    /// Initializer before the resource is constructed: fields live in
    /// staging slots.
    Staging,
    /// Initializer after construction: fields live in the `self` binding.
    Bound,
}

#[derive(Debug, Clone)]
pub struct LocalBinding {
    pub canonical: CanonicalType,
    pub is_parameter: bool,
}

#[derive(Debug, Default)]
struct Scope {
    bindings: HashMap<String, LocalBinding>,
}

pub struct FunctionContext<'a> {
    pub env: &'a Environment,
    pub caller_capabilities: Vec<String>,
    pub self_state: SelfState,
    statements: Vec<Statement>,
    scopes: Vec<Scope>,
    pending_releases: Vec<String>,
    next_reference: u32,
}

impl<'a> FunctionContext<'a> {
    pub fn new(env: &'a Environment, caller_capabilities: Vec<String>) -> Self {
        Self {
            env,
            caller_capabilities,
            self_state: SelfState::None,
            statements: Vec::new(),
            scopes: vec![Scope::default()],
            pending_releases: Vec::new(),
            next_reference: 0,
        }
    }

    pub fn new_constructor(env: &'a Environment, caller_capabilities: Vec<String>) -> Self {
        let mut ctx = Self::new(env, caller_capabilities);
        ctx.self_state = SelfState::Staging;
        ctx
    }

    /// True while the initializer stages fields into `self$…` slots.
    pub fn in_staging(&self) -> bool {
        self.self_state == SelfState::Staging
    }

    /// One-way transition taken when the struct constructor is emitted.
    pub fn bind_self(&mut self) {
        debug_assert_eq!(self.self_state, SelfState::Staging);
        self.self_state = SelfState::Bound;
    }

    pub fn emit(&mut self, statement: Statement) {
        if !statement.is_empty() {
            self.statements.push(statement);
        }
    }

    pub fn emit_expression(&mut self, expression: Expression) {
        self.emit(Statement::Expression(expression));
    }

    /// Insert at position zero of the emission buffer. Used once, for the
    /// initializer's `let self: Self.T;`.
    pub fn prepend(&mut self, statement: Statement) {
        self.statements.insert(0, statement);
    }

    pub fn last_is_return(&self) -> bool {
        self.statements.last().is_some_and(Statement::is_return)
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Register a binding under its already-mangled name.
    pub fn declare(&mut self, name: String, binding: LocalBinding) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .bindings
            .insert(name, binding);
    }

    pub fn declare_parameter(&mut self, name: String, canonical: CanonicalType) {
        self.declare(
            name,
            LocalBinding {
                canonical,
                is_parameter: true,
            },
        );
    }

    pub fn lookup(&self, name: &str) -> Option<&LocalBinding> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.get(name))
    }

    /// Fresh name for a borrowed-storage reference, registered for release.
    pub fn fresh_reference(&mut self) -> String {
        let name = mangle::reference_slot(self.next_reference);
        self.next_reference += 1;
        self.pending_releases.push(name.clone());
        name
    }

    /// Emit the matching releases for every live borrow, LIFO. The list is
    /// not drained: each exit path repeats the full sequence.
    pub fn emit_release_references(&mut self) {
        let releases: Vec<Statement> = self
            .pending_releases
            .iter()
            .rev()
            .map(|name| {
                Statement::Expression(Expression::call(
                    "release",
                    vec![Expression::moved(Expression::ident(name.clone()))],
                ))
            })
            .collect();
        for release in releases {
            self.emit(release);
        }
    }

    /// Lower into a detached buffer, for nested blocks.
    pub fn nested<F>(&mut self, f: F) -> Result<Vec<Statement>, crate::errors::TranslateError>
    where
        F: FnOnce(&mut Self) -> Result<(), crate::errors::TranslateError>,
    {
        let saved = std::mem::take(&mut self.statements);
        self.push_scope();
        let outcome = f(self);
        self.pop_scope();
        let body = std::mem::replace(&mut self.statements, saved);
        outcome.map(|_| body)
    }

    pub fn finish(self) -> Vec<Statement> {
        self.statements
    }
}
