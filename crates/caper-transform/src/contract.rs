//! Module composition.
//!
//! Assembles the emitted module: the resource type's ordered fields, the
//! synthesized initializer trio, then one procedure per behavior function
//! under its (possibly mangled) target identifier.

use crate::context::{FunctionContext, SelfState};
use crate::environment::Environment;
use crate::errors::{Diagnostics, TranslateError};
use crate::expression::lower_expression;
use crate::initializer;
use crate::mangle;
use crate::typer::canonical_type;
use caper_core::{Expression as Ir, Field, Module, Procedure, Statement, Type};
use caper_parser::ast;

pub fn generate_module(
    module: &ast::TopLevelModule,
    env: &Environment,
    diagnostics: &mut Diagnostics,
) -> Module {
    let contract = &module.contract;
    let mut out = Module::new(contract.identifier.name.clone());

    for variable in &contract.variables {
        let Some(raw) = &variable.raw_type else {
            continue;
        };
        match canonical_type(raw, env) {
            Some(canonical) => out.resource.fields.push(Field::new(
                variable.identifier.name.clone(),
                canonical.render(env.contract_name()),
            )),
            None => diagnostics.push(TranslateError::UnknownType {
                name: raw.to_string(),
                span: variable.identifier.span,
            }),
        }
    }

    // One initializer per contract; extra declarations are diagnosed and
    // ignored.
    let mut special: Option<(&ast::SpecialDeclaration, Vec<String>)> = None;
    for behavior in &module.behaviors {
        if behavior.contract_identifier.name != env.contract_name() {
            continue;
        }
        let capabilities: Vec<String> = behavior
            .capabilities
            .iter()
            .map(|cap| cap.name().to_string())
            .collect();
        for member in &behavior.members {
            if let ast::BehaviorMember::Special(decl) = member {
                if special.is_some() {
                    diagnostics.push(TranslateError::ConflictingDeclaration {
                        name: "init".to_string(),
                        span: decl.span,
                    });
                } else {
                    special = Some((decl, capabilities.clone()));
                }
            }
        }
    }

    match initializer::synthesize(contract, special, env) {
        Ok(procedures) => out.procedures.extend(procedures),
        Err(error) => diagnostics.push(error),
    }

    for behavior in &module.behaviors {
        if behavior.contract_identifier.name != env.contract_name() {
            continue; // diagnosed during environment construction
        }
        let capabilities: Vec<String> = behavior
            .capabilities
            .iter()
            .map(|cap| cap.name().to_string())
            .collect();
        for member in &behavior.members {
            if let ast::BehaviorMember::Function(declaration) = member {
                match lower_function(declaration, &capabilities, env) {
                    Ok(procedure) => out.procedures.push(procedure),
                    Err(error) => diagnostics.push(error),
                }
            }
        }
    }

    out
}

fn lower_function(
    declaration: &ast::FunctionDeclaration,
    capabilities: &[String],
    env: &Environment,
) -> Result<Procedure, TranslateError> {
    let enclosing = env.contract_name().to_string();
    let mut ctx = FunctionContext::new(env, capabilities.to_vec());

    let mut parameters = Vec::new();
    for parameter in &declaration.parameters {
        let canonical =
            canonical_type(&parameter.raw_type, env).ok_or_else(|| TranslateError::UnknownType {
                name: parameter.raw_type.to_string(),
                span: parameter.identifier.span,
            })?;
        let mangled = mangle::mangle_local(&parameter.identifier.name, env);
        let rendered = match &parameter.raw_type {
            ast::RawType::Inout(_) => Type::mut_reference(canonical.render(&enclosing)),
            _ => canonical.render(&enclosing),
        };
        parameters.push(Field::new(mangled.clone(), rendered));
        ctx.declare_parameter(mangled, canonical);
    }

    let result = match &declaration.result_type {
        Some(raw) => Some(
            canonical_type(raw, env)
                .ok_or_else(|| TranslateError::UnknownType {
                    name: raw.to_string(),
                    span: declaration.identifier.span,
                })?
                .render(&enclosing),
        ),
        None => None,
    };

    for statement in &declaration.body {
        lower_statement(statement, &mut ctx)?;
    }
    if !ctx.last_is_return() {
        ctx.emit_release_references();
        ctx.emit(Statement::Return(None));
    }

    let name = env
        .function_target_name(&declaration.identifier.name, capabilities)
        .unwrap_or(&declaration.identifier.name)
        .to_string();

    Ok(Procedure {
        name,
        public: declaration.is_public(),
        parameters,
        result,
        body: ctx.finish(),
    })
}

pub(crate) fn lower_statement(
    statement: &ast::Statement,
    ctx: &mut FunctionContext,
) -> Result<(), TranslateError> {
    match statement {
        ast::Statement::Expression(expr) => {
            let lowered = lower_expression(expr, ctx, false)?;
            ctx.emit(Statement::Expression(lowered));
            Ok(())
        }
        ast::Statement::Return(ret) => {
            // Once the initializer's struct is bound, every return yields it.
            let value = if ctx.self_state == SelfState::Bound {
                Some(Ir::moved(Ir::ident(mangle::SELF_BINDING)))
            } else {
                match &ret.expression {
                    Some(expr) => Some(lower_expression(expr, ctx, false)?),
                    None => None,
                }
            };
            ctx.emit_release_references();
            ctx.emit(Statement::Return(value));
            Ok(())
        }
        ast::Statement::If(if_stmt) => {
            let condition = lower_expression(&if_stmt.condition, ctx, false)?;
            let body = ctx.nested(|ctx| {
                for statement in &if_stmt.body {
                    lower_statement(statement, ctx)?;
                }
                Ok(())
            })?;
            let else_body = ctx.nested(|ctx| {
                for statement in &if_stmt.else_body {
                    lower_statement(statement, ctx)?;
                }
                Ok(())
            })?;
            ctx.emit(Statement::If {
                condition,
                body,
                else_body,
            });
            Ok(())
        }
    }
}
