//! Initializer synthesis.
//!
//! The contract initializer is not an ordinary function: it constructs the
//! resource `T`. Its body lowers in two phases. Phase A declares a staging
//! slot per contract field and walks source statements until every field has
//! been assigned exactly once. Phase B packs the slots into the struct
//! constructor; when statements remain after full assignment, the value is
//! bound to a prepended `self` local so the tail of the body can mutate it.
//!
//! Alongside `new`, the module receives `publish` (move the fresh resource
//! to the sender) and the accessor `get`.

use crate::context::FunctionContext;
use crate::contract::lower_statement;
use crate::environment::Environment;
use crate::errors::TranslateError;
use crate::expression::unbracket;
use crate::mangle;
use crate::typer::canonical_type;
use caper_core::{Expression as Ir, Field, Procedure, Statement, Type, RESOURCE_NAME};
use caper_parser::ast;
use indexmap::IndexSet;

pub fn synthesize(
    contract: &ast::ContractDeclaration,
    special: Option<(&ast::SpecialDeclaration, Vec<String>)>,
    env: &Environment,
) -> Result<Vec<Procedure>, TranslateError> {
    let enclosing = env.contract_name().to_string();
    let (ast_params, body, capabilities, span): (
        &[ast::Parameter],
        &[ast::Statement],
        Vec<String>,
        ast::Span,
    ) = match special {
        Some((decl, caps)) => (&decl.parameters, &decl.body, caps, decl.span),
        None => (&[], &[], Vec::new(), contract.identifier.span),
    };

    let mut ctx = FunctionContext::new_constructor(env, capabilities);
    let mut parameters = Vec::new();
    for parameter in ast_params {
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

    // Phase A prologue: one staging slot per field, in declaration order.
    for variable in &contract.variables {
        let Some(raw) = &variable.raw_type else {
            continue;
        };
        let canonical = canonical_type(raw, env).ok_or_else(|| TranslateError::UnknownType {
            name: raw.to_string(),
            span: variable.identifier.span,
        })?;
        ctx.emit_expression(Ir::VariableDeclaration {
            name: mangle::staging_slot(&variable.identifier.name),
            ty: canonical.render(&enclosing),
            initializer: None,
        });
    }

    let mut unassigned: IndexSet<String> = contract
        .variables
        .iter()
        .map(|v| v.identifier.name.clone())
        .collect();

    // Phase A walk: emit statements in source order, tracking top-level
    // field assignments, until the unassigned set drains.
    let mut consumed = 0;
    for statement in body {
        if unassigned.is_empty() {
            break;
        }
        if matches!(statement, ast::Statement::Return(_)) {
            return Err(TranslateError::IncompleteInitializer {
                fields: unassigned.into_iter().collect(),
                span,
            });
        }
        if let Some(field) = staged_assignment_target(statement, env) {
            unassigned.shift_remove(&field);
        }
        lower_statement(statement, &mut ctx)?;
        consumed += 1;
    }
    if !unassigned.is_empty() {
        return Err(TranslateError::IncompleteInitializer {
            fields: unassigned.into_iter().collect(),
            span,
        });
    }

    let constructor = Ir::StructConstructor {
        name: RESOURCE_NAME.to_string(),
        fields: contract
            .variables
            .iter()
            .map(|v| {
                (
                    v.identifier.name.clone(),
                    Ir::moved(Ir::ident(mangle::staging_slot(&v.identifier.name))),
                )
            })
            .collect(),
    };

    if consumed == body.len() {
        // No code after full assignment: return the constructor directly.
        ctx.emit_release_references();
        ctx.emit(Statement::Return(Some(constructor)));
    } else {
        // The tail of the body runs against a bound `self`. The binding's
        // declaration must precede everything emitted in Phase A.
        ctx.bind_self();
        ctx.prepend(Statement::Expression(Ir::VariableDeclaration {
            name: mangle::SELF_BINDING.to_string(),
            ty: Type::Named(format!("Self.{}", RESOURCE_NAME)),
            initializer: None,
        }));
        ctx.emit_expression(Ir::Assignment {
            target: mangle::SELF_BINDING.to_string(),
            value: Box::new(constructor),
        });
        for statement in &body[consumed..] {
            lower_statement(statement, &mut ctx)?;
        }
        if !ctx.last_is_return() {
            ctx.emit_release_references();
            ctx.emit(Statement::Return(Some(Ir::moved(Ir::ident(
                mangle::SELF_BINDING,
            )))));
        }
    }

    let new_procedure = Procedure {
        name: "new".to_string(),
        public: false,
        parameters: parameters.clone(),
        result: Some(Type::Named(format!("Self.{}", RESOURCE_NAME))),
        body: ctx.finish(),
    };

    let forwarded: Vec<Ir> = parameters
        .iter()
        .map(|p| Ir::moved(Ir::ident(p.name.clone())))
        .collect();
    let publish = Procedure {
        name: "publish".to_string(),
        public: true,
        parameters,
        result: None,
        body: vec![
            Statement::Expression(Ir::call(
                format!("move_to_sender<{}>", RESOURCE_NAME),
                vec![Ir::call("Self.new", forwarded)],
            )),
            Statement::Return(None),
        ],
    };

    let get = Procedure {
        name: "get".to_string(),
        public: true,
        parameters: vec![Field::new("addr", Type::Address)],
        result: Some(Type::mut_reference(Type::Named(format!(
            "Self.{}",
            RESOURCE_NAME
        )))),
        body: vec![Statement::Return(Some(Ir::call(
            format!("borrow_global<{}>", RESOURCE_NAME),
            vec![Ir::moved(Ir::ident("addr"))],
        )))],
    };

    Ok(vec![new_procedure, publish, get])
}

/// The field a statement assigns, when it is a top-level `=` whose target is
/// a bare field name or `self.<field>`.
fn staged_assignment_target(statement: &ast::Statement, env: &Environment) -> Option<String> {
    let ast::Statement::Expression(expr) = statement else {
        return None;
    };
    let ast::Expression::Binary(binary) = unbracket(expr) else {
        return None;
    };
    if binary.op != ast::BinaryOperator::Assign {
        return None;
    }
    match unbracket(&binary.lhs) {
        ast::Expression::Identifier(id) if env.has_field(&id.name) => Some(id.name.clone()),
        ast::Expression::Binary(dot) if dot.op == ast::BinaryOperator::Dot => {
            match (unbracket(&dot.lhs), unbracket(&dot.rhs)) {
                (ast::Expression::SelfExpression(_), ast::Expression::Identifier(field))
                    if env.has_field(&field.name) =>
                {
                    Some(field.name.clone())
                }
                _ => None,
            }
        }
        _ => None,
    }
}
