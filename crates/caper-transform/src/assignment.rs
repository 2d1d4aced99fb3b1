//! Assignment lowering.
//!
//! Four cases, chosen by the shape of the left-hand side: a fresh
//! declaration, a local rebinding, a property reached through a parameter,
//! and a property of the enclosing contract. Property targets are reified to
//! their textual path; declarations carry the right-hand side as their
//! initializer.

use crate::context::{FunctionContext, LocalBinding};
use crate::errors::TranslateError;
use crate::expression::{lower_expression, lower_lvalue, unbracket};
use crate::mangle;
use crate::typer::{canonical_type, CanonicalType};
use caper_core::Expression as Ir;
use caper_parser::ast;

pub fn lower_assignment(
    lhs: &ast::Expression,
    rhs: &ast::Expression,
    ctx: &mut FunctionContext,
) -> Result<Ir, TranslateError> {
    let lhs = unbracket(lhs);

    if let ast::Expression::VariableDeclaration(decl) = lhs {
        return lower_declaration_assignment(decl, rhs, ctx);
    }

    if let ast::Expression::Identifier(id) = lhs {
        let env = ctx.env;
        let mangled = mangle::mangle_local(&id.name, env);
        if ctx.lookup(&mangled).is_some() {
            let value = lower_expression(rhs, ctx, false)?;
            return Ok(Ir::Assignment {
                target: mangled,
                value: Box::new(value),
            });
        }
        if env.has_field(&id.name) {
            return lower_property_assignment(&id.name, rhs, ctx);
        }
        return Err(TranslateError::unresolved(id.name.clone(), id.span));
    }

    if let ast::Expression::Binary(binary) = lhs {
        if binary.op == ast::BinaryOperator::Dot {
            match (unbracket(&binary.lhs), unbracket(&binary.rhs)) {
                (ast::Expression::SelfExpression(_), ast::Expression::Identifier(field)) => {
                    if !ctx.env.has_field(&field.name) {
                        return Err(TranslateError::unresolved(field.name.clone(), field.span));
                    }
                    return lower_property_assignment(&field.name, rhs, ctx);
                }
                (ast::Expression::Identifier(_), ast::Expression::Identifier(_)) => {
                    // Property reached through a parameter (or any local
                    // struct binding): assign against the lowered path.
                    let target = lower_lvalue(lhs, ctx)?;
                    let value = lower_expression(rhs, ctx, false)?;
                    return Ok(Ir::Assignment {
                        target: target.to_string(),
                        value: Box::new(value),
                    });
                }
                _ => return Err(TranslateError::InvalidAssignment { span: lhs.span() }),
            }
        }
    }

    Err(TranslateError::InvalidAssignment { span: lhs.span() })
}

/// Store into a property of the enclosing contract. In the initializer's
/// staging phase the target is the field's slot and the transfer is forced;
/// afterwards the target is the lowered storage path.
fn lower_property_assignment(
    field: &str,
    rhs: &ast::Expression,
    ctx: &mut FunctionContext,
) -> Result<Ir, TranslateError> {
    let force_move = ctx.in_staging();
    let target = crate::expression::lower_field_lvalue(field, ctx);
    let value = lower_expression(rhs, ctx, force_move)?;
    Ok(Ir::Assignment {
        target: target.to_string(),
        value: Box::new(value),
    })
}

fn lower_declaration_assignment(
    decl: &ast::VariableDeclaration,
    rhs: &ast::Expression,
    ctx: &mut FunctionContext,
) -> Result<Ir, TranslateError> {
    let env = ctx.env;
    let mangled = mangle::mangle_local(&decl.identifier.name, env);

    // The right-hand side lowers against the outer binding, before the new
    // name exists.
    let value = lower_expression(rhs, ctx, false)?;
    let canonical = declared_canonical(decl, rhs, ctx)?;

    ctx.declare(
        mangled.clone(),
        LocalBinding {
            canonical: canonical.clone(),
            is_parameter: false,
        },
    );

    // Shadow self-assignment: rebinding a name to itself emits nothing.
    if value.read_identifier() == Some(mangled.as_str()) {
        return Ok(Ir::Noop);
    }

    Ok(Ir::VariableDeclaration {
        name: mangled,
        ty: canonical.render(env.contract_name()),
        initializer: Some(Box::new(value)),
    })
}

/// The declared canonical type: the annotation when present, otherwise
/// inferred from an identifier right-hand side.
fn declared_canonical(
    decl: &ast::VariableDeclaration,
    rhs: &ast::Expression,
    ctx: &FunctionContext,
) -> Result<CanonicalType, TranslateError> {
    let env = ctx.env;
    if let Some(raw) = &decl.raw_type {
        return canonical_type(raw, env).ok_or_else(|| TranslateError::UnknownType {
            name: raw.to_string(),
            span: decl.identifier.span,
        });
    }
    if let ast::Expression::Identifier(id) = unbracket(rhs) {
        let mangled = mangle::mangle_local(&id.name, env);
        if let Some(binding) = ctx.lookup(&mangled) {
            return Ok(binding.canonical.clone());
        }
        if env.has_field(&id.name) {
            return crate::expression::field_canonical(&id.name, id.span, ctx);
        }
    }
    Err(TranslateError::UnknownType {
        name: decl.identifier.name.clone(),
        span: decl.identifier.span,
    })
}
