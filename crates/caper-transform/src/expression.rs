//! Expression lowering.
//!
//! Each AST variant lowers to one target expression; borrows of contract
//! storage additionally emit their declaration and acquisition into the
//! surrounding `FunctionContext`. `force_move` propagates the few places
//! (initializer staging, synthesized forwarding) where a read must transfer
//! ownership regardless of the value's category.

use crate::assignment;
use crate::context::{FunctionContext, LocalBinding, SelfState};
use crate::errors::TranslateError;
use crate::mangle;
use crate::typer::{canonical_type, CanonicalType};
use caper_core::{
    BinaryOp, Expression as Ir, Literal as IrLiteral, TransferKind, Type, RESOURCE_NAME,
};
use caper_parser::ast;

pub fn lower_expression(
    expr: &ast::Expression,
    ctx: &mut FunctionContext,
    force_move: bool,
) -> Result<Ir, TranslateError> {
    match expr {
        ast::Expression::Identifier(id) => lower_identifier(id, ctx, force_move),
        ast::Expression::Binary(binary) => match binary.op {
            ast::BinaryOperator::Assign => {
                assignment::lower_assignment(&binary.lhs, &binary.rhs, ctx)
            }
            ast::BinaryOperator::Dot => lower_dot(binary, ctx, force_move),
            op => {
                let lhs = lower_expression(&binary.lhs, ctx, false)?;
                let rhs = lower_expression(&binary.rhs, ctx, false)?;
                Ok(Ir::Binary {
                    op: infix_operator(op),
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                })
            }
        },
        ast::Expression::FunctionCall(call) => lower_function_call(call, ctx, force_move),
        ast::Expression::Literal(literal) => Ok(lower_literal(literal)),
        ast::Expression::SelfExpression(span) => match ctx.self_state {
            SelfState::Bound => Ok(Ir::ident(mangle::SELF_BINDING)),
            _ => Err(TranslateError::unresolved_with(
                "self",
                "`self` has no value in this position",
                *span,
            )),
        },
        ast::Expression::VariableDeclaration(decl) => lower_bare_declaration(decl, ctx),
        ast::Expression::Bracketed(inner) => lower_expression(inner, ctx, force_move),
    }
}

/// Lowers an assignable path: no transfer wrappers, storage paths resolve to
/// a mutable-reference projection.
pub fn lower_lvalue(
    expr: &ast::Expression,
    ctx: &mut FunctionContext,
) -> Result<Ir, TranslateError> {
    match expr {
        ast::Expression::Bracketed(inner) => lower_lvalue(inner, ctx),
        ast::Expression::Identifier(id) => {
            let env = ctx.env;
            let mangled = mangle::mangle_local(&id.name, env);
            if ctx.lookup(&mangled).is_some() {
                return Ok(Ir::ident(mangled));
            }
            if env.has_field(&id.name) {
                return Ok(lower_field_lvalue(&id.name, ctx));
            }
            Err(TranslateError::unresolved(id.name.clone(), id.span))
        }
        ast::Expression::Binary(binary) if binary.op == ast::BinaryOperator::Dot => {
            match (unbracket(&binary.lhs), unbracket(&binary.rhs)) {
                (ast::Expression::SelfExpression(_), ast::Expression::Identifier(field)) => {
                    if !ctx.env.has_field(&field.name) {
                        return Err(TranslateError::unresolved(field.name.clone(), field.span));
                    }
                    Ok(lower_field_lvalue(&field.name, ctx))
                }
                (ast::Expression::Identifier(base), ast::Expression::Identifier(field)) => {
                    let mangled = mangle::mangle_local(&base.name, ctx.env);
                    if ctx.lookup(&mangled).is_none() {
                        return Err(TranslateError::unresolved(base.name.clone(), base.span));
                    }
                    Ok(Ir::FieldAccess {
                        base: Box::new(Ir::ident(mangled)),
                        field: field.name.clone(),
                    })
                }
                _ => Err(TranslateError::InvalidAssignment { span: expr.span() }),
            }
        }
        _ => Err(TranslateError::InvalidAssignment { span: expr.span() }),
    }
}

fn lower_identifier(
    id: &ast::Identifier,
    ctx: &mut FunctionContext,
    force_move: bool,
) -> Result<Ir, TranslateError> {
    let env = ctx.env;
    let mangled = mangle::mangle_local(&id.name, env);
    // Locals shadow contract fields.
    if let Some(binding) = ctx.lookup(&mangled) {
        let canonical = binding.canonical.clone();
        return Ok(wrap_transfer(Ir::ident(mangled), &canonical, force_move));
    }
    if env.has_field(&id.name) {
        return lower_field_read(&id.name, id.span, ctx, force_move);
    }
    Err(TranslateError::unresolved(id.name.clone(), id.span))
}

fn lower_field_read(
    field: &str,
    span: ast::Span,
    ctx: &mut FunctionContext,
    force_move: bool,
) -> Result<Ir, TranslateError> {
    match ctx.self_state {
        SelfState::Staging => {
            let canonical = field_canonical(field, span, ctx)?;
            Ok(wrap_transfer(
                Ir::ident(mangle::staging_slot(field)),
                &canonical,
                force_move,
            ))
        }
        SelfState::Bound => Ok(Ir::FieldAccess {
            base: Box::new(Ir::copied(Ir::ident(mangle::SELF_BINDING))),
            field: field.to_string(),
        }),
        SelfState::None => Ok(storage_field_projection(field, ctx)),
    }
}

pub(crate) fn lower_field_lvalue(field: &str, ctx: &mut FunctionContext) -> Ir {
    match ctx.self_state {
        SelfState::Staging => Ir::ident(mangle::staging_slot(field)),
        SelfState::Bound => Ir::FieldAccess {
            base: Box::new(Ir::ident(mangle::SELF_BINDING)),
            field: field.to_string(),
        },
        SelfState::None => storage_field_projection(field, ctx),
    }
}

/// Borrow contract storage and project the field. The borrow is bound to a
/// fresh reference local and registered for release.
fn storage_field_projection(field: &str, ctx: &mut FunctionContext) -> Ir {
    let reference = ctx.fresh_reference();
    ctx.emit_expression(Ir::VariableDeclaration {
        name: reference.clone(),
        ty: Type::mut_reference(Type::Named(format!("Self.{}", RESOURCE_NAME))),
        initializer: None,
    });
    ctx.emit_expression(Ir::Assignment {
        target: reference.clone(),
        value: Box::new(Ir::call(
            format!("borrow_global_mut<{}>", RESOURCE_NAME),
            vec![Ir::call("get_txn_sender", vec![])],
        )),
    });
    Ir::FieldAccess {
        base: Box::new(Ir::copied(Ir::ident(reference))),
        field: field.to_string(),
    }
}

fn lower_dot(
    binary: &ast::BinaryExpression,
    ctx: &mut FunctionContext,
    force_move: bool,
) -> Result<Ir, TranslateError> {
    match (unbracket(&binary.lhs), unbracket(&binary.rhs)) {
        (ast::Expression::SelfExpression(_), ast::Expression::Identifier(field)) => {
            if !ctx.env.has_field(&field.name) {
                return Err(TranslateError::unresolved(field.name.clone(), field.span));
            }
            lower_field_read(&field.name, field.span, ctx, force_move)
        }
        (ast::Expression::SelfExpression(_), ast::Expression::FunctionCall(call)) => {
            lower_function_call(call, ctx, force_move)
        }
        (_, ast::Expression::Identifier(field)) => {
            // Projection does not consume its base.
            let base = match lower_expression(&binary.lhs, ctx, false)? {
                Ir::Transfer {
                    kind: TransferKind::Move,
                    value,
                } => Ir::Transfer {
                    kind: TransferKind::Copy,
                    value,
                },
                other => other,
            };
            Ok(Ir::FieldAccess {
                base: Box::new(base),
                field: field.name.clone(),
            })
        }
        (_, rhs) => Err(TranslateError::unresolved_with(
            "member access",
            "only fields and `self` methods can follow `.`",
            rhs.span(),
        )),
    }
}

fn lower_function_call(
    call: &ast::FunctionCall,
    ctx: &mut FunctionContext,
    force_move: bool,
) -> Result<Ir, TranslateError> {
    let env = ctx.env;
    let name = &call.identifier.name;
    let span = call.identifier.span;

    // Declared events re-dispatch as emissions.
    if let Some(event) = env.event(name) {
        let expected = event.declaration.parameters.len();
        if expected != call.arguments.len() {
            return Err(TranslateError::unresolved_with(
                name.clone(),
                format!("event takes {} argument(s)", expected),
                span,
            ));
        }
        let mut arguments = Vec::new();
        for argument in &call.arguments {
            arguments.push(lower_expression(argument, ctx, false)?);
        }
        return Ok(Ir::call(format!("emit_event<{}>", name), arguments));
    }

    // Compiler-generated initializers are identity coercions: the call is
    // erased and the single argument lowers in its place.
    if env.has_generated_initializer(name) {
        if call.arguments.len() != 1 {
            return Err(TranslateError::unresolved_with(
                name.clone(),
                "generated initializer takes exactly one argument",
                span,
            ));
        }
        return lower_expression(&call.arguments[0], ctx, force_move);
    }

    let caller = ctx.caller_capabilities.clone();
    match env.match_function(name, call.arguments.len(), &caller) {
        crate::environment::FunctionMatch::Matched(info) => {
            let target = info.target_name().to_string();
            let mut arguments = Vec::new();
            for (argument, parameter) in call.arguments.iter().zip(&info.declaration.parameters) {
                if matches!(parameter.raw_type, ast::RawType::Inout(_)) {
                    arguments.push(Ir::AddressOf(Box::new(lower_lvalue(argument, ctx)?)));
                } else {
                    arguments.push(lower_expression(argument, ctx, false)?);
                }
            }
            Ok(Ir::call(target, arguments))
        }
        crate::environment::FunctionMatch::CapabilityMismatch => {
            Err(TranslateError::CapabilityViolation {
                name: name.clone(),
                context: caller.join(", "),
                span,
            })
        }
        crate::environment::FunctionMatch::ArityMismatch => Err(TranslateError::unresolved_with(
            name.clone(),
            "no overload takes this many arguments",
            span,
        )),
        crate::environment::FunctionMatch::Unknown => {
            Err(TranslateError::unresolved(name.clone(), span))
        }
    }
}

fn lower_bare_declaration(
    decl: &ast::VariableDeclaration,
    ctx: &mut FunctionContext,
) -> Result<Ir, TranslateError> {
    let env = ctx.env;
    let Some(raw) = &decl.raw_type else {
        return Err(TranslateError::UnknownType {
            name: decl.identifier.name.clone(),
            span: decl.identifier.span,
        });
    };
    let canonical = canonical_type(raw, env).ok_or_else(|| TranslateError::UnknownType {
        name: raw.to_string(),
        span: decl.identifier.span,
    })?;
    let mangled = mangle::mangle_local(&decl.identifier.name, env);
    ctx.declare(
        mangled.clone(),
        LocalBinding {
            canonical: canonical.clone(),
            is_parameter: false,
        },
    );
    ctx.emit_expression(Ir::VariableDeclaration {
        name: mangled.clone(),
        ty: canonical.render(env.contract_name()),
        initializer: None,
    });
    Ok(Ir::ident(mangled))
}

fn lower_literal(literal: &ast::Literal) -> Ir {
    Ir::Literal(match &literal.kind {
        ast::LiteralKind::Int(value) => IrLiteral::U64(*value),
        ast::LiteralKind::Address(hex) => IrLiteral::Address(hex.clone()),
        ast::LiteralKind::Bool(value) => IrLiteral::Bool(*value),
        ast::LiteralKind::String(text) => IrLiteral::ByteArray(text.as_bytes().to_vec()),
    })
}

/// Resources move; everything else copies unless a move is forced.
pub fn wrap_transfer(value: Ir, canonical: &CanonicalType, force_move: bool) -> Ir {
    if force_move || canonical.is_resource() {
        Ir::moved(value)
    } else {
        Ir::copied(value)
    }
}

pub fn field_canonical(
    field: &str,
    span: ast::Span,
    ctx: &FunctionContext,
) -> Result<CanonicalType, TranslateError> {
    let raw = ctx
        .env
        .field_raw_type(field)
        .unwrap_or_else(|| unreachable!("field existence checked by caller"));
    canonical_type(raw, ctx.env).ok_or_else(|| TranslateError::UnknownType {
        name: raw.to_string(),
        span,
    })
}

pub fn unbracket(expr: &ast::Expression) -> &ast::Expression {
    match expr {
        ast::Expression::Bracketed(inner) => unbracket(inner),
        other => other,
    }
}

fn infix_operator(op: ast::BinaryOperator) -> BinaryOp {
    match op {
        ast::BinaryOperator::Equal => BinaryOp::Equal,
        ast::BinaryOperator::NotEqual => BinaryOp::NotEqual,
        ast::BinaryOperator::Less => BinaryOp::Less,
        ast::BinaryOperator::Greater => BinaryOp::Greater,
        ast::BinaryOperator::LessOrEqual => BinaryOp::LessOrEqual,
        ast::BinaryOperator::GreaterOrEqual => BinaryOp::GreaterOrEqual,
        ast::BinaryOperator::Plus => BinaryOp::Add,
        ast::BinaryOperator::Minus => BinaryOp::Subtract,
        ast::BinaryOperator::Times => BinaryOp::Multiply,
        ast::BinaryOperator::Divide => BinaryOp::Divide,
        // Assignment and member access never reach the infix path.
        ast::BinaryOperator::Assign | ast::BinaryOperator::Dot => {
            unreachable!("handled before infix lowering")
        }
    }
}
