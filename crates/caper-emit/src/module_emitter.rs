//! Renders a compiled module to target IR text.
//!
//! Layout: the resource type first, then the initializer trio, then the
//! behavior procedures, one blank line between items.

use crate::emitter::{EmitContext, EmitHelper, EmitResult, Emittable};
use anyhow::Result;
use caper_core::{Module, Procedure, ResourceType, Statement, RESOURCE_NAME};
use std::io::Write;

pub struct ModuleEmitter {
    module: Module,
}

impl ModuleEmitter {
    pub fn new(module: Module) -> Self {
        Self { module }
    }

    pub fn emit_to_string(&self) -> Result<String> {
        self.module.to_formatted_string()
    }
}

impl Emittable for Module {
    fn emit<W: Write>(&self, writer: &mut W, context: &mut EmitContext) -> EmitResult {
        EmitHelper::write_block(writer, context, &format!("module {}", self.name), |w, c| {
            self.resource.emit(w, c)?;
            for procedure in &self.procedures {
                EmitHelper::blank_line(w)?;
                procedure.emit(w, c)?;
            }
            Ok(())
        })
    }
}

impl Emittable for ResourceType {
    fn emit<W: Write>(&self, writer: &mut W, context: &mut EmitContext) -> EmitResult {
        if self.fields.is_empty() {
            return EmitHelper::write_line(writer, context, &format!("resource {} {{}}", RESOURCE_NAME));
        }
        EmitHelper::write_block(
            writer,
            context,
            &format!("resource {}", RESOURCE_NAME),
            |w, c| {
                for (i, field) in self.fields.iter().enumerate() {
                    let comma = if i + 1 < self.fields.len() { "," } else { "" };
                    EmitHelper::write_line(w, c, &format!("{}: {}{}", field.name, field.ty, comma))?;
                }
                Ok(())
            },
        )
    }
}

impl Emittable for Procedure {
    fn emit<W: Write>(&self, writer: &mut W, context: &mut EmitContext) -> EmitResult {
        let visibility = if self.public { "public " } else { "" };
        let params = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect::<Vec<_>>()
            .join(", ");
        let result = match &self.result {
            Some(ty) => format!(": {}", ty),
            None => String::new(),
        };
        let header = format!("{}{}({}){}", visibility, self.name, params, result);
        EmitHelper::write_block(writer, context, &header, |w, c| {
            for statement in &self.body {
                statement.emit(w, c)?;
            }
            Ok(())
        })
    }
}

impl Emittable for Statement {
    fn emit<W: Write>(&self, writer: &mut W, context: &mut EmitContext) -> EmitResult {
        match self {
            Statement::Expression(expr) => {
                if expr.is_noop() {
                    return Ok(());
                }
                EmitHelper::write_line(writer, context, &format!("{};", expr))
            }
            Statement::Return(None) => EmitHelper::write_line(writer, context, "return;"),
            Statement::Return(Some(expr)) => {
                EmitHelper::write_line(writer, context, &format!("return {};", expr))
            }
            Statement::If {
                condition,
                body,
                else_body,
            } => {
                EmitHelper::write_block(writer, context, &format!("if ({})", condition), |w, c| {
                    for statement in body {
                        statement.emit(w, c)?;
                    }
                    Ok(())
                })?;
                if !else_body.is_empty() {
                    EmitHelper::write_block(writer, context, "else", |w, c| {
                        for statement in else_body {
                            statement.emit(w, c)?;
                        }
                        Ok(())
                    })?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caper_transform::translate_source;

    fn emit(source: &str) -> String {
        let module = translate_source(source).unwrap();
        ModuleEmitter::new(module).emit_to_string().unwrap()
    }

    #[test]
    fn empty_contract_module_text() {
        let text = emit("contract Empty {} Empty :: [any] {}");
        assert_eq!(
            text,
            "module Empty {\n\
             \x20   resource T {}\n\
             \n\
             \x20   new(): Self.T {\n\
             \x20       return struct T {};\n\
             \x20   }\n\
             \n\
             \x20   public publish() {\n\
             \x20       move_to_sender<T>(Self.new());\n\
             \x20       return;\n\
             \x20   }\n\
             \n\
             \x20   public get(addr: address): &mut Self.T {\n\
             \x20       return borrow_global<T>(move(addr));\n\
             \x20   }\n\
             }\n"
        );
    }

    #[test]
    fn one_field_initializer_module_text() {
        let text = emit(
            "contract C { var x: Address } \
             C :: [any] { public mutating func init(y: Address) { self.x = y } }",
        );
        assert!(text.contains("resource T {\n        x: address\n    }"));
        assert!(text.contains("let self$x: address;"));
        assert!(text.contains("self$x = move(y);"));
        assert!(text.contains("return struct T { x: move(self$x) };"));
    }

    #[test]
    fn shadow_assignment_output_is_byte_identical() {
        let with_shadow = emit(
            "contract C { var x: Int } C :: [any] { func f(a: Int) { let a = a } }",
        );
        let without = emit(
            "contract C { var x: Int } C :: [any] { func f(a: Int) {} }",
        );
        assert_eq!(with_shadow, without);
    }

    #[test]
    fn if_statements_nest_with_indentation() {
        let text = emit(
            "contract C { var x: Int } \
             C :: [any] { func f(v: Int) -> Int { if v == 0 { return 1 } else { return 2 } } }",
        );
        assert!(text.contains("    if (copy(v) == 0) {\n            return 1;\n        }\n"));
        assert!(text.contains("        else {\n            return 2;\n        }\n"));
    }
}
