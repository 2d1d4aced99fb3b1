/*! Translate caper source into target IR.
 *
 * The pipeline parses the source, builds the symbol environment in a
 * dedicated pass, then lowers every behavior function plus the synthesized
 * initializer trio into a [`caper_core::Module`]. Translation either yields
 * a complete module or a non-empty diagnostic sink; there is no partial
 * output.
 */

mod assignment;
mod context;
mod contract;
mod environment;
mod errors;
mod expression;
mod initializer;
mod mangle;
mod typer;

pub use environment::{Environment, FunctionInformation, FunctionMatch};
pub use errors::{Diagnostics, TranslateError};
pub use typer::{canonical_type, CanonicalType};

use caper_core::Module;
use caper_parser::ast::TopLevelModule;

/// Compile a source text with the default currency set.
pub fn translate_source(source: &str) -> Result<Module, Diagnostics> {
    translate_source_with_currencies(source, &[])
}

/// Compile a source text, flagging the named types as currencies on top of
/// the built-in set.
pub fn translate_source_with_currencies(
    source: &str,
    currencies: &[String],
) -> Result<Module, Diagnostics> {
    let mut diagnostics = Diagnostics::default();
    let ast = match caper_parser::parse(source) {
        Ok(module) => module,
        Err(error) => {
            diagnostics.push(TranslateError::Parse {
                message: error.to_string(),
                span: error.span(),
            });
            return Err(diagnostics);
        }
    };
    translate(&ast, currencies)
}

/// Compile an already-parsed module.
pub fn translate(ast: &TopLevelModule, currencies: &[String]) -> Result<Module, Diagnostics> {
    let mut diagnostics = Diagnostics::default();
    let env = Environment::build(ast, currencies, &mut diagnostics);
    let module = contract::generate_module(ast, &env, &mut diagnostics);
    if diagnostics.is_empty() {
        Ok(module)
    } else {
        Err(diagnostics)
    }
}

#[cfg(test)]
mod tests;
