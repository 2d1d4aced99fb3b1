/*! Unified interface for the caper compiler.
 *
 * Single import for the whole pipeline: parsing source text, translating it
 * to the target IR model, and emitting module text.
 */

pub use caper_core as core;
pub use caper_emit as emit;
pub use caper_parser as parser;
pub use caper_transform as transform;

pub use caper_core::{Expression, Module, Procedure, Statement, Type};
pub use caper_emit::ModuleEmitter;
pub use caper_parser::parse;
pub use caper_transform::{translate_source, translate_source_with_currencies, Diagnostics};

use anyhow::Result;

/// Source text straight to module text. Translation failures carry the full
/// diagnostic list.
pub fn compile_to_text(source: &str) -> Result<String> {
    let module = translate_source(source).map_err(anyhow::Error::new)?;
    ModuleEmitter::new(module).emit_to_string()
}
