/*! Turn compiled modules into target IR text.
 *
 * The downstream toolchain consumes a plain textual module; these emitters
 * produce it with stable layout, so compiling the same source twice yields
 * byte-identical output.
 */

pub mod emitter;
pub mod module_emitter;

pub use emitter::{EmitContext, EmitHelper, EmitResult, Emittable};
pub use module_emitter::ModuleEmitter;
