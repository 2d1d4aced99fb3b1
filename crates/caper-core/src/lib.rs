/*! Target IR data model for the caper compiler.
 *
 * The translation pipeline builds these values and the emitter turns them
 * into module text. Expressions know how to render themselves on one line;
 * everything with block structure goes through `caper-emit`. The model is
 * serde-serializable so a compiled module can be dumped as JSON.
 */

pub mod expression;
pub mod module;
pub mod statement;
pub mod types;

pub use expression::{BinaryOp, Expression, Literal, TransferKind};
pub use module::{Field, Module, Procedure, ResourceType, RESOURCE_NAME};
pub use statement::Statement;
pub use types::Type;
