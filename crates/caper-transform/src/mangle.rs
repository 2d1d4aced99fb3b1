//! Name mangling.
//!
//! `$` cannot appear in a source identifier, so every synthetic name below is
//! collision-free by construction. Function mangling is a pure function of
//! `(contract, capability list, signature)`; the count-prefixed segments keep
//! it injective even when capability or type names contain underscores.

use crate::environment::Environment;
use crate::typer::canonical_type;
use caper_parser::ast::RawType;

/// The local binding the initializer constructs the resource into.
pub const SELF_BINDING: &str = "self";

/// Mangled identifier for an overloaded function.
pub fn mangle_function(
    contract: &str,
    name: &str,
    capabilities: &[String],
    param_segments: &[String],
) -> String {
    let mut out = format!("{}${}$c{}", contract, name, capabilities.len());
    for cap in capabilities {
        out.push('$');
        out.push_str(cap);
    }
    out.push_str(&format!("$p{}", param_segments.len()));
    for segment in param_segments {
        out.push('$');
        out.push_str(segment);
    }
    out
}

/// Locals are mangled by name alone: the identity, unless the name would
/// clash with a declared function identifier.
pub fn mangle_local(name: &str, env: &Environment) -> String {
    if env.is_function(name) {
        format!("{}$v", name)
    } else {
        name.to_string()
    }
}

/// Synthetic local holding a contract field's value before the resource is
/// constructed.
pub fn staging_slot(field: &str) -> String {
    format!("self${}", field)
}

/// Borrowed-storage reference local.
pub fn reference_slot(index: u32) -> String {
    format!("ref${}", index)
}

/// Mangle segment for a parameter type. Falls back to a sanitized raw
/// spelling for types the canonical typer refuses, so that environment
/// construction never fails on mangling alone.
pub fn type_segment(raw: &RawType, env: &Environment) -> String {
    match canonical_type(raw, env) {
        Some(canonical) => canonical.mangle_name(),
        None => raw
            .to_string()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect(),
    }
}

/// Segments for a full parameter list.
pub fn type_segments(params: &[RawType], env: &Environment) -> Vec<String> {
    params.iter().map(|raw| type_segment(raw, env)).collect()
}
