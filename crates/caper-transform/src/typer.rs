//! Canonical type mapping.
//!
//! Every raw source type collapses to one of six target categories. The
//! category decides move/copy discipline and how the type renders inside a
//! module: the enclosing contract's own resource is always the local `T`,
//! foreign resources are qualified, value structs live under `Self.`.

use crate::environment::Environment;
use caper_core::{Type, RESOURCE_NAME};
use caper_parser::ast::{BasicType, RawType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalType {
    U64,
    Address,
    Bool,
    ByteArray,
    Struct(String),
    Resource(String),
}

impl CanonicalType {
    /// Resources are linear: every produced value is consumed exactly once.
    pub fn is_resource(&self) -> bool {
        matches!(self, CanonicalType::Resource(_))
    }

    /// Target rendering relative to the enclosing contract.
    pub fn render(&self, enclosing: &str) -> Type {
        match self {
            CanonicalType::U64 => Type::U64,
            CanonicalType::Address => Type::Address,
            CanonicalType::Bool => Type::Bool,
            CanonicalType::ByteArray => Type::ByteArray,
            CanonicalType::Struct(name) => Type::Named(format!("Self.{}", name)),
            CanonicalType::Resource(name) if name == enclosing => {
                Type::Named(format!("Self.{}", RESOURCE_NAME))
            }
            CanonicalType::Resource(name) => Type::Named(format!("{}.{}", name, RESOURCE_NAME)),
        }
    }

    /// Stable segment used by the function mangler.
    pub fn mangle_name(&self) -> String {
        match self {
            CanonicalType::U64 => "u64".to_string(),
            CanonicalType::Address => "address".to_string(),
            CanonicalType::Bool => "bool".to_string(),
            CanonicalType::ByteArray => "bytearray".to_string(),
            CanonicalType::Struct(name) | CanonicalType::Resource(name) => name.clone(),
        }
    }
}

/// Maps a raw type to its canonical form, or `None` when the type has no
/// target representation. Collection types are deliberately refused rather
/// than collapsed to their element type; callers turn the `None` into a
/// located diagnostic.
pub fn canonical_type(raw: &RawType, env: &Environment) -> Option<CanonicalType> {
    match raw {
        RawType::Basic(BasicType::Address) => Some(CanonicalType::Address),
        RawType::Basic(BasicType::Int) => Some(CanonicalType::U64),
        RawType::Basic(BasicType::Bool) => Some(CanonicalType::Bool),
        RawType::Basic(BasicType::String) => Some(CanonicalType::ByteArray),
        RawType::UserDefined(id) => {
            if env.is_currency(&id.name) || env.is_contract(&id.name) {
                Some(CanonicalType::Resource(id.name.clone()))
            } else {
                Some(CanonicalType::Struct(id.name.clone()))
            }
        }
        // inout-ness is reintroduced at call sites via mutable references;
        // the canonical type is the pointee.
        RawType::Inout(inner) => canonical_type(inner, env),
        RawType::FixedArray(_, _) | RawType::Array(_) | RawType::Dictionary(_, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caper_parser::ast::{Identifier, Span};

    fn env() -> Environment {
        Environment::for_tests("Bank", &["Wei"])
    }

    fn user(name: &str) -> RawType {
        RawType::UserDefined(Identifier::new(name, Span::default()))
    }

    #[test]
    fn basic_types_map_to_primitives() {
        let env = env();
        assert_eq!(
            canonical_type(&RawType::Basic(BasicType::Int), &env),
            Some(CanonicalType::U64)
        );
        assert_eq!(
            canonical_type(&RawType::Basic(BasicType::Address), &env),
            Some(CanonicalType::Address)
        );
        assert_eq!(
            canonical_type(&RawType::Basic(BasicType::String), &env),
            Some(CanonicalType::ByteArray)
        );
    }

    #[test]
    fn currency_and_contract_types_are_resources() {
        let env = env();
        assert_eq!(
            canonical_type(&user("Wei"), &env),
            Some(CanonicalType::Resource("Wei".into()))
        );
        assert_eq!(
            canonical_type(&user("Bank"), &env),
            Some(CanonicalType::Resource("Bank".into()))
        );
        assert_eq!(
            canonical_type(&user("Point"), &env),
            Some(CanonicalType::Struct("Point".into()))
        );
    }

    #[test]
    fn inout_collapses_to_pointee() {
        let env = env();
        let inout = RawType::Inout(Box::new(RawType::Basic(BasicType::Int)));
        assert_eq!(canonical_type(&inout, &env), Some(CanonicalType::U64));
    }

    #[test]
    fn collections_are_refused() {
        let env = env();
        let array = RawType::Array(Box::new(RawType::Basic(BasicType::Int)));
        let fixed = RawType::FixedArray(Box::new(RawType::Basic(BasicType::Int)), 4);
        let dict = RawType::Dictionary(
            Box::new(RawType::Basic(BasicType::Address)),
            Box::new(RawType::Basic(BasicType::Int)),
        );
        assert_eq!(canonical_type(&array, &env), None);
        assert_eq!(canonical_type(&fixed, &env), None);
        assert_eq!(canonical_type(&dict, &env), None);
    }

    #[test]
    fn rendering_substitutes_the_enclosing_resource() {
        assert_eq!(
            CanonicalType::Resource("Bank".into())
                .render("Bank")
                .to_string(),
            "Self.T"
        );
        assert_eq!(
            CanonicalType::Resource("Wei".into())
                .render("Bank")
                .to_string(),
            "Wei.T"
        );
        assert_eq!(
            CanonicalType::Struct("Point".into())
                .render("Bank")
                .to_string(),
            "Self.Point"
        );
        assert_eq!(CanonicalType::U64.render("Bank").to_string(), "u64");
    }
}
