use crate::statement::Statement;
use crate::types::Type;
use serde::{Deserialize, Serialize};

/// Inside its own module a contract's resource is always the local type `T`.
pub const RESOURCE_NAME: &str = "T";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// The contract's persistent state: one ordered field per contract variable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceType {
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    pub public: bool,
    pub parameters: Vec<Field>,
    pub result: Option<Type>,
    pub body: Vec<Statement>,
}

/// A complete emitted module: the resource type, the initializer trio
/// (`new`, `publish`, `get`), then the behavior procedures in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub resource: ResourceType,
    pub procedures: Vec<Procedure>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource: ResourceType::default(),
            procedures: Vec::new(),
        }
    }

    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.name == name)
    }
}
