//! Symbol table for one compilation unit.
//!
//! Populated in a dedicated pass over the AST, read-only during lowering.
//! Records the contract and its fields, event signatures, currency-flagged
//! type names, and every behavior function together with its caller
//! capability set.

use crate::errors::{Diagnostics, TranslateError};
use crate::mangle;
use caper_parser::ast::{
    BehaviorMember, CallerCapability, EventDeclaration, FunctionDeclaration, RawType,
    TopLevelModule,
};
use indexmap::{IndexMap, IndexSet};

#[derive(Debug, Clone)]
pub struct FunctionInformation {
    pub declaration: FunctionDeclaration,
    pub capabilities: Vec<String>,
    pub param_segments: Vec<String>,
    /// Present iff the source name is declared under more than one
    /// capability set.
    pub mangled_name: Option<String>,
}

impl FunctionInformation {
    /// Identifier the procedure is emitted (and called) under.
    pub fn target_name(&self) -> &str {
        self.mangled_name
            .as_deref()
            .unwrap_or(&self.declaration.identifier.name)
    }

    /// A caller context is accepted when every one of its capabilities is
    /// declared by the callee, with `any` as the universal acceptor.
    pub fn accepts_callers(&self, caller: &[String]) -> bool {
        caller.iter().all(|cap| {
            self.capabilities
                .iter()
                .any(|declared| declared == cap || declared == CallerCapability::ANY)
        })
    }
}

#[derive(Debug, Clone)]
pub struct EventInformation {
    pub declaration: EventDeclaration,
}

/// Outcome of call resolution under an active capability context.
#[derive(Debug)]
pub enum FunctionMatch<'a> {
    Matched(&'a FunctionInformation),
    /// Name and arity fit, but no candidate accepts the caller context.
    CapabilityMismatch,
    /// Name known, no candidate with this parameter count.
    ArityMismatch,
    Unknown,
}

#[derive(Debug, Clone, Default)]
pub struct Environment {
    contract_name: String,
    fields: IndexMap<String, RawType>,
    events: IndexMap<String, EventInformation>,
    functions: IndexMap<String, Vec<FunctionInformation>>,
    currency_types: IndexSet<String>,
}

impl Environment {
    /// Currency types always present, on top of whatever the caller names.
    pub const DEFAULT_CURRENCIES: &'static [&'static str] = &["Wei"];

    pub fn build(
        module: &TopLevelModule,
        currencies: &[String],
        diagnostics: &mut Diagnostics,
    ) -> Environment {
        let contract = &module.contract;
        let mut env = Environment {
            contract_name: contract.identifier.name.clone(),
            ..Environment::default()
        };

        for name in Self::DEFAULT_CURRENCIES {
            env.currency_types.insert((*name).to_string());
        }
        for name in currencies {
            env.currency_types.insert(name.clone());
        }
        if env.currency_types.contains(&env.contract_name) {
            diagnostics.push(TranslateError::ConflictingDeclaration {
                name: env.contract_name.clone(),
                span: contract.identifier.span,
            });
        }

        for variable in &contract.variables {
            let name = variable.identifier.name.clone();
            let Some(raw) = variable.raw_type.clone() else {
                diagnostics.push(TranslateError::UnknownType {
                    name: name.clone(),
                    span: variable.identifier.span,
                });
                continue;
            };
            if env.fields.insert(name.clone(), raw).is_some() {
                diagnostics.push(TranslateError::ConflictingDeclaration {
                    name,
                    span: variable.identifier.span,
                });
            }
        }

        for event in &contract.events {
            let name = event.identifier.name.clone();
            let info = EventInformation {
                declaration: event.clone(),
            };
            if env.events.insert(name.clone(), info).is_some() {
                diagnostics.push(TranslateError::ConflictingDeclaration {
                    name,
                    span: event.identifier.span,
                });
            }
        }

        // Functions second: their mangle segments consult the contract and
        // currency names registered above.
        let mut functions: IndexMap<String, Vec<FunctionInformation>> = IndexMap::new();
        for behavior in &module.behaviors {
            if behavior.contract_identifier.name != env.contract_name {
                diagnostics.push(TranslateError::unresolved_with(
                    behavior.contract_identifier.name.clone(),
                    "behavior block names an undeclared contract",
                    behavior.contract_identifier.span,
                ));
                continue;
            }
            let capabilities: Vec<String> = behavior
                .capabilities
                .iter()
                .map(|cap| cap.name().to_string())
                .collect();

            for member in &behavior.members {
                let BehaviorMember::Function(declaration) = member else {
                    continue;
                };
                let raw_params: Vec<RawType> = declaration
                    .parameters
                    .iter()
                    .map(|p| p.raw_type.clone())
                    .collect();
                let info = FunctionInformation {
                    declaration: declaration.clone(),
                    capabilities: capabilities.clone(),
                    param_segments: mangle::type_segments(&raw_params, &env),
                    mangled_name: None,
                };
                functions
                    .entry(declaration.identifier.name.clone())
                    .or_default()
                    .push(info);
            }
        }

        // A name declared under several capability sets is overloaded; every
        // overload gets a mangled identifier, unambiguous names stay bare.
        for (name, overloads) in functions.iter_mut() {
            if overloads.len() < 2 {
                continue;
            }
            for info in overloads.iter_mut() {
                info.mangled_name = Some(mangle::mangle_function(
                    &env.contract_name,
                    name,
                    &info.capabilities,
                    &info.param_segments,
                ));
            }
        }
        env.functions = functions;
        env
    }

    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    pub fn is_contract(&self, name: &str) -> bool {
        name == self.contract_name
    }

    pub fn is_currency(&self, name: &str) -> bool {
        self.currency_types.contains(name)
    }

    /// Currency constructors are compiler-generated identity coercions.
    pub fn has_generated_initializer(&self, name: &str) -> bool {
        self.is_currency(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field_raw_type(&self, name: &str) -> Option<&RawType> {
        self.fields.get(name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &RawType)> {
        self.fields.iter()
    }

    pub fn event(&self, name: &str) -> Option<&EventInformation> {
        self.events.get(name)
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// The identifier a specific `(name, capability set)` declaration is
    /// emitted under.
    pub fn function_target_name(&self, name: &str, capabilities: &[String]) -> Option<&str> {
        self.functions
            .get(name)?
            .iter()
            .find(|info| info.capabilities == capabilities)
            .map(|info| info.target_name())
    }

    pub fn match_function(&self, name: &str, arity: usize, caller: &[String]) -> FunctionMatch<'_> {
        let Some(overloads) = self.functions.get(name) else {
            return FunctionMatch::Unknown;
        };
        let arity_matches: Vec<&FunctionInformation> = overloads
            .iter()
            .filter(|info| info.declaration.parameters.len() == arity)
            .collect();
        if arity_matches.is_empty() {
            return FunctionMatch::ArityMismatch;
        }
        // Prefer the overload guarded by exactly the caller's capability set
        // over one that merely accepts it through `any`.
        let exact = arity_matches
            .iter()
            .find(|info| info.capabilities == caller)
            .copied();
        match exact.or_else(|| {
            arity_matches
                .into_iter()
                .find(|info| info.accepts_callers(caller))
        }) {
            Some(info) => FunctionMatch::Matched(info),
            None => FunctionMatch::CapabilityMismatch,
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests(contract: &str, currencies: &[&str]) -> Environment {
        let mut env = Environment {
            contract_name: contract.to_string(),
            ..Environment::default()
        };
        for name in currencies {
            env.currency_types.insert((*name).to_string());
        }
        env
    }

    #[cfg(test)]
    pub(crate) fn for_tests_with_function(
        contract: &str,
        currencies: &[&str],
        function: &str,
    ) -> Environment {
        use caper_parser::ast::{Identifier, Span};

        let mut env = Environment::for_tests(contract, currencies);
        env.functions.insert(
            function.to_string(),
            vec![FunctionInformation {
                declaration: FunctionDeclaration {
                    modifiers: vec![],
                    identifier: Identifier::new(function, Span::default()),
                    parameters: vec![],
                    result_type: None,
                    body: vec![],
                    span: Span::default(),
                },
                capabilities: vec![CallerCapability::ANY.to_string()],
                param_segments: vec![],
                mangled_name: None,
            }],
        );
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caper_parser::parse;

    fn build(source: &str) -> (Environment, Diagnostics) {
        let module = parse(source).unwrap();
        let mut diagnostics = Diagnostics::default();
        let env = Environment::build(&module, &[], &mut diagnostics);
        (env, diagnostics)
    }

    #[test]
    fn records_contract_fields_in_order() {
        let (env, diagnostics) = build(
            "contract Bank { var owner: Address var balance: Int } Bank :: [any] {}",
        );
        assert!(diagnostics.is_empty());
        assert_eq!(env.contract_name(), "Bank");
        let names: Vec<&String> = env.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["owner", "balance"]);
        assert!(env.has_field("owner"));
        assert!(!env.has_field("missing"));
    }

    #[test]
    fn default_currency_is_wei() {
        let (env, _) = build("contract Bank {} Bank :: [any] {}");
        assert!(env.is_currency("Wei"));
        assert!(env.has_generated_initializer("Wei"));
        assert!(!env.is_currency("Token"));
    }

    #[test]
    fn behavior_for_unknown_contract_is_diagnosed() {
        let (_, diagnostics) = build("contract Bank {} Vault :: [any] {}");
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics.iter().next().unwrap(),
            TranslateError::UnresolvedReference { name, .. } if name == "Vault"
        ));
    }

    #[test]
    fn overloaded_names_are_mangled_apart() {
        let (env, diagnostics) = build(
            "contract Bank { var x: Int } \
             Bank :: [admin] { func f() {} } \
             Bank :: [any] { func f() {} }",
        );
        assert!(diagnostics.is_empty());
        let admin = env
            .function_target_name("f", &["admin".to_string()])
            .unwrap();
        let any = env.function_target_name("f", &["any".to_string()]).unwrap();
        assert_ne!(admin, any);
        assert_ne!(admin, "f");
        assert_ne!(any, "f");
    }

    #[test]
    fn single_declarations_keep_their_bare_name() {
        let (env, _) = build(
            "contract Bank { var x: Int } Bank :: [any] { func f() {} }",
        );
        assert_eq!(
            env.function_target_name("f", &["any".to_string()]),
            Some("f")
        );
    }

    #[test]
    fn capability_matching_treats_any_as_top() {
        let (env, _) = build(
            "contract Bank { var x: Int } \
             Bank :: [admin] { func guarded() {} } \
             Bank :: [any] { func open() {} }",
        );

        // admin caller reaches both.
        assert!(matches!(
            env.match_function("guarded", 0, &["admin".to_string()]),
            FunctionMatch::Matched(_)
        ));
        assert!(matches!(
            env.match_function("open", 0, &["admin".to_string()]),
            FunctionMatch::Matched(_)
        ));

        // any caller cannot narrow into [admin].
        assert!(matches!(
            env.match_function("guarded", 0, &["any".to_string()]),
            FunctionMatch::CapabilityMismatch
        ));

        assert!(matches!(
            env.match_function("guarded", 1, &["admin".to_string()]),
            FunctionMatch::ArityMismatch
        ));
        assert!(matches!(
            env.match_function("missing", 0, &["admin".to_string()]),
            FunctionMatch::Unknown
        ));
    }

    #[test]
    fn exact_capability_match_beats_any_acceptance() {
        // The [any] overload is declared first; an admin caller still
        // resolves to the [admin] variant.
        let (env, _) = build(
            "contract Bank { var x: Int } \
             Bank :: [any] { func f() {} } \
             Bank :: [admin] { func f() {} }",
        );
        let FunctionMatch::Matched(info) = env.match_function("f", 0, &["admin".to_string()])
        else {
            panic!("expected a match");
        };
        assert_eq!(info.capabilities, vec!["admin".to_string()]);
    }

    #[test]
    fn events_are_recorded() {
        let (env, _) = build(
            "contract Bank { var x: Int event Deposit(from: Address, amount: Int) } Bank :: [any] {}",
        );
        let event = env.event("Deposit").unwrap();
        assert_eq!(event.declaration.parameters.len(), 2);
        assert!(env.event("Withdraw").is_none());
    }
}
