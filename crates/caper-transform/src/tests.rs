use super::*;
use caper_core::Statement;

fn statement_text(statement: &Statement) -> String {
    match statement {
        Statement::Expression(expr) => expr.to_string(),
        Statement::Return(Some(expr)) => format!("return {};", expr),
        Statement::Return(None) => "return;".to_string(),
        Statement::If { condition, .. } => format!("if ({})", condition),
    }
}

fn body_texts(module: &caper_core::Module, procedure: &str) -> Vec<String> {
    module
        .procedure(procedure)
        .unwrap_or_else(|| panic!("procedure `{}` not emitted", procedure))
        .body
        .iter()
        .map(statement_text)
        .collect()
}

#[test]
fn empty_contract_gets_the_initializer_trio() {
    let module = translate_source("contract Empty {} Empty :: [any] {}").unwrap();
    assert_eq!(module.name, "Empty");
    assert!(module.resource.fields.is_empty());

    let new = module.procedure("new").unwrap();
    assert!(!new.public);
    assert_eq!(new.result.as_ref().unwrap().to_string(), "Self.T");
    assert_eq!(body_texts(&module, "new"), vec!["return struct T {};"]);

    let publish = module.procedure("publish").unwrap();
    assert!(publish.public);
    assert_eq!(
        body_texts(&module, "publish"),
        vec!["move_to_sender<T>(Self.new())", "return;"]
    );

    let get = module.procedure("get").unwrap();
    assert!(get.public);
    assert_eq!(get.parameters[0].ty.to_string(), "address");
    assert_eq!(get.result.as_ref().unwrap().to_string(), "&mut Self.T");
    assert_eq!(
        body_texts(&module, "get"),
        vec!["return borrow_global<T>(move(addr));"]
    );
}

#[test]
fn simple_initializer_stages_the_field() {
    let module = translate_source(
        "contract C { var x: Address } \
         C :: [any] { public mutating func init(y: Address) { self.x = y } }",
    )
    .unwrap();

    assert_eq!(module.resource.fields.len(), 1);
    assert_eq!(module.resource.fields[0].name, "x");
    assert_eq!(module.resource.fields[0].ty.to_string(), "address");

    assert_eq!(
        body_texts(&module, "new"),
        vec![
            "let self$x: address",
            "self$x = move(y)",
            "return struct T { x: move(self$x) };",
        ]
    );
    assert_eq!(
        body_texts(&module, "publish"),
        vec!["move_to_sender<T>(Self.new(move(y)))", "return;"]
    );
}

#[test]
fn post_construction_mutation_binds_self() {
    let module = translate_source(
        "contract C { var x: Int var y: Int } \
         C :: [any] { public mutating func init(a: Int, b: Int) { \
            self.x = a \
            self.y = b \
            self.x = 1 \
         } }",
    )
    .unwrap();

    assert_eq!(
        body_texts(&module, "new"),
        vec![
            "let self: Self.T",
            "let self$x: u64",
            "let self$y: u64",
            "self$x = move(a)",
            "self$y = move(b)",
            "self = struct T { x: move(self$x), y: move(self$y) }",
            "self.x = 1",
            "return move(self);",
        ]
    );
}

#[test]
fn overloaded_behaviors_emit_distinct_procedures() {
    let module = translate_source(
        "contract C { var x: Int } \
         C :: [admin] { func f() {} func g() { f() } } \
         C :: [any] { func f() {} }",
    )
    .unwrap();

    let f_procedures: Vec<&caper_core::Procedure> = module
        .procedures
        .iter()
        .filter(|p| p.name.contains("$f$"))
        .collect();
    assert_eq!(f_procedures.len(), 2);
    assert_ne!(f_procedures[0].name, f_procedures[1].name);
    assert!(module.procedure("f").is_none());

    // The call inside the [admin] block resolves to the [admin] variant.
    let g_body = body_texts(&module, "g");
    assert!(g_body[0].contains("admin"), "call was {}", g_body[0]);
}

#[test]
fn resource_arguments_are_moved() {
    let module = translate_source(
        "contract C { var x: Int } \
         C :: [any] { func sink(t: Wei) {} func transfer(t: Wei) { sink(t) } }",
    )
    .unwrap();

    let transfer = module.procedure("transfer").unwrap();
    assert_eq!(transfer.parameters[0].ty.to_string(), "Wei.T");
    let texts = body_texts(&module, "transfer");
    assert_eq!(texts, vec!["sink(move(t))", "return;"]);

    // The resource is consumed exactly once: no statement after the call
    // reads `t` again.
    assert_eq!(
        texts.iter().filter(|t| t.contains("move(t)")).count(),
        1
    );
}

#[test]
fn shadow_assignment_is_suppressed() {
    let with_shadow = translate_source(
        "contract C { var x: Int } C :: [any] { func f(a: Int) { let a = a } }",
    )
    .unwrap();
    let without = translate_source(
        "contract C { var x: Int } C :: [any] { func f(a: Int) {} }",
    )
    .unwrap();
    assert_eq!(with_shadow, without);
}

#[test]
fn storage_reads_borrow_and_release_in_lifo_order() {
    let module = translate_source(
        "contract C { var x: Int } \
         C :: [any] { public func getX() -> Int { return x } }",
    )
    .unwrap();

    assert_eq!(
        body_texts(&module, "getX"),
        vec![
            "let ref$0: &mut Self.T",
            "ref$0 = borrow_global_mut<T>(get_txn_sender())",
            "release(move(ref$0))",
            "return copy(ref$0).x;",
        ]
    );
}

#[test]
fn storage_writes_go_through_the_borrowed_path() {
    let module = translate_source(
        "contract C { var x: Int } \
         C :: [any] { public mutating func setX(v: Int) { self.x = v } }",
    )
    .unwrap();

    assert_eq!(
        body_texts(&module, "setX"),
        vec![
            "let ref$0: &mut Self.T",
            "ref$0 = borrow_global_mut<T>(get_txn_sender())",
            "copy(ref$0).x = copy(v)",
            "release(move(ref$0))",
            "return;",
        ]
    );
}

#[test]
fn inout_arguments_pass_by_mutable_reference() {
    let module = translate_source(
        "contract C { var x: Int } \
         C :: [any] { func bump(v: inout Int) { v = v + 1 } func f(w: Int) { bump(w) } }",
    )
    .unwrap();

    let bump = module.procedure("bump").unwrap();
    assert_eq!(bump.parameters[0].ty.to_string(), "&mut u64");
    // inout-ness lives in the signature; the canonical type is the pointee.
    assert_eq!(body_texts(&module, "bump")[0], "v = copy(v) + 1");

    assert_eq!(body_texts(&module, "f")[0], "bump(&mut w)");
}

#[test]
fn events_lower_to_emissions() {
    let module = translate_source(
        "contract C { var x: Int event Deposit(amount: Int) } \
         C :: [any] { func f(v: Int) { Deposit(v) } }",
    )
    .unwrap();
    let texts = body_texts(&module, "f");
    assert_eq!(texts[0], "emit_event<Deposit>(copy(v))");
}

#[test]
fn currency_constructor_calls_are_identity_coercions() {
    let module = translate_source(
        "contract C { var x: Int } \
         C :: [any] { func f(v: Wei) -> Wei { return Wei(v) } }",
    )
    .unwrap();
    let texts = body_texts(&module, "f");
    assert_eq!(texts, vec!["return move(v);"]);
}

#[test]
fn capability_violation_is_reported() {
    let err = translate_source(
        "contract C { var x: Int } \
         C :: [admin] { func guarded() {} } \
         C :: [any] { func open() { guarded() } }",
    )
    .unwrap_err();
    assert!(err
        .iter()
        .any(|e| matches!(e, TranslateError::CapabilityViolation { name, .. } if name == "guarded")));
}

#[test]
fn incomplete_initializer_names_missing_fields() {
    let err = translate_source(
        "contract C { var x: Int var y: Int } \
         C :: [any] { public mutating func init(a: Int) { self.x = a } }",
    )
    .unwrap_err();
    assert!(err.iter().any(|e| matches!(
        e,
        TranslateError::IncompleteInitializer { fields, .. } if fields == &vec!["y".to_string()]
    )));
}

#[test]
fn collection_typed_fields_are_refused() {
    let err = translate_source(
        "contract C { var balances: [Address: Int] } C :: [any] {}",
    )
    .unwrap_err();
    assert!(err
        .iter()
        .any(|e| matches!(e, TranslateError::UnknownType { name, .. } if name == "[Address: Int]")));
}

#[test]
fn unresolved_identifiers_fail_translation() {
    let err = translate_source(
        "contract C { var x: Int } C :: [any] { func f() { missing = 1 } }",
    )
    .unwrap_err();
    assert!(err
        .iter()
        .any(|e| matches!(e, TranslateError::UnresolvedReference { name, .. } if name == "missing")));
}

#[test]
fn parse_failures_surface_as_diagnostics() {
    let err = translate_source("contract {").unwrap_err();
    assert!(err
        .iter()
        .any(|e| matches!(e, TranslateError::Parse { .. })));
}

#[test]
fn custom_currency_types_become_resources() {
    let module = translate_source_with_currencies(
        "contract C { var x: Int } C :: [any] { func hold(t: Token) {} }",
        &["Token".to_string()],
    )
    .unwrap();
    let hold = module.procedure("hold").unwrap();
    assert_eq!(hold.parameters[0].ty.to_string(), "Token.T");
}

#[test]
fn capability_widening_never_rejects_accepted_calls() {
    // Widening the callee's guard from [admin] to [any] keeps the admin
    // caller accepted.
    let narrow = translate_source(
        "contract C { var x: Int } \
         C :: [admin] { func callee() {} func caller() { callee() } }",
    );
    let widened = translate_source(
        "contract C { var x: Int } \
         C :: [any] { func callee() {} } \
         C :: [admin] { func caller() { callee() } }",
    );
    assert!(narrow.is_ok());
    assert!(widened.is_ok());
}

#[test]
fn conditionals_lower_with_nested_bodies() {
    let module = translate_source(
        "contract C { var x: Int } \
         C :: [any] { func f(v: Int) -> Int { if v == 0 { return 1 } return 2 } }",
    )
    .unwrap();
    let f = module.procedure("f").unwrap();
    let Statement::If {
        condition, body, ..
    } = &f.body[0]
    else {
        panic!("expected if statement, got {:?}", f.body[0]);
    };
    assert_eq!(condition.to_string(), "copy(v) == 0");
    assert_eq!(body.len(), 1);
    assert!(matches!(body[0], Statement::Return(Some(_))));
}
