//! Full-pipeline scenarios: source text in, module text out.

use caper::compile_to_text;

#[test]
fn empty_contract_produces_the_minimal_module() {
    let text = compile_to_text("contract Empty {} Empty :: [any] {}").unwrap();

    assert!(text.starts_with("module Empty {\n"));
    assert!(text.contains("resource T {}"));
    assert!(text.contains("new(): Self.T {"));
    assert!(text.contains("move_to_sender<T>(Self.new());"));
    assert!(text.contains("public get(addr: address): &mut Self.T {"));
    assert!(text.contains("return borrow_global<T>(move(addr));"));
}

#[test]
fn one_field_contract_with_simple_initializer() {
    let text = compile_to_text(
        "contract C { var x: Address } \
         C :: [any] { public mutating func init(y: Address) { self.x = y } }",
    )
    .unwrap();

    let new_body: Vec<&str> = text
        .lines()
        .skip_while(|l| !l.contains("new(y: address): Self.T {"))
        .take_while(|l| !l.trim().eq("}"))
        .map(str::trim)
        .collect();
    assert_eq!(
        new_body[1..],
        [
            "let self$x: address;",
            "self$x = move(y);",
            "return struct T { x: move(self$x) };",
        ]
    );
}

#[test]
fn post_construction_mutation_rebinds_through_self() {
    let text = compile_to_text(
        "contract C { var x: Int var y: Int } \
         C :: [any] { public mutating func init(a: Int, b: Int) { \
            self.x = a \
            self.y = b \
            self.x = 1 \
         } }",
    )
    .unwrap();

    let let_self = text.find("let self: Self.T;").expect("self declared");
    let construct = text
        .find("self = struct T { x: move(self$x), y: move(self$y) };")
        .expect("struct bound to self");
    let post_store = text.find("self.x = 1;").expect("post-construction store");
    let ret = text.find("return move(self);").expect("terminal return");

    assert!(let_self < construct);
    assert!(construct < post_store);
    assert!(post_store < ret);

    // The binding's declaration precedes every staged assignment.
    assert!(let_self < text.find("self$x = move(a);").unwrap());
}

#[test]
fn overloaded_behaviors_resolve_by_capability() {
    let text = compile_to_text(
        "contract C { var x: Int } \
         C :: [admin] { func f() {} func g() { f() } } \
         C :: [any] { func f() {} }",
    )
    .unwrap();

    let admin_variant = "C$f$c1$admin$p0";
    let any_variant = "C$f$c1$any$p0";
    assert!(text.contains(&format!("{}()", admin_variant)));
    assert!(text.contains(&format!("{}()", any_variant)));

    // The caller inside the [admin] block targets the [admin] variant.
    let g_body: Vec<&str> = text
        .lines()
        .skip_while(|l| !l.trim().starts_with("g() {"))
        .take_while(|l| !l.trim().eq("}"))
        .collect();
    assert!(g_body.iter().any(|l| l.contains(&format!("{}();", admin_variant))));
}

#[test]
fn resource_arguments_pass_through_as_moves() {
    let text = compile_to_text(
        "contract C { var x: Int } \
         C :: [any] { func sink(t: Wei) {} func transfer(t: Wei) { sink(t) } }",
    )
    .unwrap();

    assert!(text.contains("transfer(t: Wei.T) {"));
    assert!(text.contains("sink(move(t));"));

    // After the consuming transfer, `t` is never read again.
    let transfer_body: Vec<&str> = text
        .lines()
        .skip_while(|l| !l.contains("transfer(t: Wei.T) {"))
        .skip(1)
        .take_while(|l| !l.trim().eq("}"))
        .collect();
    let consumption = transfer_body
        .iter()
        .position(|l| l.contains("sink(move(t));"))
        .expect("consuming call present");
    for line in &transfer_body[consumption + 1..] {
        assert!(!line.contains("(t)"), "resource read after move: {}", line);
    }
}

#[test]
fn shadow_assignment_compiles_to_identical_bytes() {
    let with_shadow = compile_to_text(
        "contract C { var x: Int } C :: [any] { func f(a: Int) { let a = a } }",
    )
    .unwrap();
    let without = compile_to_text(
        "contract C { var x: Int } C :: [any] { func f(a: Int) {} }",
    )
    .unwrap();
    assert_eq!(with_shadow, without);
}

#[test]
fn compilation_is_deterministic() {
    let source = "contract Bank { var owner: Address var balance: Int } \
                  Bank :: [any] { \
                    public mutating func init(o: Address) { self.owner = o self.balance = 0 } \
                    public func getBalance() -> Int { return balance } \
                  }";
    assert_eq!(
        compile_to_text(source).unwrap(),
        compile_to_text(source).unwrap()
    );
}

#[test]
fn failed_translations_produce_no_text() {
    let result = compile_to_text("contract C { var x: Int } C :: [any] { func f() { missing } }");
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("unresolved reference `missing`"));
}
