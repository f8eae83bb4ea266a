//! End-to-end scan/rewrite scenarios through the public API

use pretty_assertions::assert_eq;
use refit::{
    BinaryOp, CompactFormatter, Config, Engine, Method, NodePath, OutputFormatter, RewriteError,
    Rewriter, RuleRegistry, SyntaxNode, TextFormatter,
};

fn engine() -> Engine {
    Engine::new(Config::default())
}

fn rewriter() -> Rewriter {
    Rewriter::new(RuleRegistry::standard().rules())
}

/// if (a) { if (b) { if (c) { if (d) { complete(); } } } }
fn deeply_nested_method() -> Method {
    let mut node = SyntaxNode::if_then(
        SyntaxNode::ident("d"),
        SyntaxNode::block(vec![SyntaxNode::call("complete", vec![])]),
    );
    for cond in ["c", "b", "a"] {
        node = SyntaxNode::if_then(SyntaxNode::ident(cond), SyntaxNode::block(vec![node]));
    }
    Method::new("process", vec![], SyntaxNode::block(vec![node]))
}

#[test]
fn test_scan_is_deterministic() {
    let eng = engine();
    let method = deeply_nested_method();

    let first = eng.scan(&method).unwrap();
    let second = eng.scan(&method).unwrap();
    assert_eq!(first.findings, second.findings);
}

#[test]
fn test_nested_conditional_scan_apply_rescan() {
    let eng = engine();
    let method = deeply_nested_method();

    let result = eng.scan(&method).unwrap();
    let nested: Vec<_> = result
        .findings
        .iter()
        .filter(|f| f.rule_id == "nested-conditional")
        .collect();
    assert_eq!(nested.len(), 1);
    assert_eq!(nested[0].location.path, NodePath(vec![0]));

    let outcome = rewriter().apply(&method, nested[0]).unwrap();
    let src = outcome.method.body.to_source();
    assert!(src.contains("if (!a) {\n    return;\n}"));
    assert!(src.contains("if (!b) {\n    return;\n}"));
    assert!(src.contains("if (!c) {\n    return;\n}"));
    assert!(src.contains("if (!d) {\n    return;\n}"));
    assert!(src.contains("complete();"));

    let rescan = eng.scan(&outcome.method).unwrap();
    assert!(rescan
        .findings
        .iter()
        .all(|f| f.rule_id != "nested-conditional"));
}

#[test]
fn test_magic_number_scan_apply_rescan() {
    let eng = engine();
    let method = Method::new(
        "check_age",
        vec!["age"],
        SyntaxNode::block(vec![SyntaxNode::ret(Some(SyntaxNode::binary(
            BinaryOp::Gt,
            SyntaxNode::ident("age"),
            SyntaxNode::int(18),
        )))]),
    );

    let result = eng.scan(&method).unwrap();
    let magic: Vec<_> = result
        .findings
        .iter()
        .filter(|f| f.rule_id == "magic-number")
        .collect();
    assert_eq!(magic.len(), 1);

    let outcome = rewriter().apply(&method, magic[0]).unwrap();
    assert_eq!(outcome.method.constants.len(), 1);
    assert_eq!(outcome.method.constants[0].name, "CONST_18");
    assert!(outcome.method.body.to_source().contains("age > CONST_18"));

    let rescan = eng.scan(&outcome.method).unwrap();
    assert!(rescan.findings.iter().all(|f| f.rule_id != "magic-number"));
}

#[test]
fn test_compound_condition_boundary_at_three() {
    let eng = engine();
    let chain = |names: &[&str]| {
        let mut iter = names.iter();
        let mut expr = SyntaxNode::ident(iter.next().unwrap());
        for name in iter {
            expr = SyntaxNode::binary(BinaryOp::And, expr, SyntaxNode::ident(name));
        }
        expr
    };

    let three = Method::new(
        "gate",
        vec![],
        SyntaxNode::block(vec![SyntaxNode::if_then(
            chain(&["x", "y", "z"]),
            SyntaxNode::block(vec![SyntaxNode::ret(None)]),
        )]),
    );
    let result = eng.scan(&three).unwrap();
    let compound: Vec<_> = result
        .findings
        .iter()
        .filter(|f| f.rule_id == "compound-condition")
        .collect();
    assert_eq!(compound.len(), 1);

    let two = Method::new(
        "gate",
        vec![],
        SyntaxNode::block(vec![SyntaxNode::if_then(
            chain(&["x", "y"]),
            SyntaxNode::block(vec![SyntaxNode::ret(None)]),
        )]),
    );
    let result = eng.scan(&two).unwrap();
    assert!(result
        .findings
        .iter()
        .all(|f| f.rule_id != "compound-condition"));
}

#[test]
fn test_applying_a_finding_twice_is_stale() {
    let method = deeply_nested_method();
    let result = engine().scan(&method).unwrap();
    let finding = result
        .findings
        .iter()
        .find(|f| f.rule_id == "nested-conditional")
        .unwrap();

    let r = rewriter();
    let outcome = r.apply(&method, finding).unwrap();
    let err = r.apply(&outcome.method, finding).unwrap_err();
    assert!(matches!(err, RewriteError::StaleNodeReference { .. }));
}

#[test]
fn test_rendered_output_matches_findings() {
    let eng = engine();

    let clean = Method::new(
        "noop",
        vec![],
        SyntaxNode::block(vec![SyntaxNode::ret(None)]),
    );
    let result = eng.scan(&clean).unwrap();
    let text = TextFormatter::new().without_color().format(&result);
    assert!(text.contains("no issues found."));

    let result = eng.scan(&deeply_nested_method()).unwrap();
    assert!(!result.findings.is_empty());
    let compact = CompactFormatter::new().format(&result);
    assert_eq!(compact.lines().count(), result.findings.len());
}

#[test]
fn test_fix_all_converges_on_mixed_smells() {
    let eng = engine();
    let subtotal = SyntaxNode::binary(
        BinaryOp::Mul,
        SyntaxNode::ident("price"),
        SyntaxNode::ident("quantity"),
    );
    let method = Method::new(
        "order_total",
        vec!["price", "quantity"],
        SyntaxNode::block(vec![
            SyntaxNode::assign("total", subtotal.clone()),
            SyntaxNode::call("audit", vec![subtotal]),
            SyntaxNode::if_then(
                SyntaxNode::binary(
                    BinaryOp::Gt,
                    SyntaxNode::ident("total"),
                    SyntaxNode::int(1000),
                ),
                SyntaxNode::block(vec![SyntaxNode::call("flag_review", vec![])]),
            ),
            SyntaxNode::ret(Some(SyntaxNode::ident("total"))),
        ]),
    );

    let report = rewriter().fix_all(&eng, &method, None).unwrap();
    assert!(report.fixes_applied >= 2);

    // The rewritten method and every extracted helper scan clean
    assert!(eng.scan(&report.method).unwrap().is_clean());
    for helper in &report.extracted {
        assert!(eng.scan(helper).unwrap().is_clean());
    }
}
