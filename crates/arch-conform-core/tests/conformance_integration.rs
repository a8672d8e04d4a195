//! Integration test: graph import, TOML rules and checker end-to-end.
//!
//! Uses fixture files under `tests/fixtures/orca/` to verify that the full
//! JSON graph → TOML config → rules → Checker pipeline finds the expected
//! architecture violations.

use arch_conform_core::rules::{
    check_layer_isolation, check_self_access, check_slice_cycles, LayerIsolationConfig,
    SelfAccessConfig, SliceCyclesConfig,
};
use arch_conform_core::{
    create_rules, import, CheckResult, Checker, Config, DependencyGraph, NodeSpec, Severity,
};
use std::path::PathBuf;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/orca")
}

fn run_fixture() -> CheckResult {
    let root = fixture_root();
    let config =
        Config::from_file(&root.join("arch-conform.toml")).expect("fixture config should load");
    let graph = import::load_graph(&root.join("arch-graph.json"), config.import())
        .expect("fixture graph should import");

    Checker::builder()
        .rules(create_rules(&config))
        .build()
        .check(&graph)
}

// ── Fixture pipeline ──

#[test]
fn fixture_reports_one_violation_per_rule() {
    let result = run_fixture();

    assert_eq!(
        result.violations.len(),
        3,
        "unexpected violations: {:#?}",
        result.violations.iter().map(ToString::to_string).collect::<Vec<_>>()
    );
    let codes: Vec<&str> = result.violations.iter().map(|v| v.code.as_str()).collect();
    assert_eq!(codes, vec!["AC001", "AC002", "AC003"]);
    assert!(result.failures.is_empty());
    assert!(!result.passes(Severity::Error));
}

#[test]
fn fixture_import_drops_tests_and_libraries() {
    let result = run_fixture();
    assert_eq!(result.nodes_checked, 7);
    assert!(result
        .violations
        .iter()
        .flat_map(|v| v.witnesses.iter())
        .all(|w| !w.origin.ends_with("Test") && !w.target.starts_with("org.springframework")));
}

#[test]
fn fixture_report_snapshot() {
    let report = run_fixture().format_test_report(Severity::Error);
    insta::assert_snapshot!(report.trim(), @r"
    === arch-conform: 3 violation(s) ===

    controllers-may-not-be-accessed [AC001] on com.netflix.spinnaker.orca.controllers.TaskController
      error: Layer 'Controllers' may not be accessed by any layer, but com.netflix.spinnaker.orca.echo.EchoNotifier depends on com.netflix.spinnaker.orca.controllers.TaskController
      | com.netflix.spinnaker.orca.echo.EchoNotifier -> com.netflix.spinnaker.orca.controllers.TaskController
      = help: Controllers are entry points and must not be called from other layers.

    controllers-only-accessed-by-themselves [AC002] on com.netflix.spinnaker.orca.controllers.TaskController
      error: Unit com.netflix.spinnaker.orca.controllers.TaskController should only be accessed by itself, but is accessed by com.netflix.spinnaker.orca.echo.EchoNotifier
      | com.netflix.spinnaker.orca.echo.EchoNotifier -> com.netflix.spinnaker.orca.controllers.TaskController

    slices-free-of-cycles [AC003] on pipeline
      error: Cycle detected: pipeline -> q -> pipeline
      | com.netflix.spinnaker.orca.pipeline.model.Execution -> com.netflix.spinnaker.orca.q.QueueProcessor
      | com.netflix.spinnaker.orca.q.QueueProcessor -> com.netflix.spinnaker.orca.pipeline.model.Execution
      = help: Break the cycle by removing or inverting one of the listed dependencies

    Total: 3 error(s), 0 warning(s), 0 info(s) from 3 rule(s) over 7 unit(s)
    ");
}

#[test]
fn fixture_json_output_is_stable() {
    let result = run_fixture();
    let json = serde_json::to_value(&result).expect("result should serialize");
    assert_eq!(json["rules_checked"], 3);
    assert_eq!(json["violations"][2]["subject"], "pipeline");
    assert_eq!(json["violations"][2]["implicated"][0], "q");
    assert_eq!(json["violations"][0]["severity"], "error");
}

// ── Behavioural scenarios ──

#[test]
fn outside_access_to_isolated_layer() {
    let graph = DependencyGraph::builder()
        .node(NodeSpec::new("app.controllers.Ctrl", "app.controllers"))
        .node(NodeSpec::new("app.service.Service", "app.service"))
        .edge("app.service.Service", "app.controllers.Ctrl")
        .build()
        .expect("graph should build");

    let violations = check_layer_isolation(
        &graph,
        &LayerIsolationConfig::new("controllers", ["app.controllers"]),
    )
    .expect("patterns are valid");

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].subject, "app.controllers.Ctrl");
    assert_eq!(violations[0].implicated, vec!["app.service.Service".to_string()]);
}

#[test]
fn nested_unit_may_access_its_owner() {
    let graph = DependencyGraph::builder()
        .node(NodeSpec::new("app.controllers.Ctrl", "app.controllers"))
        .node(NodeSpec::new("app.controllers.Ctrl$Inner", "app.controllers").member_of("app.controllers.Ctrl"))
        .edge("app.controllers.Ctrl$Inner", "app.controllers.Ctrl")
        .build()
        .expect("graph should build");

    let violations = check_self_access(&graph, &SelfAccessConfig::new("app.controllers"))
        .expect("pattern is valid");
    assert!(violations.is_empty());
}

#[test]
fn three_slices_in_a_ring() {
    let graph = DependencyGraph::builder()
        .node(NodeSpec::new("pkg.a.X", "pkg.a"))
        .node(NodeSpec::new("pkg.b.Y", "pkg.b"))
        .node(NodeSpec::new("pkg.c.Z", "pkg.c"))
        .edge("pkg.a.X", "pkg.b.Y")
        .edge("pkg.b.Y", "pkg.c.Z")
        .edge("pkg.c.Z", "pkg.a.X")
        .build()
        .expect("graph should build");

    let violations =
        check_slice_cycles(&graph, &SliceCyclesConfig::new("pkg.(*)..")).expect("pattern is valid");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].message, "Cycle detected: a -> b -> c -> a");
}

#[test]
fn removing_the_back_edge_clears_the_cycle() {
    let build = |with_back_edge: bool| {
        let mut builder = DependencyGraph::builder()
            .node(NodeSpec::new("pkg.a.X", "pkg.a"))
            .node(NodeSpec::new("pkg.b.Y", "pkg.b"))
            .node(NodeSpec::new("pkg.c.Z", "pkg.c"))
            .edge("pkg.a.X", "pkg.b.Y")
            .edge("pkg.b.Y", "pkg.c.Z")
            .edge("pkg.a.X", "pkg.c.Z");
        if with_back_edge {
            builder = builder.edge("pkg.c.Z", "pkg.a.X");
        }
        builder.build().expect("graph should build")
    };
    let config = SliceCyclesConfig::new("pkg.(*)..");

    assert!(check_slice_cycles(&build(false), &config)
        .expect("pattern is valid")
        .is_empty());

    let violations = check_slice_cycles(&build(true), &config).expect("pattern is valid");
    assert_eq!(violations.len(), 1);
    let v = &violations[0];
    assert_eq!(v.message, "Cycle detected: a -> c -> a");
    assert_eq!(v.subject, "a");
    assert_eq!(v.implicated, vec!["c".to_string()]);
}

#[test]
fn repeated_runs_are_identical() {
    assert_eq!(run_fixture().violations, run_fixture().violations);
}
