//! `tsb check` over trees written to disk.

use std::path::{Path, PathBuf};

use tsb_cli::args::{CheckArgs, Edit, OutputFormat};
use tsb_cli::driver;
use tsb_cli::reporter::{Reporter, render_json};
use tsb_syntax::{NodeArena, TreeBuilder};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn write_tree(dir: &Path, name: &str, arena: &NodeArena) -> PathBuf {
    let path = dir.join(name);
    let json = arena.to_json().expect("encode tree");
    std::fs::write(&path, json).expect("write tree");
    path
}

fn interface_thing() -> NodeArena {
    let b = TreeBuilder::new();
    let statement = b.interface_decl("Thing", &[], &[], &[b.property_sig("id", Some(b.number_type()))]);
    b.finish(&[statement])
}

/// `var t: Thing = { id: <value> };`
fn thing_user(id_is_number: bool) -> NodeArena {
    let b = TreeBuilder::new();
    let value = if id_is_number { b.num(1.0) } else { b.str_lit("one") };
    let literal = b.object_lit(&[b.prop_assign("id", value)]);
    let statement = b.var_decl("t", Some(b.type_ref("Thing", &[])), Some(literal));
    b.finish(&[statement])
}

fn check_args(files: Vec<PathBuf>) -> CheckArgs {
    CheckArgs {
        files,
        format: OutputFormat::Text,
        config: None,
        edits: Vec::new(),
        no_color: true,
    }
}

#[test]
fn reports_diagnostics_with_unit_paths() {
    init_tracing();
    let dir = tempfile::tempdir().expect("temp dir");
    let decl = write_tree(dir.path(), "thing.ts.json", &interface_thing());
    let user = write_tree(dir.path(), "user.ts.json", &thing_user(false));

    let report = driver::check(&check_args(vec![decl, user.clone()])).expect("check runs");
    assert_eq!(report.units, 2);
    assert_eq!(report.error_count(), 1);
    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.file, driver::unit_path(&user));
    assert_eq!(diagnostic.kind.name(), "type-mismatch");

    let text = Reporter::new(false).render(&report);
    assert!(text.contains("error TS2322"), "{text}");
    assert!(text.ends_with("Found 1 error in 2 units."), "{text}");
}

#[test]
fn edit_replays_incremental_update() {
    init_tracing();
    let dir = tempfile::tempdir().expect("temp dir");
    let decl = write_tree(dir.path(), "thing.ts.json", &interface_thing());
    let user = write_tree(dir.path(), "user.ts.json", &thing_user(false));
    let fixed = write_tree(dir.path(), "user.fixed.json", &thing_user(true));

    let mut args = check_args(vec![decl, user.clone()]);
    args.edits.push(Edit {
        target: user,
        replacement: fixed,
    });
    let report = driver::check(&args).expect("check runs");
    assert_eq!(report.edits, 1);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn config_enables_implicit_any_reports() {
    init_tracing();
    let dir = tempfile::tempdir().expect("temp dir");
    let b = TreeBuilder::new();
    let body = [b.return_stmt(None)];
    let function = b.function_decl("f", &[], &[b.param("x", None)], None, Some(&body));
    let tree = write_tree(dir.path(), "f.ts.json", &b.finish(&[function]));
    let config = dir.path().join("options.json");
    std::fs::write(&config, r#"{ "noImplicitAny": true }"#).expect("write config");

    let mut args = check_args(vec![tree]);
    assert!(driver::check(&args).expect("check runs").diagnostics.is_empty());

    args.config = Some(config);
    args.format = OutputFormat::Json;
    let report = driver::check(&args).expect("check runs");
    let json = render_json(&report).expect("encode");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["errorCount"], 1);
    assert_eq!(value["diagnostics"][0]["kind"], "implicit-any-parameter");
}

#[test]
fn unreadable_inputs_are_errors_with_context() {
    init_tracing();
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("missing.json");
    let err = driver::check(&check_args(vec![missing])).expect_err("missing file");
    assert!(format!("{err:#}").contains("failed to read"), "{err:#}");

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "{ not json").expect("write");
    let err = driver::check(&check_args(vec![garbage])).expect_err("bad json");
    assert!(format!("{err:#}").contains("failed to parse syntax tree"), "{err:#}");
}

#[test]
fn edit_target_must_be_checked() {
    init_tracing();
    let dir = tempfile::tempdir().expect("temp dir");
    let decl = write_tree(dir.path(), "thing.ts.json", &interface_thing());
    let mut args = check_args(vec![decl.clone()]);
    args.edits.push(Edit {
        target: dir.path().join("other.json"),
        replacement: decl,
    });
    assert!(driver::check(&args).is_err());
}
