mod cli_support;

use cli_support::{args, path_arg, run_cli, run_cli_json, run_cli_json_error, TestHome};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

fn write_fields(path: &Path) {
    let fields = json!([
        {"name": "title", "type": "string", "description": "Document title"},
        {"name": "order", "type": "object", "properties": {
            "total": {"name": "total", "type": "number"}
        }},
        {"name": "tags", "type": "array", "items": {"name": "item", "type": "string"}}
    ]);
    fs::write(path, serde_json::to_string_pretty(&fields).unwrap()).unwrap();
}

fn new_template(home: &TestHome) -> String {
    let fields_path = home.path().join("fields.json");
    write_fields(&fields_path);
    let template_path = home.path().join("orders.json");
    let created: Value = run_cli_json(
        &args([
            "template",
            "new",
            "Orders",
            "--output",
            &path_arg(&template_path),
            "--from",
            &path_arg(&fields_path),
            "--json",
        ]),
        &home.envs(),
    );
    assert_eq!(created["name"], "Orders");
    path_arg(&template_path)
}

fn field_names(template: &Value) -> Vec<String> {
    template["schema"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_template_new_and_show() {
    let home = TestHome::new();
    let template = new_template(&home);

    let shown: Value = run_cli_json(&args(["template", "show", &template, "--json"]), &home.envs());
    assert_eq!(field_names(&shown), vec!["title", "order", "tags"]);
    assert!(shown["id"].as_str().is_some());
    assert!(shown["created_at"].as_str().is_some());
    assert!(shown.get("last_updated_at").is_none());
}

#[test]
fn test_template_new_refuses_overwrite() {
    let home = TestHome::new();
    let template = new_template(&home);

    let error = run_cli_json_error(
        &args(["template", "new", "Again", "--output", &template, "--json"]),
        &home.envs(),
    );
    assert!(error["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("File already exists"));

    let replaced: Value = run_cli_json(
        &args(["template", "new", "Again", "--output", &template, "--force", "--json"]),
        &home.envs(),
    );
    assert_eq!(replaced["name"], "Again");
    assert!(field_names(&replaced).is_empty());
}

#[test]
fn test_template_validate() {
    let home = TestHome::new();
    let template = new_template(&home);

    let report: Value = run_cli_json(
        &args(["template", "validate", &template, "--json"]),
        &home.envs(),
    );
    assert_eq!(report["valid"], true);
    assert_eq!(report["fields"], 3);
    // title, order, order.total, tags, tags.[]
    assert_eq!(report["nodes"], 5);
}

#[test]
fn test_template_validate_rejects_bad_type() {
    let home = TestHome::new();
    let bad = home.path().join("bad.json");
    fs::write(&bad, r#"[{"name": "x", "type": "date"}]"#).unwrap();

    let output = run_cli(
        &args(["template", "validate", &path_arg(&bad), "--json"]),
        &home.envs(),
    );
    assert!(!output.status.success());
}

#[test]
fn test_edit_update_and_add_field() {
    let home = TestHome::new();
    let template = new_template(&home);

    let edited: Value = run_cli_json(
        &args(["edit", &template, "update", "0", "--name", "heading", "--json"]),
        &home.envs(),
    );
    assert_eq!(field_names(&edited), vec!["heading", "order", "tags"]);
    assert_eq!(edited["schema"]["fields"][0]["description"], "Document title");
    assert!(edited["last_updated_at"].as_str().is_some());

    let edited: Value = run_cli_json(
        &args([
            "edit",
            &template,
            "add-field",
            "currency",
            "--parent",
            "1",
            "--description",
            "ISO code",
            "--json",
        ]),
        &home.envs(),
    );
    let properties = edited["schema"]["fields"][1]["properties"].as_object().unwrap();
    let keys: Vec<&String> = properties.keys().collect();
    assert_eq!(keys, vec!["total", "currency"]);
    assert_eq!(properties["currency"]["description"], "ISO code");

    let edited: Value = run_cli_json(
        &args(["edit", &template, "add-field", "paid", "--type", "boolean", "--json"]),
        &home.envs(),
    );
    assert_eq!(field_names(&edited), vec!["heading", "order", "tags", "paid"]);
    assert_eq!(edited["schema"]["fields"][3]["type"], "boolean");

    // Changes were saved
    let shown: Value = run_cli_json(&args(["template", "show", &template, "--json"]), &home.envs());
    assert_eq!(field_names(&shown), vec!["heading", "order", "tags", "paid"]);
}

#[test]
fn test_edit_dry_run_does_not_save() {
    let home = TestHome::new();
    let template = new_template(&home);

    let edited: Value = run_cli_json(
        &args(["edit", &template, "--dry-run", "remove", "2", "--json"]),
        &home.envs(),
    );
    assert_eq!(field_names(&edited), vec!["title", "order"]);

    let shown: Value = run_cli_json(&args(["template", "show", &template, "--json"]), &home.envs());
    assert_eq!(field_names(&shown), vec!["title", "order", "tags"]);
}

#[test]
fn test_edit_apply_ops_file() {
    let home = TestHome::new();
    let template = new_template(&home);
    let ops_path = home.path().join("ops.json");
    fs::write(
        &ops_path,
        serde_json::to_string(&json!([
            {"op": "update_field", "path": "2.[]", "patch": {"type": "object"}},
            {"op": "add_property", "parent": "2.[]"},
            {"op": "update_field", "path": "2.[].property1", "patch": {"name": "label"}},
            {"op": "set_description", "description": "Order documents"}
        ]))
        .unwrap(),
    )
    .unwrap();

    let edited: Value = run_cli_json(
        &args(["edit", &template, "apply", &path_arg(&ops_path), "--json"]),
        &home.envs(),
    );
    assert_eq!(edited["description"], "Order documents");
    let items = &edited["schema"]["fields"][2]["items"];
    assert_eq!(items["type"], "object");
    assert_eq!(items["properties"]["label"]["type"], "string");
}

#[test]
fn test_edit_bad_path_json_error() {
    let home = TestHome::new();
    let template = new_template(&home);

    let error = run_cli_json_error(
        &args(["edit", &template, "remove", "9", "--json"]),
        &home.envs(),
    );
    assert!(error["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid field path '9'"));

    let error = run_cli_json_error(
        &args(["edit", &template, "remove", "1.[]", "--json"]),
        &home.envs(),
    );
    assert!(error["error"]["message"].as_str().is_some());
}
