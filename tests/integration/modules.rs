//! Module expansion: splicing, argument handling and fragment locations.

use std::sync::Arc;

use pacfile_cli::source::MemoryDownloader;
use pacfile_cli::templating::{RenderSettings, Renderer, Severity};

use crate::fixtures::{Harness, compact, document, json};

#[tokio::test]
async fn app_module_members_splice_into_the_parent() {
    let harness = Harness::new();
    let rendered = harness.render("df_app_global").await.unwrap();
    assert_eq!(
        compact(&rendered),
        r#"{"application":"search","description":"description","globals":{"type":"foo"},"pipelines":[{"foo":"bar","type":"foo"},{"type":"foobar"}]}"#
    );
}

#[tokio::test]
async fn app_module_strips_braces_of_an_object_fragment() {
    let harness = Harness::with_files([
        ("root", r#"{"application": "search", {{ appModule "appmod_object" }}}"#),
        ("appmod_object", document("appmod_object")),
    ]);
    let rendered = json(&harness.render("root").await.unwrap());
    assert_eq!(
        rendered,
        serde_json::json!({
            "application": "search",
            "description": "description",
            "email": "team@example.com"
        })
    );
}

#[tokio::test]
async fn sibling_calls_to_one_module_are_not_cycles() {
    let harness = Harness::new();
    let rendered = json(&harness.render("twice").await.unwrap());
    assert_eq!(rendered, serde_json::json!({"a": {"foo": "baz"}, "b": {"foo": "x"}}));
}

#[tokio::test]
async fn odd_argument_count_renders_empty_with_a_warning() {
    let harness = Harness::new();
    let rendered = harness.render("odd_params").await.unwrap();
    assert_eq!(rendered, r#"{"stage": ""}"#);
    assert_eq!(
        harness.diagnostics.warnings(),
        vec!["odd number of parameters received to module mod3".to_string()]
    );
}

#[tokio::test]
async fn non_string_keys_render_empty_with_an_error() {
    let harness = Harness::new();
    let rendered = harness.render("dict_keys").await.unwrap();
    assert_eq!(rendered, r#"{"stage": ""}"#);
    assert_eq!(
        harness.diagnostics.errors(),
        vec!["dict keys must be strings in module: mod3".to_string()]
    );
}

#[tokio::test]
async fn references_inside_module_arguments_stay_literal() {
    let harness = Harness::new();
    let rendered = harness.render("var_params.outer").await.unwrap();

    assert!(rendered.contains(r#"{{ var "myvar" ?: "failure"}}"#));
    assert!(serde_json::from_str::<serde_json::Value>(&rendered).is_err());

    let diagnostics = &harness.diagnostics;
    assert!(diagnostics.warnings().is_empty());
    assert_eq!(diagnostics.errors().len(), 1);
    assert!(diagnostics.has(Severity::Error, "Error parsing value"));
    assert_eq!(
        diagnostics.infos(),
        vec!["No global vars found in document var_params.outer".to_string()]
    );
}

#[tokio::test]
async fn raw_nested_actions_are_passed_as_text() {
    let harness = Harness::with_files([
        ("root", r#"{"a": "{{ module "inner" "artifact" {{var artifact}} }}"}"#),
        ("inner", r#"{{ var "artifact" }}"#),
    ]);
    let rendered = harness.render("root").await.unwrap();
    assert_eq!(rendered, r#"{"a": "{{var artifact}}"}"#);
}

#[tokio::test]
async fn modules_are_read_from_the_template_repository() {
    let files = MemoryDownloader::new();
    files.insert_at("svc", "app", "pacfile", "master", r#"{"stages": [{{ module "wait" }}]}"#);
    files.insert_at("platform", "modules", "wait", "stable", r#"{"type": "wait"}"#);
    files.insert_at("svc", "app", "wait", "master", r#"{"type": "wrong"}"#);

    let settings = RenderSettings {
        template_org: Some("platform".to_string()),
        template_repo: Some("modules".to_string()),
        template_branch: Some("stable".to_string()),
        ..RenderSettings::default()
    };
    let renderer = Renderer::new(Arc::new(files), settings);

    let rendered = renderer.parse("svc", "app", "pacfile", Vec::new()).await.unwrap();
    assert_eq!(rendered, r#"{"stages": [{"type": "wait"}]}"#);
}

#[tokio::test]
async fn concurrent_renders_do_not_share_state() {
    let harness = Harness::new();
    let (a, b, c) = tokio::join!(
        harness.render("df_global"),
        harness.render("df"),
        harness.render("self_loop"),
    );
    assert_eq!(json(&a.unwrap())["pipelines"][0]["type"], "foo");
    assert_eq!(json(&b.unwrap())["stages"][0]["type"], "deploy");
    assert!(c.is_err());
}
