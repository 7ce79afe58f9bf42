//! Shared documents and a render harness for the integration tests.

use std::sync::Arc;

use pacfile_cli::pipelines::PipelineLookup;
use pacfile_cli::source::MemoryDownloader;
use pacfile_cli::templating::{RenderError, RenderSettings, Renderer, VarFrame};
use pacfile_cli::test_utils::{RecordingDiagnostics, init_test_logging};

/// Documents keyed by name. Every organisation, repository and ref sees the
/// same set.
pub const DOCUMENTS: &[(&str, &str)] = &[
    (
        "df",
        r#"{
    "stages": [
        {{ module "mod1" }},
        {{ module "mod2" }}
    ]
}"#,
    ),
    ("df2", r#"{{ module "mod4" "foo" "baz" "waitTime" 100 }}"#),
    (
        "df3",
        r#"{
    "stages": [
        {{ module "mod6" "waitTime" 10 "refId" { "c": "d" } "requisiteStageRefIds" ["1", "2", "3"] }}
    ]
}"#,
    ),
    ("df4", r#"{{ module "mod3" "foo" "" }}"#),
    (
        "df_bad",
        r#"{
    "stages": [
        {{ module "mod1" }
    ]
}"#,
    ),
    (
        "df_global",
        r#"{
    "application": "search",
    "globals": {
        "type": "foo"
    },
    "pipelines": [
        {{ module "mod1" }},
        {{ module "mod2" "type" "foobar" }}
    ]
}"#,
    ),
    (
        "df_global/nested",
        r#"{
    "application": "search",
    "globals": {
        "type": "foo"
    },
    "pipelines": [
        {{ module "mod1" }},
        {{ module "mod2" "type" "foobar" }}
    ]
}"#,
    ),
    (
        "df_spec",
        r#"{
    "spec": {
        "name": "search",
        "email": "unknown@unknown.com",
        "dataSources": {
            "disabled": [],
            "enabled": ["canaryConfigs"]
        }
    },
    "globals": {
        "type": "foo"
    },
    "pipelines": [
        {{ module "mod1" }},
        {{ module "mod2" "type" "foobar" }}
    ]
}"#,
    ),
    (
        "df_app_global",
        r#"{
    "application": "search",
    {{ appModule "appmod" }},
    "globals": {
        "type": "foo"
    },
    "pipelines": [
        {{ module "mod1" }},
        {{ module "mod2" "type" "foobar" }}
    ]
}"#,
    ),
    ("appmod", r#""description": "description""#),
    (
        "appmod_object",
        r#"{
    "description": "description",
    "email": "team@example.com"
}"#,
    ),
    (
        "mod1",
        r#"{
    "foo": "bar",
    "type": "{{ var "type" ?: "deploy" }}"
}"#,
    ),
    (
        "mod2",
        r#"{
    "type": "{{ var "type" ?: "jenkins" }}"
}"#,
    ),
    ("mod3", r#"{"foo": "{{ var "foo" ?: "baz" }}"}"#),
    (
        "mod4",
        r#"{
    "foo": "{{ var "foo" "baz" }}",
    "a": "{{ var "nonexistent" "b" }}",
    "nested": {{ module "mod5" }}
}"#,
    ),
    (
        "mod5",
        r#"{
    "waitTime": {{ var "waitTime" 1000 }}
}"#,
    ),
    (
        "mod6",
        r#"{
    "name": "Wait",
    "refId": {{ var "refId" {} }},
    "requisiteStageRefIds": {{ var "requisiteStageRefIds" [] }},
    "type": "wait",
    "waitTime": {{ var "waitTime" 12044 }}
}"#,
    ),
    (
        "nested_var_df",
        r#"{
    "application": "dinernotifications",
    "globals": {
        "application": "dinernotifications"
    },
    "pipelines": [
        {{ module "preprod_teardown.pipeline.module" }}
    ]
}"#,
    ),
    (
        "preprod_teardown.pipeline.module",
        r#"{
    "parameterConfig": [
        {
            "default": "{{ var "discovery-service-name" ?: "@application" }}",
            "description": "Service Name",
            "name": "service",
            "required": true
        }
    ]
}"#,
    ),
    (
        "empty_default_variables",
        r#"{
    "application": "dinernotifications",
    "pipelines": [
        {{ module "empty_default_variables.pipeline.module" }}
    ]
}"#,
    ),
    (
        "empty_default_variables.pipeline.module",
        r#"{
    "parameterConfig": [
        {
            "default": "{{ var "discovery-service-name" ?: "" }}",
            "name": "service"
        }
    ]
}"#,
    ),
    (
        "if_params.pacfile",
        r#"{
    "test": "if_params",
    "result": {{ module "if_params.midmodule"
                        "straightvar" "foo"
                        "condvar" true }}
}"#,
    ),
    (
        "if_params.midmodule",
        r#"
    {{ if var "condvar" }}
    {{ module "if_params.bottom"
              "foo" "bar"
              "extra" [ "foo", "bar" ]
    }}
    {{ else }}
    {{ module "if_params.bottom" "foo" "bar" }}
    {{ end }}
"#,
    ),
    (
        "if_params.bottom",
        r#"{
    "foo": "{{ var "foo" ?: "default" }}",
    "biff": {{ var "extra" ?: ["NotSet"] }}
}"#,
    ),
    (
        "var_params.outer",
        r#"
    {{ module "var_params.middle" "myvar" "success" }}
"#,
    ),
    (
        "var_params.middle",
        r#"
    {{ module "var_params.inner"
              "foo" [ { "bar": {{ var "myvar" ?: "failure"}} } ]
    }}
"#,
    ),
    (
        "var_params.inner",
        r#"{
    "foo": {{ var "foo" }}
}"#,
    ),
    (
        "pipelineIDTest",
        r#"{
    "application": "pipelineidexample",
    "failPipeline": true,
    "name": "Pipeline",
    "pipeline": "{{ pipelineID "triggerApp" "triggerPipeline" }}",
    "refId": "1",
    "requisiteStageRefIds": [],
    "type": "pipeline",
    "waitForCompletion": true
}"#,
    ),
    (
        "preprocess_fail",
        r#"{
    {{
}"#,
    ),
    (
        "global_vars_parse_fail",
        r#"
    ["foo", "bar"]
"#,
    ),
    (
        "global_vars_extract_fail",
        r#"{
    "globals": 42
}"#,
    ),
    (
        "varfunc_not_defined",
        r#"{
  "test": {{ var "biff" }}
}"#,
    ),
    (
        "template_parse_fail",
        r#"{
  "test": {{ nope "biff" }}
}"#,
    ),
    (
        "template_buffer_fail",
        r#"{
  "test": {{ if 4 gt 3 }} "biff" {{ end }}
}"#,
    ),
    (
        "missing_module",
        r#"{
    "stages": [{{ module "missingFragment" }}]
}"#,
    ),
    ("odd_params", r#"{"stage": "{{ module "mod3" "foo" }}"}"#),
    ("dict_keys", r#"{"stage": "{{ module "mod3" 42 "foo" }}"}"#),
    ("self_loop", r#"{"stages": [{{ module "loop" }}]}"#),
    ("loop", r#"{"again": {{ module "loop" }}}"#),
    ("ping_root", r#"{"stages": [{{ module "ping" }}]}"#),
    ("ping", r#"{"pong": {{ module "pong" }}}"#),
    ("pong", r#"{"ping": {{ module "ping" }}}"#),
    ("twice", r#"{"a": {{ module "mod3" }}, "b": {{ module "mod3" "foo" "x" }}}"#),
    ("plain", "{\n  \"stages\": [1, 2, 3],\n  \"note\": \"no directives {here}\"\n}\n"),
];

/// A renderer over [`DOCUMENTS`] that records its diagnostics.
pub struct Harness {
    pub renderer: Renderer,
    pub diagnostics: Arc<RecordingDiagnostics>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_files(DOCUMENTS.iter().copied())
    }

    pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::with_downloader(MemoryDownloader::with_files(files))
    }

    pub fn with_downloader(downloader: MemoryDownloader) -> Self {
        init_test_logging(None);
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let renderer = Renderer::new(Arc::new(downloader), RenderSettings::default())
            .with_diagnostics(diagnostics.clone());
        Self {
            renderer,
            diagnostics,
        }
    }

    #[must_use]
    pub fn with_pipelines(self, lookup: impl PipelineLookup + 'static) -> Self {
        Self {
            renderer: self.renderer.with_pipelines(Arc::new(lookup)),
            diagnostics: self.diagnostics,
        }
    }

    pub async fn render(&self, name: &str) -> Result<String, RenderError> {
        self.render_with(name, Vec::new()).await
    }

    pub async fn render_with(
        &self,
        name: &str,
        frames: Vec<VarFrame>,
    ) -> Result<String, RenderError> {
        self.renderer.parse("org", "repo", name, frames).await
    }
}

/// The fixture text of `name`.
pub fn document(name: &str) -> &'static str {
    DOCUMENTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, text)| *text)
        .unwrap_or_else(|| panic!("no fixture named {name}"))
}

/// `text` with all whitespace removed.
pub fn compact(text: &str) -> String {
    text.split_whitespace().collect()
}

/// Parse rendered output as JSON.
pub fn json(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or_else(|err| panic!("invalid JSON ({err}):\n{text}"))
}
