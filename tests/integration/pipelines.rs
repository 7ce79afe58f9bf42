//! `pipelineID` resolution, against fixed tables and a live HTTP endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use pacfile_cli::pipelines::{
    GateClient, LookupError, NoPipelines, PipelineLookup, PipelineSummary, StaticPipelines,
    find_pipeline_id,
};
use pacfile_cli::templating::Severity;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::fixtures::{Harness, document};

const PIPELINES_JSON: &str =
    r#"[{"id": "p-1", "name": "deploy", "application": "triggerApp"}, {"id": "p-2", "name": "triggerPipeline"}]"#;

/// Serve one canned response per connection, repeating the last one.
/// Returns the base URL and a request counter.
async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        let mut index = 0;
        while let Ok((mut stream, _)) = listener.accept().await {
            let (status, body) = responses[index.min(responses.len() - 1)];
            index += 1;
            counter.fetch_add(1, Ordering::SeqCst);

            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{addr}"), hits)
}

struct FailingPipelines;

impl PipelineLookup for FailingPipelines {
    fn list_pipelines<'a>(
        &'a self,
        application: &'a str,
    ) -> BoxFuture<'a, Result<Vec<PipelineSummary>, LookupError>> {
        Box::pin(async move {
            Err(LookupError::Status {
                application: application.to_string(),
                status: 503,
            })
        })
    }
}

fn expected_with(id: &str) -> String {
    document("pipelineIDTest")
        .replace(r#"{{ pipelineID "triggerApp" "triggerPipeline" }}"#, id)
}

#[tokio::test]
async fn pipeline_id_is_substituted() {
    let harness = Harness::new()
        .with_pipelines(StaticPipelines::new().with("triggerApp", "triggerPipeline", "pipelineID"));
    let rendered = harness.render("pipelineIDTest").await.unwrap();
    assert_eq!(rendered, expected_with("pipelineID"));
}

#[tokio::test]
async fn unknown_pipeline_renders_empty() {
    let harness =
        Harness::new().with_pipelines(StaticPipelines::new().with("triggerApp", "other", "x"));
    let rendered = harness.render("pipelineIDTest").await.unwrap();
    assert_eq!(rendered, expected_with(""));
    assert!(harness.diagnostics.has(Severity::Info, "Pipeline 'triggerPipeline' not found"));
}

#[tokio::test]
async fn failed_lookup_renders_empty_and_continues() {
    let harness = Harness::new().with_pipelines(FailingPipelines);
    let rendered = harness.render("pipelineIDTest").await.unwrap();
    assert_eq!(rendered, expected_with(""));
    assert!(harness.diagnostics.has(Severity::Error, "Could not look up pipelines"));
}

#[tokio::test]
async fn offline_rendering_degrades_to_empty() {
    let harness = Harness::new().with_pipelines(NoPipelines);
    let rendered = harness.render("pipelineIDTest").await.unwrap();
    assert_eq!(rendered, expected_with(""));
}

#[tokio::test]
async fn gate_client_lists_pipelines() {
    let (url, hits) = serve(vec![(200, PIPELINES_JSON)]).await;
    let client = GateClient::new(url, Duration::from_secs(5)).unwrap();

    let pipelines = client.list_pipelines("triggerApp").await.unwrap();
    assert_eq!(pipelines.len(), 2);
    assert_eq!(
        pipelines[0],
        PipelineSummary {
            id: "p-1".to_string(),
            name: "deploy".to_string(),
        }
    );
    assert_eq!(
        find_pipeline_id(&client, "triggerApp", "triggerPipeline").await.unwrap(),
        Some("p-2".to_string())
    );
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn gate_client_retries_server_errors() {
    let (url, hits) = serve(vec![(500, "oops"), (502, "oops"), (200, PIPELINES_JSON)]).await;
    let client = GateClient::new(url, Duration::from_secs(5)).unwrap();

    let pipelines = client.list_pipelines("triggerApp").await.unwrap();
    assert_eq!(pipelines.len(), 2);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn gate_client_gives_up_after_three_attempts() {
    let (url, hits) = serve(vec![(500, "oops")]).await;
    let client = GateClient::new(url, Duration::from_secs(5)).unwrap();

    let err = client.list_pipelines("triggerApp").await.unwrap_err();
    assert!(matches!(err, LookupError::Status { status: 500, .. }), "got {err:?}");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn gate_client_does_not_retry_client_errors() {
    let (url, hits) = serve(vec![(404, "{}")]).await;
    let client = GateClient::new(url, Duration::from_secs(5)).unwrap();

    let err = client.list_pipelines("missing").await.unwrap_err();
    assert!(matches!(err, LookupError::Status { status: 404, .. }), "got {err:?}");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn gate_client_drives_pipeline_id() {
    let (url, _) = serve(vec![(200, PIPELINES_JSON)]).await;
    let client = GateClient::new(url, Duration::from_secs(5)).unwrap();
    let harness = Harness::new().with_pipelines(client);

    let rendered = harness.render("pipelineIDTest").await.unwrap();
    assert_eq!(rendered, expected_with("p-2"));
}
