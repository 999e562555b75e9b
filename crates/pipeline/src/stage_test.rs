//! Tests for the transform stage

use super::*;
use std::future::Future;
use std::pin::Pin;
use tokio::time::timeout;
use vigil_config::RoutesConfig;
use vigil_protocol::{Span, SpanKind};
use vigil_transform::{RouteTransformer, TransformError, TransformResult, Transformer};

const WAIT: Duration = Duration::from_secs(1);

fn routes_chain() -> Chain {
    let config = RoutesConfig {
        patterns: vec!["/user/:id".into()],
        unmatch: Some("wildcard".into()),
        ..Default::default()
    };
    Chain::new(vec![Box::new(RouteTransformer::new(Some(&config)))])
}

fn batch(paths: &[&str]) -> SpanBatch {
    paths.iter().map(|p| Span::new(SpanKind::Http, *p)).collect()
}

struct Failing;

impl Transformer for Failing {
    fn transform<'a>(
        &'a self,
        _batch: SpanBatch,
    ) -> Pin<Box<dyn Future<Output = TransformResult<SpanBatch>> + Send + 'a>> {
        Box::pin(async move { Err(TransformError::failed("boom")) })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[tokio::test]
async fn test_stage_classifies_and_forwards() {
    let input = Topic::new("spans", 4);
    let output = Topic::new("export", 4);
    let mut export = output.subscribe();

    let stage = TransformStage::new("routes", routes_chain());
    let metrics = stage.metrics();
    let handle = tokio::spawn(stage.run(input.subscribe(), output.clone(), CancellationToken::new()));

    input.send(batch(&["/user/1", "/other"])).await.unwrap();
    input.send(batch(&["/user/2"])).await.unwrap();

    let first = timeout(WAIT, export.recv()).await.unwrap().unwrap();
    let routes: Vec<_> = first.iter().map(|s| s.route.as_str()).collect();
    assert_eq!(routes, vec!["/user/:id", "/**"]);

    let second = timeout(WAIT, export.recv()).await.unwrap().unwrap();
    assert_eq!(second[0].route, "/user/:id");

    input.close();
    timeout(WAIT, handle).await.unwrap().unwrap();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.batches_received, 2);
    assert_eq!(snapshot.batches_forwarded, 2);
    assert_eq!(snapshot.spans_out, 3);
}

#[tokio::test]
async fn test_input_close_cascades_to_output() {
    let input: Topic<SpanBatch> = Topic::new("spans", 1);
    let output = Topic::new("export", 1);
    let mut export = output.subscribe();

    let stage = TransformStage::new("routes", routes_chain());
    let handle = tokio::spawn(stage.run(input.subscribe(), output.clone(), CancellationToken::new()));

    input.close();
    timeout(WAIT, handle).await.unwrap().unwrap();

    assert!(output.is_closed());
    assert!(timeout(WAIT, export.recv()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cancellation_stops_stage() {
    let input: Topic<SpanBatch> = Topic::new("spans", 1);
    let output = Topic::new("export", 1);
    let cancel = CancellationToken::new();

    let stage = TransformStage::new("routes", Chain::empty());
    let handle = tokio::spawn(stage.run(input.subscribe(), output.clone(), cancel.clone()));

    cancel.cancel();
    timeout(WAIT, handle).await.unwrap().unwrap();
    assert!(!input.is_closed());
}

#[tokio::test]
async fn test_cancellation_unblocks_full_output() {
    let input = Topic::new("spans", 4);
    let output = Topic::new("export", 1);
    let _stalled = output.subscribe();
    let cancel = CancellationToken::new();

    let stage = TransformStage::new("passthrough", Chain::empty());
    let handle = tokio::spawn(stage.run(input.subscribe(), output.clone(), cancel.clone()));

    input.send(batch(&["/a"])).await.unwrap();
    input.send(batch(&["/b"])).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    cancel.cancel();
    timeout(WAIT, handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_failed_chain_forwards_original_batch() {
    let input = Topic::new("spans", 1);
    let output = Topic::new("export", 1);
    let mut export = output.subscribe();

    let stage = TransformStage::new("failing", Chain::new(vec![Box::new(Failing)]));
    let metrics = stage.metrics();
    let handle = tokio::spawn(stage.run(input.subscribe(), output.clone(), CancellationToken::new()));

    input.send(batch(&["/user/1"])).await.unwrap();
    let forwarded = timeout(WAIT, export.recv()).await.unwrap().unwrap();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].route, "");

    input.close();
    timeout(WAIT, handle).await.unwrap().unwrap();
    assert_eq!(metrics.snapshot().transforms_failed, 1);
}

#[tokio::test]
async fn test_output_close_stops_stage() {
    let input = Topic::new("spans", 1);
    let output = Topic::new("export", 1);

    let stage = TransformStage::new("routes", routes_chain());
    let handle = tokio::spawn(stage.run(input.subscribe(), output.clone(), CancellationToken::new()));

    output.close();
    input.send(batch(&["/user/1"])).await.unwrap();
    timeout(WAIT, handle).await.unwrap().unwrap();
}
