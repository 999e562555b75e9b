//! Tests for service selection over process events

use super::*;
use std::time::Duration;
use vigil_services::{Attributes, DefinitionCriteria, GlobAttr, default_exclude_services};

fn selector() -> ServiceSelector {
    let rules = vec![
        Attributes::default()
            .with_name("api")
            .with_exe_path(GlobAttr::new("*api*").unwrap()),
        Attributes::default().with_open_ports("8000-8999".parse().unwrap()),
    ];
    ServiceSelector::new(
        DefinitionCriteria::new(rules),
        DefinitionCriteria::default(),
        default_exclude_services().unwrap(),
    )
}

fn created(pid: u32, exe: &str, ports: Vec<u16>) -> Event<ProcessInfo> {
    Event::created(ProcessInfo::new(pid, 1, exe).with_ports(ports))
}

fn deleted(pid: u32, exe: &str) -> Event<ProcessInfo> {
    Event::deleted(ProcessInfo::new(pid, 1, exe))
}

// ============================================================================
// Filtering
// ============================================================================

#[test]
fn test_created_selected_with_rule_name() {
    let mut matcher = DiscoveryMatcher::new(selector());
    let out = matcher.filter(vec![created(10, "/srv/api", vec![])]);

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].kind, EventType::Created);
    assert_eq!(out[0].obj.service, ServiceId::new("api", ""));
    assert_eq!(out[0].obj.process.pid, 10);
}

#[test]
fn test_unnamed_rule_falls_back_to_exe_name() {
    let mut matcher = DiscoveryMatcher::new(selector());
    let out = matcher.filter(vec![created(11, "/usr/bin/python3", vec![8080])]);
    assert_eq!(out[0].obj.service.name, "python3");
}

#[test]
fn test_ineligible_and_excluded_are_dropped() {
    let mut matcher = DiscoveryMatcher::new(selector());
    let out = matcher.filter(vec![
        created(12, "/usr/bin/bash", vec![]),
        created(13, "/usr/local/bin/vigil", vec![8080]),
    ]);
    assert!(out.is_empty());
    assert_eq!(matcher.forwarded(), 0);
}

#[test]
fn test_created_twice_forwarded_once() {
    let mut matcher = DiscoveryMatcher::new(selector());
    matcher.filter(vec![created(10, "/srv/api", vec![])]);
    let again = matcher.filter(vec![created(10, "/srv/api", vec![8080])]);
    assert!(again.is_empty());
    assert_eq!(matcher.forwarded(), 1);
}

#[test]
fn test_late_ports_make_process_eligible() {
    let mut matcher = DiscoveryMatcher::new(selector());
    assert!(matcher.filter(vec![created(20, "/usr/bin/node", vec![])]).is_empty());

    let out = matcher.filter(vec![created(20, "/usr/bin/node", vec![8443])]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].obj.service.name, "node");
}

#[test]
fn test_deleted_only_for_forwarded() {
    let mut matcher = DiscoveryMatcher::new(selector());
    matcher.filter(vec![created(10, "/srv/api", vec![])]);

    let out = matcher.filter(vec![deleted(10, "/srv/api"), deleted(99, "/usr/bin/bash")]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].kind, EventType::Deleted);
    assert_eq!(out[0].obj.service.name, "api");
    assert_eq!(matcher.forwarded(), 0);

    // a second deletion is not forwarded
    assert!(matcher.filter(vec![deleted(10, "/srv/api")]).is_empty());
}

// ============================================================================
// Run loop
// ============================================================================

#[tokio::test]
async fn test_run_forwards_and_closes_output() {
    let input: Topic<Vec<Event<ProcessInfo>>> = Topic::new("processes", 4);
    let output = Topic::new("instrumentable", 4);
    let mut out_sub = output.subscribe();

    let matcher = DiscoveryMatcher::new(selector());
    let handle = tokio::spawn(matcher.run(
        input.subscribe(),
        output.clone(),
        CancellationToken::new(),
    ));

    input
        .send(vec![
            created(1, "/usr/bin/bash", vec![]),
            created(2, "/srv/api", vec![]),
        ])
        .await
        .unwrap();
    input.close();

    let batch = tokio::time::timeout(Duration::from_secs(5), out_sub.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].obj.process.pid, 2);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(output.is_closed());
    assert!(out_sub.recv().await.is_none());
}

#[tokio::test]
async fn test_cancellation_unblocks_full_output() {
    let input: Topic<Vec<Event<ProcessInfo>>> = Topic::new("processes", 4);
    let output = Topic::new("instrumentable", 1);
    let _stalled = output.subscribe();
    let cancel = CancellationToken::new();

    let matcher = DiscoveryMatcher::new(selector());
    let handle = tokio::spawn(matcher.run(input.subscribe(), output.clone(), cancel.clone()));

    input.send(vec![created(1, "/srv/api", vec![])]).await.unwrap();
    input.send(vec![created(2, "/srv/api", vec![])]).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(!output.is_closed());
}
