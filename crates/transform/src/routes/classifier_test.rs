//! Tests for route assignment

use super::*;
use vigil_protocol::SpanKind;

fn classifier(patterns: &[&str], unmatch: Option<&str>) -> RouteClassifier {
    RouteClassifier::new(&RoutesConfig {
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
        unmatch: unmatch.map(String::from),
        ..Default::default()
    })
}

fn route(classifier: &RouteClassifier, path: &str) -> String {
    let mut span = Span::new(SpanKind::Http, path);
    classifier.classify(&mut span);
    span.route
}

#[test]
fn test_unset_policy() {
    let c = classifier(&["/user/:id"], Some("unset"));
    assert_eq!(route(&c, "/user/1234"), "/user/:id");
    assert_eq!(route(&c, "/some/path"), "");
}

#[test]
fn test_default_policy_is_unset() {
    let c = classifier(&["/user/:id"], None);
    assert_eq!(c.policy(), UnmatchPolicy::Unset);
    assert_eq!(route(&c, "/some/path"), "");
}

#[test]
fn test_unknown_policy_behaves_as_unset() {
    let c = classifier(&["/user/:id"], Some("invalid_value"));
    assert_eq!(route(&c, "/user/1234"), "/user/:id");
    assert_eq!(route(&c, "/some/path"), "");
}

#[test]
fn test_wildcard_policy() {
    let c = classifier(&["/user/:id"], Some("wildcard"));
    assert_eq!(route(&c, "/user/1234"), "/user/:id");
    assert_eq!(route(&c, "/some/path"), WILDCARD_ROUTE);
}

#[test]
fn test_literal_policy() {
    let c = classifier(&["/user/:id"], Some("literal"));
    assert_eq!(route(&c, "/user/1234"), "/user/:id");
    assert_eq!(route(&c, "/some/path"), "/some/path");

    let alias = classifier(&[], Some("path"));
    assert_eq!(route(&alias, "/x/1"), "/x/1");
}

#[test]
fn test_heuristic_policy() {
    let c = classifier(&["/user/:id"], Some("heuristic"));
    assert_eq!(route(&c, "/user/1234"), "/user/:id");
    assert_eq!(route(&c, "/some/path"), "/some/path");
    assert_eq!(route(&c, "/customer/1/job/2"), "/customer/*/job/*");
    assert_eq!(route(&c, "/customer/lfdsjd/job/erwejre"), "/customer/*/job/*");
    assert!(c.heuristic().is_some());
}

#[test]
fn test_heuristic_only_built_for_heuristic_policy() {
    assert!(classifier(&[], Some("wildcard")).heuristic().is_none());
}

#[test]
fn test_preassigned_route_is_kept() {
    let c = classifier(&["/user/:id"], Some("wildcard"));
    let mut span = Span::new(SpanKind::Http, "/user/1").with_route("/user/{userId}");
    assert_eq!(c.classify(&mut span), Classification::Preassigned);
    assert_eq!(span.route, "/user/{userId}");
}

#[test]
fn test_classification_outcome() {
    let c = classifier(&["/user/:id"], Some("literal"));
    let mut matched = Span::new(SpanKind::Http, "/user/1");
    let mut unmatched = Span::new(SpanKind::Http, "/other");

    assert_eq!(c.classify(&mut matched), Classification::Matched);
    assert_eq!(
        c.classify(&mut unmatched),
        Classification::Unmatched(UnmatchPolicy::Literal)
    );
}

#[test]
fn test_route_for_path() {
    let c = classifier(&["/users/{id}/product/{pid}"], Some("heuristic"));
    assert_eq!(c.route_for("/users/1/product/2"), "/users/{id}/product/{pid}");
    assert_eq!(c.route_for("/orders/77?x=1"), "/orders/*");
}

#[test]
fn test_heuristic_respects_wildcard_char() {
    let c = RouteClassifier::new(&RoutesConfig {
        unmatch: Some("heuristic".into()),
        wildcard_char: "_".into(),
        ..Default::default()
    });
    assert_eq!(c.route_for("/orders/77"), "/orders/_");
}
