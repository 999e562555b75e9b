//! Tests for heuristic route generalization

use super::*;

fn classifier() -> HeuristicClassifier {
    HeuristicClassifier::new("*", 64)
}

// ============================================================================
// Segment classification
// ============================================================================

#[test]
fn test_numbers_are_identifiers() {
    for segment in ["1", "123", "1234567890", "v12", "12ab"] {
        assert!(is_identifier(segment), "{segment}");
    }
}

#[test]
fn test_single_digit_grace() {
    for segment in ["v1", "v2", "h2c", "v1beta"] {
        assert!(!is_identifier(segment), "{segment}");
    }
}

#[test]
fn test_punctuated_tokens_are_identifiers() {
    for segment in [
        "a-b",
        "550e8400-e29b-41d4-a716-446655440000",
        "user_42",
        "file.json",
    ] {
        assert!(is_identifier(segment), "{segment}");
    }
}

#[test]
fn test_long_hex_is_identifier() {
    assert!(is_identifier("deadbeefcafe"));
    assert!(is_identifier("5f3a9c1be07d44aa"));
    assert!(!is_identifier("facade"));
}

#[test]
fn test_words_are_kept() {
    for segment in [
        "api", "js", "customer", "checkout", "json", "graphql", "health", "javascript",
        "ajax", "orders", "Users", "metrics",
    ] {
        assert!(!is_identifier(segment), "{segment}");
    }
}

#[test]
fn test_random_letters_are_identifiers() {
    for segment in [
        "lfdsjd",
        "erwejre",
        "bcdfgh",
        "aaab",
        "xkcdqwrt",
        "abcdefghijklmnopqrstuvwxyzabcdefgh",
    ] {
        assert!(is_identifier(segment), "{segment}");
    }
}

// ============================================================================
// Generalization
// ============================================================================

#[test]
fn test_generalize_replaces_identifiers() {
    let h = classifier();
    assert_eq!(h.generalize("/customer/1/job/2"), "/customer/*/job/*");
    assert_eq!(h.generalize("/customer/lfdsjd/job/erwejre"), "/customer/*/job/*");
    assert_eq!(h.generalize("/some/path"), "/some/path");
    assert_eq!(h.generalize("/api/v1/orders"), "/api/v1/orders");
}

#[test]
fn test_generalize_drops_query() {
    let h = classifier();
    assert_eq!(h.generalize("/users/12345?expand=true"), "/users/*");
    assert_eq!(h.generalize("/docs#intro"), "/docs");
}

#[test]
fn test_generalize_keeps_slashes() {
    let h = classifier();
    assert_eq!(h.generalize(""), "");
    assert_eq!(h.generalize("/"), "/");
    assert_eq!(h.generalize("/users/"), "/users/");
    assert_eq!(h.generalize("relative/42"), "relative/*");
}

#[test]
fn test_generalize_collapses_long_paths() {
    let h = classifier();
    assert_eq!(
        h.generalize("/a/b/c/d/e/f/g/h/i/j/k/l"),
        "/a/b/c/d/e/f/g/h/i/j/*"
    );
    assert_eq!(h.generalize("/a/b/c/d/e/f/g/h/i/j"), "/a/b/c/d/e/f/g/h/i/j");
}

#[test]
fn test_custom_wildcard() {
    let h = HeuristicClassifier::new("{id}", 8);
    assert_eq!(h.wildcard(), "{id}");
    assert_eq!(h.generalize("/orders/981"), "/orders/{id}");
}

// ============================================================================
// Memo
// ============================================================================

#[test]
fn test_repeated_path_hits_memo() {
    let h = classifier();
    let first = h.classify("/customer/1/job/2");
    let second = h.classify("/customer/1/job/2");

    assert_eq!(&*first, "/customer/*/job/*");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(h.stats().lookups.load(Ordering::Relaxed), 2);
    assert_eq!(h.stats().path_hits.load(Ordering::Relaxed), 1);
    assert_eq!(h.len(), 1);
}

#[test]
fn test_same_shape_shares_label() {
    let h = classifier();
    let a = h.classify("/customer/1/job/2");
    let b = h.classify("/customer/lfdsjd/job/erwejre");

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(h.len(), 2);
    assert_eq!(h.shape_count(), 1);
    assert_eq!(h.stats().shapes.load(Ordering::Relaxed), 1);
    assert_eq!(h.stats().shape_hits.load(Ordering::Relaxed), 1);
}

#[test]
fn test_query_variants_share_memo_entry() {
    let h = classifier();
    h.classify("/users/1?a=1");
    h.classify("/users/1?a=2");
    assert_eq!(h.len(), 1);
    assert_eq!(h.stats().path_hits.load(Ordering::Relaxed), 1);
}

#[test]
fn test_hash_collision_is_a_miss() {
    let h = classifier();
    let colliding = xxh3_64(b"/orders/7");
    h.paths
        .lock()
        .put(colliding, (Box::from("/customer/1"), Arc::from("/customer/*")));

    assert_eq!(&*h.classify("/orders/7"), "/orders/*");
    assert_eq!(h.stats().path_hits.load(Ordering::Relaxed), 0);
    assert_eq!(&*h.classify("/orders/7"), "/orders/*");
    assert_eq!(h.stats().path_hits.load(Ordering::Relaxed), 1);
}

#[test]
fn test_eviction_keeps_labels_stable() {
    let h = HeuristicClassifier::new("*", 1);
    let before = h.classify("/customer/1");
    h.classify("/orders/2");
    assert_eq!(h.len(), 1);

    let after = h.classify("/customer/1");
    assert_eq!(before, after);
    assert_eq!(h.stats().path_hits.load(Ordering::Relaxed), 0);
}

#[test]
fn test_zero_capacity_is_unbounded() {
    let h = HeuristicClassifier::new("*", 0);
    assert_eq!(h.capacity(), 0);
    for i in 0..100 {
        h.classify(&format!("/item{i}x/{i}"));
    }
    assert_eq!(h.len(), 100);
}

#[test]
fn test_hit_rate() {
    let h = classifier();
    assert_eq!(h.stats().hit_rate(), 0.0);
    h.classify("/a/1");
    h.classify("/a/1");
    assert!((h.stats().hit_rate() - 0.5).abs() < f64::EPSILON);
}
