//! Tests for composite eligibility

use super::*;
use crate::{CandidateAttrs, PortEnum};

fn rule(name: &str, exe: &str) -> Attributes {
    Attributes::default()
        .with_name(name)
        .with_exe_path(GlobAttr::new(exe).unwrap())
}

fn selector(services: Vec<Attributes>, exclude: Vec<Attributes>) -> ServiceSelector {
    ServiceSelector::new(
        services.into(),
        exclude.into(),
        default_exclude_services().unwrap(),
    )
}

#[test]
fn test_included_and_not_excluded_is_selected() {
    let sel = selector(vec![rule("api", "*api*")], vec![]);
    let got = sel.select(&CandidateAttrs::new("/srv/api")).unwrap();
    assert_eq!(got.name, "api");
    assert_eq!(got.namespace, "");
}

#[test]
fn test_not_included_is_rejected() {
    let sel = selector(vec![rule("api", "*api*")], vec![]);
    assert!(sel.select(&CandidateAttrs::new("/srv/worker")).is_none());
}

#[test]
fn test_exclude_wins_over_include() {
    let sel = selector(vec![rule("all", "*")], vec![rule("", "*sidecar*")]);
    assert!(sel.select(&CandidateAttrs::new("/srv/app")).is_some());
    assert!(sel.select(&CandidateAttrs::new("/srv/envoy-sidecar")).is_none());
}

#[test]
fn test_default_exclude_skips_self_and_collectors() {
    let sel = selector(vec![rule("all", "*")], vec![]);
    for exe in ["/usr/local/bin/vigil", "/usr/bin/alloy", "/opt/otelcol-contrib"] {
        assert!(sel.select(&CandidateAttrs::new(exe)).is_none(), "{exe}");
        assert!(sel.is_excluded(&CandidateAttrs::new(exe)));
    }
}

#[test]
fn test_empty_default_exclude_allows_self_instrumentation() {
    let sel = ServiceSelector::new(
        vec![rule("all", "*")].into(),
        DefinitionCriteria::default(),
        DefinitionCriteria::default(),
    );
    assert!(sel.select(&CandidateAttrs::new("/usr/local/bin/vigil")).is_some());
}

#[test]
fn test_system_wide_includes_everything_but_excludes() {
    let sel = selector(vec![], vec![rule("", "*ssh*")]).with_system_wide(true);
    assert!(sel.is_system_wide());

    let got = sel.select(&CandidateAttrs::new("/usr/bin/anything")).unwrap();
    assert_eq!(got.name, "");
    assert!(sel.select(&CandidateAttrs::new("/usr/sbin/sshd")).is_none());
    assert!(sel.select(&CandidateAttrs::new("/usr/bin/vigil")).is_none());
}

#[test]
fn test_port_of_interest_uses_include_set() {
    let ports: PortEnum = "8080".parse().unwrap();
    let sel = ServiceSelector::new(
        vec![Attributes::default().with_open_ports(ports)].into(),
        vec![Attributes::default().with_open_ports("22".parse().unwrap())].into(),
        DefinitionCriteria::default(),
    );
    assert!(sel.port_of_interest(8080));
    assert!(!sel.port_of_interest(22));
    assert!(sel.clone().with_system_wide(true).port_of_interest(22));
}

#[test]
fn test_default_exclude_pattern() {
    let set = default_exclude_services().unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.rules()[0].exe_path.pattern(), DEFAULT_EXCLUDE_EXE_PATH);
    assert!(set.validate().is_ok());
}
