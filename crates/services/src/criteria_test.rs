//! Tests for selection rules and criteria sets

use super::*;

fn glob(pattern: &str) -> GlobAttr {
    GlobAttr::new(pattern).unwrap()
}

fn ports(text: &str) -> PortEnum {
    text.parse().unwrap()
}

#[derive(Debug, Deserialize)]
struct Doc {
    #[serde(default)]
    services: DefinitionCriteria,
}

fn parse(toml_text: &str) -> std::result::Result<DefinitionCriteria, toml::de::Error> {
    toml::from_str::<Doc>(toml_text).map(|d| d.services)
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_empty_criteria_is_valid() {
    assert!(DefinitionCriteria::default().validate().is_ok());
}

#[test]
fn test_rule_without_criteria_is_rejected_with_index() {
    let criteria = DefinitionCriteria::new(vec![
        Attributes::default().with_exe_path(glob("*java*")),
        Attributes::default().with_name("nothing"),
    ]);
    let err = criteria.validate().unwrap_err();
    assert!(matches!(err, CriteriaError::NoSelectionCriteria { index: 1 }));
}

#[test]
fn test_each_criterion_kind_counts() {
    let rules = [
        Attributes::default().with_open_ports(ports("80")),
        Attributes::default().with_exe_path(glob("*")),
        Attributes::default().with_metadata(MetadataKey::PodName, glob("web-*")),
        Attributes::default().with_pod_label("app", glob("web")),
        Attributes::default().with_pod_annotation("team", glob("core")),
        Attributes::default().with_metadata(MetadataKey::Namespace, GlobAttr::unset()),
    ];
    for rule in rules {
        assert!(rule.has_criteria(), "{rule:?}");
    }
    assert!(!Attributes::default().with_exe_path(GlobAttr::unset()).has_criteria());
}

// ============================================================================
// Deserialization
// ============================================================================

#[test]
fn test_deserialize_full_rule() {
    let criteria = parse(
        r#"
        [[services]]
        name = "checkout"
        namespace = "shop"
        open_ports = "8080,9000-9100"
        exe_path = "*java*"
        k8s_namespace = "prod*"
        k8s_owner_name = "checkout"
        k8s_pod_labels = { app = "checkout*" }
        k8s_pod_annotations = { "vigil.io/instrument" = "true" }
        "#,
    )
    .unwrap();

    assert_eq!(criteria.len(), 1);
    let rule = &criteria.rules()[0];
    assert_eq!(rule.name, "checkout");
    assert_eq!(rule.namespace, "shop");
    assert_eq!(rule.open_ports.len(), 2);
    assert_eq!(rule.exe_path.pattern(), "*java*");
    assert_eq!(
        rule.metadata.get(MetadataKey::Namespace).map(GlobAttr::pattern),
        Some("prod*")
    );
    assert!(rule.metadata.get(MetadataKey::PodName).is_none());
    assert_eq!(rule.pod_labels["app"].pattern(), "checkout*");
    assert_eq!(rule.pod_annotations["vigil.io/instrument"].pattern(), "true");
    assert!(criteria.validate().is_ok());
}

#[test]
fn test_deserialize_unknown_metadata_key_names_rule_and_key() {
    let err = parse(
        r#"
        [[services]]
        exe_path = "*a*"

        [[services]]
        k8s_foo = "bar"
        "#,
    )
    .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("rule 1"), "{msg}");
    assert!(msg.contains("k8s_foo"), "{msg}");
}

#[test]
fn test_deserialize_bad_port_names_rule() {
    let err = parse(
        r#"
        [[services]]
        open_ports = "80-"
        "#,
    )
    .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("rule 0"), "{msg}");
    assert!(msg.contains("\"80-\""), "{msg}");
}

#[test]
fn test_deserialize_empty_metadata_value_is_present_but_unset() {
    let criteria = parse(
        r#"
        [[services]]
        k8s_deployment_name = ""
        "#,
    )
    .unwrap();
    let rule = &criteria.rules()[0];
    let entry = rule.metadata.get(MetadataKey::DeploymentName).unwrap();
    assert!(!entry.is_set());
    assert!(criteria.validate().is_ok());
    assert!(rule.matches(&CandidateAttrs::new("/bin/app")));
}

// ============================================================================
// Matching
// ============================================================================

#[test]
fn test_first_matching_rule_wins() {
    let criteria = DefinitionCriteria::new(vec![
        Attributes::default()
            .with_name("first")
            .with_exe_path(glob("*server*")),
        Attributes::default()
            .with_name("second")
            .with_exe_path(glob("*")),
    ]);

    let server = CandidateAttrs::new("/opt/app/server");
    let other = CandidateAttrs::new("/usr/bin/worker");
    assert_eq!(criteria.matches(&server).unwrap().name, "first");
    assert_eq!(criteria.matches(&other).unwrap().name, "second");
}

#[test]
fn test_no_match_returns_none() {
    let criteria = DefinitionCriteria::new(vec![
        Attributes::default().with_exe_path(glob("*nginx*")),
    ]);
    assert!(criteria.matches(&CandidateAttrs::new("/usr/bin/redis")).is_none());
    assert!(DefinitionCriteria::default()
        .matches(&CandidateAttrs::new("/usr/bin/redis"))
        .is_none());
}

#[test]
fn test_ports_and_path_must_both_hold() {
    let rule = Attributes::default()
        .with_open_ports(ports("8000-8999"))
        .with_exe_path(glob("*python*"));

    let both = CandidateAttrs::new("/usr/bin/python3").with_ports(vec![22, 8080]);
    let wrong_port = CandidateAttrs::new("/usr/bin/python3").with_ports(vec![80]);
    let wrong_path = CandidateAttrs::new("/usr/bin/ruby").with_ports(vec![8080]);
    let no_ports = CandidateAttrs::new("/usr/bin/python3");

    assert!(rule.matches(&both));
    assert!(!rule.matches(&wrong_port));
    assert!(!rule.matches(&wrong_path));
    assert!(!rule.matches(&no_ports));
}

#[test]
fn test_metadata_absence_is_non_match() {
    let rule = Attributes::default().with_metadata(MetadataKey::Namespace, glob("prod*"));

    let present = CandidateAttrs::new("/app").with_metadata(MetadataKey::Namespace, "production");
    let other = CandidateAttrs::new("/app").with_metadata(MetadataKey::Namespace, "staging");
    let absent = CandidateAttrs::new("/app");

    assert!(rule.matches(&present));
    assert!(!rule.matches(&other));
    assert!(!rule.matches(&absent));
}

#[test]
fn test_owner_name_falls_back_to_owner_kinds() {
    let rule = Attributes::default().with_metadata(MetadataKey::OwnerName, glob("checkout"));

    let explicit = CandidateAttrs::new("/app").with_metadata(MetadataKey::OwnerName, "checkout");
    let deployment =
        CandidateAttrs::new("/app").with_metadata(MetadataKey::DeploymentName, "checkout");
    let statefulset =
        CandidateAttrs::new("/app").with_metadata(MetadataKey::StatefulSetName, "checkout");
    let job = CandidateAttrs::new("/app").with_metadata(MetadataKey::JobName, "checkout");
    let explicit_other = CandidateAttrs::new("/app")
        .with_metadata(MetadataKey::OwnerName, "cart")
        .with_metadata(MetadataKey::DeploymentName, "checkout");

    assert!(rule.matches(&explicit));
    assert!(rule.matches(&deployment));
    assert!(rule.matches(&statefulset));
    assert!(!rule.matches(&job));
    assert!(!rule.matches(&explicit_other));
}

#[test]
fn test_pod_labels_and_annotations() {
    let rule = Attributes::default()
        .with_pod_label("app", glob("web*"))
        .with_pod_annotation("team", glob("core"));

    let ok = CandidateAttrs::new("/app")
        .with_pod_label("app", "webshop")
        .with_pod_annotation("team", "core");
    let missing_annotation = CandidateAttrs::new("/app").with_pod_label("app", "webshop");

    assert!(rule.matches(&ok));
    assert!(!rule.matches(&missing_annotation));
}

#[test]
fn test_process_info_is_a_candidate() {
    let criteria = DefinitionCriteria::new(vec![
        Attributes::default()
            .with_name("api")
            .with_open_ports(ports("443")),
    ]);
    let info = ProcessInfo::new(42, 1, "/srv/api").with_ports(vec![443]);
    assert_eq!(criteria.matches(&info).unwrap().name, "api");

    let attrs = CandidateAttrs::from(&info);
    assert_eq!(attrs.open_ports, vec![443]);
    assert!(attrs.metadata(MetadataKey::PodName).is_none());
}

#[test]
fn test_port_of_interest() {
    let criteria = DefinitionCriteria::new(vec![
        Attributes::default().with_exe_path(glob("*a*")),
        Attributes::default().with_open_ports(ports("80,8000-8100")),
    ]);
    assert!(criteria.port_of_interest(80));
    assert!(criteria.port_of_interest(8050));
    assert!(!criteria.port_of_interest(443));
    assert!(!DefinitionCriteria::default().port_of_interest(80));
}

#[test]
fn test_metadata_key_names() {
    let names: Vec<_> = MetadataKey::ALL.iter().map(MetadataKey::as_str).collect();
    assert_eq!(names.len(), 9);
    assert!(names.iter().all(|n| n.starts_with("k8s_")));
    assert_eq!(MetadataKey::ReplicaSetName.to_string(), "k8s_replicaset_name");
}
