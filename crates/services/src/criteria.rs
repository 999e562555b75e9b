//! Selection rules and criteria sets
//!
//! # Matching
//!
//! ```text
//! DefinitionCriteria [rule0, rule1, ...]
//!        │ first rule where every set criterion holds
//!        ▼
//!   open_ports ── any candidate port in the enumeration (or no ports set)
//!   exe_path   ── glob matches the executable path (or unset)
//!   k8s_*      ── candidate has the field and the glob matches (or unset)
//!   labels     ── same, per label / annotation key
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use vigil_protocol::ProcessInfo;

use crate::error::{CriteriaError, Result};
use crate::glob::GlobAttr;
use crate::ports::PortEnum;

/// Allowed Kubernetes metadata keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataKey {
    Namespace,
    PodName,
    DeploymentName,
    ReplicaSetName,
    DaemonSetName,
    StatefulSetName,
    JobName,
    CronJobName,
    OwnerName,
}

impl MetadataKey {
    /// Every allowed key, in declaration order
    pub const ALL: [MetadataKey; 9] = [
        Self::Namespace,
        Self::PodName,
        Self::DeploymentName,
        Self::ReplicaSetName,
        Self::DaemonSetName,
        Self::StatefulSetName,
        Self::JobName,
        Self::CronJobName,
        Self::OwnerName,
    ];

    /// Keys consulted for `k8s_owner_name` when no explicit owner is known
    pub const OWNER_FALLBACKS: [MetadataKey; 4] = [
        Self::DeploymentName,
        Self::ReplicaSetName,
        Self::DaemonSetName,
        Self::StatefulSetName,
    ];

    /// Configuration key
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Namespace => "k8s_namespace",
            Self::PodName => "k8s_pod_name",
            Self::DeploymentName => "k8s_deployment_name",
            Self::ReplicaSetName => "k8s_replicaset_name",
            Self::DaemonSetName => "k8s_daemonset_name",
            Self::StatefulSetName => "k8s_statefulset_name",
            Self::JobName => "k8s_job_name",
            Self::CronJobName => "k8s_cronjob_name",
            Self::OwnerName => "k8s_owner_name",
        }
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kubernetes metadata criteria of a rule
///
/// `Some(unset glob)` is an entry written as an empty string: it counts as
/// a criterion but matches any value, including absence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct K8sMetadata {
    pub namespace: Option<GlobAttr>,
    pub pod_name: Option<GlobAttr>,
    pub deployment_name: Option<GlobAttr>,
    pub replicaset_name: Option<GlobAttr>,
    pub daemonset_name: Option<GlobAttr>,
    pub statefulset_name: Option<GlobAttr>,
    pub job_name: Option<GlobAttr>,
    pub cronjob_name: Option<GlobAttr>,
    pub owner_name: Option<GlobAttr>,
}

impl K8sMetadata {
    fn slot(&self, key: MetadataKey) -> &Option<GlobAttr> {
        match key {
            MetadataKey::Namespace => &self.namespace,
            MetadataKey::PodName => &self.pod_name,
            MetadataKey::DeploymentName => &self.deployment_name,
            MetadataKey::ReplicaSetName => &self.replicaset_name,
            MetadataKey::DaemonSetName => &self.daemonset_name,
            MetadataKey::StatefulSetName => &self.statefulset_name,
            MetadataKey::JobName => &self.job_name,
            MetadataKey::CronJobName => &self.cronjob_name,
            MetadataKey::OwnerName => &self.owner_name,
        }
    }

    fn slot_mut(&mut self, key: MetadataKey) -> &mut Option<GlobAttr> {
        match key {
            MetadataKey::Namespace => &mut self.namespace,
            MetadataKey::PodName => &mut self.pod_name,
            MetadataKey::DeploymentName => &mut self.deployment_name,
            MetadataKey::ReplicaSetName => &mut self.replicaset_name,
            MetadataKey::DaemonSetName => &mut self.daemonset_name,
            MetadataKey::StatefulSetName => &mut self.statefulset_name,
            MetadataKey::JobName => &mut self.job_name,
            MetadataKey::CronJobName => &mut self.cronjob_name,
            MetadataKey::OwnerName => &mut self.owner_name,
        }
    }

    /// Pattern declared for a key
    pub fn get(&self, key: MetadataKey) -> Option<&GlobAttr> {
        self.slot(key).as_ref()
    }

    /// Declare a pattern for a key
    pub fn set(&mut self, key: MetadataKey, glob: GlobAttr) {
        *self.slot_mut(key) = Some(glob);
    }

    /// Declared entries
    pub fn entries(&self) -> impl Iterator<Item = (MetadataKey, &GlobAttr)> {
        MetadataKey::ALL
            .into_iter()
            .filter_map(|key| self.get(key).map(|glob| (key, glob)))
    }

    /// True if no entry is declared
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

/// Read-only view of whatever is being matched: a process or a request
pub trait Candidate {
    /// Full executable path
    fn exe_path(&self) -> &str;

    /// Ports the candidate listens on (or the single port of a request)
    fn open_ports(&self) -> &[u16];

    /// Kubernetes metadata value, if known
    fn metadata(&self, _key: MetadataKey) -> Option<&str> {
        None
    }

    /// Pod label value, if known
    fn pod_label(&self, _key: &str) -> Option<&str> {
        None
    }

    /// Pod annotation value, if known
    fn pod_annotation(&self, _key: &str) -> Option<&str> {
        None
    }
}

impl Candidate for ProcessInfo {
    fn exe_path(&self) -> &str {
        &self.exe_path
    }

    fn open_ports(&self) -> &[u16] {
        &self.open_ports
    }
}

/// Plain candidate carrying every matchable field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateAttrs {
    pub exe_path: String,
    pub open_ports: Vec<u16>,
    pub metadata: BTreeMap<MetadataKey, String>,
    pub pod_labels: BTreeMap<String, String>,
    pub pod_annotations: BTreeMap<String, String>,
}

impl CandidateAttrs {
    pub fn new(exe_path: impl Into<String>) -> Self {
        Self {
            exe_path: exe_path.into(),
            ..Default::default()
        }
    }

    pub fn with_ports(mut self, ports: Vec<u16>) -> Self {
        self.open_ports = ports;
        self
    }

    pub fn with_metadata(mut self, key: MetadataKey, value: impl Into<String>) -> Self {
        self.metadata.insert(key, value.into());
        self
    }

    pub fn with_pod_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pod_labels.insert(key.into(), value.into());
        self
    }

    pub fn with_pod_annotation(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.pod_annotations.insert(key.into(), value.into());
        self
    }
}

impl From<&ProcessInfo> for CandidateAttrs {
    fn from(info: &ProcessInfo) -> Self {
        Self::new(info.exe_path.clone()).with_ports(info.open_ports.clone())
    }
}

impl Candidate for CandidateAttrs {
    fn exe_path(&self) -> &str {
        &self.exe_path
    }

    fn open_ports(&self) -> &[u16] {
        &self.open_ports
    }

    fn metadata(&self, key: MetadataKey) -> Option<&str> {
        self.metadata.get(&key).map(String::as_str)
    }

    fn pod_label(&self, key: &str) -> Option<&str> {
        self.pod_labels.get(key).map(String::as_str)
    }

    fn pod_annotation(&self, key: &str) -> Option<&str> {
        self.pod_annotations.get(key).map(String::as_str)
    }
}

/// One selection rule
///
/// If several criteria are set the candidate must fulfill all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "AttributesDef")]
pub struct Attributes {
    /// Service name assigned on match; empty means "use the executable name"
    pub name: String,
    /// Service namespace assigned on match
    pub namespace: String,
    pub open_ports: PortEnum,
    pub exe_path: GlobAttr,
    pub metadata: K8sMetadata,
    pub pod_labels: BTreeMap<String, GlobAttr>,
    pub pod_annotations: BTreeMap<String, GlobAttr>,
}

impl Attributes {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_open_ports(mut self, ports: PortEnum) -> Self {
        self.open_ports = ports;
        self
    }

    pub fn with_exe_path(mut self, glob: GlobAttr) -> Self {
        self.exe_path = glob;
        self
    }

    pub fn with_metadata(mut self, key: MetadataKey, glob: GlobAttr) -> Self {
        self.metadata.set(key, glob);
        self
    }

    pub fn with_pod_label(mut self, key: impl Into<String>, glob: GlobAttr) -> Self {
        self.pod_labels.insert(key.into(), glob);
        self
    }

    pub fn with_pod_annotation(mut self, key: impl Into<String>, glob: GlobAttr) -> Self {
        self.pod_annotations.insert(key.into(), glob);
        self
    }

    /// Whether the rule carries at least one discriminating criterion
    pub fn has_criteria(&self) -> bool {
        !self.open_ports.is_empty()
            || self.exe_path.is_set()
            || !self.metadata.is_empty()
            || !self.pod_labels.is_empty()
            || !self.pod_annotations.is_empty()
    }

    /// Whether every criterion of this rule holds for the candidate
    pub fn matches<C: Candidate + ?Sized>(&self, candidate: &C) -> bool {
        if !self.open_ports.is_empty() && !self.open_ports.matches_any(candidate.open_ports()) {
            return false;
        }
        if !self.exe_path.matches(candidate.exe_path()) {
            return false;
        }
        let metadata_ok = self
            .metadata
            .entries()
            .all(|(key, glob)| metadata_matches(key, glob, candidate));
        metadata_ok
            && self
                .pod_labels
                .iter()
                .all(|(k, glob)| optional_matches(glob, candidate.pod_label(k)))
            && self
                .pod_annotations
                .iter()
                .all(|(k, glob)| optional_matches(glob, candidate.pod_annotation(k)))
    }
}

fn optional_matches(glob: &GlobAttr, value: Option<&str>) -> bool {
    if !glob.is_set() {
        return true;
    }
    value.is_some_and(|v| glob.matches(v))
}

fn metadata_matches<C: Candidate + ?Sized>(key: MetadataKey, glob: &GlobAttr, c: &C) -> bool {
    if !glob.is_set() {
        return true;
    }
    match (key, c.metadata(key)) {
        (_, Some(value)) => glob.matches(value),
        (MetadataKey::OwnerName, None) => MetadataKey::OWNER_FALLBACKS
            .iter()
            .any(|k| c.metadata(*k).is_some_and(|v| glob.matches(v))),
        (_, None) => false,
    }
}

/// On-disk shape of a rule. Metadata keys are explicit so that unknown
/// keys are rejected.
#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct AttributesDef {
    name: String,
    namespace: String,
    open_ports: PortEnum,
    exe_path: GlobAttr,
    k8s_namespace: Option<GlobAttr>,
    k8s_pod_name: Option<GlobAttr>,
    k8s_deployment_name: Option<GlobAttr>,
    k8s_replicaset_name: Option<GlobAttr>,
    k8s_daemonset_name: Option<GlobAttr>,
    k8s_statefulset_name: Option<GlobAttr>,
    k8s_job_name: Option<GlobAttr>,
    k8s_cronjob_name: Option<GlobAttr>,
    k8s_owner_name: Option<GlobAttr>,
    k8s_pod_labels: BTreeMap<String, GlobAttr>,
    k8s_pod_annotations: BTreeMap<String, GlobAttr>,
}

impl From<AttributesDef> for Attributes {
    fn from(def: AttributesDef) -> Self {
        Self {
            name: def.name,
            namespace: def.namespace,
            open_ports: def.open_ports,
            exe_path: def.exe_path,
            metadata: K8sMetadata {
                namespace: def.k8s_namespace,
                pod_name: def.k8s_pod_name,
                deployment_name: def.k8s_deployment_name,
                replicaset_name: def.k8s_replicaset_name,
                daemonset_name: def.k8s_daemonset_name,
                statefulset_name: def.k8s_statefulset_name,
                job_name: def.k8s_job_name,
                cronjob_name: def.k8s_cronjob_name,
                owner_name: def.k8s_owner_name,
            },
            pod_labels: def.k8s_pod_labels,
            pod_annotations: def.k8s_pod_annotations,
        }
    }
}

/// Ordered list of rules; earlier rules take precedence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionCriteria(Vec<Attributes>);

impl DefinitionCriteria {
    pub fn new(rules: Vec<Attributes>) -> Self {
        Self(rules)
    }

    pub fn push(&mut self, rule: Attributes) {
        self.0.push(rule);
    }

    pub fn rules(&self) -> &[Attributes] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attributes> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fails on the first rule without a discriminating criterion.
    /// An empty set is valid.
    pub fn validate(&self) -> Result<()> {
        match self.0.iter().position(|rule| !rule.has_criteria()) {
            Some(index) => Err(CriteriaError::no_selection_criteria(index)),
            None => Ok(()),
        }
    }

    /// True iff any rule's port enumeration contains the port
    pub fn port_of_interest(&self, port: u16) -> bool {
        self.0.iter().any(|rule| rule.open_ports.matches(port))
    }

    /// First rule matching the candidate
    pub fn matches<C: Candidate + ?Sized>(&self, candidate: &C) -> Option<&Attributes> {
        self.0.iter().find(|rule| rule.matches(candidate))
    }
}

impl From<Vec<Attributes>> for DefinitionCriteria {
    fn from(rules: Vec<Attributes>) -> Self {
        Self(rules)
    }
}

impl FromIterator<Attributes> for DefinitionCriteria {
    fn from_iter<I: IntoIterator<Item = Attributes>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DefinitionCriteria {
    type Item = &'a Attributes;
    type IntoIter = std::slice::Iter<'a, Attributes>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for DefinitionCriteria {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct CriteriaVisitor;

        impl<'de> Visitor<'de> for CriteriaVisitor {
            type Value = DefinitionCriteria;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list of service selection rules")
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<DefinitionCriteria, A::Error> {
                let mut rules = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                loop {
                    let index = rules.len();
                    match seq.next_element::<Attributes>() {
                        Ok(Some(rule)) => rules.push(rule),
                        Ok(None) => break,
                        Err(e) => {
                            return Err(de::Error::custom(CriteriaError::invalid_rule(index, e)));
                        }
                    }
                }
                Ok(DefinitionCriteria(rules))
            }
        }

        deserializer.deserialize_seq(CriteriaVisitor)
    }
}

#[cfg(test)]
#[path = "criteria_test.rs"]
mod tests;
