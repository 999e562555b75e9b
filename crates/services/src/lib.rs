//! Vigil Services - Service selection criteria
//!
//! Decides whether an observed process (or request) belongs to the set of
//! services to instrument. Criteria are declared once in configuration and
//! compiled at load time; evaluation is read-only and never fails.
//!
//! # Design
//!
//! - **Ordered rules**: a `DefinitionCriteria` is a list of `Attributes`
//!   rules; the first matching rule wins and names the service
//! - **Unset means any**: an unset `GlobAttr` matches every input, and an
//!   empty `PortEnum` matches every port
//! - **Typed metadata**: Kubernetes metadata keys are fixed fields of
//!   `K8sMetadata`, so unknown keys fail at deserialization
//! - **Composite eligibility**: `ServiceSelector` combines the include,
//!   exclude and default-exclude sets
//!
//! # Example
//!
//! ```
//! use vigil_services::{Attributes, CandidateAttrs, DefinitionCriteria, PortEnum};
//!
//! let criteria = DefinitionCriteria::new(vec![Attributes::default()
//!     .with_name("web")
//!     .with_open_ports("80,8000-8999".parse::<PortEnum>().unwrap())]);
//!
//! assert!(criteria.port_of_interest(8080));
//!
//! let candidate = CandidateAttrs::new("/usr/bin/nginx").with_ports(vec![80]);
//! assert_eq!(criteria.matches(&candidate).map(|r| r.name.as_str()), Some("web"));
//! ```

mod criteria;
mod error;
mod glob;
mod ports;
mod selector;

pub use criteria::{
    Attributes, Candidate, CandidateAttrs, DefinitionCriteria, K8sMetadata, MetadataKey,
};
pub use error::{CriteriaError, Result};
pub use glob::GlobAttr;
pub use ports::{PortEnum, PortRange};
pub use selector::{
    DEFAULT_EXCLUDE_EXE_PATH, Selection, ServiceSelector, default_exclude_services,
};
