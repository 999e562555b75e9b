//! Composite eligibility
//!
//! A candidate is selected when it is included (by `services`, or by
//! system-wide mode) and matched by neither the user excludes nor the
//! default excludes.

use crate::criteria::{Attributes, Candidate, DefinitionCriteria};
use crate::error::Result;
use crate::glob::GlobAttr;

/// Executables excluded unless the operator overrides the default set
pub const DEFAULT_EXCLUDE_EXE_PATH: &str = "{*vigil,*alloy,*otelcol*}";

/// Built-in exclusion set, keeping the agent and known collectors from
/// instrumenting themselves
pub fn default_exclude_services() -> Result<DefinitionCriteria> {
    let rule = Attributes::default().with_exe_path(GlobAttr::new(DEFAULT_EXCLUDE_EXE_PATH)?);
    Ok(DefinitionCriteria::new(vec![rule]))
}

/// Service identity assigned to a selected candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    /// Name from the matching rule (empty if the rule set none)
    pub name: &'a str,
    /// Namespace from the matching rule
    pub namespace: &'a str,
}

/// Include / exclude / default-exclude evaluator
#[derive(Debug, Clone, Default)]
pub struct ServiceSelector {
    services: DefinitionCriteria,
    exclude: DefinitionCriteria,
    default_exclude: DefinitionCriteria,
    system_wide: bool,
}

impl ServiceSelector {
    pub fn new(
        services: DefinitionCriteria,
        exclude: DefinitionCriteria,
        default_exclude: DefinitionCriteria,
    ) -> Self {
        Self {
            services,
            exclude,
            default_exclude,
            system_wide: false,
        }
    }

    /// Include every candidate not excluded
    pub fn with_system_wide(mut self, system_wide: bool) -> Self {
        self.system_wide = system_wide;
        self
    }

    pub fn services(&self) -> &DefinitionCriteria {
        &self.services
    }

    pub fn is_system_wide(&self) -> bool {
        self.system_wide
    }

    /// Whether an exclusion rule matches the candidate
    pub fn is_excluded<C: Candidate + ?Sized>(&self, candidate: &C) -> bool {
        self.exclude.matches(candidate).is_some()
            || self.default_exclude.matches(candidate).is_some()
    }

    /// Selection for the candidate, or `None` if it is not eligible
    pub fn select<C: Candidate + ?Sized>(&self, candidate: &C) -> Option<Selection<'_>> {
        let selection = if self.system_wide {
            Selection {
                name: "",
                namespace: "",
            }
        } else {
            let rule = self.services.matches(candidate)?;
            Selection {
                name: &rule.name,
                namespace: &rule.namespace,
            }
        };
        if self.is_excluded(candidate) {
            return None;
        }
        Some(selection)
    }

    /// True iff the include set is interested in the port
    pub fn port_of_interest(&self, port: u16) -> bool {
        self.system_wide || self.services.port_of_interest(port)
    }
}

#[cfg(test)]
#[path = "selector_test.rs"]
mod tests;
