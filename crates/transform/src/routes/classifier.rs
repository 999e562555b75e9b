//! Route assignment for a single span

use std::borrow::Cow;

use vigil_config::{RoutesConfig, UnmatchPolicy};
use vigil_protocol::Span;

use super::heuristic::HeuristicClassifier;
use super::matcher::RouteMatcher;

#[cfg(test)]
#[path = "classifier_test.rs"]
mod tests;

/// Route assigned by the `wildcard` unmatch policy
pub const WILDCARD_ROUTE: &str = "/**";

/// How a span's route was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// The span already carried a route
    Preassigned,
    /// A template matched
    Matched,
    /// No template matched; the unmatch policy decided
    Unmatched(UnmatchPolicy),
}

/// Templates plus the policy for paths no template matches
#[derive(Debug)]
pub struct RouteClassifier {
    matcher: RouteMatcher,
    policy: UnmatchPolicy,
    heuristic: Option<HeuristicClassifier>,
}

impl RouteClassifier {
    pub fn new(config: &RoutesConfig) -> Self {
        let policy = config.unmatch_policy();
        let heuristic = (policy == UnmatchPolicy::Heuristic).then(|| {
            HeuristicClassifier::new(config.wildcard_char.as_str(), config.heuristic_cache_size)
        });
        Self {
            matcher: RouteMatcher::new(&config.patterns),
            policy,
            heuristic,
        }
    }

    pub fn policy(&self) -> UnmatchPolicy {
        self.policy
    }

    pub fn matcher(&self) -> &RouteMatcher {
        &self.matcher
    }

    /// The heuristic memo, present only under the `heuristic` policy
    pub fn heuristic(&self) -> Option<&HeuristicClassifier> {
        self.heuristic.as_ref()
    }

    /// Assign a route to the span unless it already has one
    pub fn classify(&self, span: &mut Span) -> Classification {
        if span.has_route() {
            return Classification::Preassigned;
        }
        let (route, classification) = self.resolve(&span.path);
        span.route = route.into_owned();
        classification
    }

    /// Route a bare path would receive
    pub fn route_for(&self, path: &str) -> String {
        self.resolve(path).0.into_owned()
    }

    fn resolve<'a>(&'a self, path: &'a str) -> (Cow<'a, str>, Classification) {
        if let Some(template) = self.matcher.find(path) {
            return (Cow::Borrowed(template), Classification::Matched);
        }

        let route = match (self.policy, &self.heuristic) {
            (UnmatchPolicy::Unset, _) => Cow::Borrowed(""),
            (UnmatchPolicy::Wildcard, _) => Cow::Borrowed(WILDCARD_ROUTE),
            (UnmatchPolicy::Literal, _) => Cow::Borrowed(path),
            (UnmatchPolicy::Heuristic, Some(heuristic)) => {
                Cow::Owned(heuristic.classify(path).to_string())
            }
            (UnmatchPolicy::Heuristic, None) => Cow::Borrowed(""),
        };
        (route, Classification::Unmatched(self.policy))
    }
}
