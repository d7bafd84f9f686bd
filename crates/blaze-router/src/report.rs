//! Navigation outcomes

use blaze_net::NetError;
use serde::Serialize;

/// Why a load did not produce content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadFailure {
    #[error("Route `{route}` is not in the route table")]
    InvalidRoute { route: String },

    #[error("No response within {ms} ms")]
    Timeout { ms: u64 },

    #[error("{message}")]
    NetworkOrStatus { status: Option<u16>, message: String },
}

impl LoadFailure {
    pub fn status(status: u16) -> Self {
        LoadFailure::NetworkOrStatus {
            status: Some(status),
            message: format!("HTTP error! status: {status}"),
        }
    }
}

impl From<NetError> for LoadFailure {
    fn from(err: NetError) -> Self {
        match err {
            NetError::Timeout { ms } => LoadFailure::Timeout { ms },
            NetError::HttpError { status } => LoadFailure::status(status),
            other => LoadFailure::NetworkOrStatus {
                status: None,
                message: other.to_string(),
            },
        }
    }
}

/// Guard outcomes that turn a request into a no-op
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Suppressed {
    /// Route is already current and the request was not forced
    Duplicate,
    /// Another navigation is in flight
    InFlight,
}

/// What happens after a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Next {
    /// Load the same route again (still under its ceiling)
    Retry,
    /// Hash set to a fallback route
    Redirect(String),
    /// No usable fallback remains
    Abandon,
}

/// One step of a navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Suppressed {
        route: String,
        reason: Suppressed,
    },
    Loaded {
        route: String,
        attempt: u32,
        bytes: usize,
    },
    Failed {
        route: String,
        attempt: Option<u32>,
        failure: LoadFailure,
        next: Next,
    },
    /// Route is at its attempt ceiling, nothing was fetched
    Exhausted {
        route: String,
        attempts: u32,
        next: Next,
    },
    /// Result arrived for a ticket that is no longer current
    Stale {
        route: String,
        attempt: u32,
    },
    /// Redirect chain cut short
    RedirectLimit {
        hops: u32,
    },
}

impl Step {
    pub fn route(&self) -> Option<&str> {
        match self {
            Step::Suppressed { route, .. }
            | Step::Loaded { route, .. }
            | Step::Failed { route, .. }
            | Step::Exhausted { route, .. }
            | Step::Stale { route, .. } => Some(route),
            Step::RedirectLimit { .. } => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Step::Loaded { .. })
    }

    /// Fallback target, if this step redirected
    pub fn redirect(&self) -> Option<&str> {
        match self {
            Step::Failed { next: Next::Redirect(to), .. }
            | Step::Exhausted { next: Next::Redirect(to), .. } => Some(to),
            _ => None,
        }
    }
}

/// Everything one navigation did, redirects included
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    /// Route that was asked for
    pub requested: String,
    pub steps: Vec<Step>,
    /// Current route once the navigation settled
    pub route: Option<String>,
    /// Location hash once the navigation settled
    pub hash: String,
}

impl Navigation {
    pub fn new(requested: &str) -> Self {
        Self {
            requested: requested.to_string(),
            steps: Vec::new(),
            route: None,
            hash: String::new(),
        }
    }

    /// Number of fetches that were issued
    pub fn fetches(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| match s {
                Step::Loaded { .. } | Step::Stale { .. } => true,
                Step::Failed { attempt, .. } => attempt.is_some(),
                _ => false,
            })
            .count()
    }

    pub fn loaded(&self) -> Option<&str> {
        self.steps.iter().rev().find(|s| s.is_loaded()).and_then(Step::route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_from_net_error() {
        assert_eq!(
            LoadFailure::from(NetError::Timeout { ms: 5000 }),
            LoadFailure::Timeout { ms: 5000 }
        );
        assert!(matches!(
            LoadFailure::from(NetError::Network("reset".into())),
            LoadFailure::NetworkOrStatus { status: None, .. }
        ));
    }

    #[test]
    fn test_step_serializes_tagged() {
        let step = Step::Failed {
            route: "menu".into(),
            attempt: Some(1),
            failure: LoadFailure::status(503),
            next: Next::Redirect("home".into()),
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["step"], "failed");
        assert_eq!(json["failure"]["kind"], "network_or_status");
        assert_eq!(json["next"]["redirect"], "home");
    }
}
