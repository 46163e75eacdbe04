//! Eventual-consistency polling for authorization decisions.
//!
//! Policy changes take time to propagate through an authorization
//! subsystem's caches. The poller in this module repeatedly submits the
//! same subject access review until the returned decision matches the
//! expected outcome, giving up after a fixed deadline.
//!
//! Each attempt is classified as a three-way outcome (matched /
//! mismatched / endpoint absent) rather than a boolean, so "gave up
//! because the endpoint cannot be queried" is never conflated with
//! "confirmed correct".

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::{AuthError, AuthResult};

/// A resource group/type pair identifying what an access review is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupResource {
    /// API group of the resource (empty for the core group).
    pub group: String,
    /// Resource type name (e.g., "pods").
    pub resource: String,
}

impl GroupResource {
    /// Creates a new group/resource pair.
    pub fn new(group: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            resource: resource.into(),
        }
    }
}

/// A subject access review query.
///
/// Immutable once constructed; the poller reuses one instance across
/// all attempts of a single poll invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessQuery {
    /// The subject identity being checked.
    pub user: String,
    /// Namespace scope; empty for cluster-scoped checks.
    pub namespace: String,
    /// The verb being checked (e.g., "get", "list").
    pub verb: String,
    /// API group of the resource.
    pub group: String,
    /// Resource type being checked.
    pub resource: String,
    /// Specific resource name; empty means all resources of this type.
    pub name: String,
}

/// The decision returned for a single access review.
///
/// Transient: created and discarded within one poll attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDecision {
    /// Whether the subject is allowed to perform the action.
    pub allowed: bool,
    /// Optional human-readable explanation from the authorizer.
    #[serde(default)]
    pub reason: Option<String>,
}

impl ReviewDecision {
    /// Creates a decision with no reason attached.
    pub fn new(allowed: bool) -> Self {
        Self {
            allowed,
            reason: None,
        }
    }
}

/// Consumed interface that submits access reviews to the authorization
/// subsystem.
///
/// Implementations return [`AuthError::EndpointAbsent`] when the review
/// endpoint itself is not served, distinguished from other errors.
#[async_trait]
pub trait AccessReviewer: Send + Sync {
    /// Submits a single access review and returns the decision.
    async fn submit_review(&self, query: &AccessQuery) -> AuthResult<ReviewDecision>;
}

/// Timing configuration for the decision poller.
///
/// The defaults model acceptable policy-cache propagation latency. They
/// are exposed as configuration so tests can observe and tune the
/// contract instead of depending on hard-coded constants.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Fixed pause between attempts. No backoff growth.
    pub interval: Duration,
    /// Total time budget for a poll invocation.
    pub deadline: Duration,
    /// Single pause taken when the review endpoint is absent, before
    /// the poll terminates successfully.
    pub absent_pause: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            deadline: Duration::from_secs(5),
            absent_pause: Duration::from_secs(1),
        }
    }
}

impl PollConfig {
    /// Sets the pause between attempts.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the total poll deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Sets the pause taken when the review endpoint is absent.
    pub fn with_absent_pause(mut self, absent_pause: Duration) -> Self {
        self.absent_pause = absent_pause;
        self
    }
}

/// Outcome of a single poll attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    /// The decision matched the expected outcome; stop successfully.
    Matched,
    /// The decision did not match; keep polling.
    Mismatched,
    /// The review endpoint is not served; stop successfully after a
    /// single fixed pause.
    EndpointAbsent,
}

/// Polls the authorization subsystem until a decision matches an
/// expected outcome.
///
/// Attempts are strictly sequential on the calling task; the only
/// suspension points are the inter-attempt sleep and the single pause
/// on an absent endpoint. No background tasks are spawned.
///
/// # Known coverage gap
///
/// When the review endpoint is absent the poll succeeds regardless of
/// the expected value, including `expected = false`. In environments
/// without the endpoint a real authorization regression therefore goes
/// undetected. This mirrors the relaxed behavior of the environments
/// this helper was written for and is deliberate.
pub struct AuthorizationPoller<R: ?Sized> {
    reviewer: Arc<R>,
    config: PollConfig,
}

impl<R: AccessReviewer + ?Sized> AuthorizationPoller<R> {
    /// Creates a poller with the default timing configuration.
    pub fn new(reviewer: Arc<R>) -> Self {
        Self::with_config(reviewer, PollConfig::default())
    }

    /// Creates a poller with a custom timing configuration.
    pub fn with_config(reviewer: Arc<R>, config: PollConfig) -> Self {
        Self { reviewer, config }
    }

    /// Returns the timing configuration for this poller.
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Waits until the given user's permission to perform `verb` on the
    /// resource matches `allowed`, or the deadline elapses.
    pub async fn wait_for_authorization_update(
        &self,
        user: &str,
        namespace: &str,
        verb: &str,
        resource: &GroupResource,
        allowed: bool,
    ) -> AuthResult<()> {
        self.wait_for_named_authorization_update(user, namespace, verb, "", resource, allowed)
            .await
    }

    /// Waits until the given user's permission to perform `verb` on the
    /// named resource matches `allowed`, or the deadline elapses.
    ///
    /// An empty `resource_name` checks access to all resources of the
    /// type, matching the unnamed form.
    pub async fn wait_for_named_authorization_update(
        &self,
        user: &str,
        namespace: &str,
        verb: &str,
        resource_name: &str,
        resource: &GroupResource,
        allowed: bool,
    ) -> AuthResult<()> {
        let query = AccessQuery {
            user: user.to_string(),
            namespace: namespace.to_string(),
            verb: verb.to_string(),
            group: resource.group.clone(),
            resource: resource.resource.clone(),
            name: resource_name.to_string(),
        };

        let deadline = Instant::now() + self.config.deadline;
        loop {
            match self.attempt(&query, allowed).await? {
                Attempt::Matched => return Ok(()),
                Attempt::EndpointAbsent => {
                    // The environment cannot be queried at all. Wait once
                    // and assume the policy cache has caught up.
                    warn!(
                        user = %query.user,
                        "access review endpoint is missing; waiting a fixed pause instead"
                    );
                    sleep(self.config.absent_pause).await;
                    return Ok(());
                }
                Attempt::Mismatched => {
                    debug!(
                        user = %query.user,
                        verb = %query.verb,
                        resource = %query.resource,
                        expected = allowed,
                        "decision does not match yet; continuing to poll"
                    );
                    if Instant::now() + self.config.interval > deadline {
                        return Err(AuthError::PolicyUpdateTimeout {
                            user: query.user,
                            verb: query.verb,
                            resource: query.resource,
                            expected: allowed,
                            deadline_ms: self.config.deadline.as_millis() as u64,
                        });
                    }
                    sleep(self.config.interval).await;
                }
            }
        }
    }

    /// Issues one review and classifies the result.
    ///
    /// Review errors other than an absent endpoint abort the poll:
    /// only "wrong decision" warrants retrying, not "couldn't ask".
    async fn attempt(&self, query: &AccessQuery, allowed: bool) -> AuthResult<Attempt> {
        match self.reviewer.submit_review(query).await {
            Err(AuthError::EndpointAbsent) => Ok(Attempt::EndpointAbsent),
            Err(err) => Err(err),
            Ok(decision) if decision.allowed == allowed => Ok(Attempt::Matched),
            Ok(_) => Ok(Attempt::Mismatched),
        }
    }
}
