//! End-to-end tests of the propagation-verification flow against a
//! mock cluster client with a simulated policy-cache delay.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use authwait::{
    AccessQuery, AccessReviewer, AuthError, AuthResult, AuthorizationPoller, BindingSpec,
    BindingWriter, ClusterRoleLister, GroupResource, PollConfig, ReviewDecision, RoleBinder,
    Subject,
};

/// Mock cluster whose authorizer only observes a binding after a fixed
/// number of reviews, simulating policy-cache propagation lag.
struct MockCluster {
    cluster_roles: Vec<String>,
    bindings: RwLock<Vec<BindingSpec>>,
    review_calls: AtomicUsize,
    /// Number of reviews served before bindings become visible.
    propagation_reviews: usize,
}

impl MockCluster {
    fn new(propagation_reviews: usize) -> Self {
        Self {
            cluster_roles: vec!["viewer".to_string(), "admin".to_string()],
            bindings: RwLock::new(Vec::new()),
            review_calls: AtomicUsize::new(0),
            propagation_reviews,
        }
    }
}

#[async_trait]
impl ClusterRoleLister for MockCluster {
    async fn list_cluster_roles(&self) -> AuthResult<Vec<String>> {
        Ok(self.cluster_roles.clone())
    }
}

#[async_trait]
impl BindingWriter for MockCluster {
    async fn create_binding(&self, spec: &BindingSpec) -> AuthResult<()> {
        self.bindings.write().await.push(spec.clone());
        Ok(())
    }
}

#[async_trait]
impl AccessReviewer for MockCluster {
    async fn submit_review(&self, query: &AccessQuery) -> AuthResult<ReviewDecision> {
        let served = self.review_calls.fetch_add(1, Ordering::SeqCst);
        if served < self.propagation_reviews {
            // Cache has not caught up yet; deny.
            return Ok(ReviewDecision::new(false));
        }
        let allowed = self.bindings.read().await.iter().any(|binding| {
            binding.namespace.as_deref() == Some(query.namespace.as_str())
                && binding
                    .subjects
                    .iter()
                    .any(|subject| subject.name == query.user)
        });
        Ok(ReviewDecision {
            allowed,
            reason: Some("served by mock authorizer".to_string()),
        })
    }
}

fn fast_config() -> PollConfig {
    PollConfig::default()
        .with_interval(Duration::from_millis(5))
        .with_deadline(Duration::from_millis(200))
        .with_absent_pause(Duration::from_millis(10))
}

#[tokio::test]
async fn bind_then_wait_tolerates_cache_lag() {
    authwait::logging::init_test_logging();

    let cluster = Arc::new(MockCluster::new(3));
    let binder = RoleBinder::new(Arc::clone(&cluster));
    binder
        .bind_role_in_namespace("viewer", "ns-1", &[Subject::user("alice")])
        .await
        .unwrap();

    let poller = AuthorizationPoller::with_config(Arc::clone(&cluster), fast_config());
    poller
        .wait_for_authorization_update("alice", "ns-1", "get", &GroupResource::new("", "pods"), true)
        .await
        .unwrap();

    // The first reviews were served stale; the poller kept going.
    assert!(cluster.review_calls.load(Ordering::SeqCst) > 3);
}

#[tokio::test]
async fn unbound_user_stays_denied() {
    let cluster = Arc::new(MockCluster::new(0));
    let binder = RoleBinder::new(Arc::clone(&cluster));
    binder
        .bind_role_in_namespace("viewer", "ns-1", &[Subject::user("alice")])
        .await
        .unwrap();

    // Bob has no binding; expecting denied matches on the first review.
    let poller = AuthorizationPoller::with_config(Arc::clone(&cluster), fast_config());
    poller
        .wait_for_authorization_update("bob", "ns-1", "get", &GroupResource::new("", "pods"), false)
        .await
        .unwrap();
    assert_eq!(cluster.review_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn grant_that_never_propagates_times_out() {
    // Bindings never become visible within the deadline.
    let cluster = Arc::new(MockCluster::new(usize::MAX));
    let binder = RoleBinder::new(Arc::clone(&cluster));
    binder
        .bind_role_in_namespace("viewer", "ns-1", &[Subject::user("alice")])
        .await
        .unwrap();

    let poller = AuthorizationPoller::with_config(Arc::clone(&cluster), fast_config());
    let err = poller
        .wait_for_authorization_update("alice", "ns-1", "get", &GroupResource::new("", "pods"), true)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::PolicyUpdateTimeout { .. }));
}

/// Reviewer wrapper that reports the endpoint as absent, as on
/// providers that do not serve the review API.
struct AbsentEndpoint;

#[async_trait]
impl AccessReviewer for AbsentEndpoint {
    async fn submit_review(&self, _query: &AccessQuery) -> AuthResult<ReviewDecision> {
        Err(AuthError::EndpointAbsent)
    }
}

#[tokio::test]
async fn absent_review_endpoint_is_relaxed_success() {
    let poller = AuthorizationPoller::with_config(Arc::new(AbsentEndpoint), fast_config());

    // Succeeds for both expected values: the check is structurally
    // unavailable, not failing.
    poller
        .wait_for_authorization_update("alice", "ns-1", "get", &GroupResource::new("", "pods"), true)
        .await
        .unwrap();
    poller
        .wait_for_authorization_update(
            "alice",
            "ns-1",
            "get",
            &GroupResource::new("", "pods"),
            false,
        )
        .await
        .unwrap();
}
