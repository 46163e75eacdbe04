//! Compute-once probe for RBAC enforcement.
//!
//! Whether a cluster enforces role-based access control does not change
//! while a test process runs, so the answer is probed once and cached.
//! Concurrent first callers block on a single evaluation and all observe
//! the same result.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::AuthResult;

/// Consumed interface that lists the capability-defining objects
/// (cluster role definitions) of the target system.
#[async_trait]
pub trait ClusterRoleLister: Send + Sync {
    /// Lists the names of all cluster roles.
    async fn list_cluster_roles(&self) -> AuthResult<Vec<String>>;
}

/// Write-once probe of whether RBAC is active.
///
/// The first call to [`is_rbac_enabled`](Self::is_rbac_enabled) issues
/// exactly one listing query; every later call returns the cached
/// boolean without re-querying, even when invoked with a different
/// lister. The first caller's result binds for the probe's lifetime.
///
/// Listing errors are swallowed and mapped to "disabled": an inability
/// to even list cluster roles is treated as evidence the capability
/// does not exist. The cached outcome does not distinguish an error
/// from an empty listing.
#[derive(Debug, Default)]
pub struct RbacProbe {
    enabled: OnceCell<bool>,
}

impl RbacProbe {
    /// Creates an unprobed instance.
    ///
    /// Tests construct fresh instances to stay hermetic; production
    /// callers share [`global_probe`].
    pub fn new() -> Self {
        Self {
            enabled: OnceCell::new(),
        }
    }

    /// Returns whether RBAC is enabled, probing on first use.
    pub async fn is_rbac_enabled<L>(&self, lister: &L) -> bool
    where
        L: ClusterRoleLister + ?Sized,
    {
        *self
            .enabled
            .get_or_init(|| async {
                match lister.list_cluster_roles().await {
                    Err(err) => {
                        warn!(error = %err, "error listing cluster roles; assuming RBAC is disabled");
                        false
                    }
                    Ok(roles) if roles.is_empty() => {
                        debug!("no cluster roles found; assuming RBAC is disabled");
                        false
                    }
                    Ok(roles) => {
                        debug!(count = roles.len(), "found cluster roles; assuming RBAC is enabled");
                        true
                    }
                }
            })
            .await
    }

    /// Returns the cached result without probing, if already evaluated.
    pub fn cached(&self) -> Option<bool> {
        self.enabled.get().copied()
    }
}

// Process-wide singleton for callers that want once-per-process
// semantics instead of managing their own instance.
use std::sync::OnceLock;

static GLOBAL_PROBE: OnceLock<RbacProbe> = OnceLock::new();

/// Gets the process-wide RBAC probe.
///
/// The first caller's evaluation binds for the remaining lifetime of
/// the process. Tests should prefer a fresh [`RbacProbe`] per test.
pub fn global_probe() -> &'static RbacProbe {
    GLOBAL_PROBE.get_or_init(RbacProbe::new)
}
