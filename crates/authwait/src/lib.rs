//! authwait: Test-support helpers for authorization-policy propagation
//!
//! This crate helps end-to-end test suites assert that an access-control
//! policy change has propagated through a distributed authorization
//! subsystem, tolerating policy-cache lag:
//!
//! - `review/`  - poll an access-review interface until a decision
//!   matches an expected outcome, bounded by a deadline
//! - `probe/`   - compute-once cached check of whether RBAC is active
//! - `binding/` - create role-binding fixtures, gated by the probe
//!
//! The underlying cluster client is abstracted behind the
//! [`AccessReviewer`], [`ClusterRoleLister`], and [`BindingWriter`]
//! traits; this crate only encodes when to keep asking and when to
//! give up.
//!
//! # Example
//!
//! ```rust,ignore
//! use authwait::{AuthorizationPoller, GroupResource, RoleBinder, Subject};
//!
//! let binder = RoleBinder::new(client.clone());
//! binder
//!     .bind_role_in_namespace("viewer", "ns-1", &[Subject::user("alice")])
//!     .await?;
//!
//! let poller = AuthorizationPoller::new(client);
//! poller
//!     .wait_for_authorization_update(
//!         "alice",
//!         "ns-1",
//!         "get",
//!         &GroupResource::new("", "pods"),
//!         true,
//!     )
//!     .await?;
//! ```

pub mod binding;
pub mod error;
pub mod logging;
pub mod probe;
pub mod review;

// Re-export commonly used types at the crate root
pub use binding::{BindingSpec, BindingWriter, RoleBinder, RoleKind, RoleRef, Subject, SubjectKind};
pub use error::{AuthError, AuthResult};
pub use probe::{global_probe, ClusterRoleLister, RbacProbe};
pub use review::{
    AccessQuery, AccessReviewer, AuthorizationPoller, GroupResource, PollConfig, ReviewDecision,
};
