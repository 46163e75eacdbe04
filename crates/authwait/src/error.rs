//! Error types for authorization test helpers.

use thiserror::Error;

/// Errors surfaced by the authorization helpers.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The access review endpoint is not served by the target environment.
    ///
    /// This is a recognized condition rather than a failure: the poller
    /// converts it into a relaxed success because the policy engine cannot
    /// be observed at all in such environments.
    #[error("access review endpoint not found")]
    EndpointAbsent,

    /// Submitting an access review failed for a reason other than the
    /// endpoint being absent. Never retried.
    #[error("access review failed: {message}")]
    ReviewFailed { message: String },

    /// The observed decision never matched the expected outcome within
    /// the poll deadline.
    #[error(
        "timed out after {deadline_ms}ms waiting for '{user}' {verb} {resource} to become allowed={expected}"
    )]
    PolicyUpdateTimeout {
        user: String,
        verb: String,
        resource: String,
        expected: bool,
        deadline_ms: u64,
    },

    /// Listing capability-defining objects (cluster roles) failed.
    #[error("listing cluster roles failed: {message}")]
    ListFailed { message: String },

    /// The binding-creation interface rejected a request. Raw form
    /// returned by [`BindingWriter`](crate::binding::BindingWriter)
    /// implementations; the binder wraps it with identifying context.
    #[error("creating binding failed: {message}")]
    CreateFailed { message: String },

    /// Creating a role binding failed. Wrapped with identifying context;
    /// never retried.
    #[error("binding {role_kind}/{role} in {namespace:?} for {subjects:?} failed: {message}")]
    BindingFailed {
        role_kind: String,
        role: String,
        namespace: Option<String>,
        subjects: Vec<String>,
        message: String,
    },
}

/// Result type for authorization helper operations.
pub type AuthResult<T> = Result<T, AuthError>;
