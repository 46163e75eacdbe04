//! Role-binding fixtures for authorization tests.
//!
//! Bindings are named deterministically as `{namespace}--{role}` so
//! repeated test runs reuse the same binding instead of racing caches
//! with create/delete cycles. Creation is gated on the RBAC probe: in
//! clusters without RBAC there is nothing to bind, so all operations
//! are silent no-ops.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::probe::{ClusterRoleLister, RbacProbe};

/// Kind of identity attached to a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SubjectKind {
    User,
    Group,
    ServiceAccount,
}

/// An identity to attach to a role binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub kind: SubjectKind,
    pub name: String,
    /// Namespace of the subject; only meaningful for service accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Subject {
    /// Creates a user subject.
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::User,
            name: name.into(),
            namespace: None,
        }
    }

    /// Creates a group subject.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::Group,
            name: name.into(),
            namespace: None,
        }
    }

    /// Creates a service-account subject in a namespace.
    pub fn service_account(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::ServiceAccount,
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{:?}:{}/{}", self.kind, ns, self.name),
            None => write!(f, "{:?}:{}", self.kind, self.name),
        }
    }
}

/// Kind of role a binding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    Role,
    ClusterRole,
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleKind::Role => f.write_str("Role"),
            RoleKind::ClusterRole => f.write_str("ClusterRole"),
        }
    }
}

/// Reference to the role a binding grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    pub kind: RoleKind,
    pub name: String,
}

/// A binding descriptor handed to the creation interface.
///
/// `namespace: None` requests a cluster-scoped binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSpec {
    pub name: String,
    pub role_ref: RoleRef,
    pub namespace: Option<String>,
    pub subjects: Vec<Subject>,
}

/// Consumed interface that creates role bindings in the target system.
#[async_trait]
pub trait BindingWriter: Send + Sync {
    /// Creates the binding described by `spec`.
    async fn create_binding(&self, spec: &BindingSpec) -> AuthResult<()>;
}

/// Deterministic binding name derived from namespace and role.
///
/// Callers rely on this for idempotent reuse across test runs.
fn binding_name(namespace: &str, role: &str) -> String {
    format!("{namespace}--{role}")
}

/// Creates role-binding test fixtures, gated by the RBAC probe.
///
/// Creation failures are wrapped with role, namespace, and subject
/// context and surfaced; they are never retried, since deterministic
/// naming (not conflict handling) is what keeps reuse race-free.
pub struct RoleBinder<C: ?Sized> {
    client: Arc<C>,
    probe: Arc<RbacProbe>,
}

impl<C> RoleBinder<C>
where
    C: BindingWriter + ClusterRoleLister + ?Sized,
{
    /// Creates a binder with its own probe instance.
    pub fn new(client: Arc<C>) -> Self {
        Self::with_probe(client, Arc::new(RbacProbe::new()))
    }

    /// Creates a binder sharing an existing probe.
    pub fn with_probe(client: Arc<C>, probe: Arc<RbacProbe>) -> Self {
        Self { client, probe }
    }

    /// Binds a cluster role at the cluster scope. No-op when RBAC is
    /// disabled.
    pub async fn bind_cluster_role(
        &self,
        cluster_role: &str,
        namespace: &str,
        subjects: &[Subject],
    ) -> AuthResult<()> {
        if !self.probe.is_rbac_enabled(self.client.as_ref()).await {
            return Ok(());
        }

        let spec = BindingSpec {
            name: binding_name(namespace, cluster_role),
            role_ref: RoleRef {
                kind: RoleKind::ClusterRole,
                name: cluster_role.to_string(),
            },
            namespace: None,
            subjects: subjects.to_vec(),
        };
        debug!(binding = %spec.name, "creating cluster-scoped binding");
        self.client
            .create_binding(&spec)
            .await
            .map_err(|err| wrap_binding_error(&spec, err))
    }

    /// Binds a cluster role at the namespace scope. No-op when RBAC is
    /// disabled.
    pub async fn bind_cluster_role_in_namespace(
        &self,
        cluster_role: &str,
        namespace: &str,
        subjects: &[Subject],
    ) -> AuthResult<()> {
        self.bind_in_namespace(RoleKind::ClusterRole, cluster_role, namespace, subjects)
            .await
    }

    /// Binds a namespaced role at the namespace scope. No-op when RBAC
    /// is disabled.
    pub async fn bind_role_in_namespace(
        &self,
        role: &str,
        namespace: &str,
        subjects: &[Subject],
    ) -> AuthResult<()> {
        self.bind_in_namespace(RoleKind::Role, role, namespace, subjects)
            .await
    }

    async fn bind_in_namespace(
        &self,
        role_kind: RoleKind,
        role: &str,
        namespace: &str,
        subjects: &[Subject],
    ) -> AuthResult<()> {
        if !self.probe.is_rbac_enabled(self.client.as_ref()).await {
            return Ok(());
        }

        let spec = BindingSpec {
            name: binding_name(namespace, role),
            role_ref: RoleRef {
                kind: role_kind,
                name: role.to_string(),
            },
            namespace: Some(namespace.to_string()),
            subjects: subjects.to_vec(),
        };
        debug!(binding = %spec.name, namespace, "creating namespaced binding");
        self.client
            .create_binding(&spec)
            .await
            .map_err(|err| wrap_binding_error(&spec, err))
    }
}

fn wrap_binding_error(spec: &BindingSpec, err: AuthError) -> AuthError {
    AuthError::BindingFailed {
        role_kind: spec.role_ref.kind.to_string(),
        role: spec.role_ref.name.clone(),
        namespace: spec.namespace.clone(),
        subjects: spec.subjects.iter().map(|s| s.to_string()).collect(),
        message: err.to_string(),
    }
}
