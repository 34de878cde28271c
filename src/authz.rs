use crate::claims::RoleResolver;
use crate::permissions::PermissionTable;
use crate::role::Role;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowReason {
    ManagerOverride,
    Permitted,
    UnmanagedCommandDefaultAllow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    UnauthorizedUser,
    RoleForbidden,
    UnknownRole,
    UnmanagedCommandDenied,
    ForbiddenFlag,
    MissingEnvironmentFlag,
    TooManyArguments,
    ProjectNotFound,
    UnknownEnvironmentFlag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "lowercase")]
pub enum Decision {
    Allowed(AllowReason),
    Denied(DenyReason),
}

/// What to do with commands the permission table does not mention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmanagedPolicy {
    #[default]
    Allow,
    Deny,
}

impl std::str::FromStr for UnmanagedPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "allow" => Ok(UnmanagedPolicy::Allow),
            "deny" => Ok(UnmanagedPolicy::Deny),
            _ => anyhow::bail!("Invalid unmanaged command policy: {}", s),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub decision: Decision,
    pub actor: String,
    pub role: Option<Role>,
    /// The token the decision is about: a command name, project or flag.
    pub subject: String,
    pub timestamp: DateTime<Local>,
}

impl Verdict {
    pub fn allowed(&self) -> bool {
        matches!(self.decision, Decision::Allowed(_))
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self.decision {
            Decision::Denied(reason) => Some(reason),
            Decision::Allowed(_) => None,
        }
    }

    pub(crate) fn new(
        decision: Decision,
        actor: &str,
        role: Option<Role>,
        subject: &str,
    ) -> Self {
        Self {
            decision,
            actor: actor.to_string(),
            role,
            subject: subject.to_string(),
            timestamp: Local::now(),
        }
    }

    pub(crate) fn deny(&self, reason: DenyReason, subject: &str) -> Self {
        Self::new(Decision::Denied(reason), &self.actor, self.role.clone(), subject)
    }
}

#[derive(Clone)]
pub struct AuthorizationEngine {
    resolver: Arc<dyn RoleResolver>,
    table: PermissionTable,
    unmanaged: UnmanagedPolicy,
}

impl AuthorizationEngine {
    pub fn new(resolver: Arc<dyn RoleResolver>, table: PermissionTable) -> Self {
        Self {
            resolver,
            table,
            unmanaged: UnmanagedPolicy::default(),
        }
    }

    pub fn with_unmanaged_policy(mut self, policy: UnmanagedPolicy) -> Self {
        self.unmanaged = policy;
        self
    }

    pub fn authorize(&self, username: &str, command: &str) -> Verdict {
        let Some(role) = self.resolver.resolve_role(username) else {
            return Verdict::new(
                Decision::Denied(DenyReason::UnauthorizedUser),
                username,
                None,
                command,
            );
        };

        let decision = match role {
            Role::Manager => Decision::Allowed(AllowReason::ManagerOverride),
            Role::Developer | Role::Guest => match self.table.lookup(command, &role) {
                Some(true) => Decision::Allowed(AllowReason::Permitted),
                Some(false) => Decision::Denied(DenyReason::RoleForbidden),
                None => match self.unmanaged {
                    UnmanagedPolicy::Allow => {
                        Decision::Allowed(AllowReason::UnmanagedCommandDefaultAllow)
                    }
                    UnmanagedPolicy::Deny => Decision::Denied(DenyReason::UnmanagedCommandDenied),
                },
            },
            Role::Unrecognized(_) => Decision::Denied(DenyReason::UnknownRole),
        };

        Verdict::new(decision, username, Some(role), command)
    }
}
