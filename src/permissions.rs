use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagedCommand {
    Create,
    Delete,
    Run,
    Exec,
    Scale,
    Apply,
}

impl ManagedCommand {
    pub const ALL: [ManagedCommand; 6] = [
        ManagedCommand::Create,
        ManagedCommand::Delete,
        ManagedCommand::Run,
        ManagedCommand::Exec,
        ManagedCommand::Scale,
        ManagedCommand::Apply,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ManagedCommand::Create => "create",
            ManagedCommand::Delete => "delete",
            ManagedCommand::Run => "run",
            ManagedCommand::Exec => "exec",
            ManagedCommand::Scale => "scale",
            ManagedCommand::Apply => "apply",
        }
    }
}

impl FromStr for ManagedCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ManagedCommand::ALL
            .into_iter()
            .find(|cmd| cmd.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unmanaged command: {}", s))
    }
}

/// Per-role grants for one managed command. Managers are never looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grants {
    pub developer: bool,
    pub guest: bool,
}

impl Grants {
    pub const DENY_ALL: Grants = Grants {
        developer: false,
        guest: false,
    };
}

#[derive(Debug, Clone)]
pub struct PermissionTable {
    entries: Vec<(ManagedCommand, Grants)>,
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self {
            entries: ManagedCommand::ALL
                .into_iter()
                .map(|cmd| (cmd, Grants::DENY_ALL))
                .collect(),
        }
    }
}

impl PermissionTable {
    pub fn with_grants(mut self, command: ManagedCommand, grants: Grants) -> Self {
        self.entries.retain(|(cmd, _)| *cmd != command);
        self.entries.push((command, grants));
        self
    }

    pub fn grants(&self, command: ManagedCommand) -> Option<Grants> {
        self.entries
            .iter()
            .find(|(cmd, _)| *cmd == command)
            .map(|(_, grants)| *grants)
    }

    /// `None` means the command is not managed by the table at all, or the
    /// role has no row in it.
    pub fn lookup(&self, command: &str, role: &Role) -> Option<bool> {
        let command = command.parse::<ManagedCommand>().ok()?;
        let grants = self.grants(command)?;
        match role {
            Role::Developer => Some(grants.developer),
            Role::Guest => Some(grants.guest),
            Role::Manager | Role::Unrecognized(_) => None,
        }
    }
}
