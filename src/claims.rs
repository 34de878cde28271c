use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleClaim {
    pub username: String,
    pub role: String,
}

#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("failed to read claims file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse claims file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of the current username -> role assignments.
///
/// Implementations must not cache: every call reflects the claims as they are
/// right now.
pub trait RoleResolver: Send + Sync {
    fn resolve_role(&self, username: &str) -> Option<Role>;
}

pub struct ClaimsFile {
    path: PathBuf,
}

impl ClaimsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_claims(&self) -> Result<Vec<RoleClaim>, ClaimsError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| ClaimsError::Read {
            path: self.path.clone(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| ClaimsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Loads the full mapping. A missing or corrupt file yields an empty map,
    /// so nobody is authorized.
    pub fn role_map(&self) -> HashMap<String, Role> {
        match self.read_claims() {
            Ok(claims) => claims
                .into_iter()
                .map(|claim| (claim.username, Role::parse(&claim.role)))
                .collect(),
            Err(e) => {
                tracing::warn!("Claims source unreadable, denying everyone: {}", e);
                HashMap::new()
            }
        }
    }
}

impl RoleResolver for ClaimsFile {
    fn resolve_role(&self, username: &str) -> Option<Role> {
        self.role_map().remove(username)
    }
}

/// Fixed assignments, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticRoles {
    roles: HashMap<String, Role>,
}

impl StaticRoles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, username: &str, role: &str) -> Self {
        self.roles.insert(username.to_string(), Role::parse(role));
        self
    }
}

impl RoleResolver for StaticRoles {
    fn resolve_role(&self, username: &str) -> Option<Role> {
        self.roles.get(username).cloned()
    }
}

pub async fn show_roles() -> anyhow::Result<()> {
    let config = crate::config::Config::load()?;
    let claims = ClaimsFile::new(&config.claims_path);

    let mut entries: Vec<(String, Role)> = claims.role_map().into_iter().collect();
    if entries.is_empty() {
        println!("No role claims found in {}", claims.path().display());
        return Ok(());
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    for (username, role) in entries {
        let marker = if role.is_recognized() { "" } else { " (unrecognized)" };
        println!("{:<24} {}{}", username, role, marker);
    }

    Ok(())
}
