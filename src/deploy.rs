use crate::authz::{Decision, DenyReason, Verdict};
use crate::claims::RoleResolver;
use crate::executor::{execute_with_deadline, CommandExecutor, ExecError};
use crate::role::Role;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const HELP_FLAGS: &[&str] = &["-h", "--help"];
const SHOW_FLAGS: &[&str] = &["-s", "--show"];
const PRODUCTION_FLAGS: &[&str] = &["-p", "--prod", "--production", "prod", "production"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
}

impl Environment {
    pub fn from_flag(flag: &str) -> Option<Self> {
        PRODUCTION_FLAGS
            .contains(&flag)
            .then_some(Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployPlan {
    pub project: String,
    pub environment: Environment,
}

#[derive(Debug, Clone)]
pub enum DeployOutcome {
    Help,
    Listing(Vec<String>),
    Plan { plan: DeployPlan, verdict: Verdict },
    Denied(Verdict),
}

#[derive(Debug, Error)]
#[error("failed to read project root {path}: {source}")]
pub struct ProjectRootError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// The set of deployable projects. Read fresh on every call.
pub trait ProjectCatalog: Send + Sync {
    fn list_projects(&self) -> Result<Vec<String>, ProjectRootError>;

    fn contains(&self, project: &str) -> bool {
        match self.list_projects() {
            Ok(projects) => projects.iter().any(|p| p == project),
            Err(e) => {
                tracing::warn!(
                    "Project root unreadable, treating {} as missing: {}",
                    project,
                    e
                );
                false
            }
        }
    }
}

pub struct ProjectRoot {
    path: PathBuf,
}

impl ProjectRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProjectCatalog for ProjectRoot {
    fn list_projects(&self) -> Result<Vec<String>, ProjectRootError> {
        let to_err = |source: std::io::Error| ProjectRootError {
            path: self.path.clone(),
            source,
        };

        let mut projects = Vec::new();
        for entry in fs::read_dir(&self.path).map_err(to_err)? {
            let entry = entry.map_err(to_err)?;
            if !entry.file_type().map_err(to_err)?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                projects.push(name.to_string());
            }
        }

        projects.sort();
        Ok(projects)
    }
}

pub struct DeployValidator {
    resolver: Arc<dyn RoleResolver>,
    catalog: Arc<dyn ProjectCatalog>,
}

impl DeployValidator {
    pub fn new(resolver: Arc<dyn RoleResolver>, catalog: Arc<dyn ProjectCatalog>) -> Self {
        Self { resolver, catalog }
    }

    /// Projects under the root; an unreadable root is an empty listing.
    pub fn list_projects(&self) -> Vec<String> {
        self.catalog.list_projects().unwrap_or_else(|e| {
            tracing::warn!("Project root unreadable, listing nothing: {}", e);
            Vec::new()
        })
    }

    /// Walks the deploy arguments: help, listing, or a project plus
    /// environment pair.
    ///
    /// Only the manager role is shut out here. A role outside the three known
    /// ones is not denied on this path, unlike in [`AuthorizationEngine`], and
    /// can reach a [`DeployPlan`] and the deploy hook.
    ///
    /// [`AuthorizationEngine`]: crate::authz::AuthorizationEngine
    pub fn validate(&self, username: &str, args: &[String]) -> DeployOutcome {
        let subject = args.first().map(String::as_str).unwrap_or_default();

        let Some(role) = self.resolver.resolve_role(username) else {
            return DeployOutcome::Denied(Verdict::new(
                Decision::Denied(DenyReason::UnauthorizedUser),
                username,
                None,
                subject,
            ));
        };

        if args.is_empty() {
            return DeployOutcome::Help;
        }

        let base = Verdict::new(
            Decision::Allowed(crate::authz::AllowReason::Permitted),
            username,
            Some(role.clone()),
            subject,
        );

        if role == Role::Manager {
            return DeployOutcome::Denied(base.deny(DenyReason::RoleForbidden, subject));
        }

        if HELP_FLAGS.contains(&subject) {
            return DeployOutcome::Help;
        }

        if SHOW_FLAGS.contains(&subject) {
            return DeployOutcome::Listing(self.list_projects());
        }

        match args {
            [project] => {
                DeployOutcome::Denied(base.deny(DenyReason::MissingEnvironmentFlag, project))
            }
            [project, flag] => {
                if !self.catalog.contains(project) {
                    return DeployOutcome::Denied(base.deny(DenyReason::ProjectNotFound, project));
                }
                match Environment::from_flag(flag) {
                    Some(environment) => DeployOutcome::Plan {
                        plan: DeployPlan {
                            project: project.clone(),
                            environment,
                        },
                        verdict: base,
                    },
                    None => {
                        DeployOutcome::Denied(base.deny(DenyReason::UnknownEnvironmentFlag, flag))
                    }
                }
            }
            [_, _, extra, ..] => {
                DeployOutcome::Denied(base.deny(DenyReason::TooManyArguments, extra))
            }
            [] => DeployOutcome::Help,
        }
    }
}

/// Carries out an authorized plan. The validator never calls this itself.
#[async_trait]
pub trait DeployHook: Send + Sync {
    async fn deploy(
        &self,
        plan: &DeployPlan,
        args: &[String],
        deadline: Option<Duration>,
    ) -> Result<String, ExecError>;
}

/// Stand-in until a real rollout exists: runs `program` (by default
/// `whoami`) with the deploy arguments.
pub struct PlaceholderDeployHook {
    executor: Arc<dyn CommandExecutor>,
    program: String,
}

impl PlaceholderDeployHook {
    pub fn new(executor: Arc<dyn CommandExecutor>, program: impl Into<String>) -> Self {
        Self {
            executor,
            program: program.into(),
        }
    }
}

#[async_trait]
impl DeployHook for PlaceholderDeployHook {
    async fn deploy(
        &self,
        plan: &DeployPlan,
        args: &[String],
        deadline: Option<Duration>,
    ) -> Result<String, ExecError> {
        tracing::info!(
            "No rollout wired for {} ({}), running placeholder {}",
            plan.project,
            plan.environment.as_str(),
            self.program
        );
        execute_with_deadline(self.executor.as_ref(), &self.program, args, deadline).await
    }
}
