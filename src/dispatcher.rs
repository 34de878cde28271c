use crate::authz::{AuthorizationEngine, DenyReason};
use crate::claims::ClaimsFile;
use crate::config::Config;
use crate::deploy::{DeployHook, DeployOutcome, DeployValidator, PlaceholderDeployHook, ProjectRoot};
use crate::executor::{execute_with_deadline, CommandExecutor, ExecError, ProcessExecutor};
use crate::permissions::PermissionTable;
use crate::response;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

pub const KUBECTL: &str = "kubectl";
pub const DEPLOY: &str = "deploy";

/// Runs one request end to end and always answers with text.
pub struct Dispatcher {
    engine: AuthorizationEngine,
    validator: DeployValidator,
    executor: Arc<dyn CommandExecutor>,
    hook: Arc<dyn DeployHook>,
    kubectl_program: String,
    block_interactive_flags: bool,
    deadline: Option<Duration>,
}

impl Dispatcher {
    pub fn new(
        engine: AuthorizationEngine,
        validator: DeployValidator,
        executor: Arc<dyn CommandExecutor>,
        hook: Arc<dyn DeployHook>,
    ) -> Self {
        Self {
            engine,
            validator,
            executor,
            hook,
            kubectl_program: KUBECTL.to_string(),
            block_interactive_flags: false,
            deadline: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let claims = Arc::new(ClaimsFile::new(&config.claims_path));
        let projects = Arc::new(ProjectRoot::new(&config.project_root));
        let executor: Arc<dyn CommandExecutor> = Arc::new(ProcessExecutor);

        let engine = AuthorizationEngine::new(claims.clone(), PermissionTable::default())
            .with_unmanaged_policy(config.unmanaged_commands);
        let validator = DeployValidator::new(claims, projects);
        let hook = Arc::new(PlaceholderDeployHook::new(
            executor.clone(),
            config.deploy_program.clone(),
        ));

        Self::new(engine, validator, executor, hook)
            .with_kubectl_program(config.kubectl_program.clone())
            .with_interactive_flag_guard(config.block_interactive_flags)
            .with_deadline(config.command_timeout())
    }

    pub fn with_kubectl_program(mut self, program: impl Into<String>) -> Self {
        self.kubectl_program = program.into();
        self
    }

    pub fn with_interactive_flag_guard(mut self, enabled: bool) -> Self {
        self.block_interactive_flags = enabled;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn engine(&self) -> &AuthorizationEngine {
        &self.engine
    }

    pub fn deploy_validator(&self) -> &DeployValidator {
        &self.validator
    }

    pub async fn handle(&self, command: &str, username: &str, args: &[String]) -> String {
        self.handle_with_deadline(command, username, args, self.deadline)
            .await
    }

    /// Like [`Dispatcher::handle`], with a caller-chosen bound on the external
    /// program. `None` waits indefinitely.
    pub async fn handle_with_deadline(
        &self,
        command: &str,
        username: &str,
        args: &[String],
        deadline: Option<Duration>,
    ) -> String {
        let span = tracing::info_span!(
            "request",
            id = %uuid::Uuid::new_v4(),
            command = %command,
            user = %username
        );

        async {
            match command {
                KUBECTL => self.kubectl(username, args, deadline).await,
                DEPLOY => self.deploy(username, args, deadline).await,
                other => {
                    tracing::info!("Rejected unknown command");
                    response::unknown_command(&response::now(), other)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn kubectl(&self, username: &str, args: &[String], deadline: Option<Duration>) -> String {
        let subcommand = args.first().map(String::as_str).unwrap_or_default();
        let verdict = self.engine.authorize(username, subcommand);

        if !verdict.allowed() {
            tracing::info!("Denied: {:?}", verdict.decision);
            return response::denial(KUBECTL, &verdict);
        }

        if self.block_interactive_flags {
            if let Some(flag) = crate::flags::first_blocked_flag(args) {
                tracing::info!("Denied: flag {} cannot be relayed", flag);
                let denied = verdict.deny(DenyReason::ForbiddenFlag, flag);
                return response::denial(KUBECTL, &denied);
            }
        }

        tracing::info!("Allowed: {:?}", verdict.decision);
        let ts = response::timestamp(&verdict.timestamp);
        let result =
            execute_with_deadline(self.executor.as_ref(), &self.kubectl_program, args, deadline)
                .await;
        response::ok(&ts, &relay_output(result))
    }

    async fn deploy(&self, username: &str, args: &[String], deadline: Option<Duration>) -> String {
        match self.validator.validate(username, args) {
            DeployOutcome::Help => response::deploy_help(&response::now()),
            DeployOutcome::Listing(projects) => {
                response::ok(&response::now(), &response::project_listing(&projects))
            }
            DeployOutcome::Denied(verdict) => {
                tracing::info!("Denied: {:?}", verdict.decision);
                response::denial(DEPLOY, &verdict)
            }
            DeployOutcome::Plan { plan, verdict } => {
                tracing::info!(
                    "Deploy plan authorized: {} -> {}",
                    plan.project,
                    plan.environment.as_str()
                );
                let ts = response::timestamp(&verdict.timestamp);
                let result = self.hook.deploy(&plan, args, deadline).await;
                response::ok(&ts, &relay_output(result))
            }
        }
    }
}

/// Execution failures travel inside the success envelope, same as the
/// program's own error output.
fn relay_output(result: Result<String, ExecError>) -> String {
    result.unwrap_or_else(|e| {
        tracing::error!("Command execution failed: {}", e);
        e.to_string()
    })
}
