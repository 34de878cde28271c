use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

/// Runs an external program and returns whatever it printed.
///
/// A non-zero exit is not an error: the program's own output already says
/// what went wrong and is relayed as-is.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, program: &str, args: &[String]) -> Result<String, ExecError>;
}

#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor;

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, program: &str, args: &[String]) -> Result<String, ExecError> {
        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            tracing::debug!("{} exited with {}", program, output.status);
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(combined)
    }
}

/// Bounds `execute` by `deadline` when one is given.
pub async fn execute_with_deadline(
    executor: &dyn CommandExecutor,
    program: &str,
    args: &[String],
    deadline: Option<Duration>,
) -> Result<String, ExecError> {
    match deadline {
        Some(timeout) => tokio::time::timeout(timeout, executor.execute(program, args))
            .await
            .map_err(|_| ExecError::Timeout {
                program: program.to_string(),
                timeout,
            })?,
        None => executor.execute(program, args).await,
    }
}
