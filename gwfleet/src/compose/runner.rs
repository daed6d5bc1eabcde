//! Delegation of instance lifecycle verbs to the container orchestration tool.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::errors::{FleetError, FleetResult};
use crate::runtime::types::LogOptions;

/// Where and under which project a lifecycle verb runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposeContext {
    /// Orchestration project, unique per instance.
    pub project: String,
    /// Manifest file.
    pub manifest: PathBuf,
    /// Instance directory, used as the working directory.
    pub working_dir: PathBuf,
}

/// External container runtime collaborator.
///
/// Calls suspend until the tool exits; there is no timeout beyond what the
/// tool itself enforces.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create and start the instance's containers in the background.
    async fn up(&self, ctx: &ComposeContext) -> FleetResult<()>;

    /// Stop running containers without removing them.
    async fn stop(&self, ctx: &ComposeContext) -> FleetResult<()>;

    /// Stop and remove the instance's containers.
    async fn down(&self, ctx: &ComposeContext) -> FleetResult<()>;

    /// Stream logs to the caller's stdout/stderr.
    async fn logs(&self, ctx: &ComposeContext, options: LogOptions) -> FleetResult<()>;

    /// Whether a container with exactly this name is running.
    async fn is_running(&self, container_name: &str) -> FleetResult<bool>;
}

/// Runtime backed by `<program> compose`, `docker` by default.
#[derive(Clone, Debug)]
pub struct ComposeRuntime {
    program: String,
}

impl ComposeRuntime {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn compose_args(ctx: &ComposeContext, verb: &[&str]) -> Vec<String> {
        let mut args = vec![
            "compose".to_string(),
            "-p".to_string(),
            ctx.project.clone(),
            "-f".to_string(),
            ctx.manifest.display().to_string(),
        ];
        args.extend(verb.iter().map(|s| s.to_string()));
        args
    }

    fn describe(&self, args: &[String]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    /// Run to completion capturing output; non-zero exit is an error.
    async fn run_captured(
        &self,
        args: Vec<String>,
        ctx: Option<&ComposeContext>,
    ) -> FleetResult<String> {
        let command = self.describe(&args);
        tracing::debug!(command = %command, "Invoking container runtime");

        let mut cmd = Command::new(&self.program);
        cmd.args(&args).stdin(Stdio::null());
        if let Some(ctx) = ctx {
            cmd.current_dir(&ctx.working_dir);
        }

        let output = cmd.output().await.map_err(|e| {
            FleetError::RuntimeUnavailable(format!("failed to run {}: {e}", self.program))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(
                command = %command,
                status = ?output.status,
                stderr = %stderr,
                "Container runtime failed"
            );
            return Err(FleetError::RuntimeFailure { command, stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn compose(&self, ctx: &ComposeContext, verb: &[&str]) -> FleetResult<()> {
        self.run_captured(Self::compose_args(ctx, verb), Some(ctx))
            .await
            .map(|_| ())
    }
}

impl Default for ComposeRuntime {
    fn default() -> Self {
        Self::new(crate::runtime::constants::containers::DEFAULT_COMPOSE_PROGRAM)
    }
}

#[async_trait]
impl ContainerRuntime for ComposeRuntime {
    async fn up(&self, ctx: &ComposeContext) -> FleetResult<()> {
        self.compose(ctx, &["up", "-d"]).await
    }

    async fn stop(&self, ctx: &ComposeContext) -> FleetResult<()> {
        self.compose(ctx, &["stop"]).await
    }

    async fn down(&self, ctx: &ComposeContext) -> FleetResult<()> {
        self.compose(ctx, &["down", "--remove-orphans"]).await
    }

    async fn logs(&self, ctx: &ComposeContext, options: LogOptions) -> FleetResult<()> {
        let mut verb = vec!["logs".to_string()];
        if options.follow {
            verb.push("-f".to_string());
        }
        if let Some(tail) = options.tail {
            verb.push("--tail".to_string());
            verb.push(tail.to_string());
        }
        let verb: Vec<&str> = verb.iter().map(String::as_str).collect();
        let args = Self::compose_args(ctx, &verb);
        let command = self.describe(&args);

        // Inherit stdio so followed logs stream straight to the terminal.
        let status = Command::new(&self.program)
            .args(&args)
            .current_dir(&ctx.working_dir)
            .status()
            .await
            .map_err(|e| {
                FleetError::RuntimeUnavailable(format!("failed to run {}: {e}", self.program))
            })?;

        if !status.success() {
            return Err(FleetError::RuntimeFailure {
                command,
                stderr: format!("exited with {status}"),
            });
        }
        Ok(())
    }

    async fn is_running(&self, container_name: &str) -> FleetResult<bool> {
        let args = vec![
            "ps".to_string(),
            "--filter".to_string(),
            format!("name=^{container_name}$"),
            "--format".to_string(),
            "{{.Names}}".to_string(),
        ];
        let stdout = self.run_captured(args, None).await?;
        Ok(stdout.lines().any(|line| line.trim() == container_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ComposeContext {
        ComposeContext {
            project: "gwfleet-alpha".to_string(),
            manifest: PathBuf::from("/tmp/alpha/docker-compose.yml"),
            working_dir: PathBuf::from("/tmp/alpha"),
        }
    }

    #[test]
    fn test_compose_args_are_project_scoped() {
        let args = ComposeRuntime::compose_args(&ctx(), &["up", "-d"]);

        assert_eq!(
            args,
            vec![
                "compose",
                "-p",
                "gwfleet-alpha",
                "-f",
                "/tmp/alpha/docker-compose.yml",
                "up",
                "-d"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let runtime = ComposeRuntime::new("gwfleet-no-such-program");

        let err = runtime.is_running("anything").await.unwrap_err();

        assert!(matches!(err, FleetError::RuntimeUnavailable(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        // `false compose ...` exits 1 without output
        let runtime = ComposeRuntime::new("false");

        let err = runtime
            .stop(&ComposeContext {
                working_dir: std::env::temp_dir(),
                ..ctx()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, FleetError::RuntimeFailure { .. }));
    }
}
