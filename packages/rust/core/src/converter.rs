//! The external notebook-to-markdown converter.
//!
//! [`NbConvert`] runs `jupyter nbconvert <notebook> --to markdown` (or any
//! command with the same contract) as a blocking step of the pipeline. The
//! converter leaves `<stem>.md` next to the notebook and, when there are image
//! outputs, a `<stem>_files` folder beside it.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, instrument};

use jup2jek_shared::{Jup2JekError, Notebook, Result};

/// Default converter command line.
pub const DEFAULT_CONVERTER: &str = "jupyter nbconvert";

/// Converts a single notebook to markdown next to the source file.
pub trait NotebookConverter {
    fn convert(&self, notebook: &Notebook) -> impl Future<Output = Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// nbconvert subprocess
// ---------------------------------------------------------------------------

/// Subprocess converter: `<program> <leading args…> <notebook> --to markdown`.
#[derive(Debug, Clone)]
pub struct NbConvert {
    program: String,
    leading_args: Vec<String>,
    timeout: Option<Duration>,
}

impl Default for NbConvert {
    fn default() -> Self {
        Self::new("jupyter", ["nbconvert"])
    }
}

impl NbConvert {
    pub fn new(
        program: impl Into<String>,
        leading_args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            leading_args: leading_args.into_iter().map(Into::into).collect(),
            timeout: None,
        }
    }

    /// Build from a whitespace-separated command line such as `"jupyter nbconvert"`.
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| Jup2JekError::validation("converter command is empty"))?;
        Ok(Self::new(program, parts))
    }

    /// Kill the converter and fail the run if a notebook takes longer than this.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The command line, for logs and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.leading_args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check that the converter can be run at all, returning its version.
    ///
    /// Meant to run before anything on disk is touched. A converter that cannot
    /// be started is reported as a config error.
    pub async fn check_available(&self) -> Result<String> {
        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                Jup2JekError::config(format!(
                    "failed to run `{}`: {e}. Is Jupyter installed (`pip install nbconvert`)?",
                    self.command_line()
                ))
            })?;

        if !output.status.success() {
            return Err(Jup2JekError::config(format!(
                "`{} --version` exited with {}: {}",
                self.command_line(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!(converter = %self.command_line(), %version, "converter found");
        Ok(version)
    }
}

impl NotebookConverter for NbConvert {
    #[instrument(skip_all, fields(notebook = %notebook))]
    async fn convert(&self, notebook: &Notebook) -> Result<()> {
        let path = notebook.path();

        let child = Command::new(&self.program)
            .args(&self.leading_args)
            .arg(path)
            .args(["--to", "markdown"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Jup2JekError::conversion(
                    path,
                    format!("failed to spawn `{}`: {e}", self.command_line()),
                )
            })?;

        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    Jup2JekError::conversion(
                        path,
                        format!("timed out after {:.1}s", limit.as_secs_f64()),
                    )
                })?,
            None => child.wait_with_output().await,
        };
        let output = waited.map_err(|e| Jup2JekError::io(path, e))?;

        if !output.status.success() {
            return Err(Jup2JekError::conversion(
                path,
                format!(
                    "`{}` exited with {}: {}",
                    self.command_line(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        debug!(stderr = %String::from_utf8_lossy(&output.stderr).trim(), "converter finished");
        Ok(())
    }
}
