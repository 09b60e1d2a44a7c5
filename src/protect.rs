use crate::error::{BreakdownError, Result};
use log::info;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment variable carrying the passphrase to an external protector,
/// so it never appears on a command line.
pub const PASSPHRASE_ENV: &str = "BREAKDOWN_PASSPHRASE";

/// Re-saves a finished workbook so it requires a passphrase to open.
pub trait WorkbookProtector {
    fn protect(&self, path: &Path, passphrase: &str) -> Result<()>;
}

/// Delegates to an external program (for example a spreadsheet automation
/// script). It is invoked as `program [args..] <workbook path>` with the
/// passphrase in [`PASSPHRASE_ENV`].
#[derive(Debug, Clone)]
pub struct CommandProtector {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandProtector {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl WorkbookProtector for CommandProtector {
    fn protect(&self, path: &Path, passphrase: &str) -> Result<()> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .env(PASSPHRASE_ENV, passphrase)
            .output()
            .map_err(|e| {
                BreakdownError::Protection(format!(
                    "could not run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(BreakdownError::Protection(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        info!("Password-protected {}", path.display());
        Ok(())
    }
}
