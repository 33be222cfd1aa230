//! Process invocation boundary
//!
//! The decryptor never spawns processes directly; it goes through
//! [`ToolRunner`] so tests can script tool behaviour.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Captured result of one tool invocation.
///
/// `stdout` may hold plaintext, so the buffers are wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ToolOutput {
    /// Exit code, `None` if the process was killed by a signal
    #[zeroize(skip)]
    pub code: Option<i32>,
    #[zeroize(skip)]
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim_end().to_string()
    }
}

/// Runs a program with arguments and captures its output.
pub trait ToolRunner: Send + Sync {
    /// Run `program` with `args`, waiting for it to exit.
    ///
    /// A missing program must surface as an `io::Error` of kind `NotFound`.
    fn run(&self, program: &Path, args: &[OsString]) -> std::io::Result<ToolOutput>;
}

/// Spawns real processes with stdin closed so nothing can prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> std::io::Result<ToolOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        Ok(ToolOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
