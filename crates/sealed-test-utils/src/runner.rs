//! [`ScriptedRunner`]: decrypt tools with canned behaviour.

use std::collections::{BTreeMap, VecDeque};
use std::ffi::OsString;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use sealed_decrypt::{ToolOutput, ToolRunner};

/// What one invocation of a tool does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Exit 0 printing these bytes
    Output(Vec<u8>),
    /// Exit non-zero with this stderr
    Fail(i32, String),
    /// The program is not installed
    Missing,
}

impl Step {
    pub fn output(bytes: &[u8]) -> Self {
        Step::Output(bytes.to_vec())
    }

    pub fn fail() -> Self {
        Step::Fail(2, "gpg: decryption failed: No secret key".to_string())
    }
}

#[derive(Debug, Default)]
struct State {
    scripts: BTreeMap<String, VecDeque<Step>>,
    calls: Vec<(String, Vec<OsString>)>,
}

/// Tool runner that replays scripted steps per program name.
///
/// Programs are matched by file name, so `/usr/bin/gpg` and `gpg` share a
/// script. A program with no steps left fails; one never scripted is
/// missing.
///
/// # Example
///
/// ```
/// use sealed_test_utils::{ScriptedRunner, Step};
///
/// let runner = ScriptedRunner::new()
///     .script("regpg", [Step::fail(), Step::fail(), Step::fail()])
///     .script("gpg", [Step::output(b"hunter2")]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    state: Arc<Mutex<State>>,
}

fn program_name(program: &Path) -> String {
    program
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runner whose first tool prints `plaintext` every time.
    pub fn always(program: &str, plaintext: &[u8]) -> Self {
        Self::new().script(program, std::iter::repeat_n(Step::output(plaintext), 16))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append steps to `program`'s script.
    pub fn script(self, program: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.lock()
            .scripts
            .entry(program.to_string())
            .or_default()
            .extend(steps);
        self
    }

    /// Program names invoked, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.iter().map(|(p, _)| p.clone()).collect()
    }

    /// Full argument vectors of every invocation.
    pub fn invocations(&self) -> Vec<(String, Vec<OsString>)> {
        self.lock().calls.clone()
    }
}

impl ToolRunner for ScriptedRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> std::io::Result<ToolOutput> {
        let name = program_name(program);
        let mut state = self.lock();
        state.calls.push((name.clone(), args.to_vec()));

        let Some(script) = state.scripts.get_mut(&name) else {
            return Err(std::io::ErrorKind::NotFound.into());
        };
        match script.pop_front() {
            Some(Step::Output(bytes)) => Ok(ToolOutput::success(bytes)),
            Some(Step::Fail(code, stderr)) => Ok(ToolOutput::failure(code, stderr)),
            Some(Step::Missing) => Err(std::io::ErrorKind::NotFound.into()),
            None => Ok(ToolOutput::failure(2, "no more scripted steps")),
        }
    }
}
