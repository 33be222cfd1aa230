//! Decryption with bounded retry and strategy fallback

use std::path::Path;
use std::time::Duration;

use crate::error::{DecryptError, Result};
use crate::plaintext::Plaintext;
use crate::runner::ToolRunner;
use crate::strategy::Strategy;

/// Attempts given to each strategy before falling back to the next
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Decrypts encrypted sources by invoking external tools.
///
/// Strategies are tried in order. Each one gets its own budget of attempts;
/// a tool that exits non-zero is retried until the budget runs out, then the
/// next strategy takes over. A tool that is not installed is skipped at once.
/// Empty output is a hard failure and is never retried.
pub struct Decryptor {
    strategies: Vec<Strategy>,
    runner: Box<dyn ToolRunner>,
    attempts: u32,
    retry_delay: Duration,
}

impl Decryptor {
    pub fn new(strategies: Vec<Strategy>, runner: impl ToolRunner + 'static) -> Self {
        Self {
            strategies,
            runner: Box::new(runner),
            attempts: DEFAULT_ATTEMPTS,
            retry_delay: Duration::ZERO,
        }
    }

    /// Attempts per strategy (at least one).
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Pause between attempts of the same strategy.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Decrypt `source`, returning its non-empty plaintext.
    ///
    /// # Errors
    ///
    /// - [`DecryptError::NoStrategies`] if no strategy is configured
    /// - [`DecryptError::NoOutput`] if a tool succeeded but printed nothing
    /// - [`DecryptError::Exhausted`] carrying the last failure once every
    ///   strategy has been tried
    pub fn decrypt(&self, source: &Path) -> Result<Plaintext> {
        if self.strategies.is_empty() {
            return Err(DecryptError::NoStrategies);
        }

        let mut last_error = None;

        for strategy in &self.strategies {
            let argv = strategy.argv(source);

            for attempt in 1..=self.attempts {
                tracing::debug!(
                    tool = strategy.name(),
                    attempt,
                    source = %source.display(),
                    "Invoking decrypt tool"
                );

                let mut output = match self.runner.run(strategy.program(), &argv) {
                    Ok(output) => output,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        tracing::warn!(tool = strategy.name(), "Decrypt tool not found, falling back");
                        last_error = Some(DecryptError::ToolNotFound {
                            tool: strategy.name().to_string(),
                        });
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(tool = strategy.name(), attempt, error = %e, "Decrypt tool could not be started");
                        last_error = Some(DecryptError::Spawn {
                            tool: strategy.name().to_string(),
                            source: e,
                        });
                        self.pause_before_retry(attempt);
                        continue;
                    }
                };

                if !output.success {
                    let err = DecryptError::CommandFailed {
                        tool: strategy.name().to_string(),
                        code: output.code.unwrap_or(-1),
                        stderr: output.stderr_lossy(),
                    };
                    tracing::warn!(tool = strategy.name(), attempt, error = %err, "Decrypt attempt failed");
                    last_error = Some(err);
                    self.pause_before_retry(attempt);
                    continue;
                }

                let stdout = std::mem::take(&mut output.stdout);
                return match Plaintext::try_new(stdout) {
                    Some(plaintext) => {
                        tracing::debug!(
                            tool = strategy.name(),
                            attempt,
                            bytes = plaintext.len(),
                            "Decrypted source"
                        );
                        Ok(plaintext)
                    }
                    None => Err(DecryptError::NoOutput {
                        tool: strategy.name().to_string(),
                        path: source.to_path_buf(),
                    }),
                };
            }

            tracing::warn!(tool = strategy.name(), "Decrypt strategy exhausted");
        }

        Err(DecryptError::Exhausted {
            path: source.to_path_buf(),
            last: Box::new(last_error.unwrap_or(DecryptError::NoStrategies)),
        })
    }

    fn pause_before_retry(&self, attempt: u32) {
        if attempt < self.attempts && !self.retry_delay.is_zero() {
            std::thread::sleep(self.retry_delay);
        }
    }
}

impl std::fmt::Debug for Decryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decryptor")
            .field("strategies", &self.strategies)
            .field("attempts", &self.attempts)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}
