//! Remote state probing with directory-collision correction

use crate::error::{Error, Result};
use crate::remote::{RemoteState, Transport};
use crate::resolve::DestinationTarget;

/// Outcome of probing a destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// The target after any collision correction
    pub target: DestinationTarget,
    /// What the final target currently holds
    pub state: RemoteState,
}

/// Queries destination state through a transport.
pub struct RemoteStateProbe<'a> {
    transport: &'a dyn Transport,
}

impl<'a> RemoteStateProbe<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Probe `target`. If a literal path turns out to be an existing
    /// directory, append `name` and probe exactly once more.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Probe`] when the transport cannot answer.
    pub fn probe(&self, target: DestinationTarget, name: &str) -> Result<ProbeReport> {
        let state = self.stat(&target)?;

        if state.is_directory() && !target.directory_intent {
            let corrected = target.collision_corrected(name);
            tracing::debug!(
                from = %target.path,
                to = %corrected.path,
                "Destination is a directory, re-probing"
            );
            let state = self.stat(&corrected)?;
            return Ok(ProbeReport {
                target: corrected,
                state,
            });
        }

        Ok(ProbeReport {
            target,
            state,
        })
    }

    fn stat(&self, target: &DestinationTarget) -> Result<RemoteState> {
        let state = self
            .transport
            .stat(&target.path)
            .map_err(|source| Error::Probe {
                path: target.path.to_string(),
                source,
            })?;
        tracing::debug!(path = %target.path, state = %state.label(), "Probed destination");
        Ok(state)
    }
}
