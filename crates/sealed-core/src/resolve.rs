//! Destination resolution
//!
//! Turns the requested destination into a concrete path. The answer is
//! provisional: the probe may correct it once real remote state is known.

use sealed_fs::RemotePath;

use crate::error::{Error, Result};
use crate::remote::Transport;

/// A concrete destination for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationTarget {
    /// Resolved destination path
    pub path: RemotePath,
    /// The request ended with a separator ("put it in this directory")
    pub directory_intent: bool,
    /// The path was extended because it collided with an existing directory
    pub auto_resolved: bool,
}

impl DestinationTarget {
    /// Apply the trailing-separator rule to an already expanded path.
    pub fn from_request(requested: &RemotePath, name: &str) -> Self {
        if requested.has_trailing_separator() {
            Self {
                path: requested.join(name),
                directory_intent: true,
                auto_resolved: false,
            }
        } else {
            Self {
                path: requested.clone(),
                directory_intent: false,
                auto_resolved: false,
            }
        }
    }

    /// The target after a literal path turned out to be a directory.
    pub fn collision_corrected(&self, name: &str) -> Self {
        Self {
            path: self.path.join(name),
            directory_intent: self.directory_intent,
            auto_resolved: true,
        }
    }
}

/// Resolves requested destinations against the remote user's home.
pub struct DestinationResolver<'a> {
    transport: &'a dyn Transport,
}

impl<'a> DestinationResolver<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Resolve `requested` for a file that will be named `name` when placed
    /// inside a directory.
    pub fn resolve(&self, requested: &str, name: &str) -> Result<DestinationTarget> {
        let requested = RemotePath::new(requested);
        let expanded = self
            .transport
            .expand_user(&requested)
            .map_err(|source| Error::Probe {
                path: requested.to_string(),
                source,
            })?;

        let target = DestinationTarget::from_request(&expanded, name);
        tracing::debug!(
            requested = %requested,
            resolved = %target.path,
            directory_intent = target.directory_intent,
            "Resolved destination"
        );
        Ok(target)
    }
}
