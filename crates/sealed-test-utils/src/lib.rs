//! Shared test utilities for the sealed workspace.
//!
//! In-memory stand-ins for everything the engine talks to, so sync
//! scenarios run without a destination host or real decrypt tools. It is a
//! dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`transport`]: [`FakeTransport`], an in-memory destination host
//! - [`installer`]: [`RecordingInstaller`], which installs into a `FakeTransport`
//! - [`runner`]: [`ScriptedRunner`], canned decrypt tool behaviour
//! - [`source`]: [`SourceDir`], encrypted source files on disk

pub mod installer;
pub mod runner;
pub mod source;
pub mod transport;

pub use installer::{InstallRecord, RecordingInstaller};
pub use runner::{ScriptedRunner, Step};
pub use source::SourceDir;
pub use transport::FakeTransport;
