#![doc = "Common types shared across the analog clock workspace."]

pub mod config;
pub mod error;
pub mod mailbox;
pub mod snapshot;

pub use config::*;
pub use error::*;
pub use mailbox::*;
pub use snapshot::*;
