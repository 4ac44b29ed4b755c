//! Access to the Avi controller REST API

pub mod client;
pub mod error;

pub use client::{AviControllerClient, ObjectFetcher, ObjectQuery};
#[cfg(test)]
pub use client::StaticFetcher;
pub use error::{ExportError, ExportResult};
