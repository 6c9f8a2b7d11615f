//! Compliance evidence packaging.
//!
//! [`Exporter::export`] copies the files of an [`ExportPlan`] into a zip
//! archive with a SHA-256 manifest; [`verify_archive`] checks a package
//! against that manifest. Sequential, flat-file only.

pub mod error;
pub mod export;
pub mod hash;
pub mod manifest;
pub mod plan;
mod readme;
pub mod verify;

pub use error::ExportError;
pub use export::{ExportReport, Exporter, PlannedFile};
pub use manifest::{FileRecord, Manifest};
pub use plan::ExportPlan;
pub use verify::{verify_archive, Problem, VerifyReport};
