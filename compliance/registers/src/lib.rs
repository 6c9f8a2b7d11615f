//! Compliance registers: typed, validated access to the YAML compliance sources.
//!
//! Control mappings are read-only reference data, the evidence log is
//! append-only, and the risk register changes only through an explicit
//! status update. Everything here is flat-file I/O plus pure checks.

pub mod error;
pub mod evidence_log;
pub mod issue;
pub mod mapping;
pub mod paths;
pub mod questionnaire;
pub mod risk;
pub mod yaml;

pub use error::RegisterError;
pub use evidence_log::{EvidenceEntry, EvidenceLog, NewEvidence};
pub use issue::{Issue, IssueLevel};
pub use mapping::{ControlCounts, ControlEntry, ControlMapping, ControlStatus};
pub use paths::Paths;
pub use questionnaire::Questionnaire;
pub use risk::{RiskEntry, RiskLevel, RiskRegister, RiskStatus};
