//! # KYC Intake Core
//!
//! Pure decision logic for KYC document intake: encoding client folder
//! names, deciding which source files belong to a client, and deciding
//! whether a matching file would duplicate something already collected.
//!
//! This crate performs no filesystem I/O. Callers feed it names and
//! sizes read from disk and act on its answers.

pub mod context;
pub mod duplicate;
pub mod folder_name;
pub mod matching;
pub mod models;

pub use context::MatchContext;
pub use duplicate::{Classification, DEFAULT_NEAR_TOLERANCE};
pub use folder_name::{decode, encode, sanitize, ClientIdentity, FolderNameError};
pub use matching::{CandidateName, ExclusionVocabulary, MatchFilter, MatchOutcome, SearchPatterns};
pub use models::{ClientRecord, FolderEntry};
