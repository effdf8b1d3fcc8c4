//! # KYC Intake
//!
//! A local tool that provisions one folder per KYC client under a dated
//! root directory and collects each client's documents into it from an
//! arbitrary source tree, without piling up duplicate copies.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────────────────┐
//! │ Intake (CSV) │──▶│  Dated root       │◀──│ Collector            │
//! │ → folders    │   │  "KYC docs DATE"  │   │ walk → match → dedup │
//! └──────────────┘   └────────┬─────────┘   └──────────────────────┘
//!                             │
//!            ┌────────────────┼────────────────┐
//!            ▼                ▼                ▼
//!      ┌──────────┐    ┌────────────┐    ┌──────────┐
//!      │Inventory │    │ Zip export │    │ Summary  │
//!      └──────────┘    └────────────┘    └──────────┘
//! ```
//!
//! Matching and duplicate classification live in the `kyc-intake-core`
//! crate; this crate owns the filesystem side and the CLI/HTTP surfaces.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`dated_root`] | Per-day root directory |
//! | [`intake`] | Client table → client folders |
//! | [`collector`] | Document collection sweep and single-client retry |
//! | [`inventory`] | Client folder listing and empty-folder query |
//! | [`archive`] | Zip export |
//! | [`report`] | CSV summary export |
//! | [`server`] | Local HTTP API |

pub mod archive;
pub mod collector;
pub mod config;
pub mod dated_root;
pub mod error;
pub mod intake;
pub mod inventory;
pub mod logging;
pub mod progress;
pub mod report;
pub mod server;
