// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # afstats-observability
//!
//! Logging infrastructure for the autofocus statistics pipeline.
//!
//! Every crate in the workspace logs through `tracing`; this crate owns the
//! subscriber setup and the per-crate debug flags (`--debug-afstats-pipeline`,
//! `AFSTATS_DEBUG=all`, ...).
//!
//! Log lines carry a bracketed component tag so they can be grepped out of a
//! busy camera log:
//!
//! | Tag           | Component                          |
//! |---------------|------------------------------------|
//! | `[AF-ORCH]`   | request orchestration              |
//! | `[AF-IO]`     | property reads and publishes       |
//! | `[AF-PD]`     | phase-detection processing         |
//! | `[AF-DEPS]`   | dependency declaration             |
//! | `[AF-ENABLE]` | PDAF enablement decisions          |

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Workspace crate names accepted by the debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "afstats",
    "afstats-structures",
    "afstats-config",
    "afstats-pipeline",
];
