//! `termshot_core` -- terminal screenshot capture and verification.
//!
//! This crate contains all behaviour; the `termshot-cli` binaries only parse
//! flags and map errors to exit codes.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`errors`] | `TermshotError` enum via `thiserror` |
//! | [`capture`] | `screencapture` flag translation and invocation |
//! | [`verify`] | launch / wait / capture / terminate / report workflow |
//! | [`report`] | fixed-shape JSON verification report |
//! | [`cleanup`] | `ArtifactGuard` RAII removal of screenshots |
//! | [`process`] | `PATH` lookup, `sysinfo` probing, launched-app handle |
//! | [`signal`] | interrupt flag and interruptible sleep |
//! | [`version`] | semantic version arithmetic and metadata mirroring |
//! | [`release`] | git / `gh` release sequence |

pub mod capture;
pub mod cleanup;
pub mod errors;
pub mod process;
pub mod release;
pub mod report;
pub mod signal;
pub mod verify;
pub mod version;
