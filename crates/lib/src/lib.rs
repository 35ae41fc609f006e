//! langpacks-lib: automation of the Ubuntu language pack pipeline
//!
//! This crate provides everything the `langpacks-agent` binary does:
//! - `langpacks`: the service steps (install, checkout update, build, upload,
//!   crontab and signing-key management)
//! - `charm`: the mapping from platform lifecycle events and actions to
//!   service calls and unit status
//! - `launchpad`: the active-series query used to validate releases
//! - `exec`, `apt`, `git`, `fetch`: the external collaborators the steps drive

pub mod apt;
pub mod charm;
pub mod config;
pub mod consts;
pub mod exec;
pub mod fetch;
pub mod git;
pub mod langpacks;
pub mod launchpad;

#[cfg(test)]
mod testutil;
