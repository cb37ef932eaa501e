//! # gosh Library
//!
//! This library provides the core of the `gosh` command-line tool: a resource
//! model for a git-backed "deployment repository" that records which version
//! of every application is deployed on every stage, and which versions make
//! up every release.
//!
//! ## Quick Example
//!
//! ```
//! use gosh::inventory::{Inventory, Stage};
//!
//! let dir = tempfile::TempDir::new().unwrap();
//! let inventory = Inventory::new(dir.path());
//! inventory.scaffold().unwrap();
//!
//! let mut stage = Stage::new(&inventory, "alpha");
//! stage.versions.insert("app1".to_string(), "1.0.0".to_string());
//! stage.create().unwrap();
//!
//! // The stage is mirrored by a release of type `stage`.
//! let mut shadow = stage.shadow_release();
//! shadow.read().unwrap();
//! assert_eq!(shadow.versions, stage.versions);
//! ```
//!
//! ## Core Concepts
//!
//! - **Record documents (`document`)**: every record is a YAML file with
//!   `classes` and `parameters`, decoded and encoded in one place.
//!
//! - **Resources (`resource`)**: the create, read, update and exists lifecycle
//!   shared by all records. An update is refused unless the record was read
//!   first, so a blank instance never overwrites persisted data.
//!
//! - **Inventory (`inventory`)**: apps, app groups, stages and releases, and
//!   the path conventions that place them under `inventory/classes`.
//!
//! - **Queries (`versions`)**: version maps filtered by group or app, and
//!   artifact URLs rendered from per-app templates.
//!
//! - **Synchronizer (`repository`)**: keeps the working directory a valid
//!   clone of the configured remote and pulls, commits and pushes through the
//!   system `git` (`git`).
//!
//! - **Import (`importer`)**: bulk import through built-in and external
//!   plugins, applied through the public entity operations only.
//!
//! ## Ambient modules
//!
//! - `config`: layered configuration (home, project, environment).
//! - `auth`: git credentials resolved from configuration.
//! - `listing`: output formats of `gosh list`.
//! - `defaults`, `error`, `suggestions`.

pub mod auth;
pub mod config;
pub mod defaults;
pub mod document;
pub mod error;
pub mod git;
pub mod importer;
pub mod inventory;
pub mod listing;
pub mod repository;
pub mod resource;
pub mod suggestions;
pub mod versions;

pub use error::{Error, Result};
