//! # Resource Lifecycle
//!
//! The create/read/update/exists protocol shared by every inventory record.
//!
//! The set of record kinds is closed ([`ResourceKind`]); each kind implements
//! [`Resource`], which supplies its file path, validity check and the mapping
//! to and from a [`Document`]. The free functions in this module enforce the
//! invariants that protect persisted records:
//!
//! - `create` refuses invalid or already existing records.
//! - `read` is idempotent: once an instance is initialized, re-reading is a
//!   no-op, so in-memory changes are never clobbered by a second decode.
//! - `update` refuses instances that were never read. It writes the full
//!   in-memory state, so a blank instance would erase the record on disk.

use std::fmt;
use std::path::PathBuf;

use log::{info, trace};

use crate::document::{self, Document};
use crate::error::{Error, Result};

/// The closed set of inventory record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    App,
    AppGroup,
    Stage,
    Release,
}

impl ResourceKind {
    /// Label used in log lines and error messages.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::App => "app",
            ResourceKind::AppGroup => "app group",
            ResourceKind::Stage => "stage",
            ResourceKind::Release => "release",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Capabilities an inventory record exposes to the lifecycle functions.
pub trait Resource {
    /// Which record kind this is.
    fn kind(&self) -> ResourceKind;

    /// The record's name, used in messages.
    fn name(&self) -> &str;

    /// Absolute path of the record document.
    fn file_path(&self) -> PathBuf;

    /// Whether the struct is well formed (non-empty names and so on).
    fn is_valid(&self) -> bool;

    /// Build the on-disk document from the current in-memory state.
    fn to_document(&self) -> Document;

    /// Replace the in-memory state with the contents of `document`.
    fn apply_document(&mut self, document: &Document);

    /// Whether the instance has been read from disk.
    fn initialized(&self) -> bool;

    /// Record that the instance reflects the persisted state.
    fn mark_initialized(&mut self);

    /// Whether the record is present on disk.
    fn exists(&self) -> bool {
        self.file_path().is_file()
    }
}

fn validation_error<R: Resource + ?Sized>(resource: &R) -> Error {
    Error::Validation {
        resource_type: resource.kind().label(),
        name: resource.name().to_string(),
        message: "invalid struct, use the constructor to create one".to_string(),
    }
}

fn does_not_exist<R: Resource + ?Sized>(resource: &R) -> Error {
    Error::DoesNotExist {
        resource_type: resource.kind().label(),
        name: resource.name().to_string(),
    }
}

/// True iff the record's document exists as a regular file.
pub fn exists<R: Resource + ?Sized>(resource: &R) -> bool {
    resource.exists()
}

/// Persist a new record.
pub fn create<R: Resource + ?Sized>(resource: &R) -> Result<()> {
    trace!("Create {} '{}'", resource.kind(), resource.name());
    if !resource.is_valid() {
        return Err(validation_error(resource));
    }
    if resource.exists() {
        return Err(Error::AlreadyExists {
            resource_type: resource.kind().label(),
            name: resource.name().to_string(),
            hint: None,
        });
    }
    let path = resource.file_path();
    document::write_file(&path, &resource.to_document()).map_err(|e| {
        e.context(format!(
            "Error writing {} file '{}'",
            resource.kind(),
            path.display()
        ))
    })?;
    info!("Created {} '{}'", resource.kind(), resource.name());
    Ok(())
}

/// Load a record from disk, unless the instance was already read.
pub fn read<R: Resource + ?Sized>(resource: &mut R) -> Result<()> {
    if resource.initialized() {
        trace!(
            "{} '{}' already read, skipping",
            resource.kind(),
            resource.name()
        );
        return Ok(());
    }
    if !resource.is_valid() {
        return Err(validation_error(resource));
    }
    if !resource.exists() {
        return Err(does_not_exist(resource));
    }
    let path = resource.file_path();
    let document = document::read_file(&path).map_err(|e| {
        e.context(format!(
            "Could not read {} '{}' file",
            resource.kind(),
            resource.name()
        ))
    })?;
    resource.apply_document(&document);
    resource.mark_initialized();
    info!("Read {} '{}'", resource.kind(), resource.name());
    Ok(())
}

/// Overwrite an existing record with the full in-memory state.
pub fn update<R: Resource + ?Sized>(resource: &R) -> Result<()> {
    trace!("Update {} '{}'", resource.kind(), resource.name());
    if !resource.is_valid() {
        return Err(validation_error(resource));
    }
    if !resource.exists() {
        return Err(does_not_exist(resource));
    }
    if !resource.initialized() {
        return Err(Error::UpdatedWithoutReading {
            resource_type: resource.kind().label(),
            name: resource.name().to_string(),
        });
    }
    let path = resource.file_path();
    document::write_file(&path, &resource.to_document()).map_err(|e| {
        e.context(format!(
            "Could not update {} '{}'",
            resource.kind(),
            resource.name()
        ))
    })?;
    info!("Updated {} '{}'", resource.kind(), resource.name());
    Ok(())
}
