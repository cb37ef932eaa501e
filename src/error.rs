//! # Error Handling
//!
//! This module defines the centralized error type for `gosh`. It uses the
//! `thiserror` library to build a single `Error` enum that covers every
//! failure mode of the inventory, the record codec and the repository
//! synchronizer.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant carries the resource type, name
//!   or path involved so that messages are actionable on their own.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! ## Context and root causes
//!
//! Errors are enriched on their way up with [`Error::context`], which wraps
//! the original error in [`Error::Context`]. Callers that need to branch on
//! the underlying condition (for example "create the stage if it does not
//! exist") use [`Error::root`], which unwraps every context layer and the
//! two partial-write wrappers (`GroupRegistration`, `PartiallySynchronized`).

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for gosh operations
#[derive(Error, Debug)]
pub enum Error {
    /// A resource struct is malformed, usually an empty name.
    #[error("Invalid {resource_type} '{name}': {message}")]
    Validation {
        resource_type: &'static str,
        name: String,
        message: String,
    },

    /// The resource is not present in the inventory.
    #[error("The {resource_type} '{name}' does not exist")]
    DoesNotExist {
        resource_type: &'static str,
        name: String,
    },

    /// The resource is already present in the inventory.
    #[error("The {resource_type} '{name}' already exists{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    AlreadyExists {
        resource_type: &'static str,
        name: String,
        hint: Option<String>,
    },

    /// An update was attempted on an instance that was never read from disk.
    ///
    /// Writing it would replace the persisted record with a blank one.
    #[error("The {resource_type} '{name}' was updated before being read from disk, read it first to avoid data loss")]
    UpdatedWithoutReading {
        resource_type: &'static str,
        name: String,
    },

    /// Adding a new app to its group index failed; the app file at `path`
    /// was removed again.
    #[error("App '{app}' could not be registered in group '{group}', {} was not kept: {source}", path.display())]
    GroupRegistration {
        app: String,
        group: String,
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// The stage was written, but its shadow release could not follow.
    #[error("Stage '{stage}' was written but its shadow release is out of sync: {source}")]
    PartiallySynchronized {
        stage: String,
        #[source]
        source: Box<Error>,
    },

    /// A required argument was empty.
    #[error("Missing required argument: {argument}")]
    MissingArgument { argument: String },

    /// The record file does not exist on disk.
    #[error("Resource file not found: {}", path.display())]
    ResourceNotFound { path: PathBuf },

    /// A record document could not be parsed.
    #[error("Could not parse record document {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A record document could not be serialized.
    #[error("Could not encode record document {origin}: {source}")]
    Encode {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// An I/O error on a specific path.
    #[error("I/O error on {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The app does not define the requested artifact type.
    #[error("App '{app}' has no '{artifact_type}' artifact")]
    NoSuchArtifact { app: String, artifact_type: String },

    /// No artifact repository URL is configured for a referenced type.
    #[error("Artifact repository error for type '{repository_type}': {message}\n  hint: add artifact_repositories.{repository_type}.default to your configuration")]
    ArtifactRepository {
        repository_type: String,
        message: String,
    },

    /// An artifact template still contains a gosh placeholder after substitution.
    #[error("Unresolved placeholder '{placeholder}' in artifact of app '{app}'")]
    UnresolvedPlaceholder { app: String, placeholder: String },

    /// The working directory is not a clone of the configured deployment repository.
    #[error("Invalid deployment repository at {}: {message}", path.display())]
    InvalidDeploymentRepository { path: PathBuf, message: String },

    /// The working directory is empty and must be initialized first.
    #[error("Working directory {} is empty", path.display())]
    WorkingDirEmpty { path: PathBuf },

    /// The working directory is not empty and cannot be cloned into.
    #[error("Working directory {} is not empty", path.display())]
    WorkingDirNotEmpty { path: PathBuf },

    /// An error occurred while cloning the deployment repository.
    #[error("Git clone error for {url}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        url: String,
        message: String,
        hint: Option<String>,
    },

    /// A git command exited unsuccessfully.
    #[error("Git command failed: {command} - {stderr}")]
    GitCommand { command: String, stderr: String },

    /// Credentials could not be resolved from configuration.
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// The configuration could not be loaded.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        hint: Option<String>,
    },

    /// A release type string is not one of stage, product, hotfix.
    #[error("Unsupported release type '{value}' (expected one of: stage, product, hotfix)")]
    UnsupportedReleaseType { value: String },

    /// A release full name is malformed or uses a reserved type.
    #[error("Invalid release name '{name}', must be 'type/name' and type 'stage' is reserved")]
    InvalidReleaseName { name: String },

    /// An app template could not be rendered.
    #[error("Template error in '{name}': {message}")]
    Template { name: String, message: String },

    /// The named app template does not exist.
    #[error("App template '{name}' not found at {}", path.display())]
    TemplateNotFound { name: String, path: PathBuf },

    /// No built-in or installed import plugin has this name.
    #[error("Import plugin '{name}' not found in built-in plugins or {}", path.display())]
    PluginNotFound { name: String, path: PathBuf },

    /// An import plugin failed.
    #[error("Import plugin '{name}' failed: {message}")]
    Plugin { name: String, message: String },

    /// An `import` argument is not one of the importable parts.
    #[error("Unsupported import part '{value}' (expected one of: all, apps, stages, releases)")]
    UnsupportedImportPart { value: String },

    /// The list output format is unknown.
    #[error("Unsupported output format '{format}' (expected one of: yaml, properties, json)")]
    UnsupportedOutputFormat { format: String },

    /// Additional context around another error.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error outside of record documents (configuration, manifests).
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap this error with a message describing what was being attempted.
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The original condition underneath any context or partial-write wrapper.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. }
            | Error::GroupRegistration { source, .. }
            | Error::PartiallySynchronized { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when the root cause is a missing resource.
    pub fn is_does_not_exist(&self) -> bool {
        matches!(
            self.root(),
            Error::DoesNotExist { .. } | Error::ResourceNotFound { .. }
        )
    }

    /// True when the root cause is a resource that already exists.
    pub fn is_already_exists(&self) -> bool {
        matches!(self.root(), Error::AlreadyExists { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Extension for attaching context to results.
pub trait ResultExt<T> {
    /// Wrap the error, if any, with a context message built lazily.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}
