//! # Record Codec
//!
//! Every inventory record is stored as a YAML document with two top-level
//! keys:
//!
//! ```yaml
//! classes:
//!   - apps.platform.app1
//! parameters:
//!   app1:
//!     artifacts:
//!       maven: "[gosh:repo:maven]/app1-[gosh:version].zip"
//! ```
//!
//! `classes` is an ordered list of dotted include references and
//! `parameters` holds arbitrarily nested values keyed by entity name. This
//! module maps raw bytes to a [`Document`] and back. Entity-specific shapes
//! live with the entities themselves.
//!
//! `parameters` is a [`serde_yaml::Mapping`], which keeps insertion order, so
//! re-encoding a document does not reorder keys and git diffs stay small.

use std::fs;
use std::path::Path;

use log::{debug, trace};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

/// File extension used for every record document.
pub const RECORD_EXTENSION: &str = "yml";

/// The generic on-disk record shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Dotted include references, kept in order.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub classes: Vec<String>,

    /// Nested parameters keyed by entity name.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Mapping::is_empty"
    )]
    pub parameters: Mapping,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// The parameter block for `name`, if present.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// The parameter block for `name` when it is a mapping.
    ///
    /// A missing or null block yields `None`; callers treat that as an empty
    /// collection.
    pub fn parameter_mapping(&self, name: &str) -> Option<&Mapping> {
        self.parameter(name).and_then(Value::as_mapping)
    }

    /// Replace the parameter block for `name`.
    pub fn set_parameter(&mut self, name: &str, value: Value) {
        self.parameters.insert(Value::String(name.to_string()), value);
    }
}

/// Decode a record document from raw bytes.
pub fn decode(bytes: &[u8]) -> Result<Document> {
    decode_from(bytes, "<inline>")
}

fn decode_from(bytes: &[u8], origin: &str) -> Result<Document> {
    // An empty file is a valid, empty record.
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::default());
    }
    serde_yaml::from_slice(bytes).map_err(|source| Error::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Encode a record document to YAML bytes.
pub fn encode(document: &Document) -> Result<Vec<u8>> {
    encode_for(document, "<inline>")
}

fn encode_for(document: &Document, origin: &str) -> Result<Vec<u8>> {
    serde_yaml::to_string(document)
        .map(String::into_bytes)
        .map_err(|source| Error::Encode {
            origin: origin.to_string(),
            source,
        })
}

/// Read and decode the record document at `path`.
///
/// An empty path is a [`Error::MissingArgument`], a path that is not a
/// regular file is [`Error::ResourceNotFound`] and corrupt content is
/// [`Error::Parse`].
pub fn read_file(path: &Path) -> Result<Document> {
    if path.as_os_str().is_empty() || path.to_string_lossy().trim().is_empty() {
        return Err(Error::MissingArgument {
            argument: "record path".to_string(),
        });
    }
    if !path.is_file() {
        return Err(Error::ResourceNotFound {
            path: path.to_path_buf(),
        });
    }
    debug!("Reading record {}", path.display());
    let bytes = fs::read(path).map_err(|source| Error::FileIo {
        path: path.to_path_buf(),
        source,
    })?;
    let document = decode_from(&bytes, &path.display().to_string())?;
    trace!("Read record {}: {:?}", path.display(), document);
    Ok(document)
}

/// Encode `document` and write it to `path`, creating parent directories.
pub fn write_file(path: &Path, document: &Document) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::MissingArgument {
            argument: "record path".to_string(),
        });
    }
    let bytes = encode_for(document, &path.display().to_string())?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::FileIo {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    debug!("Writing record {}", path.display());
    fs::write(path, bytes).map_err(|source| Error::FileIo {
        path: path.to_path_buf(),
        source,
    })
}
