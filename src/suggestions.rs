//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Following CLI recommendations,
//! errors should tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gosh::suggestions;
//!
//! // Instead of:
//! stage.read()?;
//!
//! // Use:
//! stage.read().map_err(suggestions::explain)?;
//! ```

use std::path::Path;

use crate::error::Error;
use crate::importer::{BUILTIN_PLUGINS, IMPORT_PARTS};
use crate::inventory::ReleaseType;

/// Convert a library error into a CLI error, adding a hint when the root
/// cause is one users commonly hit.
pub fn explain(error: Error) -> anyhow::Error {
    let hint = hint_for(error.root());
    match hint {
        Some(hint) => anyhow::anyhow!("{error}\n\nhint: {hint}"),
        None => anyhow::Error::new(error),
    }
}

fn hint_for(error: &Error) -> Option<String> {
    match error {
        Error::WorkingDirEmpty { .. } => Some(
            "Run 'gosh init clone <url>' or 'gosh init new' to set up the working directory"
                .to_string(),
        ),
        Error::InvalidDeploymentRepository { .. } => Some(
            "Check --workdir/GOSH_WORKING_DIR and repository.url in your configuration".to_string(),
        ),
        Error::UpdatedWithoutReading { .. } => {
            Some("This is a bug in the caller: read the resource before updating it".to_string())
        }
        Error::DoesNotExist {
            resource_type: "stage",
            name,
        } => Some(format!("Create it with 'gosh create stage {name}'")),
        Error::DoesNotExist {
            resource_type: "app",
            name,
        } => Some(format!(
            "Create it with 'gosh create app {name} --group <group>'"
        )),
        Error::InvalidReleaseName { .. } | Error::UnsupportedReleaseType { .. } => Some(format!(
            "Use '<type>/<name>' where type is one of: {}",
            user_release_types().join(", ")
        )),
        Error::PluginNotFound { name, path } => Some(unknown_plugin_hint(name, path)),
        Error::UnsupportedImportPart { value } => {
            find_similar(&value.to_ascii_lowercase(), IMPORT_PARTS)
                .map(|part| format!("Did you mean '{part}'?"))
        }
        _ => None,
    }
}

fn user_release_types() -> Vec<&'static str> {
    ReleaseType::ALL
        .iter()
        .filter(|t| **t != ReleaseType::Stage)
        .map(|t| t.as_str())
        .collect()
}

fn unknown_plugin_hint(name: &str, plugin_dir: &Path) -> String {
    let did_you_mean = find_similar(name, BUILTIN_PLUGINS)
        .map(|s| format!("Did you mean '{s}'? "))
        .unwrap_or_default();
    format!(
        "{did_you_mean}Run 'gosh import plugins' to list plugins, or copy an executable to {}",
        plugin_dir.display()
    )
}

/// Generate an error for a mutation when no repository URL is configured.
///
/// Includes hints about where the URL can be set.
pub fn repository_url_missing() -> anyhow::Error {
    anyhow::anyhow!(
        "No deployment repository URL configured\n\n\
         hint: Set repository.url in ~/.gosh/config.yml or .gosh/config.yml\n\
         hint: Set the GOSH_REPOSITORY_URL environment variable\n\
         hint: Run 'gosh config' to see all configuration options"
    )
}

/// Generate an error for `create release` without a version source.
pub fn release_source_missing() -> anyhow::Error {
    anyhow::anyhow!(
        "A release needs a source of versions\n\n\
         hint: Use --from-stage/-S <stage> to copy the versions of a stage\n\
         hint: Use --from-release/-R <type>/<name> to copy another release"
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (a_len, b_len) = (a_chars.len(), b_chars.len());
    if a_len == 0 || b_len == 0 {
        return a_len.max(b_len);
    }

    let mut previous: Vec<usize> = (0..=b_len).collect();
    let mut current = vec![0usize; b_len + 1];
    for i in 1..=a_len {
        current[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b_len]
}
