//! # Git Credentials
//!
//! Credentials for the deployment repository remote are resolved once per
//! process from [`Config`]. Secrets in the configuration are base64 encoded;
//! a value that does not decode is used as plain text with a warning.
//!
//! SSH key passphrases are handed to `ssh` through `SSH_ASKPASS`, pointing at
//! the gosh binary itself with the secret in [`ASKPASS_SECRET_ENV`]. The
//! binary answers such prompts via [`askpass_response`] before parsing its
//! command line.

use std::fmt;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, warn};

use crate::config::{AuthType, Config};
use crate::error::{Error, Result};

/// Environment variable carrying a key passphrase to the askpass helper.
pub const ASKPASS_SECRET_ENV: &str = "GOSH_ASKPASS_SECRET";

/// Credentials used by git operations against the remote.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum GitAuth {
    /// Rely on the user's git and ssh setup (agent, credential helpers).
    #[default]
    None,
    /// HTTP basic authentication.
    Basic { user: String, password: String },
    /// A private key file with an optional passphrase.
    SshKey {
        key_file: PathBuf,
        passphrase: Option<String>,
    },
}

impl fmt::Debug for GitAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitAuth::None => f.write_str("None"),
            GitAuth::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("password", &"***")
                .finish(),
            GitAuth::SshKey {
                key_file,
                passphrase,
            } => f
                .debug_struct("SshKey")
                .field("key_file", key_file)
                .field("passphrase", &passphrase.as_ref().map(|_| "***"))
                .finish(),
        }
    }
}

impl GitAuth {
    /// Resolve credentials from configuration.
    ///
    /// No auth settings yields [`GitAuth::None`]. An SSH key that does not
    /// exist is an error.
    pub fn from_config(config: &Config) -> Result<Self> {
        let Some(auth) = config.effective_auth() else {
            debug!("No git auth configured, using the default git setup");
            return Ok(GitAuth::None);
        };
        match auth.kind()? {
            AuthType::Basic => {
                let user = auth.user.filter(|u| !u.is_empty()).ok_or_else(|| Error::Auth {
                    message: "basic auth requires auth.user".to_string(),
                })?;
                let password = decode_secret(auth.pass.as_deref().unwrap_or_default());
                debug!("Using basic auth config for user {}", user);
                Ok(GitAuth::Basic { user, password })
            }
            AuthType::Ssh => {
                let key_file = auth
                    .private_key_file
                    .filter(|k| !k.is_empty())
                    .map(PathBuf::from)
                    .ok_or_else(|| Error::Auth {
                        message: "ssh auth requires auth.private_key_file".to_string(),
                    })?;
                if !key_file.is_file() {
                    return Err(Error::Auth {
                        message: format!("SSH key {} could not be read", key_file.display()),
                    });
                }
                let passphrase = auth
                    .private_key_pass
                    .as_deref()
                    .map(decode_secret)
                    .filter(|p| !p.is_empty());
                debug!("Using ssh auth config with key {}", key_file.display());
                Ok(GitAuth::SshKey {
                    key_file,
                    passphrase,
                })
            }
        }
    }
}

/// Decode a base64 secret, trimming one trailing newline.
///
/// Secrets that are not valid base64 (or not UTF-8 once decoded) are
/// returned unchanged.
pub fn decode_secret(encoded: &str) -> String {
    if encoded.is_empty() {
        return String::new();
    }
    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|e| e.to_string())
        .and_then(|bytes| String::from_utf8(bytes).map_err(|e| e.to_string()));
    match decoded {
        Ok(secret) => secret.strip_suffix('\n').map(str::to_string).unwrap_or(secret),
        Err(e) => {
            warn!(
                "Unable to decode Base64 encoded password from config, handling as plain text: {}",
                e
            );
            encoded.to_string()
        }
    }
}

/// The secret to print when gosh runs as an `SSH_ASKPASS` helper.
///
/// Only answers inside the environment set up for git, where
/// `SSH_ASKPASS_REQUIRE` is present as well.
pub fn askpass_response() -> Option<String> {
    std::env::var_os("SSH_ASKPASS_REQUIRE")?;
    std::env::var(ASKPASS_SECRET_ENV).ok()
}
