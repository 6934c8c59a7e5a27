//! Catalog credentials.
//!
//! # Storage layout
//!
//! ```text
//! ~/.lexicon/
//!   credentials.yaml   (site, api_key, timeout_secs)
//! ```
//!
//! Values are layered: explicit overrides (CLI flags or their environment
//! variables) win over the credentials file. Every function that touches the
//! home directory has an `_at(home, ...)` form; tests must use that one.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::lexicon::tools::error::{Result, ToolError};

/// Request timeout used when neither the file nor the caller sets one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Endpoint and access key handed to the catalog gateway.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Base URL of the catalog, without a trailing slash.
    pub site: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Credentials {
    pub fn new(site: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            site: normalize_site(&site.into()),
            api_key,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("site", &self.site)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub site: Option<String>,
    pub api_key: Option<String>,
    /// Explicit credentials file; must exist when given.
    pub config: Option<PathBuf>,
}

/// Shape of `credentials.yaml`. Every key is optional so a file may hold only
/// the site and leave the key to the environment.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CredentialsFile {
    site: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

/// `<home>/.lexicon/credentials.yaml`
pub fn credentials_path_at(home: &Path) -> PathBuf {
    home.join(".lexicon").join("credentials.yaml")
}

/// Resolves credentials against an explicit home directory.
///
/// A missing default file is not an error; a missing explicit file is.
pub fn resolve_at(home: Option<&Path>, overrides: Overrides) -> Result<Credentials> {
    let file = match &overrides.config {
        Some(path) => {
            if !path.exists() {
                return Err(ToolError::MissingInput(path.clone()));
            }
            load_file(path)?
        }
        None => match home.map(credentials_path_at) {
            Some(path) if path.exists() => load_file(&path)?,
            _ => CredentialsFile::default(),
        },
    };

    let site = overrides
        .site
        .or(file.site)
        .map(|site| normalize_site(&site))
        .filter(|site| !site.is_empty())
        .ok_or_else(|| {
            ToolError::Config(
                "no catalog site configured; pass --site, set LEXICON_SITE, \
                 or add `site` to ~/.lexicon/credentials.yaml"
                    .into(),
            )
        })?;
    let api_key = overrides
        .api_key
        .or(file.api_key)
        .filter(|key| !key.trim().is_empty());
    let timeout_secs = match file.timeout_secs {
        Some(0) => return Err(ToolError::Config("timeout_secs must be positive".into())),
        Some(secs) => secs,
        None => DEFAULT_TIMEOUT_SECS,
    };

    let credentials = Credentials {
        site,
        api_key,
        timeout_secs,
    };
    debug!(?credentials, "resolved catalog credentials");
    Ok(credentials)
}

/// [`resolve_at`] convenience wrapper using `dirs::home_dir()`.
pub fn resolve(overrides: Overrides) -> Result<Credentials> {
    resolve_at(dirs::home_dir().as_deref(), overrides)
}

fn load_file(path: &Path) -> Result<CredentialsFile> {
    let text = std::fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(CredentialsFile::default());
    }
    serde_yaml::from_str(&text).map_err(|source| ToolError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

fn normalize_site(site: &str) -> String {
    site.trim().trim_end_matches('/').to_string()
}
