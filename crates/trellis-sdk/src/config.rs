use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use trellis_graph::DEFAULT_MAX_COMMITS;

use crate::error::{SdkError, SdkResult};

/// Per-repository settings, stored as TOML in `.trellis/config.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    pub user: UserConfig,
    pub graph: GraphConfig,
    pub status: StatusConfig,
}

/// Identity recorded on new commits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub name: String,
    pub email: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            name: "Trellis User".into(),
            email: "user@localhost".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Most commits walked when building the history graph.
    pub max_commits: usize,
    /// Collapse linear chains of unreferenced commits.
    pub simplify: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_commits: DEFAULT_MAX_COMMITS,
            simplify: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Name of the ignore files honoured in the working tree.
    pub ignore_file: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            ignore_file: ".gitignore".into(),
        }
    }
}

impl RepoConfig {
    /// Read the config at `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> SdkResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }
}
