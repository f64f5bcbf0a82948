use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::contract::{default_state_version, ResourceState};
use crate::error::StateError;

/// Last-applied state of every tracked resource, keyed by resource name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateDocument {
    #[serde(default = "default_state_version")]
    pub version: String,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceState>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            version: default_state_version(),
            resources: BTreeMap::new(),
        }
    }
}

impl StateDocument {
    /// Reads a state file. A missing file is an empty document.
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let body = match fs::read(path) {
            Ok(value) => value,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(StateError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_slice(&body).map_err(|source| StateError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the document next to `path` and renames it into place.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let body = serde_json::to_vec_pretty(self).map_err(|source| StateError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        let staging_path = path.with_extension("json.tmp");
        fs::write(&staging_path, body).map_err(|source| StateError::Io {
            path: staging_path.clone(),
            source,
        })?;
        fs::rename(&staging_path, path).map_err(|source| StateError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, name: &str) -> Option<&ResourceState> {
        self.resources.get(name)
    }
}
