// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The runtime payload a node type is provisioned with on activation:
/// files to install, environment variables to set, and the argument vector
/// that replaces the node's own invocation arguments.
///
/// The coordinator treats the bundle as opaque data and forwards it
/// verbatim; only the node's bootstrap sequence interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterBundle {
    /// Destination path to file content.
    #[serde(default)]
    pub files: BTreeMap<Utf8PathBuf, Vec<u8>>,

    /// Environment variable name to value.
    #[serde(default)]
    pub env: BTreeMap<String, Vec<u8>>,

    /// Replacement argument vector. Empty means "run the original program
    /// with no arguments".
    #[serde(default)]
    pub argv: Vec<String>,
}

impl ParameterBundle {
    /// Returns the name of the first empty `files` or `env` key, if any.
    ///
    /// Values may be empty; keys may not.
    pub(crate) fn first_empty_key(&self) -> Option<&'static str> {
        if self.files.keys().any(|p| p.as_str().is_empty()) {
            return Some("files");
        }
        if self.env.keys().any(|k| k.is_empty()) {
            return Some("env");
        }
        None
    }
}
