// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The manifest: declarative trust policy for the mesh.
//!
//! A manifest binds package identities (attestation requirements), a global
//! attestation floor, node-type definitions, and pre-authorized client
//! certificates. It is loaded once, validated, and never mutated afterwards;
//! the coordinator shares it by reference across concurrent activations.

use mesh_attest::{AttestationFloor, Requirements};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::params::ParameterBundle;

/// Declarative trust policy governing which nodes may join the mesh and
/// what they receive when they do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Manifest {
    /// Package name to attestation requirements for that package.
    #[serde(default)]
    pub packages: BTreeMap<String, Requirements>,

    /// Global attestation floor applied to every package.
    #[serde(default)]
    pub attestation: AttestationFloor,

    /// Node-type name to its definition.
    #[serde(default)]
    pub node_types: BTreeMap<String, NodeType>,

    /// Client identity name to PEM certificate, used for administrative
    /// authorization. Carried in the model; not consulted during
    /// activation.
    #[serde(default)]
    pub clients: BTreeMap<String, String>,
}

/// One type of node admitted by the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NodeType {
    /// Name of the package this node type must attest as. Must be a key in
    /// [`Manifest::packages`].
    pub package: String,

    /// Maximum number of activations granted for this node type. Zero
    /// means unlimited.
    #[serde(default)]
    pub max_activations: u32,

    /// When present, the exact subject alternative names (in order) a
    /// node's signing request must declare.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_names: Option<Vec<String>>,

    /// Runtime payload returned verbatim on successful activation.
    #[serde(default)]
    pub parameters: ParameterBundle,
}

/// A manifest that failed structural validation.
#[derive(Debug, thiserror::Error)]
pub enum InvalidManifest {
    #[error("failed to parse manifest")]
    Parse(#[from] serde_json::Error),

    #[error("manifest contains an empty {0} name")]
    EmptyName(&'static str),

    #[error(
        "node type {node_type:?} references unknown package {package:?}"
    )]
    UnknownPackage { node_type: String, package: String },

    #[error("node type {node_type:?} has an empty {map} key")]
    EmptyParameterKey { node_type: String, map: &'static str },
}

/// Lookup failure for a node-type name absent from the manifest.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown node type {0:?}")]
pub struct UnknownNodeType(pub String);

impl Manifest {
    /// Parse a JSON manifest and validate it in one step.
    pub fn from_json(data: &[u8]) -> Result<Manifest, InvalidManifest> {
        let manifest: Manifest = serde_json::from_slice(data)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check the structural invariants: non-empty names, every node type's
    /// package resolvable, non-empty parameter keys.
    pub fn validate(&self) -> Result<(), InvalidManifest> {
        if self.packages.keys().any(|k| k.is_empty()) {
            return Err(InvalidManifest::EmptyName("package"));
        }
        if self.node_types.keys().any(|k| k.is_empty()) {
            return Err(InvalidManifest::EmptyName("node type"));
        }
        if self.clients.keys().any(|k| k.is_empty()) {
            return Err(InvalidManifest::EmptyName("client"));
        }
        for (name, node_type) in &self.node_types {
            if !self.packages.contains_key(&node_type.package) {
                return Err(InvalidManifest::UnknownPackage {
                    node_type: name.clone(),
                    package: node_type.package.clone(),
                });
            }
            if let Some(map) = node_type.parameters.first_empty_key() {
                return Err(InvalidManifest::EmptyParameterKey {
                    node_type: name.clone(),
                    map,
                });
            }
        }
        Ok(())
    }

    /// Look up a node type by name.
    pub fn node_type(
        &self,
        name: &str,
    ) -> Result<&NodeType, UnknownNodeType> {
        self.node_types
            .get(name)
            .ok_or_else(|| UnknownNodeType(name.to_string()))
    }

    /// Resolve the attestation requirements governing a node type: the
    /// package requirements it is bound to plus the global floor.
    pub fn requirements_for(
        &self,
        node_type: &str,
    ) -> Result<(&Requirements, &AttestationFloor), UnknownNodeType> {
        let nt = self.node_type(node_type)?;
        // validate() guarantees the package key resolves.
        let requirements = self
            .packages
            .get(&nt.package)
            .ok_or_else(|| UnknownNodeType(node_type.to_string()))?;
        Ok((requirements, &self.attestation))
    }

    /// The parameter bundle declared for a node type.
    pub fn parameters_for(
        &self,
        node_type: &str,
    ) -> Result<&ParameterBundle, UnknownNodeType> {
        Ok(&self.node_type(node_type)?.parameters)
    }
}
