// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared types for the mesh control plane: the manifest trust policy,
//! per-node-type parameter bundles, and the activation wire types exchanged
//! between a node's bootstrap sequence and the coordinator.

mod activation;
mod manifest;
mod params;

pub use activation::{ActivationRequest, ActivationResponse, IssuedIdentity};
pub use manifest::{InvalidManifest, Manifest, NodeType, UnknownNodeType};
pub use params::ParameterBundle;
