// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire types for the activation exchange. The transport carrying them is
//! out of scope; these are the logical request and response.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::params::ParameterBundle;

/// One node's attempt to activate, carrying everything the coordinator
/// needs for a single, complete admission decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRequest {
    /// Node-type name; must be declared in the coordinator's manifest.
    pub node_type: String,

    /// Node-generated identifier for this attempt, persisted by the node
    /// before the call so repeated attempts are correlatable.
    pub instance_id: Uuid,

    /// Opaque attestation evidence covering this request's signing key.
    pub quote: Vec<u8>,

    /// PEM-encoded PKCS#10 certificate signing request. The key pair is
    /// freshly generated per attempt and never reused.
    pub csr: String,
}

/// Identity material minted for an admitted node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedIdentity {
    /// PEM leaf certificate bound to the request's public key.
    pub certificate: String,

    /// PEM root certificate of the coordinator's authority, to which the
    /// leaf chains.
    pub root: String,
}

/// A granted activation: the minted identity plus the node type's declared
/// parameter bundle, forwarded unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationResponse {
    pub identity: IssuedIdentity,
    pub parameters: ParameterBundle,
}
