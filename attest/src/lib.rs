// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The opaque remote-attestation capability.
//!
//! The mesh core never interprets quotes itself. A node holds a
//! [`QuoteIssuer`] and the coordinator holds a [`QuoteVerifier`]; any
//! concrete attestation technology plugs in behind this two-operation
//! interface. The [`mock`] module provides an in-process implementation
//! used by the test suites and by development wiring.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub mod mock;

/// Attestation requirements a package must satisfy, declared per package
/// in the manifest.
///
/// Empty byte fields are unconstrained, matching the manifest's "only check
/// what is declared" semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Requirements {
    /// Expected measurement of the package contents.
    #[serde(with = "hex", default)]
    pub unique_id: Vec<u8>,

    /// Expected identity of the package signer.
    #[serde(with = "hex", default)]
    pub signer_id: Vec<u8>,

    /// Minimum package security version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_security_version: Option<u32>,
}

/// The manifest-wide attestation floor: a minimum hardware security
/// version and the set of trusted root authorities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttestationFloor {
    /// Minimum hardware security-version number, compared bytewise: every
    /// reported byte must be at least the corresponding floor byte.
    #[serde(with = "hex", default)]
    pub min_cpu_svn: Vec<u8>,

    /// Authority name to trusted root certificate (PEM).
    #[serde(default)]
    pub root_cas: BTreeMap<String, String>,
}

/// The identity attributes extracted from a successfully verified quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub unique_id: Vec<u8>,
    pub security_version: u32,
}

/// Why a quote failed verification.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuoteError {
    #[error("quote is malformed: {0}")]
    Malformed(String),

    #[error("quote measurement does not match the required package")]
    MeasurementMismatch,

    #[error("quote signer does not match the required package signer")]
    SignerMismatch,

    #[error(
        "package security version {reported} is below the required \
         minimum {minimum}"
    )]
    StaleSecurityVersion { minimum: u32, reported: u32 },

    #[error("hardware security version is below the attestation floor")]
    StaleCpuSvn,

    #[error("quote is not rooted in a trusted authority: {authority:?}")]
    UntrustedRoot { authority: String },

    #[error("quote is not bound to this request's signing key")]
    BindingMismatch,

    #[error("failed to issue quote: {0}")]
    IssueFailed(String),
}

/// Produces attestation evidence for this node, covering `report_data`.
pub trait QuoteIssuer: Send + Sync {
    fn issue(&self, report_data: &[u8]) -> Result<Vec<u8>, QuoteError>;
}

/// Verifies attestation evidence against a package's requirements and the
/// manifest-wide floor, checking that the quote covers `report_data`.
pub trait QuoteVerifier: Send + Sync {
    fn verify(
        &self,
        quote: &[u8],
        report_data: &[u8],
        requirements: &Requirements,
        floor: &AttestationFloor,
    ) -> Result<VerifiedIdentity, QuoteError>;
}

/// The report data bound into a quote for an activation attempt: the
/// SHA-256 digest of the attempt's PEM-encoded signing request.
pub fn report_data_for_csr(csr_pem: &str) -> Vec<u8> {
    Sha256::digest(csr_pem.as_bytes()).to_vec()
}
