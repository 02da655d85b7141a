// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The activation handler: one call, one complete admission decision.
//!
//! Checks run strictly in order: resolve the node type, verify the quote,
//! validate the signing request, reserve a quota slot, sign, return the
//! parameter bundle. A quota slot is reserved only after attestation and
//! request validation succeed, so malformed or malicious requests cannot
//! exhaust legitimate capacity. Reservation happens before signing; a
//! late signing fault (an internal error) consumes the slot, which is an
//! accepted trade-off of the protocol. There is no retry inside the
//! handler.

use mesh_attest::{QuoteError, QuoteVerifier, report_data_for_csr};
use mesh_types::{ActivationRequest, ActivationResponse, Manifest};
use slog::{Logger, debug, info, o, warn};

use crate::ca::{CertificateAuthority, CsrError, validate_csr};
use crate::ledger::ActivationLedger;

/// Why an activation attempt was denied. Every variant is terminal for
/// the attempt.
#[derive(Debug, thiserror::Error)]
pub enum ActivateError {
    #[error("unknown node type {0:?}")]
    UnknownNodeType(String),

    #[error("attestation failed")]
    AttestationFailed(#[source] QuoteError),

    #[error("invalid activation request")]
    InvalidRequest(#[source] CsrError),

    #[error("activation quota exhausted for node type {node_type:?}")]
    QuotaExceeded { node_type: String },

    #[error("certificate signing failed")]
    SigningFailed(#[source] rcgen::Error),
}

/// Coordinator-side state for serving activations: the immutable manifest
/// and signing material, plus the mutable activation ledger.
///
/// Safe to share by reference across any number of concurrent callers;
/// the ledger is the only synchronization point.
pub struct Coordinator<V> {
    manifest: Manifest,
    verifier: V,
    ca: CertificateAuthority,
    ledger: ActivationLedger,
    log: Logger,
}

impl<V: QuoteVerifier> Coordinator<V> {
    /// Validate the manifest and stand up a coordinator with a zeroed
    /// ledger for every declared node type.
    pub fn new(
        log: &Logger,
        manifest: Manifest,
        verifier: V,
        ca: CertificateAuthority,
    ) -> Result<Self, mesh_types::InvalidManifest> {
        manifest.validate()?;
        let ledger = ActivationLedger::new(
            manifest.node_types.keys().map(String::as_str),
        );
        Ok(Coordinator {
            manifest,
            verifier,
            ca,
            ledger,
            log: log.new(o!("component" => "coordinator")),
        })
    }

    /// PEM encoding of the coordinator's root certificate.
    pub fn root_pem(&self) -> &str {
        self.ca.root_pem()
    }

    /// Activations granted so far for a node type, for audit.
    pub fn granted(&self, node_type: &str) -> u32 {
        self.ledger.granted(node_type)
    }

    /// Decide one activation attempt.
    pub fn activate(
        &self,
        request: &ActivationRequest,
    ) -> Result<ActivationResponse, ActivateError> {
        let log = self.log.new(o!(
            "node_type" => request.node_type.clone(),
            "instance_id" => request.instance_id.to_string(),
        ));

        let result = self.activate_inner(request);
        match &result {
            Ok(_) => {
                info!(log, "activation granted";
                    "granted" => self.ledger.granted(&request.node_type));
            }
            Err(error) => {
                warn!(log, "activation denied"; "error" => %error);
            }
        }
        result
    }

    fn activate_inner(
        &self,
        request: &ActivationRequest,
    ) -> Result<ActivationResponse, ActivateError> {
        // 1. Resolve the claimed node type.
        let node_type =
            self.manifest.node_type(&request.node_type).map_err(|_| {
                ActivateError::UnknownNodeType(request.node_type.clone())
            })?;
        let (requirements, floor) = self
            .manifest
            .requirements_for(&request.node_type)
            .map_err(|_| {
                ActivateError::UnknownNodeType(request.node_type.clone())
            })?;

        // 2. Verify the quote against the package requirements and the
        // manifest-wide floor. The quote must cover this request's CSR.
        let identity = self
            .verifier
            .verify(
                &request.quote,
                &report_data_for_csr(&request.csr),
                requirements,
                floor,
            )
            .map_err(ActivateError::AttestationFailed)?;

        // 3. Validate the signing request: proof of possession and, when
        // the manifest constrains this node type's subject names, an
        // exact ordered match.
        let csr = validate_csr(&request.csr)
            .map_err(ActivateError::InvalidRequest)?;
        if let Some(expected) = &node_type.subject_names {
            if &csr.dns_names != expected {
                return Err(ActivateError::InvalidRequest(
                    CsrError::SubjectMismatch {
                        expected: expected.clone(),
                        declared: csr.dns_names.clone(),
                    },
                ));
            }
        }

        // 4. Reserve a quota slot. Nothing before this point mutated any
        // state, so a failed attempt never consumes capacity.
        self.ledger
            .try_reserve(&request.node_type, node_type.max_activations)
            .map_err(|e| ActivateError::QuotaExceeded {
                node_type: e.node_type,
            })?;

        // 5. Mint the certificate.
        let issued = self
            .ca
            .issue(&csr, &request.node_type)
            .map_err(ActivateError::SigningFailed)?;

        debug!(self.log, "issued identity";
            "node_type" => &request.node_type,
            "security_version" => identity.security_version,
            "unique_id" => hex::encode(&identity.unique_id));

        // 6. Return the declared parameter bundle unchanged.
        Ok(ActivationResponse {
            identity: issued,
            parameters: node_type.parameters.clone(),
        })
    }
}
