// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The coordinator's root certificate authority.
//!
//! A node proves possession of a fresh key pair with a PKCS#10 signing
//! request; after policy checks pass the coordinator signs that key under
//! its self-generated root. CSR parsing and signature verification use
//! x509-parser; issuance uses rcgen.

use mesh_types::IssuedIdentity;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams,
    CertificateSigningRequestParams, DnType, IsCa, KeyPair, SanType,
};
use x509_parser::prelude::*;

/// A signing request that failed validation.
#[derive(Debug, thiserror::Error)]
pub enum CsrError {
    #[error("signing request is not valid PEM-encoded PKCS#10: {0}")]
    BadEncoding(String),

    #[error("signing request signature does not verify")]
    BadSignature,

    #[error("signing request declares no subject alternative names")]
    NoSubjectNames,

    #[error(
        "signing request subject names {declared:?} do not match the \
         names required for this node type ({expected:?})"
    )]
    SubjectMismatch { expected: Vec<String>, declared: Vec<String> },
}

/// A parsed signing request whose self-signature has been verified.
#[derive(Debug, Clone)]
pub struct ValidatedCsr {
    pem: String,
    /// Declared subject alternative names, in CSR order.
    pub dns_names: Vec<String>,
}

/// Parse a PEM PKCS#10 request, verify its self-signature (proof of
/// possession of the matching private key), and extract its subject
/// alternative names.
pub fn validate_csr(pem: &str) -> Result<ValidatedCsr, CsrError> {
    let (_, parsed_pem) = x509_parser::pem::parse_x509_pem(pem.as_bytes())
        .map_err(|e| CsrError::BadEncoding(e.to_string()))?;
    if parsed_pem.label != "CERTIFICATE REQUEST" {
        return Err(CsrError::BadEncoding(format!(
            "unexpected PEM label {:?}",
            parsed_pem.label
        )));
    }
    let (_, csr) = X509CertificationRequest::from_der(&parsed_pem.contents)
        .map_err(|e| CsrError::BadEncoding(e.to_string()))?;
    csr.verify_signature().map_err(|_| CsrError::BadSignature)?;

    let mut dns_names = Vec::new();
    if let Some(extensions) = csr.requested_extensions() {
        for extension in extensions {
            if let ParsedExtension::SubjectAlternativeName(san) = extension {
                for name in &san.general_names {
                    if let GeneralName::DNSName(dns) = name {
                        dns_names.push(dns.to_string());
                    }
                }
            }
        }
    }
    if dns_names.is_empty() {
        return Err(CsrError::NoSubjectNames);
    }

    Ok(ValidatedCsr { pem: pem.to_string(), dns_names })
}

/// The coordinator's self-generated root of trust.
pub struct CertificateAuthority {
    root: Certificate,
    key: KeyPair,
    root_pem: String,
}

impl CertificateAuthority {
    /// Generate a fresh ECDSA P-256 root with the given common name.
    pub fn new(common_name: &str) -> Result<Self, rcgen::Error> {
        let key = KeyPair::generate()?;
        let mut params = CertificateParams::new(Vec::<String>::new())?;
        params.distinguished_name.push(DnType::CommonName, common_name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let root = params.self_signed(&key)?;
        let root_pem = root.pem();
        Ok(CertificateAuthority { root, key, root_pem })
    }

    /// PEM encoding of the root certificate.
    pub fn root_pem(&self) -> &str {
        &self.root_pem
    }

    /// Sign a validated request's public key under the root, carrying the
    /// request's subject names through and setting the subject common
    /// name to the admitted node type.
    ///
    /// Signing is a local, deterministic operation; a failure here is an
    /// internal fault, not attributable to the requester.
    pub fn issue(
        &self,
        csr: &ValidatedCsr,
        node_type: &str,
    ) -> Result<IssuedIdentity, rcgen::Error> {
        let mut params =
            CertificateSigningRequestParams::from_pem(&csr.pem)?;
        params.params.subject_alt_names = csr
            .dns_names
            .iter()
            .map(|name| Ok(SanType::DnsName(name.clone().try_into()?)))
            .collect::<Result<Vec<_>, rcgen::Error>>()?;
        params
            .params
            .distinguished_name
            .push(DnType::CommonName, node_type);
        let certificate = params.signed_by(&self.root, &self.key)?;
        Ok(IssuedIdentity {
            certificate: certificate.pem(),
            root: self.root_pem.clone(),
        })
    }
}
