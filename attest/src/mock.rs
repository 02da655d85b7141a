// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-process mock attestation.
//!
//! A [`MockIssuer`] embeds the identity it claims directly into a
//! JSON-encoded quote; [`MockVerifier`] enforces the same policy checks a
//! hardware verifier would (measurement, signer, security versions,
//! trusted root, report-data binding) against that claimed identity.
//! There is deliberately no cryptography here.

use serde::{Deserialize, Serialize};

use crate::{
    AttestationFloor, QuoteError, QuoteIssuer, QuoteVerifier, Requirements,
    VerifiedIdentity,
};

/// The claimed identity carried inside a mock quote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockQuote {
    pub unique_id: Vec<u8>,
    pub signer_id: Vec<u8>,
    pub security_version: u32,
    pub cpu_svn: Vec<u8>,
    /// Name of the authority the quote claims to chain to.
    pub authority: String,
    pub report_data: Vec<u8>,
}

/// Issues mock quotes claiming a fixed identity.
#[derive(Debug, Clone, Default)]
pub struct MockIssuer {
    pub unique_id: Vec<u8>,
    pub signer_id: Vec<u8>,
    pub security_version: u32,
    pub cpu_svn: Vec<u8>,
    pub authority: String,
}

impl QuoteIssuer for MockIssuer {
    fn issue(&self, report_data: &[u8]) -> Result<Vec<u8>, QuoteError> {
        let quote = MockQuote {
            unique_id: self.unique_id.clone(),
            signer_id: self.signer_id.clone(),
            security_version: self.security_version,
            cpu_svn: self.cpu_svn.clone(),
            authority: self.authority.clone(),
            report_data: report_data.to_vec(),
        };
        serde_json::to_vec(&quote)
            .map_err(|e| QuoteError::IssueFailed(e.to_string()))
    }
}

/// Verifies mock quotes by checking the claimed identity against policy.
#[derive(Debug, Clone, Default)]
pub struct MockVerifier;

impl QuoteVerifier for MockVerifier {
    fn verify(
        &self,
        quote: &[u8],
        report_data: &[u8],
        requirements: &Requirements,
        floor: &AttestationFloor,
    ) -> Result<VerifiedIdentity, QuoteError> {
        let quote: MockQuote = serde_json::from_slice(quote)
            .map_err(|e| QuoteError::Malformed(e.to_string()))?;

        if quote.report_data != report_data {
            return Err(QuoteError::BindingMismatch);
        }
        if !floor.root_cas.is_empty()
            && !floor.root_cas.contains_key(&quote.authority)
        {
            return Err(QuoteError::UntrustedRoot {
                authority: quote.authority,
            });
        }
        if !requirements.unique_id.is_empty()
            && quote.unique_id != requirements.unique_id
        {
            return Err(QuoteError::MeasurementMismatch);
        }
        if !requirements.signer_id.is_empty()
            && quote.signer_id != requirements.signer_id
        {
            return Err(QuoteError::SignerMismatch);
        }
        if let Some(minimum) = requirements.min_security_version {
            if quote.security_version < minimum {
                return Err(QuoteError::StaleSecurityVersion {
                    minimum,
                    reported: quote.security_version,
                });
            }
        }
        if quote.cpu_svn.len() < floor.min_cpu_svn.len()
            || quote
                .cpu_svn
                .iter()
                .zip(floor.min_cpu_svn.iter())
                .any(|(got, min)| got < min)
        {
            return Err(QuoteError::StaleCpuSvn);
        }

        Ok(VerifiedIdentity {
            unique_id: quote.unique_id,
            security_version: quote.security_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report_data_for_csr;
    use assert_matches::assert_matches;

    fn issuer() -> MockIssuer {
        MockIssuer {
            unique_id: vec![0xa1; 4],
            signer_id: vec![0xb2; 4],
            security_version: 3,
            cpu_svn: vec![4, 4],
            authority: "vendor".to_string(),
        }
    }

    fn requirements() -> Requirements {
        Requirements {
            unique_id: vec![0xa1; 4],
            signer_id: vec![0xb2; 4],
            min_security_version: Some(2),
        }
    }

    fn floor() -> AttestationFloor {
        AttestationFloor {
            min_cpu_svn: vec![3, 3],
            root_cas: [("vendor".to_string(), "PEM".to_string())]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn valid_quote_verifies() {
        let report_data = report_data_for_csr("csr pem");
        let quote = issuer().issue(&report_data).unwrap();
        let identity = MockVerifier
            .verify(&quote, &report_data, &requirements(), &floor())
            .unwrap();
        assert_eq!(identity.unique_id, vec![0xa1; 4]);
        assert_eq!(identity.security_version, 3);
    }

    #[test]
    fn measurement_mismatch_is_rejected() {
        let report_data = report_data_for_csr("csr pem");
        let mut issuer = issuer();
        issuer.unique_id = vec![0xff; 4];
        let quote = issuer.issue(&report_data).unwrap();
        assert_matches!(
            MockVerifier.verify(&quote, &report_data, &requirements(), &floor()),
            Err(QuoteError::MeasurementMismatch)
        );
    }

    #[test]
    fn stale_security_version_is_rejected() {
        let report_data = report_data_for_csr("csr pem");
        let mut issuer = issuer();
        issuer.security_version = 1;
        let quote = issuer.issue(&report_data).unwrap();
        assert_matches!(
            MockVerifier.verify(&quote, &report_data, &requirements(), &floor()),
            Err(QuoteError::StaleSecurityVersion { minimum: 2, reported: 1 })
        );
    }

    #[test]
    fn stale_cpu_svn_is_rejected() {
        let report_data = report_data_for_csr("csr pem");
        let mut issuer = issuer();
        issuer.cpu_svn = vec![3, 2];
        let quote = issuer.issue(&report_data).unwrap();
        assert_matches!(
            MockVerifier.verify(&quote, &report_data, &requirements(), &floor()),
            Err(QuoteError::StaleCpuSvn)
        );
    }

    #[test]
    fn untrusted_authority_is_rejected() {
        let report_data = report_data_for_csr("csr pem");
        let mut issuer = issuer();
        issuer.authority = "interloper".to_string();
        let quote = issuer.issue(&report_data).unwrap();
        assert_matches!(
            MockVerifier.verify(&quote, &report_data, &requirements(), &floor()),
            Err(QuoteError::UntrustedRoot { authority }) if authority == "interloper"
        );
    }

    #[test]
    fn report_data_binding_is_enforced() {
        let quote = issuer().issue(&report_data_for_csr("csr pem")).unwrap();
        let other = report_data_for_csr("different csr");
        assert_matches!(
            MockVerifier.verify(&quote, &other, &requirements(), &floor()),
            Err(QuoteError::BindingMismatch)
        );
    }

    #[test]
    fn malformed_quote_is_rejected() {
        let report_data = report_data_for_csr("csr pem");
        assert_matches!(
            MockVerifier.verify(b"not json", &report_data, &requirements(), &floor()),
            Err(QuoteError::Malformed(_))
        );
    }

    #[test]
    fn empty_requirements_are_unconstrained() {
        let report_data = report_data_for_csr("csr pem");
        let quote = issuer().issue(&report_data).unwrap();
        let identity = MockVerifier
            .verify(
                &quote,
                &report_data,
                &Requirements::default(),
                &AttestationFloor::default(),
            )
            .unwrap();
        assert_eq!(identity.security_version, 3);
    }
}
