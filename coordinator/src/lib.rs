// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The coordinator: trust root of the mesh.
//!
//! Given an already-validated [`mesh_types::Manifest`], the coordinator
//! decides for each activation attempt whether the requesting node's
//! attested identity matches policy, and if so mints a certificate under
//! its root authority and hands back the node type's parameter bundle.
//! Admission is quota-bounded per node type and race-free under
//! concurrent load; the [`ledger::ActivationLedger`] is the only mutable
//! state.

pub mod activation;
pub mod ca;
pub mod ledger;

pub use activation::{ActivateError, Coordinator};
pub use ca::{CertificateAuthority, CsrError, ValidatedCsr, validate_csr};
pub use ledger::{ActivationLedger, QuotaExceeded};
