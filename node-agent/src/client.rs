// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The activation-call seam.
//!
//! The concrete transport (attested channel, wire encoding) lives behind
//! this trait. The call blocks until the coordinator answers or the
//! transport fails; deadlines and retries belong to the caller's
//! supervisor, not here.

use async_trait::async_trait;
use mesh_types::{ActivationRequest, ActivationResponse};

/// The activation call failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ActivateClientError {
    /// The coordinator reached a decision and it was a denial.
    #[error("coordinator rejected activation: {0}")]
    Rejected(String),

    /// The call never completed.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Performs the activation RPC against the coordinator.
#[async_trait]
pub trait ActivateClient: Send + Sync {
    async fn activate(
        &self,
        coordinator_addr: &str,
        request: &ActivationRequest,
    ) -> Result<ActivationResponse, ActivateClientError>;
}
