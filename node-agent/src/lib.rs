// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node-side bootstrap: everything that runs before a node's real
//! workload starts.
//!
//! The bootstrap sequence proves this node's runtime identity to the
//! coordinator and, on admission, installs the returned secrets,
//! environment and argument vector before handing control to the
//! workload. On any failure it aborts without mutating node-visible
//! state, except for the persisted attempt identifier.

pub mod bootstrap;
pub mod client;
pub mod config;
pub mod host;

pub use bootstrap::{BootstrapError, Handoff, bootstrap};
pub use client::{ActivateClient, ActivateClientError};
pub use config::{Config, ConfigError};
