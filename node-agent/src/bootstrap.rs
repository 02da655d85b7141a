// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bootstrap sequence.
//!
//! One attempt proceeds through: configuration, fresh key pair and
//! signing request, durable instance identifier, attestation quote,
//! activation call, installation of the returned parameters, handoff.
//! Any failure aborts without handing off control, leaving node-visible
//! state untouched except for the persisted identifier, which is written
//! unconditionally before the network call so repeated attempts stay
//! correlatable.

use camino::Utf8PathBuf;
use mesh_attest::{QuoteError, QuoteIssuer, report_data_for_csr};
use mesh_types::{ActivationRequest, IssuedIdentity};
use rcgen::{CertificateParams, KeyPair};
use secrecy::SecretString;
use slog::{Logger, info, o};
use std::io;
use uuid::Uuid;

use crate::client::{ActivateClient, ActivateClientError};
use crate::config::{Config, ConfigError};
use crate::host::{HostEnv, HostFs};

/// Argument vector installed when the coordinator returns an empty one:
/// run the original program with no arguments.
pub const DEFAULT_ARGV0: &str = "./node";

/// Why a bootstrap attempt aborted. The node's real workload must not
/// run after any of these.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("invalid bootstrap configuration")]
    Precondition(#[from] ConfigError),

    #[error("failed to generate signing request")]
    Csr(#[source] rcgen::Error),

    #[error("failed to persist instance identifier at {path}")]
    IdentifierPersist {
        path: Utf8PathBuf,
        #[source]
        err: io::Error,
    },

    #[error("instance identifier at {path} is not a valid UUID")]
    IdentifierCorrupt { path: Utf8PathBuf },

    #[error("failed to obtain attestation quote")]
    Quote(#[source] QuoteError),

    #[error("activation failed")]
    Activation(#[from] ActivateClientError),

    #[error("failed to install file {path}")]
    InstallFile {
        path: Utf8PathBuf,
        #[source]
        err: io::Error,
    },

    #[error("environment value for {name:?} is not valid UTF-8")]
    NonUtf8Env { name: String },
}

/// Everything the entry point needs to start the real workload: the
/// minted identity, the matching private key, and the argument vector.
#[derive(Debug)]
pub struct Handoff {
    pub identity: IssuedIdentity,
    pub private_key: SecretString,
    pub argv: Vec<String>,
}

/// Run one complete bootstrap attempt.
///
/// Configuration is read through `env` and validated before anything
/// else happens. On success the returned parameters are fully installed
/// through `fs` and `env` before the [`Handoff`] is returned; on failure
/// nothing is installed.
pub async fn bootstrap(
    log: &Logger,
    issuer: &dyn QuoteIssuer,
    client: &dyn ActivateClient,
    fs: &dyn HostFs,
    env: &dyn HostEnv,
) -> Result<Handoff, BootstrapError> {
    let config = Config::from_env(env)?;
    let log = log.new(o!("node_type" => config.node_type.clone()));

    // Fresh key pair and signing request for this attempt; neither is
    // ever reused.
    let key = KeyPair::generate().map_err(BootstrapError::Csr)?;
    let csr = CertificateParams::new(config.dns_names.clone())
        .and_then(|params| params.serialize_request(&key))
        .and_then(|csr| csr.pem())
        .map_err(BootstrapError::Csr)?;

    // Durable attempt marker, written before any network interaction.
    let instance_id = load_or_create_instance_id(fs, &config)?;
    info!(log, "instance identifier persisted";
        "instance_id" => instance_id.to_string());

    let quote = issuer
        .issue(&report_data_for_csr(&csr))
        .map_err(BootstrapError::Quote)?;
    info!(log, "attestation quote obtained");

    let request = ActivationRequest {
        node_type: config.node_type.clone(),
        instance_id,
        quote,
        csr,
    };
    let response =
        client.activate(&config.coordinator_addr, &request).await?;
    info!(log, "activation granted; installing parameters";
        "files" => response.parameters.files.len(),
        "env" => response.parameters.env.len());

    for (path, data) in &response.parameters.files {
        fs.write(path, data).map_err(|err| {
            BootstrapError::InstallFile { path: path.clone(), err }
        })?;
    }
    for (name, value) in &response.parameters.env {
        let value = std::str::from_utf8(value).map_err(|_| {
            BootstrapError::NonUtf8Env { name: name.clone() }
        })?;
        env.set(name, value);
    }
    let argv = if response.parameters.argv.is_empty() {
        vec![DEFAULT_ARGV0.to_string()]
    } else {
        response.parameters.argv.clone()
    };

    Ok(Handoff {
        identity: response.identity,
        private_key: SecretString::new(key.serialize_pem()),
        argv,
    })
}

/// Reuse the identifier persisted by a prior partial run, or generate
/// and persist a fresh one. Either way an identifier exists on disk
/// before this returns; a write failure is fatal.
fn load_or_create_instance_id(
    fs: &dyn HostFs,
    config: &Config,
) -> Result<Uuid, BootstrapError> {
    let path = &config.instance_id_path;
    match fs.read(path) {
        Ok(bytes) => std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| BootstrapError::IdentifierCorrupt {
                path: path.clone(),
            }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let id = Uuid::new_v4();
            fs.write(path, id.to_string().as_bytes()).map_err(|err| {
                BootstrapError::IdentifierPersist {
                    path: path.clone(),
                    err,
                }
            })?;
            Ok(id)
        }
        Err(err) => Err(BootstrapError::IdentifierPersist {
            path: path.clone(),
            err,
        }),
    }
}
