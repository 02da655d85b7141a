// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Environment-derived bootstrap configuration.
//!
//! Every recognized option is read through the injected [`HostEnv`]
//! accessor and validated eagerly, before any network or filesystem
//! action. A missing or malformed value is a fatal precondition failure.

use camino::Utf8PathBuf;

use crate::host::HostEnv;

/// Network address of the coordinator.
pub const ENV_COORDINATOR_ADDR: &str = "MESH_COORDINATOR_ADDR";
/// This node's declared type name.
pub const ENV_NODE_TYPE: &str = "MESH_NODE_TYPE";
/// Path at which the per-attempt instance identifier is persisted.
pub const ENV_INSTANCE_ID_PATH: &str = "MESH_INSTANCE_ID_PATH";
/// Comma-separated subject alternative names for the node certificate.
pub const ENV_DNS_NAMES: &str = "MESH_DNS_NAMES";

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {0} is set but empty")]
    Empty(&'static str),

    #[error("{ENV_DNS_NAMES} contains an empty name: {0:?}")]
    EmptyDnsName(String),
}

/// Validated bootstrap configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub coordinator_addr: String,
    pub node_type: String,
    pub instance_id_path: Utf8PathBuf,
    /// Subject alternative names, in configured order.
    pub dns_names: Vec<String>,
}

impl Config {
    pub fn from_env(env: &dyn HostEnv) -> Result<Config, ConfigError> {
        let coordinator_addr = required(env, ENV_COORDINATOR_ADDR)?;
        let node_type = required(env, ENV_NODE_TYPE)?;
        let instance_id_path =
            Utf8PathBuf::from(required(env, ENV_INSTANCE_ID_PATH)?);
        let raw_names = required(env, ENV_DNS_NAMES)?;

        let dns_names: Vec<String> =
            raw_names.split(',').map(str::to_string).collect();
        if let Some(empty) = dns_names.iter().find(|n| n.is_empty()) {
            return Err(ConfigError::EmptyDnsName(empty.clone()));
        }

        Ok(Config {
            coordinator_addr,
            node_type,
            instance_id_path,
            dns_names,
        })
    }
}

fn required(
    env: &dyn HostEnv,
    name: &'static str,
) -> Result<String, ConfigError> {
    match env.get(name) {
        None => Err(ConfigError::Missing(name)),
        Some(value) if value.is_empty() => Err(ConfigError::Empty(name)),
        Some(value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryEnv;
    use assert_matches::assert_matches;

    fn full_env() -> InMemoryEnv {
        let env = InMemoryEnv::default();
        env.set(ENV_COORDINATOR_ADDR, "coordinator:2001");
        env.set(ENV_NODE_TYPE, "backend");
        env.set(ENV_INSTANCE_ID_PATH, "/var/mesh/instance-id");
        env.set(ENV_DNS_NAMES, "dns1,dns2");
        env
    }

    #[test]
    fn parses_a_complete_environment() {
        let config = Config::from_env(&full_env()).unwrap();
        assert_eq!(config.coordinator_addr, "coordinator:2001");
        assert_eq!(config.node_type, "backend");
        assert_eq!(config.instance_id_path, "/var/mesh/instance-id");
        assert_eq!(config.dns_names, vec!["dns1", "dns2"]);
    }

    #[test]
    fn each_variable_is_required() {
        for name in [
            ENV_COORDINATOR_ADDR,
            ENV_NODE_TYPE,
            ENV_INSTANCE_ID_PATH,
            ENV_DNS_NAMES,
        ] {
            let env = full_env();
            env.remove(name);
            assert_matches!(
                Config::from_env(&env),
                Err(ConfigError::Missing(missing)) if missing == name
            );
        }
    }

    #[test]
    fn empty_values_are_rejected() {
        let env = full_env();
        env.set(ENV_NODE_TYPE, "");
        assert_matches!(
            Config::from_env(&env),
            Err(ConfigError::Empty(ENV_NODE_TYPE))
        );
    }

    #[test]
    fn trailing_comma_is_rejected() {
        let env = full_env();
        env.set(ENV_DNS_NAMES, "dns1,");
        assert_matches!(
            Config::from_env(&env),
            Err(ConfigError::EmptyDnsName(_))
        );
    }

    #[test]
    fn a_single_name_needs_no_comma() {
        let env = full_env();
        env.set(ENV_DNS_NAMES, "only.mesh.internal");
        let config = Config::from_env(&env).unwrap();
        assert_eq!(config.dns_names, vec!["only.mesh.internal"]);
    }
}
