//! Network configuration, signing secrets and contract interface files.

use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, ChainId};
use alloy_signer_local::{LocalSignerError, PrivateKeySigner};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    path::{Path, PathBuf},
};
use thiserror::Error;
use url::Url;

/// Errors raised while loading configuration artifacts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A JSON file is malformed.
    #[error("failed to parse {path}: {source}")]
    Json {
        /// The file that was parsed.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// No signing key is configured for a chain.
    #[error("no secret configured for chain {0}")]
    MissingSecret(String),

    /// The configured signing key is not a valid private key.
    #[error("invalid secret for chain {chain}: {source}")]
    InvalidSecret {
        /// The chain the key belongs to.
        chain: String,
        /// The underlying signer error.
        #[source]
        source: LocalSignerError,
    },
}

/// Configuration of one chain binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// The node endpoint. Subscriptions require a websocket endpoint.
    pub node_address: Url,
    /// The chain id stamped on every submission.
    pub chain_id: ChainId,
    /// Address of the protocol-registration contract.
    pub protocol_contract_address: Address,
    /// Path to the registration contract's interface description.
    pub protocol_abi_path: PathBuf,
    /// Address of the token-logic contract.
    pub token_contract_address: Address,
    /// Path to the token-logic contract's interface description.
    pub token_abi_path: PathBuf,
}

impl NetworkConfig {
    /// Resolves relative interface paths against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.protocol_abi_path.is_relative() {
            self.protocol_abi_path = base.join(&self.protocol_abi_path);
        }
        if self.token_abi_path.is_relative() {
            self.token_abi_path = base.join(&self.token_abi_path);
        }
    }
}

/// The relay configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Path to the secrets file.
    #[serde(default)]
    pub secret: Option<PathBuf>,
    /// Chain bindings keyed by chain name.
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
}

impl RelayConfig {
    /// Resolves every relative path against `base`, usually the directory of the config file.
    pub fn resolve_paths(&mut self, base: &Path) {
        if let Some(secret) = self.secret.as_mut().filter(|secret| secret.is_relative()) {
            *secret = base.join(&*secret);
        }
        self.networks.values_mut().for_each(|network| network.resolve_paths(base));
    }
}

/// Signing keys keyed by chain name.
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SecretStore {
    keys: HashMap<String, String>,
}

impl SecretStore {
    /// Loads the secrets file: a JSON object mapping chain name to hex private key.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = read(path)?;
        serde_json::from_str(&raw)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })
    }

    /// Returns `true` if a key is configured for `chain`.
    pub fn contains(&self, chain: &str) -> bool {
        self.keys.contains_key(chain)
    }

    /// Returns the signer for `chain`.
    pub fn signer(&self, chain: &str) -> Result<PrivateKeySigner, ConfigError> {
        let key = self.keys.get(chain).ok_or_else(|| ConfigError::MissingSecret(chain.to_string()))?;
        key.trim()
            .parse()
            .map_err(|source| ConfigError::InvalidSecret { chain: chain.to_string(), source })
    }
}

impl fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chains = self.keys.keys().collect::<Vec<_>>();
        chains.sort();
        f.debug_struct("SecretStore").field("chains", &chains).finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InterfaceFile {
    Abi(JsonAbi),
    Artifact { abi: JsonAbi },
}

/// Parses an interface description: either a bare ABI array or a build artifact with an `abi`
/// member.
pub fn parse_interface(raw: &str) -> Result<JsonAbi, serde_json::Error> {
    Ok(match serde_json::from_str(raw)? {
        InterfaceFile::Abi(abi) | InterfaceFile::Artifact { abi } => abi,
    })
}

/// Loads an interface description from `path`.
pub fn load_interface(path: &Path) -> Result<JsonAbi, ConfigError> {
    let raw = read(path)?;
    parse_interface(&raw).map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })
}
