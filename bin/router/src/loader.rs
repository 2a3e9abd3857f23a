//! Loads the router configuration and connects the configured chains.

use anyhow::{Context, Result, bail};
use omni_relay::{
    ChainBinding, ChainRelay, RelayOptions,
    config::{RelayConfig, SecretStore, load_interface},
    ledger::AlloyLedger,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info};

/// The loaded configuration and the secrets it refers to.
#[derive(Debug)]
pub(crate) struct Settings {
    pub(crate) config: RelayConfig,
    pub(crate) secrets: SecretStore,
}

/// Reads the TOML configuration at `path` and the secrets file it names.
///
/// Relative paths inside the configuration are resolved against its directory. `secret` overrides
/// the configured secrets file.
pub(crate) fn load_settings(path: &Path, secret: Option<&Path>) -> Result<Settings> {
    debug!(target: "router", path = %path.display(), "Loading configuration");
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let mut config: RelayConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base);

    if config.networks.is_empty() {
        bail!("config file {} declares no networks", path.display());
    }

    let secret_path: PathBuf = match secret {
        Some(secret) => secret.to_path_buf(),
        None => config.secret.clone().context("no secrets file configured")?,
    };
    let secrets = SecretStore::load(&secret_path)?;

    if let Some(chain) = config.networks.keys().find(|chain| !secrets.contains(chain)) {
        bail!("secrets file {} has no key for chain {chain}", secret_path.display());
    }

    Ok(Settings { config, secrets })
}

/// Connects every configured chain and initializes its relay.
pub(crate) async fn connect(
    settings: &Settings,
    options: RelayOptions,
) -> Result<Vec<Arc<ChainRelay<AlloyLedger>>>> {
    let mut relays = Vec::with_capacity(settings.config.networks.len());

    for (name, network) in &settings.config.networks {
        info!(target: "router", chain = %name, endpoint = %network.node_address, "Initializing chain");

        let signer = settings.secrets.signer(name)?;
        let protocol_abi = load_interface(&network.protocol_abi_path)?;
        let token_abi = load_interface(&network.token_abi_path)?;

        let binding = ChainBinding::connect(name, network, signer, protocol_abi, token_abi)
            .await
            .with_context(|| format!("failed to connect chain {name}"))?;
        let relay = ChainRelay::initialize(binding, options)
            .with_context(|| format!("failed to index outcome events of chain {name}"))?;
        relays.push(Arc::new(relay));
    }

    Ok(relays)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    const CONFIG: &str = r#"
secret = "secret.json"

[networks.alpha]
node_address = "ws://127.0.0.1:8546"
chain_id = 31337
protocol_contract_address = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512"
protocol_abi_path = "abi/OmniverseProtocol.json"
token_contract_address = "0x5fbdb2315678afecb367f032d93f642f64180aa3"
token_abi_path = "abi/SkywalkerFungible.json"

[networks.beta]
node_address = "ws://127.0.0.1:8547"
chain_id = 31338
protocol_contract_address = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512"
protocol_abi_path = "/opt/abi/OmniverseProtocol.json"
token_contract_address = "0x5fbdb2315678afecb367f032d93f642f64180aa3"
token_abi_path = "/opt/abi/SkywalkerFungible.json"
"#;

    fn workspace(config: &str, secrets: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), config).unwrap();
        fs::write(dir.path().join("secret.json"), secrets).unwrap();
        dir
    }

    #[test]
    fn test_load_multi_network_config() {
        let dir = workspace(CONFIG, &format!(r#"{{"alpha":"{KEY}","beta":"{KEY}"}}"#));

        let settings = load_settings(&dir.path().join("config.toml"), None).unwrap();

        let networks = &settings.config.networks;
        assert_eq!(networks.keys().collect::<Vec<_>>(), ["alpha", "beta"]);
        assert_eq!(networks["alpha"].chain_id, 31337);
        assert_eq!(networks["beta"].node_address.as_str(), "ws://127.0.0.1:8547/");
        assert_eq!(
            networks["alpha"].protocol_abi_path,
            dir.path().join("abi/OmniverseProtocol.json")
        );
        assert_eq!(networks["beta"].token_abi_path, PathBuf::from("/opt/abi/SkywalkerFungible.json"));
        assert!(settings.secrets.signer("beta").is_ok());
    }

    #[test]
    fn test_secret_override() {
        let dir = workspace(CONFIG, "{}");
        let override_path = dir.path().join("override.json");
        fs::write(&override_path, format!(r#"{{"alpha":"{KEY}","beta":"{KEY}"}}"#)).unwrap();

        let settings = load_settings(&dir.path().join("config.toml"), Some(&override_path)).unwrap();
        assert!(settings.secrets.contains("alpha"));
    }

    #[test]
    fn test_missing_chain_secret() {
        let dir = workspace(CONFIG, &format!(r#"{{"alpha":"{KEY}"}}"#));

        let err = load_settings(&dir.path().join("config.toml"), None).unwrap_err();
        assert!(err.to_string().contains("no key for chain beta"));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = TempDir::new().unwrap();
        let err = load_settings(&dir.path().join("absent.toml"), None).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn test_malformed_config() {
        let dir = workspace("[networks.alpha]\nchain_id = \"one\"\n", "{}");
        let err = load_settings(&dir.path().join("config.toml"), None).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }

    #[test]
    fn test_config_without_networks() {
        let dir = workspace("secret = \"secret.json\"\n", "{}");
        let err = load_settings(&dir.path().join("config.toml"), None).unwrap_err();
        assert!(err.to_string().contains("declares no networks"));
    }
}
