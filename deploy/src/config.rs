use std::{collections::BTreeMap, env, fs, path::Path, time::Duration};

use anyhow::{anyhow, Context, Result};
use ethers::providers::{Http, Provider};
use serde::Deserialize;

/// Comma separated private keys replacing the `accounts` of the selected network.
pub const ACCOUNTS_ENV_VAR: &str = "APE_ACCOUNTS";

const DEFAULT_CONFIRMATIONS: usize = 1;

/// Named network endpoints, keyed by network name.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct NetworksConfig {
    networks: BTreeMap<String, Network>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Network {
    #[serde(skip)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default = "default_confirmations")]
    pub confirmations: usize,
    #[serde(default)]
    pub legacy: bool,
    /// Receipt polling interval, provider default when unset.
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
}

fn default_confirmations() -> usize {
    DEFAULT_CONFIRMATIONS
}

impl NetworksConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read network config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid network config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(raw)?;
        for (name, network) in config.networks.iter_mut() {
            network.name = name.clone();
        }
        Ok(config)
    }

    /// Returns the named network with the account override from the environment applied.
    pub fn network(&self, name: &str) -> Result<Network> {
        self.network_with_accounts(name, env::var(ACCOUNTS_ENV_VAR).ok().as_deref())
    }

    pub fn network_with_accounts(&self, name: &str, accounts: Option<&str>) -> Result<Network> {
        let mut network = self.networks.get(name).cloned().ok_or_else(|| {
            anyhow!(
                "unknown network `{}`, known networks: [{}]",
                name,
                self.networks.keys().cloned().collect::<Vec<_>>().join(", ")
            )
        })?;
        if let Some(accounts) = accounts {
            log::debug!("using accounts from {}", ACCOUNTS_ENV_VAR);
            network.accounts = split_accounts(accounts);
        }
        network.validate()?;
        Ok(network)
    }
}

impl Network {
    pub fn validate(&self) -> Result<()> {
        self.provider()?;
        if self.confirmations == 0 {
            return Err(anyhow!(
                "network `{}`: confirmations must be at least 1",
                self.name
            ));
        }
        Ok(())
    }

    pub fn provider(&self) -> Result<Provider<Http>> {
        let provider = Provider::<Http>::try_from(self.url.as_str())
            .with_context(|| format!("network `{}`: invalid url {}", self.name, self.url))?;
        Ok(match self.poll_interval_ms {
            Some(ms) => provider.interval(Duration::from_millis(ms)),
            None => provider,
        })
    }
}

fn split_accounts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_owned)
        .collect()
}
