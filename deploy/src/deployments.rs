use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use ethers::types::{H160, H256};
use serde::{Deserialize, Serialize};

/// Outcome of a confirmed deployment, persisted so later calls can find the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub contract: String,
    pub network: String,
    pub chain_id: u64,
    pub address: H160,
    pub transaction_hash: H256,
    pub block_number: Option<u64>,
    pub deployer: H160,
    pub args: Vec<String>,
}

/// `<root>/<network>/<contract>.json`
#[derive(Debug, Clone)]
pub struct DeploymentStore {
    root: PathBuf,
}

impl DeploymentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, network: &str, contract: &str) -> PathBuf {
        self.root.join(network).join(format!("{}.json", contract))
    }

    pub fn save(&self, record: &DeploymentRecord) -> Result<PathBuf> {
        let path = self.path(&record.network, &record.contract);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        fs::write(&path, serde_json::to_string_pretty(record)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("deployment record written to {}", path.display());
        Ok(path)
    }

    pub fn load(&self, network: &str, contract: &str) -> Result<DeploymentRecord> {
        let path = self.path(network, contract);
        read_record(&path).with_context(|| {
            format!(
                "no usable deployment of `{}` on `{}` at {}; deploy it first or pass --address",
                contract,
                network,
                path.display()
            )
        })
    }
}

fn read_record(path: &Path) -> Result<DeploymentRecord> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DeploymentRecord {
        DeploymentRecord {
            contract: "Ape".to_owned(),
            network: "localdev".to_owned(),
            chain_id: 31337,
            address: "0x5fbdb2315678afecb367f032d93f642f64180aa3"
                .parse()
                .unwrap(),
            transaction_hash: H256::repeat_byte(0xab),
            block_number: Some(1),
            deployer: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
                .parse()
                .unwrap(),
            args: vec!["camt_ape".to_owned(), "camt".to_owned()],
        }
    }

    #[test]
    fn saved_record_is_found_by_network_and_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeploymentStore::new(dir.path());
        let path = store.save(&record()).unwrap();
        assert_eq!(path, dir.path().join("localdev").join("Ape.json"));
        assert_eq!(store.load("localdev", "Ape").unwrap(), record());
    }

    #[test]
    fn later_deployment_replaces_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeploymentStore::new(dir.path());
        store.save(&record()).unwrap();
        let mut next = record();
        next.address = H160::repeat_byte(0x11);
        store.save(&next).unwrap();
        assert_eq!(store.load("localdev", "Ape").unwrap().address, next.address);
    }

    #[test]
    fn missing_record_suggests_address() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeploymentStore::new(dir.path())
            .load("localdev", "Ape")
            .unwrap_err()
            .to_string();
        assert!(err.contains("--address"));
    }
}
