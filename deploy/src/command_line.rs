use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ethers::types::H160;

use crate::{
    config::{Network, NetworksConfig},
    contracts::{ArtifactRegistry, ContractArtifact},
    deploy::Deploy,
    deployments::DeploymentStore,
    invoke::Invoke,
    signers::Signers,
};

#[derive(Debug, Parser)]
#[clap(version, about = "Deploy the Ape contract and call it")]
pub struct CommandLine {
    /// Network endpoint configuration file.
    #[clap(long, global = true, default_value = "networks.json")]
    config: PathBuf,

    #[clap(short, long, global = true, default_value = "localdev")]
    network: String,

    /// Hardhat artifacts directory.
    #[clap(long, global = true, default_value = "artifacts")]
    artifacts: PathBuf,

    #[clap(long, global = true, default_value = "deployments")]
    deployments: PathBuf,

    #[clap(long, global = true, default_value = "Ape")]
    contract: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Deploy a new instance of the contract.
    Deploy {
        #[clap(long, env = "DEPLOYER_PRIVATE_KEY", hide_env_values = true)]
        sk: String,

        /// Do not write the deployment record.
        #[clap(long)]
        no_record: bool,

        /// Constructor arguments.
        #[clap(default_values = ["camt_ape", "camt"])]
        args: Vec<String>,
    },
    /// Call a state changing function on a deployed instance.
    Mint {
        /// Contract address, defaults to the recorded deployment.
        #[clap(short, long)]
        address: Option<String>,

        #[clap(short, long, default_value = "mint")]
        function: String,

        #[clap(allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

impl CommandLine {
    pub async fn execute(self) -> Result<()> {
        let network = NetworksConfig::load(&self.config)?.network(&self.network)?;
        let artifact = ArtifactRegistry::new(&self.artifacts).resolve(&self.contract)?;
        let store = DeploymentStore::new(&self.deployments);

        match self.command {
            Command::Deploy {
                sk,
                no_record,
                args,
            } => {
                let deploy = Deploy::new(&network, &sk).await?;
                let record = deploy.run(&artifact, &args).await?;
                if !no_record {
                    store.save(&record)?;
                }
                Ok(())
            }
            Command::Mint {
                address,
                function,
                args,
            } => {
                let signers = Signers::from_keys(&network.accounts)
                    .with_context(|| format!("invalid accounts for network `{}`", network.name))?;
                log::debug!("signers: {:?}", signers.addresses());
                let invoke = Invoke::new(&network, &signers).await?;
                let address = match address {
                    Some(address) => parse_address(&address)?,
                    None => recorded_address(&store, &network, &artifact, invoke.chain_id())?,
                };
                let outcome = invoke.run(&artifact, address, &function, &args).await?;
                println!("Function call result: {}", outcome.result);
                println!(
                    "Transaction {:?} included in block {:?}",
                    outcome.transaction_hash, outcome.block_number
                );
                Ok(())
            }
        }
    }
}

/// `chain_id` is the one the connected node reports.
fn recorded_address(
    store: &DeploymentStore,
    network: &Network,
    artifact: &ContractArtifact,
    chain_id: u64,
) -> Result<H160> {
    let record = store.load(&network.name, &artifact.contract_name)?;
    if record.chain_id != chain_id {
        bail!(
            "recorded `{}` deployment is on chain {}, network `{}` is chain {}",
            record.contract,
            record.chain_id,
            network.name,
            chain_id
        );
    }
    log::info!(
        "using `{}` deployed at {:?} by {:?}",
        record.contract,
        record.address,
        record.deployer
    );
    Ok(record.address)
}

/// Accepts only the `0x` prefixed 20 byte form.
fn parse_address(raw: &str) -> Result<H160> {
    let hex = match raw.strip_prefix("0x") {
        Some(hex) => hex,
        None => bail!("address {:?} must start with 0x", raw),
    };
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("address {:?} is not 20 bytes of hex", raw);
    }
    raw.parse()
        .with_context(|| format!("invalid address {:?}", raw))
}
