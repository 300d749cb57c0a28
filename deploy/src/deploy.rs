use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use ethers::{providers::Middleware, signers::Signer, types::H160};

use crate::{
    config::Network,
    contracts::{encode_args, ContractArtifact},
    deployments::DeploymentRecord,
    signers::parse_wallet,
    utils::{connect, ensure_success, Client},
};

pub struct Deploy {
    client: Arc<Client>,
    network: Network,
}

impl Deploy {
    pub async fn new(network: &Network, sk: &str) -> Result<Self> {
        let wallet = parse_wallet(sk).context("invalid deployer key")?;
        let client = connect(network, wallet).await?;
        Ok(Self {
            client,
            network: network.clone(),
        })
    }

    pub fn deployer(&self) -> H160 {
        self.client.address()
    }

    /// Deploys a fresh instance of `artifact`; every call yields a new address.
    pub async fn run<S: AsRef<str>>(
        &self,
        artifact: &ContractArtifact,
        args: &[S],
    ) -> Result<DeploymentRecord> {
        let name = &artifact.contract_name;
        println!("Deploying contract...");
        println!("Deployer address: {:?}", self.deployer());

        let factory = artifact.factory(self.client.clone())?;
        println!("{} contract factory created.", name);

        let tokens = encode_args(artifact.constructor_inputs(), args)
            .with_context(|| format!("invalid constructor arguments for `{}`", name))?;
        let mut deployer = factory
            .deploy(tokens)
            .with_context(|| format!("failed to build `{}` deployment", name))?;
        if self.network.legacy {
            deployer = deployer.legacy();
        }

        let pending = self
            .client
            .send_transaction(deployer.tx, None)
            .await
            .with_context(|| format!("failed to send `{}` deployment", name))?;
        println!("Transaction sent. Waiting for deployment...");
        log::info!("transaction hash:{:?}", pending.tx_hash());

        let receipt = ensure_success(
            pending
                .confirmations(self.network.confirmations)
                .await
                .with_context(|| format!("deployment of `{}` was not confirmed", name))?,
        )?;
        let address = receipt
            .contract_address
            .ok_or(anyhow!("deployment receipt has no contract address"))?;
        log::info!(
            "deployment block:{:?} gas used:{:?}",
            receipt.block_number,
            receipt.gas_used
        );

        println!("{} contract deployed at: {:?}", name, address);

        Ok(DeploymentRecord {
            contract: name.clone(),
            network: self.network.name.clone(),
            chain_id: self.client.signer().chain_id(),
            address,
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|block| block.as_u64()),
            deployer: self.deployer(),
            args: args.iter().map(|arg| arg.as_ref().to_owned()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        contracts::tests::APE_ARTIFACT,
        utils::tests::{anvil, unreachable_network, KEY},
    };

    #[tokio::test]
    async fn each_deployment_yields_a_new_contract() {
        let Some((_anvil, network)) = anvil() else {
            return;
        };
        let artifact = ContractArtifact::from_json(APE_ARTIFACT).unwrap();
        let deploy = Deploy::new(&network, KEY).await.unwrap();

        let first = deploy.run(&artifact, &["camt_ape", "camt"]).await.unwrap();
        let second = deploy.run(&artifact, &["camt_ape", "camt"]).await.unwrap();
        assert_ne!(first.address, second.address);
        assert_ne!(first.address, H160::zero());

        assert_eq!(first.contract, "Ape");
        assert_eq!(first.network, "anvil");
        assert_eq!(first.chain_id, 31337);
        assert_eq!(first.deployer, deploy.deployer());
        assert_eq!(first.args, vec!["camt_ape".to_owned(), "camt".to_owned()]);
        assert!(first.block_number.is_some());

        let code = deploy.client.get_code(first.address, None).await.unwrap();
        assert_eq!(code.to_vec(), vec![0x60, 0x01, 0x60, 0x00, 0x54, 0x01, 0x60, 0x00, 0x55, 0x00]);
    }

    #[tokio::test]
    async fn wrong_constructor_arity_sends_nothing() {
        let Some((_anvil, network)) = anvil() else {
            return;
        };
        let artifact = ContractArtifact::from_json(APE_ARTIFACT).unwrap();
        let deploy = Deploy::new(&network, KEY).await.unwrap();
        let nonce = deploy
            .client
            .get_transaction_count(deploy.deployer(), None)
            .await
            .unwrap();

        assert!(deploy.run(&artifact, &["camt_ape"]).await.is_err());
        assert_eq!(
            deploy
                .client
                .get_transaction_count(deploy.deployer(), None)
                .await
                .unwrap(),
            nonce
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let err = Deploy::new(&unreachable_network(), KEY)
            .await
            .err()
            .unwrap();
        assert!(format!("{:#}", err).contains("failed to reach network"));
    }

    #[tokio::test]
    async fn bad_key_fails_before_connecting() {
        let err = Deploy::new(&unreachable_network(), "0x1234")
            .await
            .err()
            .unwrap();
        assert!(format!("{:#}", err).contains("invalid deployer key"));
    }
}
