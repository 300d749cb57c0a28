use std::sync::Arc;

use anyhow::{Context, Result};
use ethers::{
    abi::Token,
    signers::Signer,
    types::{H160, H256},
};

use crate::{
    config::Network,
    contracts::{encode_args, ContractArtifact},
    signers::Signers,
    utils::{connect, ensure_contract, ensure_success, Client},
};

#[derive(Debug)]
pub struct CallOutcome {
    /// Return value of the function, simulated against the latest block.
    pub result: Token,
    pub transaction_hash: H256,
    pub block_number: Option<u64>,
}

/// Calls a state changing function on an already deployed contract.
pub struct Invoke {
    client: Arc<Client>,
    network: Network,
}

impl Invoke {
    /// Signs with the first identity of `signers`.
    pub async fn new(network: &Network, signers: &Signers) -> Result<Self> {
        let wallet = signers
            .first()
            .with_context(|| format!("network `{}` has no accounts", network.name))?
            .clone();
        let client = connect(network, wallet).await?;
        Ok(Self {
            client,
            network: network.clone(),
        })
    }

    /// Chain id reported by the node at connect time.
    pub fn chain_id(&self) -> u64 {
        self.client.signer().chain_id()
    }

    pub async fn run<S: AsRef<str>>(
        &self,
        artifact: &ContractArtifact,
        address: H160,
        function: &str,
        args: &[S],
    ) -> Result<CallOutcome> {
        ensure_contract(&self.client, address).await?;
        let contract = artifact.attach(address, self.client.clone());

        let params = artifact.function_inputs(function)?;
        let tokens = encode_args(params, args)
            .with_context(|| format!("invalid arguments for `{}`", function))?;

        let mut call = contract
            .method::<_, Token>(function, tokens)
            .with_context(|| format!("failed to encode `{}` call", function))?;
        if self.network.legacy {
            call = call.legacy();
        }

        let result = call
            .call()
            .await
            .with_context(|| format!("`{}` would revert", function))?;

        let pending = call
            .send()
            .await
            .with_context(|| format!("failed to send `{}` transaction", function))?;
        log::info!("transaction hash:{:?}", pending.tx_hash());
        let receipt = ensure_success(
            pending
                .confirmations(self.network.confirmations)
                .await
                .with_context(|| format!("`{}` transaction was not confirmed", function))?,
        )?;

        Ok(CallOutcome {
            result,
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|block| block.as_u64()),
        })
    }
}
