use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{TransactionReceipt, H160, U64},
};

use crate::config::Network;

pub type Client = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Queries the node's chain id and checks it against the configured one.
pub async fn chain_id(provider: &Provider<Http>, network: &Network) -> Result<u64> {
    let chain_id = provider
        .get_chainid()
        .await
        .with_context(|| format!("failed to reach network `{}` at {}", network.name, network.url))?
        .as_u64();
    if let Some(expected) = network.chain_id {
        if expected != chain_id {
            bail!(
                "network `{}` expects chain id {}, node reports {}",
                network.name,
                expected,
                chain_id
            );
        }
    }
    Ok(chain_id)
}

pub async fn connect(network: &Network, wallet: LocalWallet) -> Result<Arc<Client>> {
    let provider = network.provider()?;
    let chain_id = chain_id(&provider, network).await?;
    log::info!(
        "connected to `{}` (chain id {}) as {:?}",
        network.name,
        chain_id,
        wallet.address()
    );
    Ok(Arc::new(SignerMiddleware::new(
        provider,
        wallet.with_chain_id(chain_id),
    )))
}

pub async fn ensure_contract(client: &Client, address: H160) -> Result<()> {
    let code = client
        .get_code(address, None)
        .await
        .with_context(|| format!("failed to fetch code at {:?}", address))?;
    if code.is_empty() {
        bail!("no contract deployed at {:?}", address);
    }
    Ok(())
}

pub fn ensure_success(receipt: Option<TransactionReceipt>) -> Result<TransactionReceipt> {
    let receipt = receipt.ok_or(anyhow!("transaction receipt not found"))?;
    if receipt.status != Some(U64::one()) {
        bail!("transaction {:?} reverted", receipt.transaction_hash);
    }
    Ok(receipt)
}
