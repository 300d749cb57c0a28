use anyhow::{anyhow, Context, Result};
use ethers::{
    signers::{LocalWallet, Signer},
    types::H160,
    utils::hex,
};

/// Builds a wallet from a hex encoded secp256k1 key, with or without `0x`.
///
/// Errors never include the key material.
pub fn parse_wallet(sk: &str) -> Result<LocalWallet> {
    let sk = sk.trim();
    let bytes = hex::decode(sk.strip_prefix("0x").unwrap_or(sk))
        .map_err(|_| anyhow!("private key is not valid hex"))?;
    if bytes.len() != 32 {
        return Err(anyhow!("private key must be 32 bytes, got {}", bytes.len()));
    }
    LocalWallet::from_bytes(&bytes).map_err(|_| anyhow!("private key is not a valid secp256k1 key"))
}

/// Ordered signing identities available on a network.
#[derive(Debug, Clone, Default)]
pub struct Signers {
    wallets: Vec<LocalWallet>,
}

impl Signers {
    pub fn from_keys<S: AsRef<str>>(keys: &[S]) -> Result<Self> {
        let wallets = keys
            .iter()
            .enumerate()
            .map(|(i, key)| parse_wallet(key.as_ref()).with_context(|| format!("account #{}", i)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { wallets })
    }

    pub fn first(&self) -> Result<&LocalWallet> {
        self.wallets
            .first()
            .ok_or_else(|| anyhow!("no signers configured for this network"))
    }

    pub fn addresses(&self) -> Vec<H160> {
        self.wallets.iter().map(|wallet| wallet.address()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // well known development keys
    const KEY_0: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const KEY_1: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    #[test]
    fn prefix_is_optional() {
        let with = parse_wallet(KEY_0).unwrap();
        let without = parse_wallet(KEY_0.strip_prefix("0x").unwrap()).unwrap();
        assert_eq!(with.address(), without.address());
        assert_eq!(
            format!("{:?}", with.address()),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn bad_keys_do_not_leak() {
        let err = parse_wallet("0xnothex").unwrap_err().to_string();
        assert!(!err.contains("nothex"));
        assert!(parse_wallet("0x00").is_err());
        assert!(parse_wallet(&format!("0x{}", "00".repeat(32))).is_err());
    }

    #[test]
    fn keeps_order() {
        let signers = Signers::from_keys(&[KEY_0, KEY_1]).unwrap();
        assert_eq!(signers.addresses().len(), 2);
        assert_eq!(
            signers.first().unwrap().address(),
            parse_wallet(KEY_0).unwrap().address()
        );
        assert_eq!(
            signers.addresses()[1],
            parse_wallet(KEY_1).unwrap().address()
        );
    }

    #[test]
    fn empty_list_has_no_first() {
        let signers = Signers::from_keys::<&str>(&[]).unwrap();
        assert!(signers.addresses().is_empty());
        assert!(signers.first().is_err());
    }

    #[test]
    fn invalid_key_names_index() {
        let err = Signers::from_keys(&[KEY_0, "zz"]).unwrap_err();
        assert!(format!("{:#}", err).contains("account #1"));
    }
}
