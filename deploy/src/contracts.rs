use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, bail, Context, Result};
use ethers::{
    abi::{
        token::{LenientTokenizer, Tokenizer},
        Abi, Param, Token,
    },
    contract::{Contract, ContractFactory},
    providers::Middleware,
    types::{Bytes, H160},
};
use serde::Deserialize;

/// Compiled contract as emitted by hardhat under `artifacts/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub abi: Abi,
    #[serde(default)]
    pub bytecode: Bytes,
}

impl ContractArtifact {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn factory<M: Middleware>(&self, client: Arc<M>) -> Result<ContractFactory<M>> {
        if self.bytecode.is_empty() {
            bail!(
                "artifact `{}` has no bytecode and cannot be deployed",
                self.contract_name
            );
        }
        Ok(ContractFactory::new(
            self.abi.clone(),
            self.bytecode.clone(),
            client,
        ))
    }

    pub fn attach<M: Middleware>(&self, address: H160, client: Arc<M>) -> Contract<M> {
        Contract::new(address, self.abi.clone(), client)
    }

    pub fn constructor_inputs(&self) -> &[Param] {
        self.abi
            .constructor()
            .map(|constructor| constructor.inputs.as_slice())
            .unwrap_or(&[])
    }

    pub fn function_inputs(&self, name: &str) -> Result<&[Param]> {
        let function = self
            .abi
            .function(name)
            .with_context(|| format!("`{}` has no function `{}`", self.contract_name, name))?;
        Ok(function.inputs.as_slice())
    }
}

/// Tokenizes command line arguments against the ABI parameter types.
pub fn encode_args<S: AsRef<str>>(params: &[Param], args: &[S]) -> Result<Vec<Token>> {
    if params.len() != args.len() {
        bail!(
            "expected {} arguments ({}), got {}",
            params.len(),
            params
                .iter()
                .map(|param| format!("{} {}", param.kind, param.name))
                .collect::<Vec<_>>()
                .join(", "),
            args.len()
        );
    }
    params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            LenientTokenizer::tokenize(&param.kind, arg.as_ref()).map_err(|e| {
                anyhow!(
                    "argument `{}` is not a valid {} ({:?}): {}",
                    param.name,
                    param.kind,
                    arg.as_ref(),
                    e
                )
            })
        })
        .collect()
}

/// Resolves contract artifacts by name below a hardhat artifacts directory.
#[derive(Debug, Clone)]
pub struct ArtifactRegistry {
    root: PathBuf,
}

impl ArtifactRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, name: &str) -> Result<ContractArtifact> {
        let search_root = {
            let sources = self.root.join("contracts");
            if sources.is_dir() {
                sources
            } else {
                self.root.clone()
            }
        };
        let file_name = format!("{}.json", name);
        let mut candidates = Vec::new();
        find_files(&search_root, &file_name, &mut candidates)
            .with_context(|| format!("failed to search artifacts in {}", search_root.display()))?;
        candidates.sort();

        let mut matches = Vec::new();
        for path in candidates {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let artifact = ContractArtifact::from_json(&raw)
                .with_context(|| format!("invalid artifact {}", path.display()))?;
            if artifact.contract_name == name {
                matches.push((path, artifact));
            }
        }

        match matches.len() {
            0 => Err(anyhow!(
                "artifact for contract `{}` not found in {}",
                name,
                self.root.display()
            )),
            1 => {
                let (path, artifact) = matches.remove(0);
                log::debug!("resolved `{}` from {}", name, path.display());
                Ok(artifact)
            }
            _ => Err(anyhow!(
                "multiple artifacts for contract `{}`: {}",
                name,
                matches
                    .iter()
                    .map(|(path, _)| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

fn find_files(dir: &Path, file_name: &str, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            if entry.file_name() != "build-info" {
                find_files(&path, file_name, found)?;
            }
        } else if entry.file_name() == file_name {
            found.push(path);
        }
    }
    Ok(())
}
