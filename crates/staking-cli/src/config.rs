use std::collections::HashMap;
use std::path::Path;

use alloy::primitives::Address;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct Config {
    pub(crate) rpc_url: Option<String>,
    pub(crate) storage_address: Option<String>,
    #[serde(default)]
    pub(crate) default_keys: HashMap<String, String>,
}

impl Config {
    pub(crate) fn load(config_path: &Option<String>, env_file: &str) -> Result<Self> {
        dotenv::from_filename(env_file).ok();

        let mut config = if let Some(path) = config_path {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    pub(crate) fn load_from_file(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;

        Self::parse(&content).with_context(|| format!("Failed to parse config file: {path}"))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub(crate) fn load_from_env(&mut self) {
        if let Ok(rpc_url) = std::env::var("RPC_URL") {
            self.rpc_url = Some(rpc_url);
        }
        if let Ok(address) = std::env::var("STORAGE_ADDRESS") {
            self.storage_address = Some(address);
        }
        if let Ok(key) = std::env::var("PRIVATE_KEY") {
            self.default_keys.insert("default".to_string(), key);
        }
    }

    pub(crate) fn with_rpc_url(mut self, rpc_url: String) -> Self {
        self.rpc_url = Some(rpc_url);
        self
    }

    pub(crate) fn get_rpc_url(&self) -> Result<Url> {
        let rpc_url = self.rpc_url.as_deref().ok_or_else(|| {
            eyre::eyre!("RPC URL not configured. Set RPC_URL environment variable or use --rpc-url")
        })?;
        Url::parse(rpc_url).with_context(|| format!("Invalid RPC URL: {rpc_url}"))
    }

    pub(crate) fn get_storage_address(&self) -> Result<Address> {
        let address = self.storage_address.as_deref().ok_or_else(|| {
            eyre::eyre!("Storage address not configured. Set STORAGE_ADDRESS environment variable")
        })?;
        address
            .parse()
            .with_context(|| format!("Invalid storage address: {address}"))
    }

    /// Explicit key, else the configured key for `role`, else the default.
    pub(crate) fn get_private_key(&self, key: Option<String>, role: &str) -> Result<String> {
        key.or_else(|| self.default_keys.get(role).cloned())
            .or_else(|| self.default_keys.get("default").cloned())
            .ok_or_else(|| {
                eyre::eyre!("No private key for {role}. Pass --key or set PRIVATE_KEY")
            })
    }
}
