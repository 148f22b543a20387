// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration module - loads settings from environment variables.

use alloy::primitives::Address;
use std::str::FromStr;

/// Target chain for token deployments. One switch instead of divergent
/// per-chain entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainTarget {
    Base,
    BaseSepolia,
}

impl ChainTarget {
    pub fn chain_id(&self) -> u64 {
        match self {
            ChainTarget::Base => 8453,
            ChainTarget::BaseSepolia => 84532,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChainTarget::Base => "base",
            ChainTarget::BaseSepolia => "base-sepolia",
        }
    }
}

impl FromStr for ChainTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "base" | "mainnet" => Ok(ChainTarget::Base),
            "base-sepolia" | "sepolia" | "testnet" => Ok(ChainTarget::BaseSepolia),
            other => Err(format!("Unknown chain target: {}", other)),
        }
    }
}

/// Main configuration for the mention bot.
#[derive(Debug, Clone)]
pub struct Config {
    // X API credentials
    pub twitter_bearer_token: String,
    pub twitter_api_key: String,
    pub twitter_api_secret: String,
    pub twitter_access_token: String,
    pub twitter_access_secret: String,

    // Chain
    pub chain: ChainTarget,
    pub chain_id: u64,
    pub rpc_url: String,
    pub deployer_private_key: String,
    pub factory_address: Address,

    // LLM
    pub openai_api_key: String,
    pub suggest_model: String,

    // Poller
    pub poll_interval_secs: u64,
    pub lookback_secs: u64,
    pub max_results: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let chain: ChainTarget = env_var_or("CHAIN_TARGET", "base").parse()?;

        Ok(Self {
            // X API credentials
            twitter_bearer_token: env_var("TWITTER_BEARER_TOKEN")?,
            twitter_api_key: env_var("TWITTER_API_KEY")?,
            twitter_api_secret: env_var("TWITTER_API_SECRET")?,
            twitter_access_token: env_var("TWITTER_ACCESS_TOKEN")?,
            twitter_access_secret: env_var("TWITTER_ACCESS_SECRET")?,

            // Chain
            chain,
            chain_id: env_var_or("CHAIN_ID", &chain.chain_id().to_string())
                .parse()
                .unwrap_or_else(|_| chain.chain_id()),
            rpc_url: env_var("RPC_URL")?,
            deployer_private_key: env_var("DEPLOYER_PRIVATE_KEY")?,
            factory_address: parse_address(&env_var("TOKEN_FACTORY_ADDRESS")?)?,

            // LLM
            openai_api_key: env_var("OPENAI_API_KEY")?,
            suggest_model: env_var_or("SUGGEST_MODEL", "gpt-4o"),

            // Poller
            poll_interval_secs: env_var_or("POLL_INTERVAL_SECS", "30")
                .parse()
                .unwrap_or(30),
            lookback_secs: env_var_or("LOOKBACK_SECS", "60").parse().unwrap_or(60),
            max_results: env_var_or("MAX_RESULTS", "5").parse().unwrap_or(5),
        })
    }
}

fn env_var(name: &str) -> Result<String, String> {
    std::env::var(name).map_err(|_| format!("{} not set", name))
}

fn env_var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_address(s: &str) -> Result<Address, String> {
    Address::from_str(s).map_err(|e| format!("Invalid address {}: {}", s, e))
}
