// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Provider setup and configuration for the target chain RPC.

use crate::config::Config;
use alloy::{
    network::EthereumWallet,
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};

/// Create a provider with signer from config.
pub fn create_provider(config: &Config) -> Result<(impl Provider + Clone, EthereumWallet), String> {
    let signer: PrivateKeySigner = config
        .deployer_private_key
        .parse()
        .map_err(|e| format!("Invalid private key: {e}"))?;

    let wallet = EthereumWallet::from(signer);

    let url: Url = config
        .rpc_url
        .parse()
        .map_err(|e| format!("Invalid RPC URL: {e}"))?;

    let provider = ProviderBuilder::new()
        .wallet(wallet.clone())
        .connect_http(url);

    Ok((provider, wallet))
}
