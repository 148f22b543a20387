// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Token deployment through the ERC-20 factory contract.

use super::{Deployment, TokenDeployer};
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::sol;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use tracing::{debug, info};

// Factory interface: deploys one ERC-20 per origin URL and exposes the
// existing deployment for dedup lookups.
sol! {
    #[sol(rpc)]
    interface ITokenFactory {
        struct TokenInfo {
            address tokenAddress;
            string name;
            string symbol;
            string xUrl;
            string xUser;
        }

        function deployERC20Token(
            string calldata name,
            string calldata symbol,
            string calldata xUrl,
            string calldata xUser
        ) external payable;

        function getTokenByXUrl(string calldata xUrl)
            external view returns (TokenInfo memory info);
    }
}

/// Deploys tokens through the factory contract.
pub struct FactoryDeployer<P: Provider + Clone> {
    provider: P,
    factory_address: Address,
}

impl<P: Provider + Clone> FactoryDeployer<P> {
    pub fn new(provider: P, factory_address: Address) -> Self {
        Self {
            provider,
            factory_address,
        }
    }

    /// Address already minted for this origin, if any.
    async fn existing_token(&self, origin_url: &str) -> Option<Address> {
        let factory = ITokenFactory::new(self.factory_address, &self.provider);
        match factory.getTokenByXUrl(origin_url.to_string()).call().await {
            Ok(i) if i.tokenAddress != Address::ZERO => Some(i.tokenAddress),
            Ok(_) => None,
            Err(e) => {
                debug!("getTokenByXUrl lookup failed for {}: {}", origin_url, e);
                None
            }
        }
    }
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync + 'static> TokenDeployer for FactoryDeployer<P> {
    async fn deploy(
        &self,
        name: &str,
        symbol: &str,
        origin_url: &str,
        origin_handle: &str,
    ) -> anyhow::Result<Deployment> {
        if let Some(existing) = self.existing_token(origin_url).await {
            info!(
                "♻️ Token already deployed for {}: {}",
                origin_url, existing
            );
            return Ok(Deployment {
                tx_hash: None,
                token_address: existing.to_string(),
            });
        }

        info!("🚀 Deploying {} ({}) for {}", name, symbol, origin_url);

        let factory = ITokenFactory::new(self.factory_address, &self.provider);
        let pending = factory
            .deployERC20Token(
                name.to_string(),
                symbol.to_string(),
                origin_url.to_string(),
                origin_handle.to_string(),
            )
            .value(U256::ZERO)
            .send()
            .await
            .context("Failed to send deploy transaction")?;

        info!("📤 Deploy transaction sent: {:?}", pending.tx_hash());

        let receipt = pending
            .get_receipt()
            .await
            .context("Failed to get deploy receipt")?;

        if !receipt.status() {
            return Err(anyhow!(
                "Deploy transaction reverted: {:?}",
                receipt.transaction_hash
            ));
        }

        let info = factory
            .getTokenByXUrl(origin_url.to_string())
            .call()
            .await
            .context("Failed to read deployed token back from factory")?;

        if info.tokenAddress == Address::ZERO {
            return Err(anyhow!(
                "Factory has no token recorded for {} after deploy",
                origin_url
            ));
        }

        info!(
            "✅ Token deployed: {} ({}) at {}",
            name, symbol, info.tokenAddress
        );

        Ok(Deployment {
            tx_hash: Some(receipt.transaction_hash.to_string()),
            token_address: info.tokenAddress.to_string(),
        })
    }
}
