// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Chain module for deploying tokens through the factory contract.

mod factory;
mod provider;

pub use factory::FactoryDeployer;
pub use provider::create_provider;

use async_trait::async_trait;

/// Result of a token deployment.
///
/// `tx_hash` is `None` when the factory already held a token for the
/// origin key and no transaction was sent.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub tx_hash: Option<String>,
    pub token_address: String,
}

/// Deploy collaborator. Idempotent per origin key: a repeated deploy for
/// the same origin returns the existing token address instead of minting
/// a second one. The factory contract enforces this; the poller only
/// relies on it.
#[async_trait]
pub trait TokenDeployer: Send + Sync {
    async fn deploy(
        &self,
        name: &str,
        symbol: &str,
        origin_url: &str,
        origin_handle: &str,
    ) -> anyhow::Result<Deployment>;
}
