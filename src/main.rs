// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mint Bot - mention-triggered ERC-20 deployments on Base

mod chain;
mod config;
mod dead_letter;
mod poller;
mod social;
mod suggest;

use chain::{create_provider, FactoryDeployer, TokenDeployer};
use config::Config;
use dead_letter::DeadLetterLog;
use poller::{MentionPoller, PollSettings, TokioTimer};
use social::{SocialApi, TwitterClient};
use suggest::{OpenAiSuggester, SuggestionApi};

use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load config: {}", e);
        e
    })?;

    let args: Vec<String> = std::env::args().collect();

    // One-shot mode: exercise the suggestion call alone.
    if args.len() > 1 && args[1] == "--test-suggest" {
        let text = args.get(2).cloned().unwrap_or_else(|| {
            "When you press F to pay respects and the whole internet joins in. #PressF"
                .to_string()
        });

        info!("🧪 Testing suggestion for: {}", text);
        let suggester =
            OpenAiSuggester::new(config.openai_api_key.clone(), config.suggest_model.clone());
        let suggestion = suggester.suggest(&text).await?;
        info!("📊 Suggested: {} ({})", suggestion.name, suggestion.symbol);
        return Ok(());
    }

    // One-shot mode: exercise a single factory deploy.
    if args.len() > 1 && args[1] == "--test-deploy" {
        let name = args
            .get(2)
            .cloned()
            .unwrap_or_else(|| "Crypto is still here".to_string());
        let symbol = args.get(3).cloned().unwrap_or_else(|| "HERE".to_string());
        let origin_url = args.get(4).cloned().unwrap_or_else(|| {
            "https://x.com/cz_binance/status/1928211000190259581".to_string()
        });
        let origin_handle = args
            .get(5)
            .cloned()
            .unwrap_or_else(|| "cz_binance".to_string());

        info!(
            "🧪 Testing deploy of {} ({}) on {}",
            name,
            symbol,
            config.chain.name()
        );
        let (provider, _) = create_provider(&config)?;
        let deployer = FactoryDeployer::new(provider, config.factory_address);
        let deployment = deployer
            .deploy(&name, &symbol, &origin_url, &origin_handle)
            .await?;
        info!(
            "📊 Result: tx={:?}, token={}",
            deployment.tx_hash, deployment.token_address
        );
        return Ok(());
    }

    info!("🚀 Mint Bot starting...");
    info!("📡 RPC: {}", config.rpc_url);
    info!("⛓️ Chain: {} (id {})", config.chain.name(), config.chain_id);
    info!("🏭 Factory: {:?}", config.factory_address);
    info!("🧠 Model: {}", config.suggest_model);

    let (provider, _) = create_provider(&config)?;
    let social = TwitterClient::new(&config);
    let suggester =
        OpenAiSuggester::new(config.openai_api_key.clone(), config.suggest_model.clone());
    let deployer = FactoryDeployer::new(provider, config.factory_address);

    // Resolving the bot's own identity is the one fatal startup step.
    let bot_id = social.authed_user_id().await.map_err(|e| {
        error!("Failed to resolve bot identity: {}", e);
        e
    })?;

    let dead_letters = DeadLetterLog::load();
    let mut poller = MentionPoller::new(
        social,
        suggester,
        deployer,
        TokioTimer,
        PollSettings::from_config(&config),
        bot_id,
        dead_letters,
    );

    // One-shot mode: run the pipeline for a known mention/origin pair.
    if args.len() > 1 && args[1] == "--process" {
        let (Some(mention_id), Some(origin_id)) = (args.get(2), args.get(3)) else {
            error!("Usage: mint-bot --process <mention_id> <origin_post_id>");
            return Ok(());
        };
        poller.process_one(mention_id, origin_id).await?;
        return Ok(());
    }

    info!("✅ Mint Bot ready! Polling for mentions...");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Poll loop with graceful shutdown
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("🛑 Shutdown signal received, stopping poller...");
        }
        _ = poller.run() => {}
    }

    Ok(())
}
