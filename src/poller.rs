// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mention polling loop: cursor tracking, rate-limit backoff, and the
//! suggest -> deploy -> reply pipeline, single-flight per tick.

use crate::chain::TokenDeployer;
use crate::config::Config;
use crate::dead_letter::{DeadLetter, DeadLetterLog, PipelineStage};
use crate::social::{Mention, MentionQuery, SocialApi, SocialError};
use crate::suggest::SuggestionApi;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default wait when a rate-limit response carries no reset time.
const DEFAULT_RATE_LIMIT_WAIT_SECS: u64 = 60;

/// Cap on the exponential backoff term.
const MAX_EXPONENTIAL_WAIT_SECS: u64 = 900;

/// Wall clock and sleep, injected so tests can step ticks without delays.
#[async_trait]
pub trait Timer: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    async fn sleep(&self, duration: Duration);
}

/// Production timer backed by tokio.
pub struct TokioTimer;

#[async_trait]
impl Timer for TokioTimer {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Poll cadence settings.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub poll_interval_secs: u64,
    pub lookback_secs: u64,
    pub max_results: u32,
}

impl PollSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval_secs: config.poll_interval_secs,
            lookback_secs: config.lookback_secs,
            max_results: config.max_results,
        }
    }
}

/// The mention poller. Owns the cursor and the backoff counter; drives
/// the three collaborators for each qualifying mention. At most one
/// pipeline runs at a time and fetches are strictly sequential.
pub struct MentionPoller<S, G, D, T> {
    social: S,
    suggester: G,
    deployer: D,
    timer: T,
    settings: PollSettings,
    bot_id: String,
    since_id: Option<String>,
    consecutive_rate_limits: u32,
    dead_letters: DeadLetterLog,
}

impl<S, G, D, T> MentionPoller<S, G, D, T>
where
    S: SocialApi,
    G: SuggestionApi,
    D: TokenDeployer,
    T: Timer,
{
    pub fn new(
        social: S,
        suggester: G,
        deployer: D,
        timer: T,
        settings: PollSettings,
        bot_id: String,
        dead_letters: DeadLetterLog,
    ) -> Self {
        Self {
            social,
            suggester,
            deployer,
            timer,
            settings,
            bot_id,
            since_id: None,
            consecutive_rate_limits: 0,
            dead_letters,
        }
    }

    /// Run until the process is killed. Shutdown is handled by the caller
    /// racing this future against a signal.
    pub async fn run(&mut self) {
        info!(
            "📡 Polling for mentions every {}s",
            self.settings.poll_interval_secs
        );
        loop {
            let sleep = self.tick().await;
            self.timer.sleep(sleep).await;
        }
    }

    /// One FETCH -> PROCESS/BACKOFF cycle. Returns the duration to sleep
    /// before the next tick instead of sleeping, so tests can step.
    pub async fn tick(&mut self) -> Duration {
        let query = self.query();
        debug!("Checking for mentions ({:?})", query);

        match self
            .social
            .fetch_mentions(&self.bot_id, &query, self.settings.max_results)
            .await
        {
            Ok(page) => {
                self.process_page(page).await;
                self.consecutive_rate_limits = 0;
                Duration::from_secs(self.settings.poll_interval_secs)
            }
            Err(SocialError::RateLimited { reset_epoch_secs }) => {
                self.consecutive_rate_limits += 1;
                let now_epoch = self.timer.now().timestamp().max(0) as u64;
                let delay =
                    backoff_delay(self.consecutive_rate_limits, reset_epoch_secs, now_epoch);
                warn!(
                    "⏳ Rate limited ({} consecutive), sleeping {}s",
                    self.consecutive_rate_limits,
                    delay.as_secs()
                );
                delay
            }
            Err(e) => {
                // Transient and even fatal-looking errors mid-loop are
                // retried at normal cadence; the loop never terminates.
                error!("Error fetching mentions: {}", e);
                Duration::from_secs(self.settings.poll_interval_secs)
            }
        }
    }

    /// One-shot pipeline run for a known mention/origin pair.
    pub async fn process_one(&self, mention_id: &str, origin_id: &str) -> anyhow::Result<()> {
        self.run_pipeline(mention_id, origin_id)
            .await
            .map_err(|(stage, err)| anyhow::anyhow!("{:?} stage failed: {}", stage, err))
    }

    fn query(&self) -> MentionQuery {
        match &self.since_id {
            Some(id) => MentionQuery::SinceId(id.clone()),
            None => {
                let start =
                    self.timer.now() - chrono::Duration::seconds(self.settings.lookback_secs as i64);
                MentionQuery::StartTime(start.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            }
        }
    }

    async fn process_page(&mut self, mut page: Vec<Mention>) {
        if page.is_empty() {
            debug!("No new mentions");
            return;
        }

        info!("📨 Found {} mentions to process", page.len());
        sort_newest_first(&mut page);

        // Advance the cursor before any pipeline runs: a crash mid-page
        // must not re-fetch the page under the same cursor. Mentions
        // within the page may be reprocessed on partial failure, so
        // delivery is at-least-once, not exactly-once.
        self.since_id = Some(page[0].id.clone());
        info!("Cursor advanced to {}", page[0].id);

        for mention in &page {
            let Some(origin_id) = mention.replied_to() else {
                debug!("Mention {} is not a reply, skipping", mention.id);
                continue;
            };
            let origin_id = origin_id.to_string();

            // A failed mention is dead-lettered and the rest of the page
            // still runs.
            if let Err((stage, err)) = self.run_pipeline(&mention.id, &origin_id).await {
                error!(
                    "Pipeline failed for mention {} at {:?}: {}",
                    mention.id, stage, err
                );
                let timestamp = self.timer.now().timestamp().max(0) as u64;
                self.dead_letters.record(DeadLetter {
                    mention_id: mention.id.clone(),
                    origin_post_id: Some(origin_id),
                    stage,
                    error: err,
                    timestamp,
                });
            }
        }
    }

    async fn run_pipeline(
        &self,
        mention_id: &str,
        origin_id: &str,
    ) -> Result<(), (PipelineStage, String)> {
        let origin = self
            .social
            .fetch_post(origin_id)
            .await
            .map_err(|e| (PipelineStage::FetchOrigin, e.to_string()))?;

        let origin_url = format!(
            "https://x.com/{}/status/{}",
            origin.author_handle, origin_id
        );
        info!("📝 Origin post by @{}: {}", origin.author_handle, origin.text);

        let suggestion = self
            .suggester
            .suggest(&origin.text)
            .await
            .map_err(|e| (PipelineStage::Suggest, e.to_string()))?;
        info!(
            "💡 Suggested token: {} ({})",
            suggestion.name, suggestion.symbol
        );

        let deployment = self
            .deployer
            .deploy(
                &suggestion.name,
                &suggestion.symbol,
                &origin_url,
                &origin.author_handle,
            )
            .await
            .map_err(|e| (PipelineStage::Deploy, e.to_string()))?;

        let text = reply_text(
            &suggestion.name,
            &suggestion.symbol,
            &deployment.token_address,
        );
        self.social
            .post_reply(mention_id, &text)
            .await
            .map_err(|e| (PipelineStage::Reply, e.to_string()))?;

        info!("✅ Mention {} handled", mention_id);
        Ok(())
    }
}

/// Sleep duration after a rate-limit response: time until the reported
/// reset (60s default when absent) plus an exponential term capped at
/// 15 minutes.
fn backoff_delay(consecutive: u32, reset_epoch_secs: Option<u64>, now_epoch: u64) -> Duration {
    let base = reset_epoch_secs
        .map(|reset| reset.saturating_sub(now_epoch))
        .unwrap_or(DEFAULT_RATE_LIMIT_WAIT_SECS);
    let exponential = 2u64
        .saturating_pow(consecutive)
        .min(MAX_EXPONENTIAL_WAIT_SECS);
    Duration::from_secs(base + exponential)
}

/// Newest first. Ids are compared numerically: they are decimal strings
/// wider than 2^53, so neither float nor lexicographic comparison is
/// safe.
fn sort_newest_first(page: &mut [Mention]) {
    page.sort_by(|a, b| numeric_id(&b.id).cmp(&numeric_id(&a.id)));
}

fn numeric_id(id: &str) -> u128 {
    id.parse().unwrap_or(0)
}

/// Reply template. Kept verbatim: downstream consumers scrape it.
pub fn reply_text(name: &str, symbol: &str, token_address: &str) -> String {
    format!(
        "🚀 Your token is live!\n\n💎 Name: {}\n💫 Symbol: {}\n🔗 Address: {}\n\nLFG! 🚀",
        name, symbol, token_address
    )
}
