// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Social platform client for mention polling and replies.

mod oauth;
pub mod twitter;

pub use twitter::TwitterClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the social platform collaborator.
///
/// The poller dispatches on these variants; rate limits are recovered
/// locally with backoff and must never be treated as fatal.
#[derive(Debug, Error)]
pub enum SocialError {
    /// Upstream quota exhausted. Carries the epoch-seconds reset time from
    /// the `x-rate-limit-reset` header when the API reported one.
    #[error("rate limited (reset at epoch {reset_epoch_secs:?})")]
    RateLimited { reset_epoch_secs: Option<u64> },

    /// Anything recoverable: network hiccups, 5xx, malformed pages.
    #[error("transient social API error: {0}")]
    Transient(String),

    /// Credential or permission failures. Fatal at startup; during the
    /// loop they are still logged and retried at normal cadence.
    #[error("fatal social API error: {0}")]
    Fatal(String),
}

/// An inbound post addressed to the bot account. Read once per poll tick,
/// never stored beyond it.
#[derive(Debug, Clone)]
pub struct Mention {
    pub id: String,
    pub author_id: Option<String>,
    pub created_at: Option<String>,
    pub referenced: Vec<ReferencedPost>,
}

/// A post referenced by a mention (reply, quote, retweet).
#[derive(Debug, Clone)]
pub struct ReferencedPost {
    pub kind: String,
    pub id: String,
}

impl Mention {
    /// Id of the post this mention replies to, if any. Only `replied_to`
    /// references qualify a mention for the pipeline.
    pub fn replied_to(&self) -> Option<&str> {
        self.referenced
            .iter()
            .find(|r| r.kind == "replied_to")
            .map(|r| r.id.as_str())
    }
}

/// The origin post a mention reacts to. Its text feeds the suggestion.
#[derive(Debug, Clone)]
pub struct OriginPost {
    pub text: String,
    pub author_handle: String,
}

/// How to scope a mentions fetch: by cursor, or by a wall-clock window
/// when no cursor exists yet (fresh start or restart).
#[derive(Debug, Clone)]
pub enum MentionQuery {
    SinceId(String),
    StartTime(String),
}

/// Social platform operations the poller drives.
#[async_trait]
pub trait SocialApi: Send + Sync {
    /// Resolve the bot's own user id. Called once before the loop starts;
    /// failure here is fatal.
    async fn authed_user_id(&self) -> Result<String, SocialError>;

    /// Fetch mentions of `bot_id` newer than the query bound.
    async fn fetch_mentions(
        &self,
        bot_id: &str,
        query: &MentionQuery,
        max_results: u32,
    ) -> Result<Vec<Mention>, SocialError>;

    /// Fetch a single post's text and author handle.
    async fn fetch_post(&self, post_id: &str) -> Result<OriginPost, SocialError>;

    /// Post a reply under the given mention.
    async fn post_reply(&self, mention_id: &str, text: &str) -> Result<(), SocialError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replied_to_picks_only_reply_references() {
        let mention = Mention {
            id: "10".to_string(),
            author_id: None,
            created_at: None,
            referenced: vec![
                ReferencedPost {
                    kind: "quoted".to_string(),
                    id: "1".to_string(),
                },
                ReferencedPost {
                    kind: "replied_to".to_string(),
                    id: "2".to_string(),
                },
            ],
        };
        assert_eq!(mention.replied_to(), Some("2"));

        let retweet = Mention {
            id: "11".to_string(),
            author_id: None,
            created_at: None,
            referenced: vec![ReferencedPost {
                kind: "retweeted".to_string(),
                id: "3".to_string(),
            }],
        };
        assert_eq!(retweet.replied_to(), None);
    }
}
