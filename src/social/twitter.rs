// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! X API v2 client: mention polling, single-post lookup, replies.
//!
//! Reads (mentions timeline, own identity) and the reply post run in
//! OAuth 1.0a user context; single-post lookup uses the app-only bearer
//! token, matching the split the platform requires.

use super::oauth::{self, OAuthCredentials};
use super::{Mention, MentionQuery, OriginPost, ReferencedPost, SocialApi, SocialError};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

const API_BASE: &str = "https://api.twitter.com/2";

/// X API v2 client.
pub struct TwitterClient {
    http: reqwest::Client,
    bearer_token: String,
    oauth: OAuthCredentials,
}

impl TwitterClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            bearer_token: config.twitter_bearer_token.clone(),
            oauth: OAuthCredentials {
                consumer_key: config.twitter_api_key.clone(),
                consumer_secret: config.twitter_api_secret.clone(),
                access_token: config.twitter_access_token.clone(),
                access_secret: config.twitter_access_secret.clone(),
            },
        }
    }

    async fn get_user_context(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<String, SocialError> {
        let auth = oauth::authorization_header("GET", url, params, &self.oauth);
        let full_url = if params.is_empty() {
            url.to_string()
        } else {
            format!("{}?{}", url, encode_query(params))
        };

        let response = self
            .http
            .get(&full_url)
            .header("Authorization", auth)
            .send()
            .await
            .map_err(|e| SocialError::Transient(format!("Request failed: {}", e)))?;

        check_response(response).await
    }
}

/// Map an HTTP response to the error taxonomy, or hand back the body.
async fn check_response(response: reqwest::Response) -> Result<String, SocialError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let reset_epoch_secs = response
            .headers()
            .get("x-rate-limit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(SocialError::RateLimited { reset_epoch_secs });
    }

    let body = response.text().await.unwrap_or_default();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(SocialError::Fatal(format!("API error ({}): {}", status, body)));
    }
    if !status.is_success() {
        return Err(SocialError::Transient(format!(
            "API error ({}): {}",
            status, body
        )));
    }

    Ok(body)
}

fn encode_query(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn parse_json<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, SocialError> {
    serde_json::from_str(body)
        .map_err(|e| SocialError::Transient(format!("Failed to parse response: {}", e)))
}

#[derive(Debug, Deserialize)]
struct MentionsResponse {
    data: Option<Vec<TweetDto>>,
    errors: Option<Vec<ApiErrorDto>>,
}

#[derive(Debug, Deserialize)]
struct TweetDto {
    id: String,
    author_id: Option<String>,
    created_at: Option<String>,
    referenced_tweets: Option<Vec<ReferencedTweetDto>>,
}

#[derive(Debug, Deserialize)]
struct ReferencedTweetDto {
    #[serde(rename = "type")]
    kind: String,
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDto {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SinglePostResponse {
    data: Option<PostDto>,
    includes: Option<IncludesDto>,
}

#[derive(Debug, Deserialize)]
struct PostDto {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IncludesDto {
    users: Option<Vec<UserDto>>,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    #[allow(dead_code)]
    id: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    data: Option<MeDto>,
}

#[derive(Debug, Deserialize)]
struct MeDto {
    id: String,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostTweetResponse {
    data: Option<PostedTweetDto>,
}

#[derive(Debug, Deserialize)]
struct PostedTweetDto {
    id: String,
}

impl From<TweetDto> for Mention {
    fn from(dto: TweetDto) -> Self {
        Mention {
            id: dto.id,
            author_id: dto.author_id,
            created_at: dto.created_at,
            referenced: dto
                .referenced_tweets
                .unwrap_or_default()
                .into_iter()
                .map(|r| ReferencedPost {
                    kind: r.kind,
                    id: r.id,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl SocialApi for TwitterClient {
    async fn authed_user_id(&self) -> Result<String, SocialError> {
        let url = format!("{}/users/me", API_BASE);
        let body = self.get_user_context(&url, &[]).await?;
        let me: MeResponse = parse_json(&body)?;

        let data = me
            .data
            .ok_or_else(|| SocialError::Fatal("No user data returned".to_string()))?;
        if let Some(username) = &data.username {
            info!("🤖 Authenticated as @{} (id {})", username, data.id);
        }
        Ok(data.id)
    }

    async fn fetch_mentions(
        &self,
        bot_id: &str,
        query: &MentionQuery,
        max_results: u32,
    ) -> Result<Vec<Mention>, SocialError> {
        let url = format!("{}/users/{}/mentions", API_BASE, bot_id);
        let max_results = max_results.to_string();

        let mut params: Vec<(&str, &str)> = vec![
            ("expansions", "referenced_tweets.id,author_id"),
            ("max_results", &max_results),
            (
                "tweet.fields",
                "referenced_tweets,author_id,in_reply_to_user_id,created_at",
            ),
        ];
        match query {
            MentionQuery::SinceId(id) => params.push(("since_id", id)),
            MentionQuery::StartTime(ts) => params.push(("start_time", ts)),
        }

        let body = self.get_user_context(&url, &params).await?;
        let response: MentionsResponse = parse_json(&body)?;

        if response.data.is_none() {
            if let Some(errors) = response.errors {
                let detail = errors
                    .iter()
                    .map(|e| {
                        e.detail
                            .clone()
                            .or_else(|| e.title.clone())
                            .unwrap_or_default()
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(SocialError::Transient(format!("API errors: {}", detail)));
            }
        }

        Ok(response
            .data
            .unwrap_or_default()
            .into_iter()
            .map(Mention::from)
            .collect())
    }

    async fn fetch_post(&self, post_id: &str) -> Result<OriginPost, SocialError> {
        let url = format!(
            "{}/tweets/{}?tweet.fields=author_id,text&expansions=author_id",
            API_BASE, post_id
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .map_err(|e| SocialError::Transient(format!("Request failed: {}", e)))?;

        let body = check_response(response).await?;
        let response: SinglePostResponse = parse_json(&body)?;

        let text = response
            .data
            .and_then(|d| d.text)
            .unwrap_or_default();
        let author_handle = response
            .includes
            .and_then(|i| i.users)
            .and_then(|users| users.into_iter().next())
            .map(|u| u.username)
            .unwrap_or_default();

        debug!("Fetched origin post {}: {} chars", post_id, text.len());
        Ok(OriginPost {
            text,
            author_handle,
        })
    }

    async fn post_reply(&self, mention_id: &str, text: &str) -> Result<(), SocialError> {
        let url = format!("{}/tweets", API_BASE);
        let auth = oauth::authorization_header("POST", &url, &[], &self.oauth);

        let body = serde_json::json!({
            "text": text,
            "reply": { "in_reply_to_tweet_id": mention_id },
        });

        let response = self
            .http
            .post(&url)
            .header("Authorization", auth)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SocialError::Transient(format!("Request failed: {}", e)))?;

        let body = check_response(response).await?;
        let posted: PostTweetResponse = parse_json(&body)?;
        match posted.data {
            Some(tweet) => info!("✨ Posted reply {} to mention {}", tweet.id, mention_id),
            None => info!("✨ Posted reply to mention {}", mention_id),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_page_parses_referenced_tweets() {
        let body = r#"{
            "data": [
                {
                    "id": "1928300000000000001",
                    "author_id": "99",
                    "created_at": "2025-05-30T12:00:00.000Z",
                    "referenced_tweets": [
                        {"type": "replied_to", "id": "1928211000190259581"}
                    ]
                },
                {"id": "1928300000000000002", "author_id": "100"}
            ],
            "meta": {"result_count": 2}
        }"#;

        let parsed: MentionsResponse = serde_json::from_str(body).unwrap();
        let mentions: Vec<Mention> = parsed
            .data
            .unwrap()
            .into_iter()
            .map(Mention::from)
            .collect();

        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].replied_to(), Some("1928211000190259581"));
        assert_eq!(mentions[1].replied_to(), None);
    }

    #[test]
    fn single_post_parses_text_and_author() {
        let body = r#"{
            "data": {"id": "1", "text": "When you press F to pay respects...", "author_id": "7"},
            "includes": {"users": [{"id": "7", "username": "cz_binance"}]}
        }"#;

        let parsed: SinglePostResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.data.unwrap().text.unwrap(),
            "When you press F to pay respects..."
        );
        assert_eq!(
            parsed.includes.unwrap().users.unwrap()[0].username,
            "cz_binance"
        );
    }

    #[test]
    fn query_string_keeps_field_lists_intact() {
        let q = encode_query(&[
            ("max_results", "5"),
            ("tweet.fields", "referenced_tweets,author_id"),
        ]);
        assert_eq!(q, "max_results=5&tweet.fields=referenced_tweets%2Cauthor_id");
    }
}
