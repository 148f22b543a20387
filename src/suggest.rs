// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Token name/symbol suggestion via OpenAI chat completion.

use anyhow::{anyhow, Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

lazy_static! {
    // First {...} fragment in a response that is not pure JSON.
    static ref JSON_FRAGMENT: Regex = Regex::new(r"\{[^}]+\}").expect("static regex");
}

/// LLM-derived `{symbol, name}` pair for the token to deploy.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Suggestion {
    pub symbol: String,
    pub name: String,
}

/// Suggestion collaborator the poller drives once per qualifying mention.
#[async_trait]
pub trait SuggestionApi: Send + Sync {
    async fn suggest(&self, text: &str) -> Result<Suggestion>;
}

/// OpenAI-backed suggester.
pub struct OpenAiSuggester {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiSuggester {
    pub fn new(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl SuggestionApi for OpenAiSuggester {
    async fn suggest(&self, text: &str) -> Result<Suggestion> {
        let prompt = format!(
            "Suggest a meme coin token symbol (all caps, <=7 chars) and name (<=15 chars) \
             for this viral tweet. Respond in JSON: {{\"symbol\": \"...\", \"name\": \"...\"}}\n\
             Tweet: \"{}\"",
            text
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .max_tokens(100u32)
            .temperature(0.7)
            .messages([ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into()])
            .build()?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("chat completion request failed")?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow!("chat completion returned no content"))?;

        debug!("Raw suggestion response: {}", content);
        parse_suggestion(&content)
    }
}

/// Parse a model response into a [`Suggestion`].
///
/// Strict JSON first; responses wrapped in prose or code fences fall back
/// to the first embedded `{...}` fragment before failing.
pub fn parse_suggestion(raw: &str) -> Result<Suggestion> {
    if let Ok(suggestion) = serde_json::from_str::<Suggestion>(raw) {
        return Ok(normalize(suggestion));
    }

    if let Some(fragment) = JSON_FRAGMENT.find(raw) {
        if let Ok(suggestion) = serde_json::from_str::<Suggestion>(fragment.as_str()) {
            return Ok(normalize(suggestion));
        }
    }

    Err(anyhow!("Failed to parse suggestion response: {}", raw))
}

fn normalize(suggestion: Suggestion) -> Suggestion {
    Suggestion {
        symbol: suggestion.symbol.trim().to_string(),
        name: suggestion.name.trim().to_string(),
    }
}
