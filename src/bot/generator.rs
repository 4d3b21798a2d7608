//! Reply generation for the automated participant.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::chat::Message;
use crate::config::BotConfig;
use crate::{ChatzoneError, Result};

/// Reply used when no API key is configured.
pub const OFFLINE_REPLY: &str = "I'm currently offline. Please try again later.";

/// Reply used when the model call fails or returns nothing.
pub const FALLBACK_REPLY: &str = "Oops, I'm having a little trouble thinking right now.";

/// Most recent lines sent as context.
pub const HISTORY_LIMIT: usize = 10;

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// User agent string for model requests.
const USER_AGENT: &str = "ChatZone/1.0 (GeminiBot)";

/// Something that turns chat history into a reply.
///
/// Implementations never fail: any error becomes a fallback string, so the
/// returned reply is always non-empty.
pub trait ReplyGenerator: Send + Sync {
    /// Produce a reply to `history`, oldest message first.
    fn generate<'a>(&'a self, history: &'a [Message]) -> BoxFuture<'a, String>;
}

/// Render history as `nickname: text` lines, keeping the last `limit`.
///
/// # Examples
///
/// ```
/// use chatzone::auth::Identity;
/// use chatzone::bot::format_history;
/// use chatzone::chat::Message;
///
/// let now = chrono::Utc::now();
/// let history = vec![
///     Message::new(Identity::user("alice", ""), "hi", now),
///     Message::new(Identity::bot(), "hello!", now),
/// ];
/// assert_eq!(format_history(&history, 10), "alice: hi\nGeminiBot: hello!");
/// assert_eq!(format_history(&history, 1), "GeminiBot: hello!");
/// ```
pub fn format_history(history: &[Message], limit: usize) -> String {
    let skip = history.len().saturating_sub(limit);
    history[skip..]
        .iter()
        .map(Message::format)
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(history: &[Message], limit: usize) -> String {
    format!(
        "You are GeminiBot, a friendly and engaging participant in a chat room.\n\
         Your personality is curious and slightly humorous.\n\
         Keep your responses concise and conversational, like a real chat message.\n\
         Do not use markdown.\n\
         Here is the recent chat history:\n\
         ---\n\
         {}\n\
         ---\n\
         Based on the last message, what is your reply?",
        format_history(history, limit)
    )
}

/// Pull the concatenated text parts of the first candidate.
fn extract_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Reply generator backed by the Gemini `generateContent` REST endpoint.
pub struct GeminiReplyGenerator {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    history_limit: usize,
}

impl GeminiReplyGenerator {
    /// Create a generator from bot settings.
    pub fn new(config: &BotConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ChatzoneError::Bot(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            history_limit: config.history_limit,
        })
    }

    /// Whether an API key is configured.
    pub fn is_online(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn request(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| ChatzoneError::Bot(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ChatzoneError::Bot(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ChatzoneError::Bot(format!("failed to read response: {}", e)))?;
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ChatzoneError::Bot(format!("malformed response: {}", e)))?;

        extract_text(&body).ok_or_else(|| ChatzoneError::Bot("empty reply".to_string()))
    }
}

impl ReplyGenerator for GeminiReplyGenerator {
    fn generate<'a>(&'a self, history: &'a [Message]) -> BoxFuture<'a, String> {
        Box::pin(async move {
            if !self.is_online() {
                return OFFLINE_REPLY.to_string();
            }

            let prompt = build_prompt(history, self.history_limit);
            match self.request(&prompt).await {
                Ok(reply) => {
                    debug!("Generated reply ({} chars)", reply.len());
                    reply
                }
                Err(e) => {
                    warn!("Reply generation failed: {}", e);
                    FALLBACK_REPLY.to_string()
                }
            }
        })
    }
}
