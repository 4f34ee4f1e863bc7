use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use tokio::sync::mpsc;

use crate::error::{KueError, KueResult};

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn query(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Ollama request failed with status: {}. Make sure Ollama is running with: ollama serve",
                response.status()
            ));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        Ok(ollama_response.response)
    }
}

/// A transport reply: the assistant's text, or why there isn't one.
pub type Reply = KueResult<String>;

/// Where submitted chat text goes. Replies arrive later on the receiver the
/// transport was created with.
pub trait ChatTransport {
    fn send(&self, text: &str, history: &[String]) -> KueResult<()>;
}

pub struct OllamaTransport {
    client: OllamaClient,
    model: String,
    replies: mpsc::UnboundedSender<Reply>,
}

impl OllamaTransport {
    pub fn new(client: OllamaClient, model: &str) -> (Self, mpsc::UnboundedReceiver<Reply>) {
        let (replies, rx) = mpsc::unbounded_channel();
        (
            Self {
                client,
                model: model.to_string(),
                replies,
            },
            rx,
        )
    }
}

impl ChatTransport for OllamaTransport {
    fn send(&self, text: &str, history: &[String]) -> KueResult<()> {
        let prompt = build_prompt(text, history);
        let client = self.client.clone();
        let model = self.model.clone();
        let replies = self.replies.clone();

        tracing::info!(model = %model, history = history.len(), "sending chat message");
        tokio::spawn(async move {
            let reply = client
                .query(&model, &prompt)
                .await
                .map_err(|e| KueError::backend("ollama", e));
            if let Err(e) = &reply {
                tracing::warn!(error = %e, "chat request failed");
            }
            // The receiver is gone only when the app is shutting down.
            let _ = replies.send(reply);
        });
        Ok(())
    }
}

pub fn build_prompt(text: &str, history: &[String]) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are Kue, an assistant embedded in a GIS application. ");
    prompt.push_str("When a task can be automated, answer with a single fenced ```python block ");
    prompt.push_str("the user can run in their GIS console.\n\n");

    if !history.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for line in history {
            prompt.push_str(line);
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    prompt.push_str("Current message: ");
    prompt.push_str(text);

    prompt
}
