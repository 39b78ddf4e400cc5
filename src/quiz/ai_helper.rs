use std::time::Duration;

use chatgpt::client::ChatGPT;
use chatgpt::config::ChatGPTEngine;
use chatgpt::types::CompletionResponse;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("completion request failed: {0}")]
    Transport(String),

    #[error("completion request timed out after {0:?}")]
    Timeout(Duration),

    #[error("completion came back empty")]
    EmptyReply,
}

/// A text-completion backend. Takes a prompt, returns the model's reply.
#[allow(async_fn_in_trait)]
pub trait Completion {
    async fn complete(&self, prompt: &str) -> Result<String, ApiError>;
}

pub struct ChatGptCompletion {
    chat_gpt: ChatGPT,
    timeout: Duration,
}

impl ChatGptCompletion {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut gpt = ChatGPT::new(api_key).map_err(|e| ApiError::Transport(e.to_string()))?;

        gpt.config.engine = engine_for(model);
        gpt.config.timeout = timeout;

        Ok(Self {
            chat_gpt: gpt,
            timeout,
        })
    }
}

impl Completion for ChatGptCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, ApiError> {
        log::debug!("Prompt: {:?}", prompt);

        let response: CompletionResponse =
            tokio::time::timeout(self.timeout, self.chat_gpt.send_message(prompt))
                .await
                .map_err(|_| ApiError::Timeout(self.timeout))?
                .map_err(|e| ApiError::Transport(e.to_string()))?;
        let content = response.message().clone().content;

        log::debug!("Completion: {:?}", content);

        if content.trim().is_empty() {
            return Err(ApiError::EmptyReply);
        }
        Ok(content)
    }
}

fn engine_for(model: &str) -> ChatGPTEngine {
    match model {
        "gpt-3.5-turbo" => ChatGPTEngine::Gpt35Turbo,
        "gpt-4" => ChatGPTEngine::Gpt4,
        "gpt-4o-mini" => ChatGPTEngine::Custom("gpt-4o-mini"),
        // The engine wants a 'static name; this runs once per process.
        other => ChatGPTEngine::Custom(Box::leak(other.to_string().into_boxed_str())),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_models_map_to_engines() {
        assert!(matches!(engine_for("gpt-4"), ChatGPTEngine::Gpt4));
        assert!(matches!(engine_for("gpt-4o-mini"), ChatGPTEngine::Custom("gpt-4o-mini")));
        assert!(matches!(engine_for("my-model"), ChatGPTEngine::Custom("my-model")));
    }

    #[tokio::test]
    async fn scripted_completion_replays_in_order() {
        let api = testing::ScriptedCompletion::new([Ok("one".to_string()), Err(ApiError::EmptyReply)]);

        assert_eq!(api.complete("first").await, Ok("one".to_string()));
        assert_eq!(api.complete("second").await, Err(ApiError::EmptyReply));
        assert!(api.complete("third").await.is_err());
        assert_eq!(api.prompts(), vec!["first", "second", "third"]);
    }
}
