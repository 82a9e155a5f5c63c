//! The language-model client: chat abstraction plus schema-constrained calls.
//!
//! [`ChatClient`] is the seam between the pipeline and any concrete model
//! provider; [`OpenAiChatClient`] is the production implementation and test
//! doubles implement the trait directly. [`StructuredLlm`] layers the
//! structured-output contract on top: every completion is treated as an
//! untrusted external value, extracted, and validated against the declared
//! schema before it is admitted into workflow state.

pub mod error;
pub mod openai;

pub use error::LlmError;
pub use openai::OpenAiChatClient;

use async_trait::async_trait;
use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::SCHEMA_RETRIES;
use crate::extract::extract_json;

/// Semantic generation profile, mapped to sampling parameters by the
/// concrete client. Keeps model-specific knobs out of stage code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationProfile {
    /// Consistent, predictable output (ingredient parsing, nutrition).
    Precise,
    /// General-purpose middle ground.
    #[default]
    Balanced,
    /// Diverse, inventive output (recipe generation).
    Creative,
}

impl GenerationProfile {
    pub(crate) fn temperature(self) -> f32 {
        match self {
            Self::Precise => 0.1,
            Self::Balanced => 0.3,
            Self::Creative => 0.7,
        }
    }
}

/// One chat call: a system prompt, a user prompt, and a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub profile: GenerationProfile,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            profile: GenerationProfile::default(),
        }
    }

    pub fn with_profile(mut self, profile: GenerationProfile) -> Self {
        self.profile = profile;
        self
    }
}

/// The seam to a generative chat model.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends one chat request and returns the raw completion text.
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError>;
}

/// Schema-constrained calls over any [`ChatClient`].
///
/// Each call appends the declared JSON Schema of the target type to the
/// prompt, extracts JSON from the completion, and deserializes it. When the
/// first completion fails validation, the call is retried exactly once with
/// the validation error appended; a second failure is
/// [`LlmError::SchemaViolation`]. Transport errors are never retried here,
/// which bounds every call to at most two attempts.
pub struct StructuredLlm<C> {
    client: C,
    schema_retries: u32,
}

impl<C: ChatClient> StructuredLlm<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            schema_retries: SCHEMA_RETRIES,
        }
    }

    /// Overrides the schema-retry budget (attempts = retries + 1).
    pub fn with_schema_retries(mut self, retries: u32) -> Self {
        self.schema_retries = retries;
        self
    }

    /// Performs a schema-constrained call, returning the validated value.
    pub async fn call<T>(&self, request: ChatRequest) -> Result<T, LlmError>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema = serde_json::to_string_pretty(&schema_for!(T))?;
        let framed_user = format!(
            "{}\n\nRespond with a single JSON object conforming to this JSON Schema. \
             Output only the JSON, no commentary.\n\n{}",
            request.user, schema
        );

        let mut attempt_user = framed_user.clone();
        let mut last_error = String::new();

        for attempt in 0..=self.schema_retries {
            let attempt_request = ChatRequest {
                system: request.system.clone(),
                user: attempt_user.clone(),
                profile: request.profile,
            };
            let completion = self.client.complete(attempt_request).await?;
            match Self::admit::<T>(&completion) {
                Ok(value) => {
                    debug!(attempt, "completion admitted");
                    return Ok(value);
                }
                Err(description) => {
                    warn!(attempt, error = %description, "completion failed schema validation");
                    last_error = description;
                    attempt_user = format!(
                        "{framed_user}\n\nYour previous reply could not be accepted: \
                         {last_error}\nReturn corrected JSON only."
                    );
                }
            }
        }

        Err(LlmError::SchemaViolation(last_error))
    }

    /// Extracts and deserializes a completion; the error string feeds the
    /// retry prompt.
    fn admit<T: DeserializeOwned>(completion: &str) -> Result<T, String> {
        let json = extract_json(completion).map_err(|e| e.to_string())?;
        serde_json::from_str(&json).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Dish {
        title: String,
        servings: u32,
    }

    /// Replays a fixed sequence of completions and records every request.
    #[derive(Clone)]
    struct ScriptedChat {
        responses: Arc<Mutex<Vec<String>>>,
        requests: Arc<Mutex<Vec<ChatRequest>>>,
    }

    impl ScriptedChat {
        fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: Arc::new(Mutex::new(
                    responses.into_iter().rev().map(String::from).collect(),
                )),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedChat {
        async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
            self.requests.lock().unwrap().push(request);
            let mut responses = self.responses.lock().unwrap();
            responses
                .pop()
                .ok_or_else(|| LlmError::MalformedResponse("script exhausted".into()))
        }
    }

    #[tokio::test]
    async fn valid_first_completion_is_admitted() {
        let chat = ScriptedChat::new(vec![r#"{"title": "Omelette", "servings": 2}"#]);
        let llm = StructuredLlm::new(chat.clone());
        let dish: Dish = llm
            .call(ChatRequest::new("system", "make a dish"))
            .await
            .unwrap();
        assert_eq!(
            dish,
            Dish {
                title: "Omelette".into(),
                servings: 2
            }
        );
        assert_eq!(chat.request_count(), 1);
    }

    #[tokio::test]
    async fn schema_failure_retries_once_with_the_error_description() {
        let chat = ScriptedChat::new(vec![
            "I would be happy to help!",
            r#"{"title": "Omelette", "servings": 2}"#,
        ]);
        let llm = StructuredLlm::new(chat.clone());
        let dish: Dish = llm
            .call(ChatRequest::new("system", "make a dish"))
            .await
            .unwrap();
        assert_eq!(dish.title, "Omelette");
        assert_eq!(chat.request_count(), 2);

        let requests = chat.requests.lock().unwrap();
        assert!(
            requests[1]
                .user
                .contains("Your previous reply could not be accepted")
        );
        assert!(requests[1].user.contains("no JSON value found"));
    }

    #[tokio::test]
    async fn persistent_schema_failure_stops_after_two_attempts() {
        let chat = ScriptedChat::new(vec!["nope", "still nope", "never sent"]);
        let llm = StructuredLlm::new(chat.clone());
        let result: Result<Dish, _> = llm.call(ChatRequest::new("system", "make a dish")).await;
        assert!(matches!(result, Err(LlmError::SchemaViolation(_))));
        assert_eq!(chat.request_count(), 2);
    }

    #[tokio::test]
    async fn transport_errors_are_not_retried() {
        #[derive(Clone)]
        struct FailingChat {
            calls: Arc<Mutex<u32>>,
        }

        #[async_trait]
        impl ChatClient for FailingChat {
            async fn complete(&self, _request: ChatRequest) -> Result<String, LlmError> {
                *self.calls.lock().unwrap() += 1;
                Err(LlmError::Timeout)
            }
        }

        let chat = FailingChat {
            calls: Arc::new(Mutex::new(0)),
        };
        let llm = StructuredLlm::new(chat.clone());
        let result: Result<Dish, _> = llm.call(ChatRequest::new("system", "make a dish")).await;
        assert!(matches!(result, Err(LlmError::Timeout)));
        assert_eq!(*chat.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn prompt_carries_the_declared_schema() {
        let chat = ScriptedChat::new(vec![r#"{"title": "Toast", "servings": 1}"#]);
        let llm = StructuredLlm::new(chat.clone());
        let _: Dish = llm
            .call(ChatRequest::new("system", "make a dish"))
            .await
            .unwrap();
        let requests = chat.requests.lock().unwrap();
        assert!(requests[0].user.contains("JSON Schema"));
        assert!(requests[0].user.contains("servings"));
    }
}
