use super::*;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};

/// OpenAI-backed story provider
pub struct OpenAiStoryteller {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiStoryteller {
    /// Create a new provider with the given API key and model
    pub fn new(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        Self { client, model }
    }
}

#[async_trait]
impl StoryProvider for OpenAiStoryteller {
    async fn generate(&self, request: StoryRequest) -> NarrativeResult<StoryOutput> {
        let system_content = "You write short fantasy vignettes that hide a secret message. \
            You always answer with a single JSON object and nothing else.";

        let user_content = build_story_prompt(&request.secret, request.difficulty);

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(0.8)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_content)
                    .build()
                    .map_err(|e| NarrativeError::ApiError(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_content)
                    .build()
                    .map_err(|e| NarrativeError::ApiError(e.to_string()))?
                    .into(),
            ])
            .build()
            .map_err(|e| NarrativeError::ApiError(e.to_string()))?;

        // Execute with timeout
        let response =
            tokio::time::timeout(request.timeout, self.client.chat().create(chat_request))
                .await
                .map_err(|_| NarrativeError::Timeout(request.timeout))?
                .map_err(|e| NarrativeError::ApiError(e.to_string()))?;

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| NarrativeError::ParseError("No content in response".to_string()))?;

        parse_story_json(&text)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Difficulty;

    #[tokio::test]
    #[ignore] // Only run with actual API key
    async fn test_openai_story_generation() {
        let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
        let provider = OpenAiStoryteller::new(api_key, "gpt-4o-mini".to_string());

        let request = StoryRequest {
            secret: "Meet at the old oak tree at midnight".to_string(),
            difficulty: Difficulty::Medium,
            timeout: Duration::from_secs(30),
        };

        let output = provider.generate(request).await.unwrap();

        assert!(!output.story.is_empty());
        assert!(!output.mapping.is_empty());
        println!("Story: {}", output.story);
        println!("Mapping: {:?}", output.mapping);
    }
}
