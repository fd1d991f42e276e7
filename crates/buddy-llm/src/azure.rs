//! Azure OpenAI chat-completions client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use buddy_core::config::{CompletionConfig, HttpConfig};
use buddy_core::RetryPolicy;

use crate::client::{Completion, CompletionClient, CompletionRequest};
use crate::error::LlmError;

/// Completion client backed by an Azure OpenAI deployment.
#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    http: Client,
    url: String,
    temperature: f32,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl AzureOpenAiClient {
    /// Build a client from configuration.
    ///
    /// The API key is installed as a default header; the request timeout
    /// applies to every call.
    pub fn new(config: &CompletionConfig, http: &HttpConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Config("API key is required".to_string()));
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| LlmError::Config(format!("Invalid API key: {}", e)))?;
        headers.insert("api-key", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(http.request_timeout())
            .user_agent(concat!("travel-buddy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http: client,
            url: chat_url(&config.endpoint, &config.deployment, &config.api_version),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            retry: RetryPolicy::from_config(http),
        })
    }

    /// Build the JSON request body.
    fn build_body(&self, request: &CompletionRequest) -> JsonValue {
        let mut request = request.clone();
        if let Some(schema) = &request.output_schema {
            let instruction = format!(
                "Respond only with a JSON object matching this schema:\n{}",
                schema
            );
            request.system = Some(match request.system.take() {
                Some(system) => format!("{}\n\n{}", system, instruction),
                None => instruction,
            });
        }

        let mut body = json!({
            "messages": request.to_messages(),
            "temperature": request.temperature.unwrap_or(self.temperature),
            "max_tokens": request.max_tokens.unwrap_or(self.max_tokens),
        });
        if request.output_schema.is_some() {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }

    async fn send_once(&self, body: &JsonValue) -> Result<ChatCompletionResponse, LlmError> {
        let response = self.http.post(&self.url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), extract_error_message(&text)));
        }
        Ok(response.json::<ChatCompletionResponse>().await?)
    }
}

#[async_trait]
impl CompletionClient for AzureOpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let body = self.build_body(&request);
        let structured = request.output_schema.is_some();

        tracing::debug!(
            history = request.history.len(),
            structured,
            "Sending completion request"
        );

        let response = self
            .retry
            .run("completion", || self.send_once(&body), LlmError::is_retryable)
            .await?;

        parse_completion(response, structured)
    }
}

// =============================================================================
// Wire types and helpers
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version=..`
fn chat_url(endpoint: &str, deployment: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        endpoint.trim_end_matches('/'),
        deployment,
        api_version
    )
}

fn parse_completion(
    response: ChatCompletionResponse,
    structured: bool,
) -> Result<Completion, LlmError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::MalformedResponse("response has no choices".to_string()))?;

    if !structured {
        return Ok(Completion::text(content));
    }

    let value: JsonValue = serde_json::from_str(strip_code_fence(&content))?;
    if !value.is_object() {
        return Err(LlmError::MalformedResponse(
            "structured output is not a JSON object".to_string(),
        ));
    }
    Ok(Completion {
        text: content,
        structured: Some(value),
    })
}

/// Remove a surrounding markdown code fence, if the model added one.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Pull `error.message` out of an Azure error body, falling back to the raw text.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<JsonValue>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(300).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use buddy_core::Turn;

    fn config() -> CompletionConfig {
        CompletionConfig {
            endpoint: "https://example.openai.azure.com/".to_string(),
            deployment: "gpt-4o".to_string(),
            api_key: "secret".to_string(),
            ..CompletionConfig::default()
        }
    }

    fn client() -> AzureOpenAiClient {
        AzureOpenAiClient::new(&config(), &HttpConfig::default()).unwrap()
    }

    fn response(content: Option<&str>) -> ChatCompletionResponse {
        ChatCompletionResponse {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: content.map(str::to_string),
                },
            }],
        }
    }

    #[test]
    fn test_chat_url() {
        assert_eq!(
            chat_url("https://r.openai.azure.com/", "dep", "2024-02-01"),
            "https://r.openai.azure.com/openai/deployments/dep/chat/completions?api-version=2024-02-01"
        );
    }

    #[test]
    fn test_new_requires_api_key() {
        let mut cfg = config();
        cfg.api_key = String::new();
        let err = AzureOpenAiClient::new(&cfg, &HttpConfig::default()).unwrap_err();
        assert!(matches!(err, LlmError::Config(_)));
    }

    #[test]
    fn test_build_body_plain() {
        let turns = vec![Turn::user("hello"), Turn::assistant("hi there")];
        let request = CompletionRequest::new("what now?")
            .with_system("system prompt")
            .with_history(&turns);
        let body = client().build_body(&request);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[3]["content"], "what now?");
        assert_eq!(body["max_tokens"], 1500);
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_build_body_structured() {
        let request = CompletionRequest::new("classify")
            .with_system("classifier")
            .with_output_schema(json!({"type": "object"}))
            .with_max_tokens(200);
        let body = client().build_body(&request);

        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["max_tokens"], 200);
        let system = body["messages"][0]["content"].as_str().unwrap();
        assert!(system.starts_with("classifier"));
        assert!(system.contains("JSON object matching this schema"));
    }

    #[test]
    fn test_parse_plain_completion() {
        let completion = parse_completion(response(Some("Try the Louvre.")), false).unwrap();
        assert_eq!(completion.text, "Try the Louvre.");
        assert!(completion.structured.is_none());
    }

    #[test]
    fn test_parse_structured_completion() {
        let completion =
            parse_completion(response(Some(r#"{"intent": "new_query"}"#)), true).unwrap();
        assert_eq!(completion.structured.unwrap()["intent"], "new_query");
    }

    #[test]
    fn test_parse_structured_with_code_fence() {
        let content = "```json\n{\"intent\": \"follow_up\"}\n```";
        let completion = parse_completion(response(Some(content)), true).unwrap();
        assert_eq!(completion.structured.unwrap()["intent"], "follow_up");
    }

    #[test]
    fn test_parse_structured_malformed() {
        let err = parse_completion(response(Some("not json at all")), true).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_structured_non_object() {
        let err = parse_completion(response(Some("[1, 2]")), true).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_no_choices() {
        let err = parse_completion(ChatCompletionResponse { choices: vec![] }, false).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_null_content() {
        assert!(parse_completion(response(None), false).is_err());
    }

    #[test]
    fn test_response_deserializes_from_wire_json() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"ok"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parse_completion(parsed, false).unwrap().text, "ok");
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"error": {"code": "429", "message": "Rate limit reached"}}"#;
        assert_eq!(extract_error_message(body), "Rate limit reached");
        assert_eq!(extract_error_message("plain failure"), "plain failure");
    }
}
