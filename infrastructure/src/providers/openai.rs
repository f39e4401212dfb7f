//! OpenAI-compatible chat completion provider.
//!
//! Structured output is requested as a single forced function call whose
//! parameters are the schema; the arguments come back as a JSON string.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tavern_application::{CompletionRequest, LlmProvider, ProviderError};
use tavern_domain::{OutputSchema, ProviderKind};
use tracing::debug;

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| ProviderError::MissingCredentials(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }

    async fn send(&self, body: &ApiRequest<'_>) -> Result<ApiResponse, ProviderError> {
        debug!(model = body.model, url = %self.endpoint(), "Sending chat completion");
        let response = self
            .client
            .post(self.endpoint())
            .headers(self.build_headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
        let response = self.send(&ApiRequest::text(request)).await?;
        extract_text(response)
    }

    async fn complete_structured(
        &self,
        request: &CompletionRequest<'_>,
        schema: &OutputSchema,
    ) -> Result<Value, ProviderError> {
        let response = self.send(&ApiRequest::structured(request, schema)).await?;
        extract_arguments(response)
    }
}

// ==================== Wire types ====================

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: [ApiMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<[ApiTool<'a>; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

impl<'a> ApiRequest<'a> {
    fn text(request: &CompletionRequest<'a>) -> Self {
        Self {
            model: request.model,
            messages: [
                ApiMessage {
                    role: "system",
                    content: request.system_prompt,
                },
                ApiMessage {
                    role: "user",
                    content: request.user_prompt,
                },
            ],
            temperature: request.temperature,
            tools: None,
            tool_choice: None,
        }
    }

    fn structured(request: &CompletionRequest<'a>, schema: &OutputSchema) -> Self {
        let mut body = Self::text(request);
        body.tools = Some([ApiTool {
            kind: "function",
            function: ApiFunction {
                name: schema.name,
                description: schema.description,
                parameters: schema.parameters(),
            },
        }]);
        body.tool_choice = Some(serde_json::json!({
            "type": "function",
            "function": { "name": schema.name }
        }));
        body
    }
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ApiTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ApiFunction<'a>,
}

#[derive(Debug, Serialize)]
struct ApiFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
    /// Some compatible servers send `null` instead of omitting the field.
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiToolCall {
    function: ApiToolCallFunction,
}

#[derive(Debug, Deserialize)]
struct ApiToolCallFunction {
    arguments: String,
}

fn first_message(response: ApiResponse) -> Result<ApiResponseMessage, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| ProviderError::MalformedResponse("response has no choices".to_string()))
}

fn extract_text(response: ApiResponse) -> Result<String, ProviderError> {
    first_message(response)?
        .content
        .ok_or_else(|| ProviderError::MalformedResponse("message has no content".to_string()))
}

fn extract_arguments(response: ApiResponse) -> Result<Value, ProviderError> {
    let call = first_message(response)?
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse("no function call returned".to_string()))?;
    serde_json::from_str(&call.function.arguments)
        .map_err(|e| ProviderError::MalformedResponse(format!("function arguments: {e}")))
}
