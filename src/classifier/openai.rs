//! OpenAI-compatible chat completions client.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CompletionRequest, LanguageModel};
use crate::config::LlmConfig;
use crate::{AppError, Result};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions model reachable over HTTP.
#[derive(Clone)]
pub struct OpenAiCompatModel {
    client: Client,
    endpoint: String,
    auth_header: String,
    model: String,
    vision_model: String,
    temperature: f32,
}

impl OpenAiCompatModel {
    /// Build a client for `config` authenticated with `api_key`.
    #[must_use]
    pub fn new(config: &LlmConfig, api_key: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            auth_header: format!("Bearer {api_key}"),
            model: config.model.clone(),
            vision_model: config.vision_model.clone(),
            temperature: config.temperature,
        }
    }

    async fn send(&self, request: CompletionRequest) -> Result<String> {
        let (model, content, response_format) = match request.image {
            Some(image) => {
                let data = STANDARD.encode(&image.bytes);
                let parts = vec![
                    ContentPart::Text {
                        text: request.prompt,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:{};base64,{data}", image.mime),
                        },
                    },
                ];
                (
                    self.vision_model.as_str(),
                    MessageContent::Parts(parts),
                    None,
                )
            }
            None => (
                self.model.as_str(),
                MessageContent::Text(request.prompt),
                Some(ResponseFormat {
                    kind: "json_object",
                }),
            ),
        };
        let body = ChatRequest {
            model,
            messages: vec![Message {
                role: "user",
                content,
            }],
            temperature: self.temperature,
            response_format,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", &self.auth_header)
            .json(&body)
            .send()
            .await
            .map_err(|err| classifier_error("request failed", &err))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Classifier(format!(
                "provider returned {status}: {}",
                crate::util::preview(&text, 200)
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| classifier_error("response decode failed", &err))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::Classifier("empty completion".into()))
    }
}

fn classifier_error(what: &str, err: &reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout(format!("language model {what}: {err}"))
    } else {
        AppError::Classifier(format!("{what}: {err}"))
    }
}

impl LanguageModel for OpenAiCompatModel {
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(self.send(request))
    }
}
