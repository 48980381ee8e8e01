//! A channel that posts notifications to a Feishu (Lark) custom bot webhook.

use crate::config::{FeishuConfig, MessageKind};
use crate::core::{Channel, ChannelError, Effect, NotificationRequest, WEBHOOK_PLACEHOLDER};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// The JSON envelope accepted by the webhook.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "msg_type", content = "content", rename_all = "lowercase")]
pub enum WebhookPayload {
    Text { text: String },
    Post { post: PostLocales },
    Interactive(CardContent),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PostLocales {
    pub zh_cn: PostBody,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PostBody {
    pub title: String,
    pub content: Vec<Vec<PostElement>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PostElement {
    pub tag: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CardContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: CardData,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CardData {
    pub template_id: String,
    pub template_variable: CardVariables,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CardVariables {
    pub title: String,
    pub content: String,
}

impl WebhookPayload {
    pub fn text(text: impl Into<String>) -> Self {
        WebhookPayload::Text { text: text.into() }
    }

    pub fn post(title: impl Into<String>, content: impl Into<String>) -> Self {
        WebhookPayload::Post {
            post: PostLocales {
                zh_cn: PostBody {
                    title: title.into(),
                    content: vec![vec![PostElement {
                        tag: "text".to_string(),
                        text: content.into(),
                    }]],
                },
            },
        }
    }

    pub fn card(
        template_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        WebhookPayload::Interactive(CardContent {
            kind: "template".to_string(),
            data: CardData {
                template_id: template_id.into(),
                template_variable: CardVariables {
                    title: title.into(),
                    content: content.into(),
                },
            },
        })
    }

    /// Builds the envelope of the given kind for a request.
    pub fn for_request(
        kind: MessageKind,
        template_id: &str,
        request: &NotificationRequest,
    ) -> Self {
        match kind {
            MessageKind::Text => Self::text(format!("{}\n{}", request.title(), request.body())),
            MessageKind::Post => Self::post(request.title(), request.body()),
            MessageKind::Card => Self::card(template_id, request.title(), request.body()),
        }
    }
}

/// The envelope the webhook answers with.
#[derive(Debug, Deserialize)]
pub struct WebhookResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

/// Returns true when a webhook URL has not been filled in.
pub fn is_unconfigured(url: &str) -> bool {
    let url = url.trim();
    url.is_empty() || url.contains(WEBHOOK_PLACEHOLDER)
}

/// Sends notifications to a Feishu webhook.
pub struct FeishuChannel {
    webhook_url: String,
    message_kind: MessageKind,
    template_id: String,
    timeout: Duration,
}

impl FeishuChannel {
    /// Creates a new `FeishuChannel` posting rich-text messages.
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            message_kind: MessageKind::Post,
            template_id: crate::config::DEFAULT_TEMPLATE_ID.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_config(config: &FeishuConfig) -> Self {
        Self {
            webhook_url: config.webhook_url.clone(),
            message_kind: config.message_type,
            template_id: config.template_id.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    pub fn with_message_kind(mut self, kind: MessageKind) -> Self {
        self.message_kind = kind;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Posts a payload and classifies the webhook's answer.
    pub async fn send_payload(&self, payload: &WebhookPayload) -> Result<(), ChannelError> {
        if is_unconfigured(&self.webhook_url) {
            return Err(ChannelError::Configuration(
                "webhook URL has not been set".to_string(),
            ));
        }

        let body = serde_json::to_vec(payload)?;
        debug!(bytes = body.len(), "Posting webhook payload");

        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        // reqwest derives Content-Length from the byte body.
        let response = client
            .post(&self.webhook_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request to webhook failed");
                ChannelError::Transport(e)
            })?;

        let status = response.status();
        let text = response.text().await?;
        classify_response(status, &text)
    }
}

/// Maps a webhook answer onto a delivery result. A non-2xx status is a
/// failure; otherwise only `code == 0` counts as success.
fn classify_response(status: reqwest::StatusCode, body: &str) -> Result<(), ChannelError> {
    if !status.is_success() {
        error!(status = %status, body = %body, "Webhook returned an error status");
        return Err(ChannelError::Status {
            status: status.as_u16(),
            body: body.trim().to_string(),
        });
    }

    match serde_json::from_str::<WebhookResponse>(body) {
        Ok(WebhookResponse { code: 0, .. }) => {
            info!("Webhook accepted notification.");
            Ok(())
        }
        Ok(WebhookResponse { code, msg }) => {
            error!(code, msg = %msg, "Webhook rejected notification");
            Err(ChannelError::Rejected { code, msg })
        }
        Err(e) => {
            error!(status = %status, body = %body, "Could not parse webhook response");
            Err(ChannelError::MalformedResponse(format!("HTTP {}: {}", status, e)))
        }
    }
}

#[async_trait]
impl Channel for FeishuChannel {
    fn name(&self) -> &str {
        "feishu"
    }

    fn effect(&self) -> Effect {
        Effect::ChatMessage
    }

    #[instrument(skip(self, request), fields(kind = %self.message_kind))]
    async fn deliver(&self, request: &NotificationRequest) -> Result<(), ChannelError> {
        let payload = WebhookPayload::for_request(self.message_kind, &self.template_id, request);
        self.send_payload(&payload).await
    }
}
