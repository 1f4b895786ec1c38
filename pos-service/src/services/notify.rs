use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;

use crate::config::WhatsappConfig;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Notifier not enabled")]
    NotEnabled,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Send error: {0}")]
    SendFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// What an invoice notification carries: enough to tell the customer what
/// they owe and where to view the bill.
#[derive(Debug, Clone)]
pub struct InvoiceNotice {
    pub to_phone: String,
    pub invoice_number: String,
    pub total: f64,
    pub currency: String,
    pub business_name: String,
    pub link: String,
}

/// Outbound invoice notification channel. Always best-effort: callers
/// fire-and-forget and never fail the originating request on an error.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_invoice_notice(&self, notice: &InvoiceNotice) -> Result<(), NotifierError>;
}

pub struct WhatsappNotifier {
    config: WhatsappConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct WhatsappMessageRequest {
    messaging_product: &'static str,
    to: String,
    #[serde(rename = "type")]
    message_type: &'static str,
    text: WhatsappText,
}

#[derive(Debug, Serialize)]
struct WhatsappText {
    body: String,
}

impl WhatsappNotifier {
    pub fn new(config: WhatsappConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.enabled
    }
}

#[async_trait]
impl Notifier for WhatsappNotifier {
    async fn send_invoice_notice(&self, notice: &InvoiceNotice) -> Result<(), NotifierError> {
        if !self.config.enabled {
            return Err(NotifierError::NotEnabled);
        }

        let to: String = notice
            .to_phone
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        if to.is_empty() {
            return Err(NotifierError::InvalidRecipient(
                "recipient phone is empty".to_string(),
            ));
        }

        let body = format!(
            "{} {}\nTotal: {:.2} {}\n{}",
            notice.business_name, notice.invoice_number, notice.total, notice.currency, notice.link
        );
        let request = WhatsappMessageRequest {
            messaging_product: "whatsapp",
            to,
            message_type: "text",
            text: WhatsappText { body },
        };

        let url = format!(
            "{}/{}/messages",
            self.config.api_url.trim_end_matches('/'),
            self.config.phone_number_id
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifierError::Connection(format!("WhatsApp API unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(NotifierError::SendFailed(format!(
                "WhatsApp API returned {}: {}",
                status, detail
            )));
        }

        Ok(())
    }
}

/// Used when no delivery channel is configured and in tests that do not
/// care about notifications.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send_invoice_notice(&self, _notice: &InvoiceNotice) -> Result<(), NotifierError> {
        Err(NotifierError::NotEnabled)
    }
}
