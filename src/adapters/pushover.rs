//! Alert delivery
//!
//! `PushoverSink` posts the composed message to the Pushover messages API as a
//! form (`user`, `token`, `message`). `LogSink` is used when no credentials are
//! configured: alerts still show up in the logs.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::adapters::errors::{AdapterError, AdapterResult};
use crate::adapters::traits::AlertSink;

pub struct PushoverSink {
    url: String,
    user: String,
    token: String,
    http_client: reqwest::Client,
}

impl PushoverSink {
    pub fn new(
        url: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            url: url.into(),
            user: user.into(),
            token: token.into(),
            http_client,
        }
    }
}

#[async_trait]
impl AlertSink for PushoverSink {
    async fn deliver(&self, message: &str) -> AdapterResult<()> {
        let form = [
            ("user", self.user.as_str()),
            ("token", self.token.as_str()),
            ("message", message),
        ];

        let response = self.http_client
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AdapterError::Request(format!("Pushover request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Pushover rejected the message");
            return Err(AdapterError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        info!(lines = message.lines().count(), "Alert delivered");
        Ok(())
    }
}

/// Sink that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn deliver(&self, message: &str) -> AdapterResult<()> {
        info!(message = %message, "Alert (no delivery configured)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_deliver_posts_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/1/messages.json")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("user".into(), "u-123".into()),
                Matcher::UrlEncoded("token".into(), "t-456".into()),
                Matcher::UrlEncoded("message".into(), "Paribu BTC %-2.00\nBTC Paribu Koineks %1.75".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"status":1}"#)
            .create_async()
            .await;

        let sink = PushoverSink::new(
            format!("{}/1/messages.json", server.url()),
            "u-123",
            "t-456",
            Duration::from_secs(5),
        );

        sink.deliver("Paribu BTC %-2.00\nBTC Paribu Koineks %1.75").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_deliver_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("POST", "/1/messages.json")
            .with_status(400)
            .with_body(r#"{"user":"invalid","status":0}"#)
            .create_async()
            .await;

        let sink = PushoverSink::new(
            format!("{}/1/messages.json", server.url()),
            "bad",
            "t-456",
            Duration::from_secs(5),
        );

        let err = sink.deliver("x %1.00").await.unwrap_err();
        assert!(matches!(err, AdapterError::Status { status: 400, .. }));
        assert!(err.to_string().contains("invalid"));
    }

    #[tokio::test]
    async fn test_log_sink_accepts_everything() {
        assert!(LogSink.deliver("anything").await.is_ok());
    }
}
