//! Twilio SMS sender.
//!
//! Posts messages to the Twilio REST API's `Messages.json` endpoint using
//! HTTP basic auth with the account SID and auth token.

use crate::config::SmsConfig;
use crate::error::SendError;
use crate::notify::NotificationSender;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Error body returned by Twilio on a rejected request.
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    code: Option<u64>,
    message: String,
}

/// SMS sender backed by the Twilio REST API.
pub struct TwilioSender {
    http_client: reqwest::Client,
    api_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
    timeout_seconds: u64,
}

impl TwilioSender {
    /// Create a sender from SMS settings.
    pub fn new(config: &SmsConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", self.api_url, self.account_sid)
    }
}

#[async_trait]
impl NotificationSender for TwilioSender {
    fn name(&self) -> &'static str {
        "twilio"
    }

    async fn send(&self, body: &str, destination: &str) -> Result<(), SendError> {
        let url = self.messages_url();
        debug!("Posting SMS to {} via {}", destination, url);

        let form = [
            ("To", destination),
            ("From", self.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form[..])
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    format!("request timed out after {}s", self.timeout_seconds)
                } else if e.is_connect() {
                    format!("cannot connect to {}", self.api_url)
                } else {
                    format!("failed to send request: {}", e)
                };
                SendError::new(destination, reason)
            })?;

        let status = response.status();
        if status.is_success() {
            info!("SMS sent successfully to {}", destination);
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let reason = match serde_json::from_str::<TwilioErrorBody>(&text) {
            Ok(TwilioErrorBody {
                code: Some(code),
                message,
            }) => format!("HTTP {} (code {}): {}", status.as_u16(), code, message),
            Ok(TwilioErrorBody { message, .. }) => format!("HTTP {}: {}", status.as_u16(), message),
            Err(_) => format!("HTTP {}", status.as_u16()),
        };

        Err(SendError::new(destination, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn test_config(api_url: String) -> SmsConfig {
        SmsConfig {
            api_url,
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from_number: "+15559999".to_string(),
            timeout_seconds: 5,
        }
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(split) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..split]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= split + 4 + content_length
    }

    /// Accept one HTTP request, answer with `status_line` and `body`, return the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    #[test]
    fn test_messages_url() {
        let sender =
            TwilioSender::new(&test_config("https://api.twilio.com/2010-04-01/".to_string()))
                .unwrap();
        assert_eq!(
            sender.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[tokio::test]
    async fn test_send_posts_form() {
        let (url, server) = serve_once("HTTP/1.1 201 Created", r#"{"sid":"SM1"}"#).await;
        let sender = TwilioSender::new(&test_config(url)).unwrap();

        sender.send("due back tomorrow", "+15550100").await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /Accounts/AC123/Messages.json"));
        assert!(request.to_lowercase().contains("authorization: basic"));
        assert!(request.contains("To=%2B15550100"));
        assert!(request.contains("From=%2B15559999"));
        assert!(request.contains("Body=due+back+tomorrow"));
    }

    #[tokio::test]
    async fn test_rejected_send_reports_twilio_message() {
        let (url, server) = serve_once(
            "HTTP/1.1 400 Bad Request",
            r#"{"code":21211,"message":"Invalid 'To' Phone Number","status":400}"#,
        )
        .await;
        let sender = TwilioSender::new(&test_config(url)).unwrap();

        let err = sender.send("hi", "bogus").await.unwrap_err();
        server.await.unwrap();
        assert_eq!(err.destination, "bogus");
        assert_eq!(err.reason, "HTTP 400 (code 21211): Invalid 'To' Phone Number");
    }

    #[tokio::test]
    async fn test_unreachable_gateway() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sender = TwilioSender::new(&test_config(format!("http://{}", addr))).unwrap();
        let err = sender.send("hi", "+15550100").await.unwrap_err();
        assert_eq!(err.destination, "+15550100");
    }
}
