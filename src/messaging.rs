//! Outbound SMS delivery

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

/// Sends one text message to a phone number
#[async_trait]
pub trait MessageSender: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, to: &str, body: &str) -> Result<()>;
}

/// Twilio Programmable Messaging client
#[derive(Debug, Clone)]
pub struct TwilioSender {
    api_base: String,
    account_sid: String,
    auth_token: String,
    from: String,
    client: reqwest::Client,
}

impl TwilioSender {
    pub fn new(
        api_base: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from: from.into(),
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

#[async_trait]
impl MessageSender for TwilioSender {
    fn name(&self) -> &'static str {
        "twilio"
    }

    async fn send(&self, to: &str, body: &str) -> Result<()> {
        debug!("Sending {} chars to {}", body.chars().count(), to);

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from.as_str()), ("Body", body)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Twilio API error {}: {}", status, body);
        }

        Ok(())
    }
}

/// Logs messages instead of sending them
#[derive(Debug, Clone, Default)]
pub struct LogSender;

#[async_trait]
impl MessageSender for LogSender {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, to: &str, body: &str) -> Result<()> {
        info!("SMS to {}: {}", to, body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{basic_auth, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_twilio_posts_form_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
            .and(basic_auth("AC123", "secret"))
            .and(body_string_contains("To=%2B15550001111"))
            .and(body_string_contains("From=%2B15559990000"))
            .and(body_string_contains("Body=1%2F1+hello"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let sender = TwilioSender::new(server.uri(), "AC123", "secret", "+15559990000");
        tokio_test::assert_ok!(sender.send("+15550001111", "1/1 hello").await);
    }

    #[tokio::test]
    async fn test_twilio_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid To number"))
            .mount(&server)
            .await;

        let sender = TwilioSender::new(server.uri(), "AC123", "secret", "+15559990000");
        let err = sender.send("nope", "hi").await.unwrap_err();
        assert!(err.to_string().contains("invalid To number"));
    }

    #[tokio::test]
    async fn test_log_sender_always_succeeds() {
        tokio_test::assert_ok!(LogSender.send("+15550001111", "1/1 hi").await);
    }
}
