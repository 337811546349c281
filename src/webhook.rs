//! Outbound webhook delivery for asynchronous scan jobs.
//!
//! Grounded on spec.md section 6 ("Outbound wire contracts") and the
//! teacher's `execute_with_retry` exponential-backoff idiom in
//! `scrapers/dome.rs`.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::KYCDecisionOutput;

pub const WEBHOOK_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub job_id: String,
    pub reference_id: Option<String>,
    pub status: WebhookStatus,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub duration_seconds: f64,
    pub result: Option<KYCDecisionOutput>,
    pub error: Option<String>,
}

/// Delivers a webhook payload with retry, matching spec.md section 6:
/// three attempts, `2^attempt` second exponential backoff, success is any
/// 2xx. `extra_headers` carries client-supplied header passthrough.
pub async fn deliver(
    client: &Client,
    webhook_url: &str,
    payload: &WebhookPayload,
    extra_headers: &[(String, String)],
) -> Result<(), anyhow::Error> {
    const MAX_ATTEMPTS: u32 = 3;

    let mut last_error = None;
    for attempt in 1..=MAX_ATTEMPTS {
        let mut request = client
            .post(webhook_url)
            .header("X-KYC-Job-ID", &payload.job_id)
            .header("X-KYC-Webhook-Version", WEBHOOK_VERSION)
            .json(payload);

        for (name, value) in extra_headers {
            request = request.header(name, value);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                info!(job_id = %payload.job_id, attempt, "webhook delivered");
                return Ok(());
            }
            Ok(response) => {
                warn!(job_id = %payload.job_id, attempt, status = %response.status(), "webhook returned non-2xx");
                last_error = Some(anyhow::anyhow!("webhook returned {}", response.status()));
            }
            Err(e) => {
                warn!(job_id = %payload.job_id, attempt, error = %e, "webhook request failed");
                last_error = Some(anyhow::Error::from(e));
            }
        }

        if attempt < MAX_ATTEMPTS {
            let backoff = Duration::from_secs(2u64.pow(attempt));
            tokio::time::sleep(backoff).await;
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("webhook delivery failed with no recorded error")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> WebhookPayload {
        WebhookPayload {
            job_id: "job_123".to_string(),
            reference_id: None,
            status: WebhookStatus::Completed,
            completed_at: chrono::Utc::now(),
            duration_seconds: 1.5,
            result: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn delivery_succeeds_against_a_2xx_endpoint() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::header("X-KYC-Webhook-Version", WEBHOOK_VERSION))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = Client::new();
        let result = deliver(&client, &server.uri(), &sample_payload(), &[]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn delivery_fails_after_exhausting_retries() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = Client::new();
        let result = deliver(&client, &server.uri(), &sample_payload(), &[]).await;
        assert!(result.is_err());
    }
}
