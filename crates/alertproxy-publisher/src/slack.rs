//! Slack incoming-webhook sink.
//!
//! Incoming webhooks don't return a message identifier to thread future
//! updates off of, so the "incident ID" cached for a Slack target is a
//! synthetic marker (the fingerprint itself) — enough to distinguish "we
//! already posted about this alert" from a first sighting, which is all
//! the create/update routing in [`crate::sink::IncidentPublisher`] needs.
//! Recorded as an explicit design decision in `DESIGN.md`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use alertproxy_core::ProviderError;
use alertproxy_types::{AlertStatus, EnrichedAlert, Severity, Target};

use crate::config_ext::require_config;
use crate::error_mapping::{http_error, network_error, retry_after_seconds};
use crate::sink::IncidentSink;

const PROVIDER: &str = "slack";

fn severity_color(alert: &EnrichedAlert) -> &'static str {
    match alert.effective_severity() {
        Severity::Critical => "#d62728",
        Severity::Warning => "#ff9f1c",
        Severity::Info => "#2ca02c",
    }
}

fn blocks_payload(alert: &EnrichedAlert, heading: &str) -> Value {
    json!({
        "attachments": [{
            "color": severity_color(alert),
            "blocks": [
                {
                    "type": "section",
                    "text": { "type": "mrkdwn", "text": format!("*{heading}*: {}", alert.alert_name()) }
                },
                {
                    "type": "context",
                    "elements": [{ "type": "mrkdwn", "text": format!("fingerprint: `{}`", alert.fingerprint) }]
                }
            ]
        }]
    })
}

pub struct SlackSink {
    client: Client,
}

impl SlackSink {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn post(&self, target: &Target, payload: Value) -> Result<(), ProviderError> {
        let webhook_url = require_config(target, PROVIDER, "webhook_url")?;

        let response = self
            .client
            .post(webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, &e))?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let retry_after = retry_after_seconds(response.headers());
        let body = response.text().await.unwrap_or_default();
        Err(http_error(PROVIDER, status, retry_after, body))
    }
}

#[async_trait]
impl IncidentSink for SlackSink {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn create(&self, alert: &EnrichedAlert, target: &Target) -> Result<String, ProviderError> {
        self.post(target, blocks_payload(alert, "Firing")).await?;
        Ok(alert.fingerprint.clone())
    }

    async fn update(&self, _external_id: &str, alert: &EnrichedAlert, target: &Target) -> Result<(), ProviderError> {
        self.post(target, blocks_payload(alert, "Still firing")).await
    }

    async fn resolve(&self, _external_id: &str, alert: &EnrichedAlert, target: &Target) -> Result<(), ProviderError> {
        debug_assert_eq!(alert.status, AlertStatus::Resolved);
        self.post(target, blocks_payload(alert, "Resolved")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use chrono::Utc;

    fn alert() -> EnrichedAlert {
        let mut labels = BTreeMap::new();
        labels.insert("alertname".to_string(), "HighCPU".to_string());
        EnrichedAlert {
            fingerprint: "fp-123".to_string(),
            status: AlertStatus::Firing,
            labels,
            starts_at: Utc::now(),
            ends_at: None,
            generator_url: None,
            classification: None,
        }
    }

    #[test]
    fn blocks_payload_includes_alert_name_and_fingerprint() {
        let payload = blocks_payload(&alert(), "Firing");
        let rendered = payload.to_string();
        assert!(rendered.contains("HighCPU"));
        assert!(rendered.contains("fp-123"));
    }

    #[test]
    fn severity_color_varies_by_severity() {
        let mut a = alert();
        assert_eq!(severity_color(&a), "#ff9f1c");
        a.classification = Some(alertproxy_types::Classification {
            severity: Severity::Critical,
            confidence: 0.9,
            reasoning: "spike".into(),
            recommendations: vec![],
        });
        assert_eq!(severity_color(&a), "#d62728");
    }
}
