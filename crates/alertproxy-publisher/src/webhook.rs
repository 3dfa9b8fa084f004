//! Generic webhook sink: a flat JSON POST of the alert, unchanged across
//! create/update/resolve since the wire format (spec §6) has no notion of
//! a distinct remote entity to create or patch. The cached "incident ID"
//! is the fingerprint itself, just enough for [`crate::sink::IncidentPublisher`]
//! to tell a first sighting from a repeat one.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use alertproxy_core::ProviderError;
use alertproxy_types::{AlertStatus, EnrichedAlert, Target};

use crate::config_ext::require_config;
use crate::error_mapping::{http_error, network_error, retry_after_seconds};
use crate::sink::IncidentSink;

const PROVIDER: &str = "webhook";

fn status_str(status: AlertStatus) -> &'static str {
    match status {
        AlertStatus::Firing => "firing",
        AlertStatus::Resolved => "resolved",
    }
}

fn payload(alert: &EnrichedAlert) -> Value {
    let mut body = json!({
        "alert_name": alert.alert_name(),
        "fingerprint": alert.fingerprint,
        "status": status_str(alert.status),
        "labels": alert.labels,
        "starts_at": alert.starts_at.to_rfc3339(),
    });

    if let Some(ends_at) = alert.ends_at {
        body["ends_at"] = json!(ends_at.to_rfc3339());
    }
    if let Some(generator_url) = &alert.generator_url {
        body["generator_url"] = json!(generator_url);
    }
    if let Some(classification) = &alert.classification {
        body["classification"] = json!(classification);
    }

    body
}

pub struct WebhookSink {
    client: Client,
}

impl WebhookSink {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn post(&self, target: &Target, alert: &EnrichedAlert) -> Result<(), ProviderError> {
        let url = require_config(target, PROVIDER, "url")?;

        let response = self
            .client
            .post(url)
            .json(&payload(alert))
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
impl IncidentSink for WebhookSink {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn create(&self, alert: &EnrichedAlert, target: &Target) -> Result<String, ProviderError> {
        self.post(target, alert).await?;
        Ok(alert.fingerprint.clone())
    }

    async fn update(&self, _external_id: &str, alert: &EnrichedAlert, target: &Target) -> Result<(), ProviderError> {
        self.post(target, alert).await
    }

    async fn resolve(&self, _external_id: &str, alert: &EnrichedAlert, target: &Target) -> Result<(), ProviderError> {
        self.post(target, alert).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use chrono::Utc;

    fn alert() -> EnrichedAlert {
        let mut labels = BTreeMap::new();
        labels.insert("alertname".to_string(), "DiskFull".to_string());
        EnrichedAlert {
            fingerprint: "fp-9".to_string(),
            status: AlertStatus::Firing,
            labels,
            starts_at: Utc::now(),
            ends_at: None,
            generator_url: Some("http://prom/graph".to_string()),
            classification: None,
        }
    }

    #[test]
    fn payload_includes_core_fields() {
        let p = payload(&alert());
        assert_eq!(p["fingerprint"], "fp-9");
        assert_eq!(p["status"], "firing");
        assert_eq!(p["generator_url"], "http://prom/graph");
        assert!(p.get("ends_at").is_none());
    }

    #[test]
    fn payload_omits_absent_optional_fields() {
        let mut a = alert();
        a.generator_url = None;
        let p = payload(&a);
        assert!(p.get("generator_url").is_none());
    }
}
