//! PagerDuty Events API v2 sink.
//!
//! PagerDuty has no separate "update" endpoint: re-sending a `trigger`
//! event with the same `dedup_key` updates the open incident's payload in
//! place, which is what [`IncidentSink::update`] does here. `dedup_key` is
//! always the alert's fingerprint (spec §6), so the cached "incident ID"
//! and the dedup key are the same string.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use alertproxy_core::ProviderError;
use alertproxy_types::{EnrichedAlert, Severity, Target};

use crate::config_ext::require_config;
use crate::error_mapping::{http_error, network_error, retry_after_seconds};
use crate::sink::IncidentSink;

const PROVIDER: &str = "pagerduty";
const EVENTS_API_URL: &str = "https://events.pagerduty.com/v2/enqueue";

fn severity_str(alert: &EnrichedAlert) -> &'static str {
    match alert.effective_severity() {
        Severity::Critical => "critical",
        Severity::Warning => "warning",
        Severity::Info => "info",
    }
}

fn event_payload(alert: &EnrichedAlert, target: &Target, routing_key: &str, event_action: &str) -> Value {
    let mut payload = json!({
        "summary": format!("{} ({})", alert.alert_name(), alert.status_label()),
        "severity": severity_str(alert),
        "source": target.name,
        "timestamp": alert.starts_at.to_rfc3339(),
        "custom_details": alert.labels,
    });

    if let Some(classification) = &alert.classification {
        payload["custom_details"]["classification_reasoning"] = json!(classification.reasoning);
        payload["custom_details"]["classification_confidence"] = json!(classification.confidence);
    }

    json!({
        "routing_key": routing_key,
        "event_action": event_action,
        "dedup_key": alert.fingerprint,
        "payload": payload,
    })
}

trait StatusLabel {
    fn status_label(&self) -> &'static str;
}

impl StatusLabel for EnrichedAlert {
    fn status_label(&self) -> &'static str {
        match self.status {
            alertproxy_types::AlertStatus::Firing => "firing",
            alertproxy_types::AlertStatus::Resolved => "resolved",
        }
    }
}

pub struct PagerDutySink {
    client: Client,
}

impl PagerDutySink {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn send_event(&self, target: &Target, payload: Value) -> Result<(), ProviderError> {
        let response = self
            .client
            .post(EVENTS_API_URL)
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
        Err(http_error(PROVIDER, status, retry_after, body)
            .with_detail("dedup_key", payload["dedup_key"].as_str().unwrap_or_default()))
    }
}

#[async_trait]
impl IncidentSink for PagerDutySink {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn create(&self, alert: &EnrichedAlert, target: &Target) -> Result<String, ProviderError> {
        let routing_key = require_config(target, PROVIDER, "routing_key")?;
        self.send_event(target, event_payload(alert, target, routing_key, "trigger")).await?;
        Ok(alert.fingerprint.clone())
    }

    async fn update(&self, _external_id: &str, alert: &EnrichedAlert, target: &Target) -> Result<(), ProviderError> {
        let routing_key = require_config(target, PROVIDER, "routing_key")?;
        self.send_event(target, event_payload(alert, target, routing_key, "trigger")).await
    }

    async fn resolve(&self, _external_id: &str, alert: &EnrichedAlert, target: &Target) -> Result<(), ProviderError> {
        let routing_key = require_config(target, PROVIDER, "routing_key")?;
        self.send_event(target, event_payload(alert, target, routing_key, "resolve")).await
    }
}
