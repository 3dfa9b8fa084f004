//! Rootly incident sink: true create/update/resolve endpoints returning a
//! real incident ID, unlike Slack or PagerDuty. The JSON:API-style `id`
//! lives at `data.id`; that field path is preserved in
//! [`ProviderError::details`] under the `field` key whenever a response
//! can't be parsed for it, so operators can tell a malformed-response bug
//! apart from a genuine sink outage.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use alertproxy_core::ProviderError;
use alertproxy_types::{EnrichedAlert, Severity, Target};

use crate::config_ext::require_config;
use crate::error_mapping::{http_error, network_error, retry_after_seconds};
use crate::sink::IncidentSink;

const PROVIDER: &str = "rootly";
const BASE_URL: &str = "https://api.rootly.com/v1";
const ID_FIELD_PATH: &str = "data.id";

fn severity_str(alert: &EnrichedAlert) -> &'static str {
    match alert.effective_severity() {
        Severity::Critical => "critical",
        Severity::Warning => "warning",
        Severity::Info => "info",
    }
}

fn create_payload(alert: &EnrichedAlert) -> Value {
    json!({
        "data": {
            "type": "incidents",
            "attributes": {
                "title": alert.alert_name(),
                "summary": alert.fingerprint,
                "severity": severity_str(alert),
                "labels": alert.labels,
            }
        }
    })
}

fn update_payload(alert: &EnrichedAlert) -> Value {
    json!({
        "data": {
            "type": "incidents",
            "attributes": {
                "title": alert.alert_name(),
                "severity": severity_str(alert),
            }
        }
    })
}

fn extract_id(body: &str) -> Result<String, ProviderError> {
    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::http(502, PROVIDER, format!("unparseable response: {e}")).with_detail("field", ID_FIELD_PATH))?;

    parsed
        .get("data")
        .and_then(|d| d.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ProviderError::http(502, PROVIDER, "response missing incident id").with_detail("field", ID_FIELD_PATH))
}

pub struct RootlySink {
    client: Client,
}

impl RootlySink {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn error_from(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let retry_after = retry_after_seconds(response.headers());
        let body = response.text().await.unwrap_or_default();
        http_error(PROVIDER, status, retry_after, body)
    }
}

#[async_trait]
impl IncidentSink for RootlySink {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn create(&self, alert: &EnrichedAlert, target: &Target) -> Result<String, ProviderError> {
        let api_key = require_config(target, PROVIDER, "api_key")?;

        let response = self
            .client
            .post(format!("{BASE_URL}/incidents"))
            .bearer_auth(api_key)
            .json(&create_payload(alert))
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, &e))?;

        if !response.status().is_success() {
            return Err(self.error_from(response).await);
        }

        let body = response.text().await.map_err(|e| network_error(PROVIDER, &e))?;
        extract_id(&body)
    }

    async fn update(&self, external_id: &str, alert: &EnrichedAlert, target: &Target) -> Result<(), ProviderError> {
        let api_key = require_config(target, PROVIDER, "api_key")?;

        let response = self
            .client
            .patch(format!("{BASE_URL}/incidents/{external_id}"))
            .bearer_auth(api_key)
            .json(&update_payload(alert))
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, &e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.error_from(response).await)
        }
    }

    async fn resolve(&self, external_id: &str, _alert: &EnrichedAlert, target: &Target) -> Result<(), ProviderError> {
        let api_key = require_config(target, PROVIDER, "api_key")?;

        let response = self
            .client
            .post(format!("{BASE_URL}/incidents/{external_id}/resolve"))
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, &e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.error_from(response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_id_reads_json_api_data_id() {
        let body = r#"{"data": {"id": "INC-42", "type": "incidents"}}"#;
        assert_eq!(extract_id(body).unwrap(), "INC-42");
    }

    #[test]
    fn extract_id_reports_field_path_on_missing_id() {
        let body = r#"{"data": {"type": "incidents"}}"#;
        let err = extract_id(body).unwrap_err();
        assert_eq!(err.details().get("field").map(String::as_str), Some("data.id"));
    }

    #[test]
    fn extract_id_reports_field_path_on_malformed_json() {
        let err = extract_id("not json").unwrap_err();
        assert_eq!(err.details().get("field").map(String::as_str), Some("data.id"));
    }
}
