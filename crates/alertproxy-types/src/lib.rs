//! Shared domain model: alerts, dispatch targets, and priority.
//!
//! These types are deliberately dumb data carriers — label-based
//! suppression, AI classification, and Alertmanager-payload parsing are all
//! external collaborators (see spec §1). This crate only defines the shapes
//! the dispatch core needs to agree on.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Firing/resolved lifecycle state of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Firing,
    Resolved,
}

/// Severity bucket produced by the (optional) AI classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// Result of the optional AI enrichment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub severity: Severity,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    pub reasoning: String,
    pub recommendations: Vec<String>,
}

/// An alert plus its optional classification, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedAlert {
    /// Stable content-derived identifier, typically hashed from labels by
    /// the (external) ingestion layer.
    pub fingerprint: String,
    pub status: AlertStatus,
    pub labels: BTreeMap<String, String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub generator_url: Option<String>,
    pub classification: Option<Classification>,
}

impl EnrichedAlert {
    pub fn alert_name(&self) -> &str {
        self.labels
            .get("alertname")
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    /// Severity used for priority routing: an explicit classification wins;
    /// absent that, the `severity` label; absent that, `warning`.
    pub fn effective_severity(&self) -> Severity {
        if let Some(c) = &self.classification {
            return c.severity;
        }
        match self.labels.get("severity").map(String::as_str) {
            Some("critical") => Severity::Critical,
            Some("info") => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

/// Dispatch job priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Priority derived from an alert's status and effective severity, per
    /// spec §4.5: critical firing alerts get `High`, resolved/info alerts
    /// get `Low`, everything else `Medium`.
    pub fn from_alert(alert: &EnrichedAlert) -> Self {
        if alert.status == AlertStatus::Resolved {
            return Priority::Low;
        }
        match alert.effective_severity() {
            Severity::Critical => Priority::High,
            Severity::Info => Priority::Low,
            Severity::Warning => Priority::Medium,
        }
    }
}

/// The kind of downstream sink a [`Target`] dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Slack,
    PagerDuty,
    Rootly,
    Webhook,
}

/// A dispatch destination. Identity is `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub kind: TargetKind,
    /// Provider-specific configuration (webhook URL, routing key, ...).
    /// Kept as a flat string map: parsing provider config schemas is out of
    /// scope (spec §1).
    pub config: BTreeMap<String, String>,
}

impl Target {
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            config: BTreeMap::new(),
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(status: AlertStatus, severity_label: Option<&str>) -> EnrichedAlert {
        let mut labels = BTreeMap::new();
        labels.insert("alertname".to_string(), "HighCPU".to_string());
        if let Some(s) = severity_label {
            labels.insert("severity".to_string(), s.to_string());
        }
        EnrichedAlert {
            fingerprint: "fp1".to_string(),
            status,
            labels,
            starts_at: Utc::now(),
            ends_at: None,
            generator_url: None,
            classification: None,
        }
    }

    #[test]
    fn priority_critical_firing_is_high() {
        let a = alert(AlertStatus::Firing, Some("critical"));
        assert_eq!(Priority::from_alert(&a), Priority::High);
    }

    #[test]
    fn priority_resolved_is_always_low() {
        let a = alert(AlertStatus::Resolved, Some("critical"));
        assert_eq!(Priority::from_alert(&a), Priority::Low);
    }

    #[test]
    fn priority_info_is_low() {
        let a = alert(AlertStatus::Firing, Some("info"));
        assert_eq!(Priority::from_alert(&a), Priority::Low);
    }

    #[test]
    fn priority_default_is_medium() {
        let a = alert(AlertStatus::Firing, None);
        assert_eq!(Priority::from_alert(&a), Priority::Medium);
    }

    #[test]
    fn classification_overrides_severity_label() {
        let mut a = alert(AlertStatus::Firing, Some("info"));
        a.classification = Some(Classification {
            severity: Severity::Critical,
            confidence: 0.9,
            reasoning: "spike".to_string(),
            recommendations: vec![],
        });
        assert_eq!(Priority::from_alert(&a), Priority::High);
    }

    #[test]
    fn ordering_high_greater_than_low() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }
}
