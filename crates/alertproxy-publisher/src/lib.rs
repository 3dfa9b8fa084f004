//! The [`Publisher`] contract and the four sink implementations the
//! publishing queue dispatches to: Slack, PagerDuty, Rootly, and a generic
//! webhook. Every sink is wrapped in the same create/update/resolve +
//! incident-cache routing (spec §4.4) via [`IncidentPublisher`]; only the
//! three low-level [`IncidentSink`] operations differ per sink.

mod config_ext;
mod error_mapping;
mod pagerduty;
mod rootly;
mod sink;
mod slack;
mod webhook;

pub use error_mapping::{http_error, network_error, retry_after_seconds};
pub use pagerduty::PagerDutySink;
pub use rootly::RootlySink;
pub use sink::{IncidentObserver, IncidentPublisher, IncidentSink, Publisher};
pub use slack::SlackSink;
pub use webhook::WebhookSink;

use alertproxy_cache::IncidentCache;
use alertproxy_types::TargetKind;
use reqwest::Client;

/// Builds the [`Publisher`] appropriate for a [`TargetKind`]. The
/// `reqwest::Client` is typically shared across targets for connection
/// pooling, but `cache` must be a distinct [`IncidentCache`] per *target*
/// (not shared across targets): the cache key is the bare fingerprint, and
/// the same alert dispatched to both a Slack and a PagerDuty target gets a
/// different external ID at each, so a shared cache would have the two
/// targets clobber each other's entry.
pub fn publisher_for(kind: TargetKind, client: Client, cache: IncidentCache) -> Box<dyn Publisher> {
    match kind {
        TargetKind::Slack => Box::new(IncidentPublisher::new(SlackSink::new(client), cache)),
        TargetKind::PagerDuty => Box::new(IncidentPublisher::new(PagerDutySink::new(client), cache)),
        TargetKind::Rootly => Box::new(IncidentPublisher::new(RootlySink::new(client), cache)),
        TargetKind::Webhook => Box::new(IncidentPublisher::new(WebhookSink::new(client), cache)),
    }
}
