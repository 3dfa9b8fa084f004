//! Facade crate: wires the dispatch core's independent crates (queue,
//! publishers, circuit breakers, metrics, reloadable resources) into one
//! running proxy. Everything downstream of alert ingestion — suppression,
//! AI classification, Alertmanager payload parsing — stays out of scope
//! (spec §1); this crate starts at "an [`alertproxy_types::EnrichedAlert`]
//! and a [`alertproxy_types::Target`] arrived" and ends at "dispatched, or
//! dead-lettered".

mod dispatcher;
mod dlq;
mod queue_observer;
mod targets;

pub use dispatcher::{Dispatcher, DispatcherBuilder, ProxyConfig};
pub use dlq::{DlqConfig, InMemoryDlq, ReloadableDlq};
pub use queue_observer::MetricsQueueObserver;
pub use targets::{DispatchTargetsConfig, TargetRegistry};

pub use alertproxy_circuitbreaker as circuitbreaker;
pub use alertproxy_metrics as metrics;
pub use alertproxy_publisher as publisher;
pub use alertproxy_queue as queue;
pub use alertproxy_reload as reload;
pub use alertproxy_types as types;
