#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Reusable event data for high-frequency event dispatch.
//!
//! Event dispatchers commonly expect a freshly created object per emitted event. When events are
//! emitted at high frequency, creating those objects means a constant stream of short-lived
//! allocations. This package provides an [`EventCache`] that instead keeps one mutable record
//! per event type and hands out the same record on every emission, to be updated in place and
//! passed straight to the dispatcher.
//!
//! This is part of the [Folo project](https://github.com/folo-rs/folo) that provides mechanisms for
//! high-performance hardware-aware programming in Rust.
//!
//! # Example
//!
//! ```
//! use event_cache::{EventCache, Value};
//!
//! // The declared event types and their fields are the single source of truth
//! // for what the cache contains.
//! let cache = EventCache::builder()
//!     .event("moved", [("x", 0), ("y", 0)])
//!     .event_without_fields("destroyed")
//!     .build();
//!
//! // Updates chain, returning the same record, which can be handed to a dispatcher as-is.
//! let moved = cache.use_event("moved").set("x", 10).set("y", 20);
//!
//! assert_eq!(moved.get("x"), Some(Value::Int(10)));
//! assert_eq!(moved.get("y"), Some(Value::Int(20)));
//! assert_eq!(moved.event_type().as_deref(), Some("moved"));
//!
//! // The next emission reuses the same record.
//! cache.use_event("moved").set("x", 30).set("y", 40);
//! assert_eq!(moved.get("x"), Some(Value::Int(30)));
//! ```
//!
//! # Records
//!
//! Each record ([`EventData`]) has the fields declared for its event type plus two implicit
//! fields: `type`, holding the name of the event type, and `target`, which starts out as
//! [`Value::Null`] and is meant to be filled in by the dispatcher.
//!
//! Fields are updated either via [`EventData::set()`], which writes unconditionally and chains,
//! or via [`EventData::assign()`], which refuses to write fields the record does not have.
//!
//! # Typed fields
//!
//! Event types can also be declared at the type level by implementing [`EventShape`] on a marker
//! type and registering it via [`EventCacheBuilder::declare()`]. [`EventCache::use_typed()`]
//! then returns a [`TypedEventData`] whose setters only accept the [`Field`] constants of that
//! event type with values of the declared type, so misspelled fields and type-changing writes
//! are compile errors. The string-keyed API keeps working on the same records.
//!
//! # Inspecting the declared events
//!
//! [`EventCache::payload()`] returns a [`Payload`], a read-only view of the declared event types
//! whose records are the live records of the cache.
//!
//! # Observability
//!
//! The cache logs its construction via `tracing` and counts emissions and rejected assignments
//! via `nm` events named `event_cache_uses` and `event_cache_assignments_rejected`.

mod builder;
mod cache;
mod error;
mod event_data;
mod metrics;
mod payload;
mod typed;
mod value;

pub use builder::*;
pub use cache::*;
pub use error::*;
pub use event_data::*;
pub use payload::*;
pub use typed::*;
pub use value::*;
