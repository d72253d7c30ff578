//! Metrics for the event cache.
//!
//! These are plain counters. The metrics use per-thread event instances, which suits the
//! single-threaded nature of the cache.

use nm::Event;

thread_local! {
    /// Event for observing `EventCache::use_event()` calls, i.e. one per emitted event.
    pub(crate) static USES: Event = Event::builder()
        .name("event_cache_uses")
        .build();

    /// Event for observing direct assignments that were rejected because the field does not
    /// exist on the record.
    pub(crate) static ASSIGNMENTS_REJECTED: Event = Event::builder()
        .name("event_cache_assignments_rejected")
        .build();
}
