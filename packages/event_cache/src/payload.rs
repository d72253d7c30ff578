use std::fmt;
use std::iter::FusedIterator;
use std::ops::Index;
use std::rc::Rc;
use std::slice;

use crate::EventData;

/// Read-only view of the event types declared for an [`EventCache`][crate::EventCache].
///
/// The view is frozen at the top level only: it offers no way to add, remove or replace event
/// types, but the [`EventData`] records it references are the live records of the cache and
/// remain mutable through their own API. Reading a record through the payload therefore shows
/// the values of the most recent emission, not those of the original template.
///
/// Use this to inspect the declared shape of the events, e.g. to enumerate event types and
/// their fields when wiring up listeners.
///
/// Cloning a payload is cheap and shares the records. A clone keeps the records alive even after
/// the cache itself is dropped.
///
/// # Example
///
/// ```
/// use event_cache::{EventCache, Value};
///
/// let cache = EventCache::builder()
///     .event("moved", [("x", 0), ("y", 0)])
///     .event_without_fields("destroyed")
///     .build();
///
/// let payload = cache.payload();
///
/// assert_eq!(payload.event_types().collect::<Vec<_>>(), ["moved", "destroyed"]);
/// assert_eq!(payload["moved"].get("x"), Some(Value::Int(0)));
///
/// // The records behind the payload are the ones handed out by the cache.
/// cache.use_event("moved").set("x", 10);
/// assert_eq!(payload["moved"].get("x"), Some(Value::Int(10)));
/// ```
#[derive(Clone)]
pub struct Payload {
    /// Records in declaration order.
    records: Rc<[Rc<EventData>]>,
}

impl Payload {
    pub(crate) fn new(records: Rc<[Rc<EventData>]>) -> Self {
        Self { records }
    }

    /// The record of an event type, or `None` if the type was not declared.
    #[must_use]
    pub fn get(&self, event_type: &str) -> Option<&EventData> {
        self.records
            .iter()
            .find(|record| record.name() == event_type)
            .map(Rc::as_ref)
    }

    /// Whether the event type was declared.
    #[must_use]
    pub fn contains(&self, event_type: &str) -> bool {
        self.get(event_type).is_some()
    }

    /// The declared event types, in declaration order.
    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.name())
    }

    /// Iterates over the declared event types and their records, in declaration order.
    pub fn iter(&self) -> PayloadIter<'_> {
        PayloadIter {
            inner: self.records.iter(),
        }
    }

    /// The number of declared event types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no event types were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Index<&str> for Payload {
    type Output = EventData;

    /// # Panics
    ///
    /// Panics if the event type was not declared.
    fn index(&self, event_type: &str) -> &Self::Output {
        self.get(event_type)
            .unwrap_or_else(|| panic!("event type '{event_type}' is not part of the payload"))
    }
}

impl<'a> IntoIterator for &'a Payload {
    type Item = (&'a str, &'a EventData);
    type IntoIter = PayloadIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over the event types and records of a [`Payload`].
#[derive(Debug)]
pub struct PayloadIter<'a> {
    inner: slice::Iter<'a, Rc<EventData>>,
}

impl<'a> Iterator for PayloadIter<'a> {
    type Item = (&'a str, &'a EventData);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|record| (record.name(), &**record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for PayloadIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|record| (record.name(), &**record))
    }
}

impl ExactSizeIterator for PayloadIter<'_> {}

impl FusedIterator for PayloadIter<'_> {}
