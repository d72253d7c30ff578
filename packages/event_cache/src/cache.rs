use std::fmt;
use std::rc::Rc;

use foldhash::HashMap;
use nm::Event;
use tracing::{debug, trace};

use crate::metrics::USES;
use crate::{EventCacheBuilder, EventData, EventShape, Payload, TypedEventData, Value};

/// A cache of reusable event data, holding one mutable record per declared event type.
///
/// Dispatching an event usually means creating a new object per emission. At high event
/// frequency, that is a steady stream of short-lived allocations. This cache instead keeps one
/// record per event type and hands out the same record every time, to be updated in place and
/// passed to the dispatcher:
///
/// ```
/// use event_cache::{EventCache, EventData, Value};
///
/// # struct Dispatcher;
/// # impl Dispatcher {
/// #     fn dispatch(&self, _event: &EventData) {}
/// # }
/// struct Car {
///     events: EventCache,
///     dispatcher: Dispatcher,
/// }
///
/// impl Car {
///     fn new() -> Self {
///         Self {
///             events: EventCache::builder()
///                 .event("moved", [("x", 0.0), ("y", 0.0)])
///                 .event_without_fields("destroyed")
///                 .build(),
///             dispatcher: Dispatcher,
///         }
///     }
///
///     fn moved(&self, x: f64, y: f64) {
///         self.dispatcher
///             .dispatch(self.events.use_event("moved").set("x", x).set("y", y));
///     }
///
///     fn destroy(&self) {
///         self.dispatcher.dispatch(self.events.use_event("destroyed"));
///     }
/// }
///
/// let car = Car::new();
/// car.moved(10.0, 20.0);
/// car.destroy();
///
/// assert_eq!(car.events.use_event("moved").get("x"), Some(Value::Float(10.0)));
/// ```
///
/// # Transient values
///
/// Because the record is reused, whatever a listener observes is only valid until the next
/// emission of the same event type. Listeners that need to keep event data must copy the field
/// values out of the record; keeping a reference to the record shows later emissions instead.
///
/// # Undeclared event types
///
/// The set of event types is fixed when the cache is built. Requesting any other type via
/// [`use_event()`][1] is a caller bug and panics. Use [`get()`][2] for a checked lookup.
///
/// # Thread safety
///
/// The cache is single-threaded. Each update is expected to be dispatched and consumed before
/// the next update of the same event type begins.
///
/// [1]: Self::use_event
/// [2]: Self::get
pub struct EventCache {
    /// Lookup table for `use_event()`. Shares the records with `payload`.
    records: HashMap<Rc<str>, Rc<EventData>>,

    payload: Payload,
}

impl EventCache {
    /// Creates a cache from a template of event types and the initial values of their fields.
    ///
    /// This is equivalent to declaring each entry of the template via
    /// [`EventCacheBuilder::event()`].
    ///
    /// # Example
    ///
    /// ```
    /// use event_cache::{EventCache, Value};
    ///
    /// let cache = EventCache::new([
    ///     ("moved", vec![("x", 0), ("y", 0)]),
    ///     ("destroyed", vec![]),
    /// ]);
    ///
    /// assert_eq!(cache.use_event("moved").get("y"), Some(Value::Int(0)));
    /// assert!(cache.contains("destroyed"));
    /// ```
    #[must_use]
    pub fn new<I, K, F, FK, V>(template: I) -> Self
    where
        I: IntoIterator<Item = (K, F)>,
        K: AsRef<str>,
        F: IntoIterator<Item = (FK, V)>,
        FK: AsRef<str>,
        V: Into<Value>,
    {
        template
            .into_iter()
            .fold(Self::builder(), |builder, (event_type, fields)| {
                builder.event(event_type, fields)
            })
            .build()
    }

    /// Starts building a new [`EventCache`].
    ///
    /// # Example
    ///
    /// ```
    /// use event_cache::EventCache;
    ///
    /// let cache = EventCache::builder()
    ///     .event("start", [("value", "begin")])
    ///     .event("end", [("success", false)])
    ///     .build();
    ///
    /// assert_eq!(cache.len(), 2);
    /// ```
    pub fn builder() -> EventCacheBuilder {
        EventCacheBuilder::new()
    }

    pub(crate) fn new_inner(declarations: Vec<(Rc<str>, Vec<(Rc<str>, Value)>)>) -> Self {
        let records: Rc<[Rc<EventData>]> = declarations
            .into_iter()
            .map(|(event_type, template)| {
                trace!(%event_type, field_count = template.len(), "declaring event type");
                Rc::new(EventData::new(event_type, template))
            })
            .collect();

        let lookup = records
            .iter()
            .map(|record| (record.shared_name(), Rc::clone(record)))
            .collect::<HashMap<_, _>>();

        debug!(event_types = records.len(), "event cache created");

        Self {
            records: lookup,
            payload: Payload::new(records),
        }
    }

    /// Returns the record of an event type, ready to be updated and dispatched.
    ///
    /// Every call for the same event type returns the same record, so this never allocates.
    /// Field values set by a previous emission remain in place until overwritten.
    ///
    /// # Panics
    ///
    /// Panics if the event type was not declared when the cache was built.
    ///
    /// # Example
    ///
    /// ```
    /// use event_cache::{EventCache, Value};
    ///
    /// let cache = EventCache::builder().event("moved", [("x", 0), ("y", 0)]).build();
    ///
    /// let first = cache.use_event("moved").set("x", 10).set("y", 20);
    /// let second = cache.use_event("moved").set("x", 30).set("y", 40);
    ///
    /// // Both emissions used the same record, so the first one now shows the second's values.
    /// assert!(std::ptr::eq(first, second));
    /// assert_eq!(first.get("x"), Some(Value::Int(30)));
    /// ```
    #[must_use]
    pub fn use_event(&self, event_type: &str) -> &EventData {
        let Some(record) = self.get(event_type) else {
            panic!("event type '{event_type}' was not declared when the event cache was built");
        };

        USES.with(Event::observe_once);

        record
    }

    /// Returns the record of the event type described by `E`, updated through typed fields.
    ///
    /// This is [`use_event()`][1] for event types declared via [`EventCacheBuilder::declare()`],
    /// returning a handle that only accepts the fields `E` declares.
    ///
    /// # Panics
    ///
    /// Panics if the event type was not declared when the cache was built.
    ///
    /// # Example
    ///
    /// ```
    /// use event_cache::{EventCache, EventShape, Field, FieldInit};
    ///
    /// struct Moved;
    ///
    /// impl Moved {
    ///     const X: Field<Self, i64> = Field::new("x");
    ///     const Y: Field<Self, i64> = Field::new("y");
    /// }
    ///
    /// impl EventShape for Moved {
    ///     const EVENT_TYPE: &'static str = "moved";
    ///
    ///     fn fields() -> Vec<FieldInit<Self>> {
    ///         vec![Self::X.init(0), Self::Y.init(0)]
    ///     }
    /// }
    ///
    /// let cache = EventCache::builder().declare::<Moved>().build();
    ///
    /// let first = cache.use_typed::<Moved>().set(Moved::X, 10).set(Moved::Y, 20);
    /// cache.use_typed::<Moved>().set(Moved::X, 30).set(Moved::Y, 40);
    ///
    /// assert_eq!(first.get(Moved::X), Some(30));
    /// ```
    ///
    /// [1]: Self::use_event
    #[must_use]
    pub fn use_typed<E>(&self) -> TypedEventData<'_, E>
    where
        E: EventShape,
    {
        TypedEventData::new(self.use_event(E::EVENT_TYPE))
    }

    /// Returns the record of an event type, or `None` if the type was not declared.
    #[must_use]
    pub fn get(&self, event_type: &str) -> Option<&EventData> {
        self.records.get(event_type).map(Rc::as_ref)
    }

    /// Whether the event type was declared when the cache was built.
    #[must_use]
    pub fn contains(&self, event_type: &str) -> bool {
        self.records.contains_key(event_type)
    }

    /// The declared event types, in declaration order.
    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.payload.event_types()
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

    /// The read-only view of the declared event types and their records.
    ///
    /// See [`Payload`] for details.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl fmt::Debug for EventCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCache")
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::Error;

    assert_not_impl_any!(EventCache: Send, Sync);

    fn moved_and_destroyed() -> EventCache {
        EventCache::builder()
            .event("moved", [("x", 0), ("y", 0)])
            .event_without_fields("destroyed")
            .build()
    }

    fn fields(record: &EventData) -> Vec<(String, Value)> {
        let mut fields = Vec::new();
        record.for_each_field(|key, value| fields.push((key.to_string(), value.clone())));
        fields
    }

    #[test]
    fn payload_mirrors_template() {
        let cache = moved_and_destroyed();
        let payload = cache.payload();

        assert_eq!(payload.event_types().collect::<Vec<_>>(), ["moved", "destroyed"]);
        assert_eq!(
            fields(&payload["moved"]),
            [
                ("x".to_string(), Value::Int(0)),
                ("y".to_string(), Value::Int(0)),
                ("type".to_string(), Value::from("moved")),
                ("target".to_string(), Value::Null),
            ]
        );
        assert_eq!(
            fields(&payload["destroyed"]),
            [
                ("type".to_string(), Value::from("destroyed")),
                ("target".to_string(), Value::Null),
            ]
        );
    }

    #[test]
    fn payload_records_are_live_records() {
        let cache = moved_and_destroyed();

        assert!(std::ptr::eq(&cache.payload()["moved"], cache.use_event("moved")));

        // Records reached through the payload remain mutable.
        cache.payload()["moved"].set("x", 5);
        assert_eq!(cache.use_event("moved").get("x"), Some(Value::Int(5)));
    }

    #[test]
    fn payload_outlives_cache() {
        let cache = moved_and_destroyed();
        let payload = cache.payload().clone();

        cache.use_event("moved").set("x", 7);
        drop(cache);

        assert_eq!(payload["moved"].get("x"), Some(Value::Int(7)));
    }

    #[test]
    fn use_event_returns_same_record() {
        let cache = moved_and_destroyed();

        let first = cache.use_event("moved");
        let second = cache.use_event("moved");

        assert!(std::ptr::eq(first, second));
        assert!(!std::ptr::eq(first, cache.use_event("destroyed")));
    }

    #[test]
    fn use_event_does_not_change_values() {
        let cache = moved_and_destroyed();
        cache.use_event("moved").set("x", 3);

        let record = cache.use_event("moved");

        assert_eq!(record.get("x"), Some(Value::Int(3)));
        assert_eq!(record.get("y"), Some(Value::Int(0)));
    }

    #[test]
    fn chained_updates_return_same_record() {
        let cache = moved_and_destroyed();
        let record = cache.use_event("moved");

        let after_x = record.set("x", 10);
        let after_y = after_x.set("y", 20);

        assert!(std::ptr::eq(after_x, record));
        assert!(std::ptr::eq(after_y, record));
        assert_eq!(record.get("x"), Some(Value::Int(10)));
        assert_eq!(record.get("y"), Some(Value::Int(20)));
        assert_eq!(record.event_type().as_deref(), Some("moved"));
    }

    #[test]
    fn second_emission_overwrites_first() {
        let cache = moved_and_destroyed();

        let first = cache.use_event("moved").set("x", 10).set("y", 20);
        assert_eq!(first.get("x"), Some(Value::Int(10)));
        assert_eq!(first.get("y"), Some(Value::Int(20)));
        assert_eq!(first.event_type().as_deref(), Some("moved"));

        cache.use_event("moved").set("x", 30).set("y", 40);

        assert_eq!(first.get("x"), Some(Value::Int(30)));
        assert_eq!(first.get("y"), Some(Value::Int(40)));
    }

    #[test]
    fn separate_caches_do_not_share_records() {
        let a = moved_and_destroyed();
        let b = moved_and_destroyed();

        assert!(!std::ptr::eq(a.use_event("moved"), b.use_event("moved")));

        a.use_event("moved").set("x", 99);

        assert_eq!(a.use_event("moved").get("x"), Some(Value::Int(99)));
        assert_eq!(b.use_event("moved").get("x"), Some(Value::Int(0)));
    }

    #[test]
    fn multiple_event_types_are_independent() {
        let cache = EventCache::new([
            ("start", vec![("value", Value::from("begin"))]),
            ("end", vec![("success", Value::Bool(false))]),
        ]);

        cache.use_event("start").set("value", "go");
        cache.use_event("end").set("success", true);

        assert_eq!(cache.use_event("start").get("value"), Some(Value::from("go")));
        assert_eq!(cache.use_event("end").get("success"), Some(Value::Bool(true)));
        assert_eq!(cache.use_event("start").get("success"), None);
    }

    #[test]
    fn assignment_to_undeclared_field_does_not_persist() {
        let cache = moved_and_destroyed();

        let result = cache.use_event("moved").assign("z", 1);

        assert!(matches!(result, Err(Error::UnknownField { .. })));
        assert_eq!(cache.use_event("moved").get("z"), None);
        assert!(!cache.payload()["moved"].contains_key("z"));
    }

    #[test]
    fn get_undeclared_is_none() {
        let cache = moved_and_destroyed();

        assert!(cache.get("spawned").is_none());
        assert!(!cache.contains("spawned"));
        assert!(cache.contains("moved"));
    }

    #[test]
    #[should_panic]
    fn use_event_undeclared_panics() {
        let cache = moved_and_destroyed();

        _ = cache.use_event("spawned");
    }

    #[test]
    fn len_counts_event_types() {
        let cache = moved_and_destroyed();

        assert_eq!(cache.len(), 2);
        assert!(!cache.is_empty());
        assert!(EventCache::builder().build().is_empty());
    }

    #[test]
    fn new_and_builder_agree() {
        let from_template = EventCache::new([("moved", [("x", 1), ("y", 2)])]);
        let from_builder = EventCache::builder()
            .event("moved", [("x", 1), ("y", 2)])
            .build();

        assert_eq!(
            fields(from_template.use_event("moved")),
            fields(from_builder.use_event("moved"))
        );
    }

    #[test]
    fn debug_shows_payload() {
        let cache = moved_and_destroyed();

        let debug = format!("{cache:?}");

        assert!(debug.starts_with("EventCache"));
        assert!(debug.contains("destroyed"));
    }
}
