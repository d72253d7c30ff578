use std::fmt;
use std::rc::Rc;

use crate::{EventCache, EventShape, FieldInit, Value};

/// The field template of one event type: field names and their initial values.
type FieldTemplate = Vec<(Rc<str>, Value)>;

/// Builder for creating an instance of [`EventCache`].
///
/// Each call to [`event()`][1] declares one event type and the initial values of its fields.
/// The declarations are the single source of truth for which event types the cache knows
/// and what fields their records have.
///
/// Declaring the same event type again replaces its fields but keeps its original position in
/// the declaration order. Within one declaration, a repeated field name keeps the last value.
///
/// # Examples
///
/// ```
/// use event_cache::EventCache;
///
/// let cache = EventCache::builder()
///     .event("moved", [("x", 0.0), ("y", 0.0)])
///     .event("renamed", [("name", "")])
///     .event_without_fields("destroyed")
///     .build();
///
/// assert_eq!(cache.len(), 3);
/// ```
///
/// [1]: Self::event
#[must_use]
#[derive(Default)]
pub struct EventCacheBuilder {
    declarations: Vec<(Rc<str>, FieldTemplate)>,
}

impl fmt::Debug for EventCacheBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCacheBuilder")
            .field(
                "event_types",
                &self
                    .declarations
                    .iter()
                    .map(|(name, _)| name)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl EventCacheBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Declares an event type and the initial values of the fields of its record.
    ///
    /// The `type` and `target` fields are added automatically and do not need to be declared.
    ///
    /// # Examples
    ///
    /// ```
    /// use event_cache::{EventCache, Value};
    ///
    /// let cache = EventCache::builder()
    ///     .event("end", [("success", Value::Bool(false)), ("code", Value::Int(0))])
    ///     .build();
    ///
    /// assert_eq!(cache.use_event("end").get("success"), Some(Value::Bool(false)));
    /// ```
    pub fn event<K, F, FK, V>(mut self, event_type: K, fields: F) -> Self
    where
        K: AsRef<str>,
        F: IntoIterator<Item = (FK, V)>,
        FK: AsRef<str>,
        V: Into<Value>,
    {
        let event_type = event_type.as_ref();

        let mut template: FieldTemplate = Vec::new();

        for (key, value) in fields {
            let key = key.as_ref();
            let value = value.into();

            match template.iter_mut().find(|(existing, _)| **existing == *key) {
                Some((_, existing_value)) => *existing_value = value,
                None => template.push((Rc::from(key), value)),
            }
        }

        match self
            .declarations
            .iter_mut()
            .find(|(existing, _)| **existing == *event_type)
        {
            Some((_, existing_template)) => *existing_template = template,
            None => self.declarations.push((Rc::from(event_type), template)),
        }

        self
    }

    /// Declares an event type whose record only carries the implicit `type` and `target` fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use event_cache::EventCache;
    ///
    /// let cache = EventCache::builder().event_without_fields("destroyed").build();
    ///
    /// assert_eq!(cache.use_event("destroyed").event_type().as_deref(), Some("destroyed"));
    /// ```
    pub fn event_without_fields(self, event_type: impl AsRef<str>) -> Self {
        self.event(event_type, Vec::<(&str, Value)>::new())
    }

    /// Declares the event type described by `E`, with the fields it lists.
    ///
    /// Records of the event type can then be updated through typed fields via
    /// [`EventCache::use_typed()`], in addition to the string-keyed API.
    ///
    /// # Examples
    ///
    /// ```
    /// use event_cache::{EventCache, EventShape, Field, FieldInit, Value};
    ///
    /// struct End;
    ///
    /// impl End {
    ///     const SUCCESS: Field<Self, bool> = Field::new("success");
    /// }
    ///
    /// impl EventShape for End {
    ///     const EVENT_TYPE: &'static str = "end";
    ///
    ///     fn fields() -> Vec<FieldInit<Self>> {
    ///         vec![Self::SUCCESS.init(false)]
    ///     }
    /// }
    ///
    /// let cache = EventCache::builder().declare::<End>().build();
    ///
    /// assert_eq!(cache.use_event("end").get("success"), Some(Value::Bool(false)));
    /// ```
    pub fn declare<E>(self) -> Self
    where
        E: EventShape,
    {
        self.event(
            E::EVENT_TYPE,
            E::fields().into_iter().map(FieldInit::into_parts),
        )
    }

    /// Builds the event cache, creating one record per declared event type.
    ///
    /// # Examples
    ///
    /// ```
    /// use event_cache::EventCache;
    ///
    /// let cache = EventCache::builder().build();
    ///
    /// assert!(cache.is_empty());
    /// ```
    #[must_use]
    pub fn build(self) -> EventCache {
        EventCache::new_inner(self.declarations)
    }
}
