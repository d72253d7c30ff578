use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

use nm::Event;
use tracing::trace;

use crate::metrics::ASSIGNMENTS_REJECTED;
use crate::{Error, Result, Value};

/// Name of the field that every record carries with its event type.
pub const TYPE_FIELD: &str = "type";

/// Name of the field that every record carries for the dispatcher to fill in.
pub const TARGET_FIELD: &str = "target";

/// The reusable data record of one event type, doubling as a chainable handle for updating it.
///
/// Obtain one via [`EventCache::use_event()`][1]. There is exactly one `EventData` per declared
/// event type for the lifetime of the cache, so every emission of that type observes and mutates
/// the same object. Any values read from it are only valid until the next update of the same
/// event type; copy out whatever you need to keep.
///
/// Every record has the fields of its template plus [`TYPE_FIELD`] (set to the event type) and
/// [`TARGET_FIELD`] (initially [`Value::Null`]).
///
/// There are two ways to write a field:
///
/// * [`set()`][2] writes unconditionally and returns the same handle, for chaining. This is the
///   primary interface and trusts the caller to use declared field names.
/// * [`assign()`][3] only writes fields that already exist and reports an error otherwise.
///
/// # Example
///
/// ```
/// use event_cache::{EventCache, Value};
///
/// let cache = EventCache::builder().event("moved", [("x", 0), ("y", 0)]).build();
///
/// let moved = cache.use_event("moved").set("x", 10).set("y", 20);
///
/// assert_eq!(moved.get("x"), Some(Value::Int(10)));
/// assert_eq!(moved.get("y"), Some(Value::Int(20)));
/// assert_eq!(moved.event_type().as_deref(), Some("moved"));
/// ```
///
/// # Thread safety
///
/// The record is single-threaded.
///
/// [1]: crate::EventCache::use_event
/// [2]: Self::set
/// [3]: Self::assign
pub struct EventData {
    /// The event type this record was declared under. Unlike the `type` field, this never changes.
    name: Rc<str>,

    /// Fields in declaration order. Records are small, so a linear scan beats hashing here.
    ///
    /// We never hand out borrows of this, so no borrow can conflict with a later mutation.
    fields: RefCell<Vec<Field>>,
}

#[derive(Debug)]
struct Field {
    key: Rc<str>,
    value: Value,
}

impl EventData {
    pub(crate) fn new(name: Rc<str>, template: Vec<(Rc<str>, Value)>) -> Self {
        let mut fields: Vec<Field> = Vec::with_capacity(template.len().saturating_add(2));

        let implicit: [(Rc<str>, Value); 2] = [
            (Rc::from(TYPE_FIELD), Value::Str(Rc::clone(&name))),
            (Rc::from(TARGET_FIELD), Value::Null),
        ];

        for (key, value) in template.into_iter().chain(implicit) {
            match fields.iter_mut().find(|field| field.key == key) {
                Some(field) => field.value = value,
                None => fields.push(Field { key, value }),
            }
        }

        Self {
            name,
            fields: RefCell::new(fields),
        }
    }

    pub(crate) fn shared_name(&self) -> Rc<str> {
        Rc::clone(&self.name)
    }

    /// The event type this record was declared under.
    ///
    /// This is the key used with [`EventCache::use_event()`][crate::EventCache::use_event] and
    /// does not change even if the `type` field is overwritten.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current value of a field, or `None` if the record has no such field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.fields
            .borrow()
            .iter()
            .find(|field| *field.key == *key)
            .map(|field| field.value.clone())
    }

    /// The current value of the `type` field, if it holds a string.
    #[must_use]
    pub fn event_type(&self) -> Option<Rc<str>> {
        match self.get(TYPE_FIELD) {
            Some(Value::Str(event_type)) => Some(event_type),
            _ => None,
        }
    }

    /// The current value of the `target` field.
    #[must_use]
    pub fn target(&self) -> Value {
        self.get(TARGET_FIELD).unwrap_or_default()
    }

    /// Whether the record has a field with the given name.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.borrow().iter().any(|field| *field.key == *key)
    }

    /// The number of fields in the record, including `type` and `target`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.borrow().len()
    }

    /// Whether the record has no fields.
    ///
    /// This is never the case for records created by an [`EventCache`][crate::EventCache],
    /// which always carry at least `type` and `target`.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Cannot be true for any constructible record.
    pub fn is_empty(&self) -> bool {
        self.fields.borrow().is_empty()
    }

    /// Calls a closure with the name and current value of every field, in declaration order.
    ///
    /// # Panics
    ///
    /// Panics if the closure attempts to write to this record.
    pub fn for_each_field<F>(&self, mut f: F)
    where
        F: FnMut(&str, &Value),
    {
        for field in self.fields.borrow().iter() {
            f(&field.key, &field.value);
        }
    }

    /// Writes a field and returns the same handle, so updates can be chained.
    ///
    /// The write is unconditional: if the record has no field with this name, one is added.
    /// Writing `type` or `target` is permitted, though correct usage never changes `type`.
    ///
    /// # Example
    ///
    /// ```
    /// use event_cache::{EventCache, Value};
    ///
    /// let cache = EventCache::builder().event("start", [("value", "begin")]).build();
    ///
    /// let start = cache.use_event("start");
    /// let chained = start.set("value", "go");
    ///
    /// assert!(std::ptr::eq(start, chained));
    /// assert_eq!(start.get("value"), Some(Value::from("go")));
    /// ```
    pub fn set(&self, key: &str, value: impl Into<Value>) -> &Self {
        let value = value.into();

        let previous = {
            let mut fields = self.fields.borrow_mut();

            match fields.iter_mut().find(|field| *field.key == *key) {
                Some(field) => Some(mem::replace(&mut field.value, value)),
                None => {
                    fields.push(Field {
                        key: Rc::from(key),
                        value,
                    });
                    None
                }
            }
        };

        // The previous value may be the last reference to an object whose drop logic touches
        // this record, so it is only dropped once the fields are no longer borrowed.
        drop(previous);

        self
    }

    /// Writes the `target` field and returns the same handle, so updates can be chained.
    ///
    /// Dispatchers use this to point the event at whatever emitted it.
    pub fn set_target(&self, target: impl Into<Value>) -> &Self {
        self.set(TARGET_FIELD, target)
    }

    /// Writes a field that already exists on the record.
    ///
    /// The set of fields is fixed when the cache is created, so this cannot introduce new
    /// fields. Unlike [`set()`][Self::set], this checks the field name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] if the record has no field with this name. The record is
    /// left unchanged in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use event_cache::{EventCache, Value};
    ///
    /// let cache = EventCache::builder().event("moved", [("x", 0)]).build();
    /// let moved = cache.use_event("moved");
    ///
    /// moved.assign("x", 5).unwrap();
    /// assert_eq!(moved.get("x"), Some(Value::Int(5)));
    ///
    /// assert!(moved.assign("z", 5).is_err());
    /// assert_eq!(moved.get("z"), None);
    /// ```
    pub fn assign(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let previous = {
            let mut fields = self.fields.borrow_mut();

            fields
                .iter_mut()
                .find(|field| *field.key == *key)
                .map(|field| mem::replace(&mut field.value, value.into()))
        };

        if previous.is_none() {
            ASSIGNMENTS_REJECTED.with(Event::observe_once);
            trace!(event_type = %self.name, field = key, "rejected assignment to undeclared field");

            return Err(Error::UnknownField {
                event_type: self.name.to_string(),
                field: key.to_owned(),
            });
        }

        drop(previous);
        Ok(())
    }
}

impl fmt::Debug for EventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventData")
            .field("name", &self.name)
            .field("fields", &*self.fields.borrow())
            .finish()
    }
}
