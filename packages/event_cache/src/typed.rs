use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::{EventData, Value};

/// Declares an event type and the shape of its record at the type level.
///
/// Implement this on a marker type per event type and declare each field as a [`Field`]
/// constant. Updating a record through [`EventCache::use_typed()`][1] then only accepts those
/// constants, with values of the declared type, so a misspelled field or a write that changes
/// the type of a field fails to compile.
///
/// The string-keyed API of [`EventData`] stays available for the same records.
///
/// # Example
///
/// ```
/// use event_cache::{EventCache, EventShape, Field, FieldInit};
///
/// struct Moved;
///
/// impl Moved {
///     const X: Field<Self, f64> = Field::new("x");
///     const Y: Field<Self, f64> = Field::new("y");
/// }
///
/// impl EventShape for Moved {
///     const EVENT_TYPE: &'static str = "moved";
///
///     fn fields() -> Vec<FieldInit<Self>> {
///         vec![Self::X.init(0.0), Self::Y.init(0.0)]
///     }
/// }
///
/// let cache = EventCache::builder().declare::<Moved>().build();
///
/// let moved = cache.use_typed::<Moved>().set(Moved::X, 10.0).set(Moved::Y, 20.0);
///
/// assert_eq!(moved.get(Moved::X), Some(10.0));
/// assert_eq!(moved.record().event_type().as_deref(), Some("moved"));
/// ```
///
/// A field of another event type is rejected:
///
/// ```compile_fail
/// use event_cache::{EventCache, EventShape, Field, FieldInit};
///
/// struct Moved;
/// struct Renamed;
///
/// impl Moved {
///     const X: Field<Self, f64> = Field::new("x");
/// }
///
/// impl Renamed {
///     const NAME: Field<Self, bool> = Field::new("name");
/// }
///
/// impl EventShape for Moved {
///     const EVENT_TYPE: &'static str = "moved";
///
///     fn fields() -> Vec<FieldInit<Self>> {
///         vec![Self::X.init(0.0)]
///     }
/// }
///
/// let cache = EventCache::builder().declare::<Moved>().build();
/// cache.use_typed::<Moved>().set(Renamed::NAME, true);
/// ```
///
/// [1]: crate::EventCache::use_typed
pub trait EventShape: Sized + 'static {
    /// The name of the event type, as used with the string-keyed API.
    const EVENT_TYPE: &'static str;

    /// The fields of the record and their initial values.
    ///
    /// Every [`Field`] constant of this event type is expected to be listed here. A field that
    /// is left out is added to the record on its first write.
    fn fields() -> Vec<FieldInit<Self>>;
}

/// A field of the record of event type `E`, holding values of type `T`.
///
/// Declare these as associated constants of the event's marker type, see [`EventShape`].
pub struct Field<E, T> {
    name: &'static str,

    _shape: PhantomData<fn() -> (E, T)>,
}

impl<E, T> Field<E, T> {
    /// Declares a field with the given name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _shape: PhantomData,
        }
    }

    /// The name of the field, as used with the string-keyed API.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<E, T> Field<E, T>
where
    T: FieldValue,
{
    /// Pairs the field with its initial value, for use in [`EventShape::fields()`].
    #[must_use]
    pub fn init(self, value: T) -> FieldInit<E> {
        FieldInit {
            name: self.name,
            value: value.into(),
            _shape: PhantomData,
        }
    }
}

impl<E, T> Clone for Field<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for Field<E, T> {}

impl<E, T> fmt::Debug for Field<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

/// A field of event type `E` together with its initial value.
///
/// Created via [`Field::init()`].
pub struct FieldInit<E> {
    name: &'static str,
    value: Value,

    _shape: PhantomData<fn() -> E>,
}

impl<E> FieldInit<E> {
    pub(crate) fn into_parts(self) -> (&'static str, Value) {
        (self.name, self.value)
    }
}

impl<E> fmt::Debug for FieldInit<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInit")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

/// A type that can be stored in a typed [`Field`] and read back out of a [`Value`].
pub trait FieldValue: Into<Value> + Sized {
    /// The value held by `value`, if it holds this type.
    fn from_value(value: &Value) -> Option<Self>;
}

impl FieldValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FieldValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl FieldValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_float()
    }
}

impl FieldValue for Rc<str> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(value) => Some(Rc::clone(value)),
            _ => None,
        }
    }
}

impl FieldValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

/// The record of event type `E`, updated through the fields declared by its [`EventShape`].
///
/// Obtain one via [`EventCache::use_typed()`][1]. This is a thin handle over the same
/// [`EventData`] that [`EventCache::use_event()`][2] returns; [`record()`][3] hands out that
/// record for dispatching or for the string-keyed API.
///
/// Writing a field through a key of a different type does not compile:
///
/// ```compile_fail
/// use event_cache::{EventCache, EventShape, Field, FieldInit};
///
/// struct Moved;
///
/// impl Moved {
///     const X: Field<Self, f64> = Field::new("x");
/// }
///
/// impl EventShape for Moved {
///     const EVENT_TYPE: &'static str = "moved";
///
///     fn fields() -> Vec<FieldInit<Self>> {
///         vec![Self::X.init(0.0)]
///     }
/// }
///
/// let cache = EventCache::builder().declare::<Moved>().build();
/// cache.use_typed::<Moved>().set(Moved::X, "ten");
/// ```
///
/// Neither does a field name given as a string:
///
/// ```compile_fail
/// use event_cache::{EventCache, EventShape, Field, FieldInit};
///
/// struct Moved;
///
/// impl Moved {
///     const X: Field<Self, f64> = Field::new("x");
/// }
///
/// impl EventShape for Moved {
///     const EVENT_TYPE: &'static str = "moved";
///
///     fn fields() -> Vec<FieldInit<Self>> {
///         vec![Self::X.init(0.0)]
///     }
/// }
///
/// let cache = EventCache::builder().declare::<Moved>().build();
/// cache.use_typed::<Moved>().set("xx", 10.0);
/// ```
///
/// [1]: crate::EventCache::use_typed
/// [2]: crate::EventCache::use_event
/// [3]: Self::record
pub struct TypedEventData<'a, E> {
    record: &'a EventData,

    _shape: PhantomData<fn() -> E>,
}

impl<'a, E> TypedEventData<'a, E>
where
    E: EventShape,
{
    pub(crate) fn new(record: &'a EventData) -> Self {
        Self {
            record,
            _shape: PhantomData,
        }
    }

    /// The record behind this handle.
    #[must_use]
    pub fn record(self) -> &'a EventData {
        self.record
    }

    /// The current value of a field, or `None` if the field does not hold a `T`.
    ///
    /// The field only holds something else if it was written through the string-keyed API.
    #[must_use]
    pub fn get<T>(self, field: Field<E, T>) -> Option<T>
    where
        T: FieldValue,
    {
        self.record
            .get(field.name)
            .as_ref()
            .and_then(T::from_value)
    }

    /// Writes a field and returns the same handle, so updates can be chained.
    pub fn set<T>(self, field: Field<E, T>, value: T) -> Self
    where
        T: FieldValue,
    {
        self.record.set(field.name, value);
        self
    }

    /// Writes the `target` field and returns the same handle, so updates can be chained.
    pub fn set_target(self, target: impl Into<Value>) -> Self {
        self.record.set_target(target);
        self
    }
}

impl<E> Clone for TypedEventData<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for TypedEventData<'_, E> {}

impl<E> fmt::Debug for TypedEventData<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedEventData").field(self.record).finish()
    }
}
