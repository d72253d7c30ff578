use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// The value of one field of an event record.
///
/// Values are cheap to clone: strings and objects are reference-counted, so cloning a value
/// never copies their contents. This matters because reading a field returns a clone of its
/// current value.
///
/// A field is expected to hold the same kind of value for the lifetime of its record (e.g. an
/// `x` coordinate is always a [`Value::Float`]). The cache does not check this.
///
/// # Example
///
/// ```
/// use event_cache::Value;
///
/// assert_eq!(Value::from(42), Value::Int(42));
/// assert_eq!(Value::from("moved").as_str(), Some("moved"));
/// assert!(Value::from(None::<i64>).is_null());
/// ```
#[derive(Clone, Default)]
#[non_exhaustive]
pub enum Value {
    /// No value. The `target` field of every record starts out as this.
    #[default]
    Null,

    /// A boolean.
    Bool(bool),

    /// A signed integer.
    Int(i64),

    /// A floating point number.
    Float(f64),

    /// A shared string.
    ///
    /// Converting from `&str` or `String` allocates. If a string field is updated on every
    /// emission, create the `Rc<str>` once and clone it instead.
    Str(Rc<str>),

    /// An opaque reference to an arbitrary object, typically the dispatcher stored in `target`.
    ///
    /// Objects compare equal only if they are the same allocation.
    Object(Rc<dyn Any>),
}

impl Value {
    /// Wraps an arbitrary object into a [`Value::Object`].
    ///
    /// # Example
    ///
    /// ```
    /// use event_cache::Value;
    ///
    /// struct Car {
    ///     wheels: u8,
    /// }
    ///
    /// let value = Value::object(Car { wheels: 4 });
    /// assert_eq!(value.downcast_ref::<Car>().map(|car| car.wheels), Some(4));
    /// ```
    #[must_use]
    pub fn object<T>(value: T) -> Self
    where
        T: Any,
    {
        Self::Object(Rc::new(value))
    }

    /// Whether this is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean held by this value, if it is a [`Value::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The integer held by this value, if it is a [`Value::Int`].
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// The number held by this value, if it is a [`Value::Float`].
    ///
    /// Integers are not converted.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// The string held by this value, if it is a [`Value::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// The object held by this value, if it is a [`Value::Object`].
    #[must_use]
    pub fn as_object(&self) -> Option<&Rc<dyn Any>> {
        match self {
            Self::Object(value) => Some(value),
            _ => None,
        }
    }

    /// The object held by this value, if it is a [`Value::Object`] of type `T`.
    #[must_use]
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: Any,
    {
        self.as_object().and_then(|object| object.downcast_ref::<T>())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::Int(value) => f.debug_tuple("Int").field(value).finish(),
            Self::Float(value) => f.debug_tuple("Float").field(value).finish(),
            Self::Str(value) => f.debug_tuple("Str").field(value).finish(),
            Self::Object(value) => f.debug_tuple("Object").field(&Rc::as_ptr(value)).finish(),
        }
    }
}

impl PartialEq for Value {
    #[expect(
        clippy::float_cmp,
        reason = "field values are compared exactly, the same as the caller wrote them"
    )]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<Rc<str>> for Value {
    fn from(value: Rc<str>) -> Self {
        Self::Str(value)
    }
}

impl From<Rc<dyn Any>> for Value {
    fn from(value: Rc<dyn Any>) -> Self {
        Self::Object(value)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Self>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
