use thiserror::Error;

/// Errors that can occur when updating cached event data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A direct assignment targeted a field that the event record does not have.
    ///
    /// The record key set is fixed when the cache is created, so direct assignment can only
    /// update fields that were declared in the template (plus `type` and `target`).
    #[error("event type '{event_type}' has no field '{field}'")]
    UnknownField {
        /// The event type whose record rejected the assignment.
        event_type: String,

        /// The field name that was not found on the record.
        field: String,
    },
}

/// A specialized `Result` type for event cache operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn unknown_field_names_type_and_field() {
        let error = Error::UnknownField {
            event_type: "moved".to_string(),
            field: "z".to_string(),
        };

        assert_eq!(error.to_string(), "event type 'moved' has no field 'z'");
    }
}
