//! Base implementation of records for logging.
use crate::error::GenrepError;
use std::collections::HashMap;

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value, typically used for metrics like loss or return.
    Scalar(f32),

    /// A count, such as the number of environment steps taken.
    Step(usize),
}

/// A container for storing key-value pairs of various data types.
///
/// # Examples
///
/// ```rust
/// use genrep_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("generative_loss", 0.5);
/// record.insert("env_steps", RecordValue::Step(500));
///
/// let loss = record.get_scalar("generative_loss").unwrap();
/// assert_eq!(loss, 0.5);
/// assert_eq!(record.get_step("env_steps").unwrap(), 500);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        let mut map = HashMap::new();
        map.insert(name.into(), RecordValue::Scalar(value));
        Self(map)
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, GenrepError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(GenrepError::RecordValueTypeError("Scalar".to_string())),
            None => Err(GenrepError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a step count from the record.
    pub fn get_step(&self, k: &str) -> Result<usize, GenrepError> {
        match self.0.get(k) {
            Some(RecordValue::Step(v)) => Ok(*v),
            Some(_) => Err(GenrepError::RecordValueTypeError("Step".to_string())),
            None => Err(GenrepError::RecordKeyError(k.to_string())),
        }
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let mut r = Record::from_slice(&[
            ("loss", RecordValue::Scalar(1.0)),
            ("env_steps", RecordValue::Step(16_777_217)),
        ]);
        r.insert("loss", RecordValue::Scalar(2.0));
        assert_eq!(r.get_scalar("loss").unwrap(), 2.0);
        // Exact beyond the integer range of f32
        assert_eq!(r.get_step("env_steps").unwrap(), 16_777_217);
        assert!(matches!(
            r.get_scalar("env_steps"),
            Err(GenrepError::RecordValueTypeError(_))
        ));
        assert!(matches!(
            r.get_step("missing"),
            Err(GenrepError::RecordKeyError(_))
        ));
        assert!(!r.is_empty());
        assert!(Record::empty().is_empty());
    }
}
