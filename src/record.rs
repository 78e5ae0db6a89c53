//! Record targets: where materialized values go.
//!
//! Two shapes are supported:
//!
//! - [`DynamicRecord`]: an ordered key → [`Value`] map, keys discovered from captions.
//! - Any type implementing [`TypedRecord`]: a plain struct that lists its assignable fields as
//!   [`Accessor`]s and optionally exposes nested children for dotted paths such as
//!   `address.street`.
//!
//! ```
//! use tabular_ingest::record::{Accessors, NestedTarget, TypedRecord};
//!
//! #[derive(Debug, Default)]
//! struct Address {
//!     street: String,
//! }
//!
//! impl TypedRecord for Address {
//!     fn accessors() -> Accessors<Self> {
//!         Accessors::<Self>::new().field("street", |a, v| {
//!             a.street = v.into_text();
//!             Ok(())
//!         })
//!     }
//! }
//!
//! #[derive(Debug, Default)]
//! struct Student {
//!     name: String,
//!     address: Option<Address>,
//! }
//!
//! impl TypedRecord for Student {
//!     fn accessors() -> Accessors<Self> {
//!         Accessors::<Self>::new().field("name", |s, v| {
//!             s.name = v.into_text();
//!             Ok(())
//!         })
//!     }
//!
//!     fn child_mut(&mut self, key: &str) -> Option<&mut dyn NestedTarget> {
//!         match key {
//!             "address" => Some(self.address.get_or_insert_with(Address::default)),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let mut student = Student::default();
//! student
//!     .assign_path(&["address".to_string(), "street".to_string()], "Premier St".into())
//!     .unwrap();
//! assert_eq!(student.address.unwrap().street, "Premier St");
//! ```

use std::fmt;

use crate::error::AssignError;
use crate::types::Value;

/// Setter function for one field of `T`.
pub type Accessor<T> = fn(&mut T, Value) -> Result<(), AssignError>;

/// Field table of a typed record, in declaration order.
pub struct Accessors<T> {
    entries: Vec<(&'static str, Accessor<T>)>,
}

impl<T> Accessors<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn field(mut self, key: &'static str, accessor: Accessor<T>) -> Self {
        self.entries.push((key, accessor));
        self
    }

    pub fn get(&self, key: &str) -> Option<Accessor<T>> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, accessor)| *accessor)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Accessors<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntoIterator for Accessors<T> {
    type Item = (&'static str, Accessor<T>);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A struct that can be populated field by field.
pub trait TypedRecord: Default {
    /// Every directly assignable field.
    fn accessors() -> Accessors<Self>;

    /// Child object for the first segment of a dotted path, created on demand.
    fn child_mut(&mut self, _key: &str) -> Option<&mut dyn NestedTarget> {
        None
    }
}

/// Object-safe assignment along a dotted path.
pub trait NestedTarget {
    fn assign_path(&mut self, path: &[String], value: Value) -> Result<(), AssignError>;
}

impl<T: TypedRecord> NestedTarget for T {
    fn assign_path(&mut self, path: &[String], value: Value) -> Result<(), AssignError> {
        match path {
            [] => Err(AssignError::UnknownPath {
                path: String::new(),
            }),
            [field] => {
                let accessor = Self::accessors()
                    .get(field)
                    .ok_or_else(|| AssignError::UnknownField { key: field.clone() })?;
                accessor(self, value)
            }
            [head, rest @ ..] => self
                .child_mut(head)
                .ok_or_else(|| AssignError::UnknownPath {
                    path: path.join("."),
                })?
                .assign_path(rest, value),
        }
    }
}

/// How a bound column writes its value into a record.
pub enum Setter<T> {
    /// Insert under a key of a dynamic record.
    Mapping(String),
    /// Walk a dotted path through nested children.
    NestedPath(Vec<String>),
    /// Call a typed field accessor.
    Accessor { key: String, accessor: Accessor<T> },
}

impl<T> Setter<T> {
    /// Field key this setter writes, dotted for nested paths.
    pub fn key(&self) -> String {
        match self {
            Setter::Mapping(key) | Setter::Accessor { key, .. } => key.clone(),
            Setter::NestedPath(path) => path.join("."),
        }
    }

    pub fn nested(path: &str) -> Self {
        Setter::NestedPath(path.split('.').map(str::to_string).collect())
    }
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        match self {
            Setter::Mapping(key) => Setter::Mapping(key.clone()),
            Setter::NestedPath(path) => Setter::NestedPath(path.clone()),
            Setter::Accessor { key, accessor } => Setter::Accessor {
                key: key.clone(),
                accessor: *accessor,
            },
        }
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setter::Mapping(key) => f.debug_tuple("Mapping").field(key).finish(),
            Setter::NestedPath(path) => f.debug_tuple("NestedPath").field(path).finish(),
            Setter::Accessor { key, .. } => f.debug_struct("Accessor").field("key", key).finish(),
        }
    }
}

/// Output shape of an ingestion run.
pub trait RecordTarget: Sized {
    /// Dynamic targets accept any key; typed targets only their discovered fields.
    const DYNAMIC: bool;

    fn create() -> Self;

    /// Base key → setter table (empty for dynamic targets).
    fn discover() -> Vec<(String, Setter<Self>)>;

    fn apply(&mut self, setter: &Setter<Self>, value: Value) -> Result<(), AssignError>;
}

impl<T: TypedRecord> RecordTarget for T {
    const DYNAMIC: bool = false;

    fn create() -> Self {
        T::default()
    }

    fn discover() -> Vec<(String, Setter<Self>)> {
        T::accessors()
            .into_iter()
            .map(|(key, accessor)| {
                (
                    key.to_string(),
                    Setter::Accessor {
                        key: key.to_string(),
                        accessor,
                    },
                )
            })
            .collect()
    }

    fn apply(&mut self, setter: &Setter<Self>, value: Value) -> Result<(), AssignError> {
        match setter {
            Setter::Accessor { accessor, .. } => accessor(self, value),
            Setter::NestedPath(path) => self.assign_path(path, value),
            Setter::Mapping(key) => self.assign_path(std::slice::from_ref(key), value),
        }
    }
}

/// Insertion-ordered key → value map.
///
/// Re-inserting an existing key replaces its value and keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicRecord {
    entries: Vec<(String, Value)>,
}

impl DynamicRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key → value`, returning the previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Text of a [`Value::Utf8`] entry.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object with keys in record order.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for DynamicRecord {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl RecordTarget for DynamicRecord {
    const DYNAMIC: bool = true;

    fn create() -> Self {
        Self::new()
    }

    fn discover() -> Vec<(String, Setter<Self>)> {
        Vec::new()
    }

    fn apply(&mut self, setter: &Setter<Self>, value: Value) -> Result<(), AssignError> {
        match setter {
            Setter::Mapping(key) => {
                self.insert(key.clone(), value);
                Ok(())
            }
            Setter::NestedPath(path) => {
                self.insert(path.join("."), value);
                Ok(())
            }
            Setter::Accessor { accessor, .. } => accessor(self, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Address {
        street: String,
        post_code: Option<i64>,
    }

    impl TypedRecord for Address {
        fn accessors() -> Accessors<Self> {
            Accessors::<Self>::new()
                .field("street", |a, v| {
                    a.street = v.into_text();
                    Ok(())
                })
                .field("postCode", |a, v| {
                    a.post_code = Some(v.to_i64()?);
                    Ok(())
                })
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Student {
        first_name: String,
        address: Option<Address>,
    }

    impl TypedRecord for Student {
        fn accessors() -> Accessors<Self> {
            Accessors::<Self>::new().field("firstName", |s, v| {
                s.first_name = v.into_text();
                Ok(())
            })
        }

        fn child_mut(&mut self, key: &str) -> Option<&mut dyn NestedTarget> {
            match key {
                "address" => Some(self.address.get_or_insert_with(Address::default)),
                _ => None,
            }
        }
    }

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(str::to_string).collect()
    }

    #[test]
    fn dynamic_record_keeps_first_insertion_position() {
        let mut record = DynamicRecord::new();
        record.insert("no", Value::from("10"));
        record.insert("code", Value::from("AU"));
        let previous = record.insert("no", Value::from("11"));
        assert_eq!(previous, Some(Value::from("10")));
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["no", "code"]);
        assert_eq!(record.get_str("no"), Some("11"));
    }

    #[test]
    fn dynamic_record_json_preserves_order() {
        let record: DynamicRecord = [("b", Value::Int64(1)), ("a", Value::Null)]
            .into_iter()
            .collect();
        assert_eq!(record.to_json().to_string(), r#"{"b":1,"a":null}"#);
    }

    #[test]
    fn nested_assignment_creates_children() {
        let mut student = Student::default();
        student.assign_path(&path("address.postCode"), Value::from("2000")).unwrap();
        student.assign_path(&path("firstName"), Value::from("Ann")).unwrap();
        assert_eq!(student.first_name, "Ann");
        assert_eq!(student.address.as_ref().and_then(|a| a.post_code), Some(2000));
    }

    #[test]
    fn nested_assignment_reports_unknown_segments() {
        let mut student = Student::default();
        assert_eq!(
            student.assign_path(&path("school.name"), Value::from("x")),
            Err(AssignError::UnknownPath {
                path: "school.name".to_string()
            })
        );
        assert_eq!(
            student.assign_path(&path("address.suburb"), Value::from("x")),
            Err(AssignError::UnknownField {
                key: "suburb".to_string()
            })
        );
    }

    #[test]
    fn typed_apply_dispatches_each_setter_kind() {
        let mut student = Student::create();
        let setters = Student::discover();
        assert_eq!(setters.len(), 1);
        student.apply(&setters[0].1, Value::from("Bo")).unwrap();
        student
            .apply(&Setter::nested("address.street"), Value::from("Premier St"))
            .unwrap();
        student
            .apply(&Setter::Mapping("firstName".to_string()), Value::from("Cy"))
            .unwrap();
        assert_eq!(student.first_name, "Cy");
        assert_eq!(student.address.unwrap().street, "Premier St");
    }

    #[test]
    fn dynamic_apply_uses_dotted_key_for_nested_paths() {
        let mut record = DynamicRecord::create();
        record
            .apply(&Setter::nested("address.street"), Value::from("Premier St"))
            .unwrap();
        assert_eq!(record.get_str("address.street"), Some("Premier St"));
    }
}
