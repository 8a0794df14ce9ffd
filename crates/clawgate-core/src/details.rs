//! Loosely-typed argument maps.
//!
//! Agents hand the gate arbitrary JSON-shaped arguments. They stay a
//! string → JSON value map at the boundary; every consumer reads them through
//! [`DetailsExt`], which treats a value of the wrong type as absent instead of
//! guessing at its shape.

use serde_json::{Map, Value};

/// Arguments or details attached to an action.
pub type Details = Map<String, Value>;

#[doc(hidden)]
pub use serde_json as __serde_json;

/// Build a [`Details`] map from `key => value` pairs.
///
/// Values go through `serde_json::json!`, so anything JSON-representable works.
///
/// ```
/// use clawgate_core::{details, DetailsExt};
///
/// let d = details! { "path" => "/tmp/a", "elevated" => true, "to" => ["a", "b"] };
/// assert_eq!(d.str_field("path"), Some("/tmp/a"));
/// assert!(d.is_true("elevated"));
/// assert_eq!(d.array_len("to"), Some(2));
/// ```
#[macro_export]
macro_rules! details {
    () => {
        $crate::Details::new()
    };
    ($($key:expr => $value:tt),+ $(,)?) => {{
        let mut map = $crate::Details::new();
        $(
            map.insert(
                ::std::string::String::from($key),
                $crate::details::__serde_json::json!($value),
            );
        )+
        map
    }};
}

/// Defensive typed accessors over a [`Details`] map.
pub trait DetailsExt {
    /// String value at `key`, if present and a string.
    fn str_field(&self, key: &str) -> Option<&str>;

    /// Boolean value at `key`, if present and a JSON boolean.
    fn bool_field(&self, key: &str) -> Option<bool>;

    /// `true` only when `key` holds the JSON boolean `true`.
    fn is_true(&self, key: &str) -> bool {
        self.bool_field(key) == Some(true)
    }

    /// Length of the array at `key`, if present and an array.
    fn array_len(&self, key: &str) -> Option<usize>;

    /// First string value found among `keys`, in order.
    fn first_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.str_field(k))
    }
}

impl DetailsExt for Details {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn bool_field(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    fn array_len(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(Value::as_array).map(Vec::len)
    }
}
