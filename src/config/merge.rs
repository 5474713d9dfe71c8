//! Field-by-field merging of config tiers.
//!
//! Tiers are converted to JSON values first so YAML and the embedded defaults
//! merge through one code path.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// Maps merge key by key, recursively. Any other overlay value replaces the
/// base value, except `null`, which means "not set in this tier" and keeps
/// the base.
///
/// # Example
/// ```
/// use serde_json::json;
/// use taskboard::config::deep_merge;
///
/// let defaults = json!({"server": {"host": "127.0.0.1", "port": 31995}});
/// let project = json!({"server": {"port": 4000}});
/// assert_eq!(
///     deep_merge(defaults, project),
///     json!({"server": {"host": "127.0.0.1", "port": 4000}})
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let value = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold tiers lowest priority first.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
