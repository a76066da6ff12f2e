//! Typed key/value fields attached to a single log record.
//!
//! Every constructor is a pure function: it captures the key and the value
//! and does nothing else. Encoding happens when the record is written.

use std::time::Duration;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Value carried by a [`Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Contributes nothing to the record.
    Skip,
    /// An absent optional value, encoded as `null`.
    Null,
    Bool(bool),
    Int64(i64),
    Uint64(u64),
    Float64(f64),
    Float32(f32),
    String(String),
    /// UTF-8 text held as raw bytes.
    ByteString(Vec<u8>),
    /// Opaque bytes, encoded as base64.
    Binary(Vec<u8>),
    Duration(Duration),
    Time(DateTime<Utc>),
    /// Any serde-serializable value.
    Any(Value),
    /// Serialization of an `any` value failed; holds the error text.
    Invalid(String),
}

/// A named, typed value attached to one log call.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: String,
    value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<String>, value: FieldValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn is_skip(&self) -> bool {
        matches!(self.value, FieldValue::Skip)
    }

    /// The JSON key/value pair this field contributes, if any.
    pub(crate) fn to_json(&self) -> Option<(String, Value)> {
        let value = match &self.value {
            FieldValue::Skip => return None,
            FieldValue::Invalid(err) => {
                return Some((format!("{}Error", self.key), Value::String(err.clone())))
            }
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int64(n) => Value::from(*n),
            FieldValue::Uint64(n) => Value::from(*n),
            FieldValue::Float64(f) => float_value(*f),
            // Go through the shortest decimal form so 0.1f32 stays 0.1.
            FieldValue::Float32(f) => float_value(f.to_string().parse().unwrap_or(f64::NAN)),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::ByteString(bytes) => {
                Value::String(String::from_utf8_lossy(bytes).into_owned())
            }
            FieldValue::Binary(bytes) => {
                Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            FieldValue::Duration(d) => float_value(d.as_secs_f64()),
            FieldValue::Time(t) => float_value(epoch_seconds(t)),
            FieldValue::Any(v) => v.clone(),
        };
        Some((self.key.clone(), value))
    }
}

/// Non-finite floats have no JSON number form.
fn float_value(f: f64) -> Value {
    if f.is_nan() {
        Value::String("NaN".into())
    } else if f.is_infinite() {
        Value::String(if f > 0.0 { "+Inf" } else { "-Inf" }.into())
    } else {
        Value::from(f)
    }
}

pub(crate) fn epoch_seconds(t: &DateTime<Utc>) -> f64 {
    t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) / 1e9
}

fn optional<T>(key: impl Into<String>, value: Option<T>, wrap: impl FnOnce(T) -> FieldValue) -> Field {
    Field::new(key, value.map_or(FieldValue::Null, wrap))
}

/// A no-op field; it adds nothing to the record.
pub fn skip() -> Field {
    Field::new("", FieldValue::Skip)
}

pub fn bool(key: impl Into<String>, value: bool) -> Field {
    Field::new(key, FieldValue::Bool(value))
}

pub fn boolp(key: impl Into<String>, value: Option<bool>) -> Field {
    optional(key, value, FieldValue::Bool)
}

pub fn string(key: impl Into<String>, value: impl Into<String>) -> Field {
    Field::new(key, FieldValue::String(value.into()))
}

pub fn stringp(key: impl Into<String>, value: Option<&str>) -> Field {
    optional(key, value, |s| FieldValue::String(s.to_string()))
}

/// UTF-8 encoded text given as bytes. Invalid sequences are replaced.
pub fn byte_string(key: impl Into<String>, value: impl AsRef<[u8]>) -> Field {
    Field::new(key, FieldValue::ByteString(value.as_ref().to_vec()))
}

/// Opaque binary data, emitted base64-encoded.
pub fn binary(key: impl Into<String>, value: impl AsRef<[u8]>) -> Field {
    Field::new(key, FieldValue::Binary(value.as_ref().to_vec()))
}

pub fn int64(key: impl Into<String>, value: i64) -> Field {
    Field::new(key, FieldValue::Int64(value))
}

pub fn int64p(key: impl Into<String>, value: Option<i64>) -> Field {
    optional(key, value, FieldValue::Int64)
}

pub fn uint64(key: impl Into<String>, value: u64) -> Field {
    Field::new(key, FieldValue::Uint64(value))
}

pub fn float64(key: impl Into<String>, value: f64) -> Field {
    Field::new(key, FieldValue::Float64(value))
}

pub fn float64p(key: impl Into<String>, value: Option<f64>) -> Field {
    optional(key, value, FieldValue::Float64)
}

pub fn float32(key: impl Into<String>, value: f32) -> Field {
    Field::new(key, FieldValue::Float32(value))
}

pub fn float32p(key: impl Into<String>, value: Option<f32>) -> Field {
    optional(key, value, FieldValue::Float32)
}

/// Encoded as floating-point seconds.
pub fn duration(key: impl Into<String>, value: Duration) -> Field {
    Field::new(key, FieldValue::Duration(value))
}

pub fn durationp(key: impl Into<String>, value: Option<Duration>) -> Field {
    optional(key, value, FieldValue::Duration)
}

/// Encoded as floating-point seconds since the Unix epoch.
pub fn time(key: impl Into<String>, value: DateTime<Utc>) -> Field {
    Field::new(key, FieldValue::Time(value))
}

/// Error text under the conventional `error` key.
pub fn error<E: std::error::Error + ?Sized>(err: &E) -> Field {
    named_error("error", err)
}

pub fn named_error<E: std::error::Error + ?Sized>(key: impl Into<String>, err: &E) -> Field {
    Field::new(key, FieldValue::String(err.to_string()))
}

/// Any serializable value, encoded through serde at call time.
///
/// If serialization fails the record carries `<key>Error` with the failure
/// text instead of the value.
pub fn any<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Field {
    match serde_json::to_value(value) {
        Ok(v) => Field::new(key, FieldValue::Any(v)),
        Err(err) => Field::new(key, FieldValue::Invalid(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn constructors_are_pure() {
        assert_eq!(bool("k", true), bool("k", true));
        assert_eq!(float64p("f", Some(1.5)), float64p("f", Some(1.5)));
        assert_ne!(bool("k", true), bool("k", false));
    }

    #[test]
    fn skip_contributes_nothing() {
        let f = skip();
        assert!(f.is_skip());
        assert_eq!(f.to_json(), None);
    }

    #[test]
    fn optional_variants_encode_null() {
        assert_eq!(boolp("b", None).to_json(), Some(("b".into(), Value::Null)));
        assert_eq!(
            durationp("d", Some(Duration::from_millis(1500))).to_json(),
            Some(("d".into(), json!(1.5)))
        );
        assert_eq!(float32p("f", None).value(), &FieldValue::Null);
    }

    #[test]
    fn float32_keeps_short_decimal() {
        assert_eq!(float32("f", 0.1).to_json().unwrap().1, json!(0.1));
    }

    #[test]
    fn non_finite_floats_become_strings() {
        assert_eq!(float64("f", f64::NAN).to_json().unwrap().1, json!("NaN"));
        assert_eq!(float64("f", f64::NEG_INFINITY).to_json().unwrap().1, json!("-Inf"));
    }

    #[test]
    fn bytes_encodings() {
        assert_eq!(byte_string("s", b"hello").to_json().unwrap().1, json!("hello"));
        assert_eq!(binary("b", [0xdeu8, 0xad, 0xbe, 0xef]).to_json().unwrap().1, json!("3q2+7w=="));
    }

    #[test]
    fn any_serializes_structures() {
        let mut m = HashMap::new();
        m.insert("a", 1);
        assert_eq!(any("m", &m).to_json().unwrap(), ("m".into(), json!({"a": 1})));
        assert_eq!(any("v", &vec![1, 2]).to_json().unwrap().1, json!([1, 2]));
    }

    #[test]
    fn any_reports_serialization_failure() {
        let mut m = HashMap::new();
        m.insert((1, 2), "tuple keys are not JSON keys");
        let f = any("bad", &m);
        assert!(matches!(f.value(), FieldValue::Invalid(_)));
        assert_eq!(f.to_json().unwrap().0, "badError");
    }

    #[test]
    fn error_uses_display() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        assert_eq!(error(&err).to_json().unwrap(), ("error".into(), json!("disk on fire")));
    }

    #[test]
    fn time_is_epoch_seconds() {
        let t = DateTime::from_timestamp(1_700_000_000, 500_000_000).unwrap();
        assert_eq!(time("at", t).to_json().unwrap().1, json!(1_700_000_000.5));
    }
}
