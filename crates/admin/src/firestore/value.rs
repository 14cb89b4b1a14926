//! Firestore typed values and their plain JSON equivalents.
//!
//! Firestore's REST encoding wraps every value in a single-key object naming
//! its type. [`Value`] mirrors that encoding with serde's externally tagged
//! enums, so `{"integerValue": "42"}` deserializes straight into
//! `Value::IntegerValue(42)`.
//!
//! Conversions to JSON are lossy in two deliberate places: timestamps,
//! bytes and references become strings, and doubles with no fractional part
//! become JSON integers (numbers written by web clients often land as
//! doubles even when they hold counts).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number};
use storedesk_core::Fields;

/// Largest integer a double represents exactly.
const MAX_EXACT_DOUBLE: f64 = 9_007_199_254_740_992.0;

/// Field map in Firestore's wire encoding.
pub type WireFields = BTreeMap<String, Value>;

/// A Firestore value in its REST encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(#[serde(with = "integer_string")] i64),
    DoubleValue(#[serde(with = "double")] f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(LatLng),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

/// Geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LatLng {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

/// Array payload. Firestore omits `values` for empty arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ArrayValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

/// Map payload. Firestore omits `fields` for empty maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MapValue {
    #[serde(default)]
    pub fields: WireFields,
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::NullValue(()),
            serde_json::Value::Bool(b) => Self::BooleanValue(*b),
            serde_json::Value::Number(n) => n.as_i64().map_or_else(
                || Self::DoubleValue(n.as_f64().unwrap_or_default()),
                Self::IntegerValue,
            ),
            serde_json::Value::String(s) => Self::StringValue(s.clone()),
            serde_json::Value::Array(items) => Self::ArrayValue(ArrayValue {
                values: items.iter().map(Self::from).collect(),
            }),
            serde_json::Value::Object(map) => Self::MapValue(MapValue {
                fields: encode_fields(map),
            }),
        }
    }
}

impl Value {
    /// Convert into plain JSON.
    #[must_use]
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Self::NullValue(()) => serde_json::Value::Null,
            Self::BooleanValue(b) => serde_json::Value::Bool(b),
            Self::IntegerValue(n) => serde_json::Value::from(n),
            Self::DoubleValue(x) => double_to_json(x),
            Self::TimestampValue(s)
            | Self::StringValue(s)
            | Self::BytesValue(s)
            | Self::ReferenceValue(s) => serde_json::Value::String(s),
            Self::GeoPointValue(point) => {
                let mut map = Map::new();
                map.insert("latitude".to_string(), double_to_json(point.latitude));
                map.insert("longitude".to_string(), double_to_json(point.longitude));
                serde_json::Value::Object(map)
            }
            Self::ArrayValue(array) => {
                serde_json::Value::Array(array.values.into_iter().map(Self::into_json).collect())
            }
            Self::MapValue(map) => serde_json::Value::Object(decode_fields(map.fields)),
        }
    }
}

#[allow(clippy::cast_possible_truncation)] // guarded by the exact-integer range check
fn double_to_json(x: f64) -> serde_json::Value {
    if x.is_finite() && x.fract() == 0.0 && x.abs() <= MAX_EXACT_DOUBLE {
        serde_json::Value::from(x as i64)
    } else {
        Number::from_f64(x).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

/// Encode a JSON field map for the wire.
#[must_use]
pub fn encode_fields(fields: &Fields) -> WireFields {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), Value::from(value)))
        .collect()
}

/// Decode a wire field map into JSON.
#[must_use]
pub fn decode_fields(fields: WireFields) -> Fields {
    fields
        .into_iter()
        .map(|(key, value)| (key, value.into_json()))
        .collect()
}

/// `integerValue` is an int64 sent as a decimal string.
mod integer_string {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(i64),
    }

    #[allow(clippy::trivially_copy_pass_by_ref)] // signature required by serde(with)
    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(D::Error::custom),
            Repr::Number(n) => Ok(n),
        }
    }
}

/// `doubleValue` is a JSON number, or one of `"NaN"`, `"Infinity"`, `"-Infinity"`.
mod double {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    #[allow(clippy::trivially_copy_pass_by_ref)] // signature required by serde(with)
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_infinite() && value.is_sign_positive() {
            serializer.serialize_str("Infinity")
        } else if value.is_infinite() {
            serializer.serialize_str("-Infinity")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(x) => Ok(x),
            Repr::Text(text) => text.parse().map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: serde_json::Value) -> Fields {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_encode_product_fields() {
        let fields = object(json!({
            "name": "Mug",
            "price": 4.5,
            "quantity": 3,
            "images": ["a.png"],
            "description": null
        }));
        let wire = serde_json::to_value(encode_fields(&fields)).unwrap();

        assert_eq!(
            wire,
            json!({
                "name": {"stringValue": "Mug"},
                "price": {"doubleValue": 4.5},
                "quantity": {"integerValue": "3"},
                "images": {"arrayValue": {"values": [{"stringValue": "a.png"}]}},
                "description": {"nullValue": null}
            })
        );
    }

    #[test]
    fn test_decode_typed_document_fields() {
        let wire: WireFields = serde_json::from_value(json!({
            "customerName": {"stringValue": "Ada"},
            "quantity": {"integerValue": "2"},
            "totalPrice": {"doubleValue": 19.98},
            "createdAt": {"timestampValue": "2024-03-01T10:00:00.123Z"},
            "daily": {"mapValue": {"fields": {"claimedDay": {"integerValue": "4"}}}},
            "referrals": {"arrayValue": {}},
            "isPremium": {"booleanValue": true}
        }))
        .unwrap();

        assert_eq!(
            serde_json::Value::Object(decode_fields(wire)),
            json!({
                "customerName": "Ada",
                "quantity": 2,
                "totalPrice": 19.98,
                "createdAt": "2024-03-01T10:00:00.123Z",
                "daily": {"claimedDay": 4},
                "referrals": [],
                "isPremium": true
            })
        );
    }

    #[test]
    fn test_integral_double_decodes_as_integer() {
        let value: Value = serde_json::from_value(json!({"doubleValue": 12.0})).unwrap();
        assert_eq!(value.into_json(), json!(12));
    }

    #[test]
    fn test_non_finite_double_decodes_as_null() {
        let value: Value = serde_json::from_value(json!({"doubleValue": "NaN"})).unwrap();
        assert_eq!(value.into_json(), serde_json::Value::Null);

        let value: Value = serde_json::from_value(json!({"doubleValue": "-Infinity"})).unwrap();
        assert_eq!(value, Value::DoubleValue(f64::NEG_INFINITY));
    }

    #[test]
    fn test_integer_value_accepts_number() {
        let value: Value = serde_json::from_value(json!({"integerValue": 7})).unwrap();
        assert_eq!(value, Value::IntegerValue(7));
    }

    #[test]
    fn test_empty_map_value_without_fields() {
        let value: Value = serde_json::from_value(json!({"mapValue": {}})).unwrap();
        assert_eq!(value.into_json(), json!({}));
    }

    #[test]
    fn test_geo_point_and_reference() {
        let value: Value = serde_json::from_value(json!({
            "geoPointValue": {"latitude": 51.5, "longitude": -0.12}
        }))
        .unwrap();
        assert_eq!(value.into_json(), json!({"latitude": 51.5, "longitude": -0.12}));

        let value: Value = serde_json::from_value(json!({
            "referenceValue": "projects/p/databases/(default)/documents/categories/c1"
        }))
        .unwrap();
        assert_eq!(
            value.into_json(),
            json!("projects/p/databases/(default)/documents/categories/c1")
        );
    }

    #[test]
    fn test_unknown_value_type_is_rejected() {
        let result: Result<Value, _> = serde_json::from_value(json!({"vectorValue": {}}));
        assert!(result.is_err());
    }
}
