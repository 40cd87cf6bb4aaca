//! JSON <-> AMF0 conversion for command-line input and output.
//!
//! JSON has no undefined, date or reference, so those map to tagged objects
//! (`{"$date": ms}`, `{"$ref": n}`, `{"$undefined": true}`) in both
//! directions. Typed objects carry their class under `"$class"`.

use rtmpprims_amf::Value;
use serde_json::{Map, Number, Value as Json};

const DATE_TAG: &str = "$date";
const REF_TAG: &str = "$ref";
const UNDEFINED_TAG: &str = "$undefined";
const CLASS_TAG: &str = "$class";

/// Convert a JSON value into an AMF0 value.
pub fn json_to_amf(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        Json::String(s) => Value::text(s.as_str()),
        Json::Array(items) => Value::StrictArray(items.iter().map(json_to_amf).collect()),
        Json::Object(map) => object_to_amf(map),
    }
}

fn object_to_amf(map: &Map<String, Json>) -> Value {
    if map.len() == 1 {
        if let Some(millis) = map.get(DATE_TAG).and_then(Json::as_f64) {
            return Value::Date {
                millis,
                timezone: 0,
            };
        }
        if let Some(index) = map
            .get(REF_TAG)
            .and_then(Json::as_u64)
            .and_then(|index| u16::try_from(index).ok())
        {
            return Value::Reference(index);
        }
        if map.get(UNDEFINED_TAG) == Some(&Json::Bool(true)) {
            return Value::Undefined;
        }
    }

    let properties = map
        .iter()
        .filter(|(key, _)| key.as_str() != CLASS_TAG)
        .map(|(key, value)| (key.clone(), json_to_amf(value)))
        .collect();
    match map.get(CLASS_TAG).and_then(Json::as_str) {
        Some(class_name) => Value::TypedObject {
            class_name: class_name.to_string(),
            properties,
        },
        None => Value::Object(properties),
    }
}

/// Convert an AMF0 value into JSON for display.
pub fn amf_to_json(value: &Value) -> Json {
    match value {
        Value::Number(n) => number(*n),
        Value::Boolean(b) => Json::Bool(*b),
        Value::String(s) | Value::LongString(s) | Value::XmlDocument(s) => Json::String(s.clone()),
        Value::Object(properties) | Value::EcmaArray { properties, .. } => {
            Json::Object(properties_to_json(properties))
        }
        Value::TypedObject {
            class_name,
            properties,
        } => {
            let mut map = Map::new();
            map.insert(CLASS_TAG.to_string(), Json::String(class_name.clone()));
            map.extend(properties_to_json(properties));
            Json::Object(map)
        }
        Value::Null | Value::Unsupported => Json::Null,
        Value::Undefined => tagged(UNDEFINED_TAG, Json::Bool(true)),
        Value::Reference(index) => tagged(REF_TAG, Json::from(*index)),
        Value::StrictArray(items) => Json::Array(items.iter().map(amf_to_json).collect()),
        Value::Date { millis, .. } => tagged(DATE_TAG, number(*millis)),
    }
}

fn properties_to_json(properties: &[(String, Value)]) -> Map<String, Json> {
    properties
        .iter()
        .map(|(key, value)| (key.clone(), amf_to_json(value)))
        .collect()
}

fn tagged(tag: &str, value: Json) -> Json {
    let mut map = Map::new();
    map.insert(tag.to_string(), value);
    Json::Object(map)
}

// Integral values print without a fraction; NaN and infinities become null.
fn number(n: f64) -> Json {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Json::from(n as i64)
    } else {
        Number::from_f64(n).map(Json::Number).unwrap_or(Json::Null)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn scalars_and_containers_from_json() {
        let value = json_to_amf(&json!({
            "app": "live",
            "fpad": false,
            "capabilities": 15,
            "codecs": [1, null]
        }));
        assert_eq!(
            value,
            Value::object([
                ("app", Value::text("live")),
                ("fpad", Value::Boolean(false)),
                ("capabilities", Value::Number(15.0)),
                (
                    "codecs",
                    Value::StrictArray(vec![Value::Number(1.0), Value::Null])
                ),
            ])
        );
    }

    #[test]
    fn tagged_objects_map_to_special_values() {
        assert_eq!(
            json_to_amf(&json!({"$date": 1000.0})),
            Value::Date {
                millis: 1000.0,
                timezone: 0
            }
        );
        assert_eq!(json_to_amf(&json!({"$ref": 2})), Value::Reference(2));
        assert_eq!(json_to_amf(&json!({"$undefined": true})), Value::Undefined);
        assert_eq!(
            json_to_amf(&json!({"$class": "Point", "x": 1})),
            Value::TypedObject {
                class_name: "Point".into(),
                properties: vec![("x".into(), Value::Number(1.0))],
            }
        );
    }

    #[test]
    fn amf_to_json_keeps_property_order() {
        let value = Value::ecma_array([("b", Value::Number(2.0)), ("a", Value::Number(0.5))]);
        assert_eq!(
            serde_json::to_string(&amf_to_json(&value)).unwrap(),
            r#"{"b":2,"a":0.5}"#
        );
    }

    #[test]
    fn special_values_survive_json() {
        for value in [
            Value::Undefined,
            Value::Reference(7),
            Value::Date {
                millis: 1_700_000_000_000.0,
                timezone: 0,
            },
        ] {
            assert_eq!(json_to_amf(&amf_to_json(&value)), value);
        }
        assert_eq!(amf_to_json(&Value::Number(f64::NAN)), Json::Null);
    }
}
