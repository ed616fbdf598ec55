//! core::codec
//!
//! Translation between native [`Value`]s and the backend's tagged JSON.
//!
//! # Wire format
//!
//! Typed values travel as JSON objects discriminated by `__type`:
//!
//! ```text
//! {"__type": "Pointer",  "className": "_Role", "objectId": "R1"}
//! {"__type": "Date",     "iso": "2024-01-01T00:00:00.000Z"}
//! {"__type": "GeoPoint", "latitude": 40.0, "longitude": -30.0}
//! {"__type": "File",     "name": "a.png", "url": "https://..."}
//! {"__type": "Object",   "className": "Post", ...fields}
//! {"__type": "Relation", "className": "_Role"}
//! ```
//!
//! Decoding is pure. Pointers and relations decode to unresolved
//! references; fetching what they point at is an explicit call on
//! [`crate::engine::Client`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value as Json};

use super::types::{Embedded, FileRef, GeoPoint, Pointer, ToPointer};
use super::value::Value;

/// Discriminator key of tagged values.
pub const TYPE_KEY: &str = "__type";

/// Discriminator key of mutation operations.
pub const OP_KEY: &str = "__op";

const CLASS_NAME_KEY: &str = "className";

/// Encode a native value into its wire form.
///
/// Anything carrying an identity encodes as a `Pointer`; arrays are
/// encoded item by item with no relation semantics attached.
pub fn encode(value: &Value) -> Json {
    if let Some(pointer) = value.to_pointer() {
        return pointer_json(&pointer);
    }

    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => Json::Number(n.clone()),
        Value::String(s) => Json::String(s.clone()),
        Value::Date(d) => json!({ TYPE_KEY: "Date", "iso": format_date(d) }),
        Value::GeoPoint(g) => json!({
            TYPE_KEY: "GeoPoint",
            "latitude": g.latitude,
            "longitude": g.longitude,
        }),
        Value::File(f) => {
            let mut map = Map::new();
            map.insert(TYPE_KEY.into(), Json::from("File"));
            if let Some(name) = &f.name {
                map.insert("name".into(), Json::from(name.as_str()));
            }
            map.insert("url".into(), Json::from(f.url.as_str()));
            Json::Object(map)
        }
        Value::Object(embedded) => {
            let mut map = embedded.fields.clone();
            map.insert(TYPE_KEY.into(), Json::from("Object"));
            map.insert(CLASS_NAME_KEY.into(), Json::from(embedded.class_name.as_str()));
            Json::Object(map)
        }
        Value::Relation { class_name } => {
            json!({ TYPE_KEY: "Relation", CLASS_NAME_KEY: class_name })
        }
        Value::Array(items) => Json::Array(items.iter().map(encode).collect()),
        Value::Map(map) => Json::Object(map.clone()),
        // Pointers were handled above.
        Value::Pointer(p) => pointer_json(p),
    }
}

/// Decode a wire value into its native form.
///
/// Tagged objects dispatch on `__type`; a tagged object with missing or
/// malformed fields, an unknown tag, or an untagged map comes back
/// unchanged as [`Value::Map`].
pub fn decode(raw: &Json) -> Value {
    match raw {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.clone()),
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Array(items.iter().map(decode).collect()),
        Json::Object(map) => decode_tagged(map).unwrap_or_else(|| Value::Map(map.clone())),
    }
}

fn decode_tagged(map: &Map<String, Json>) -> Option<Value> {
    let str_field = |key: &str| map.get(key).and_then(Json::as_str);

    match str_field(TYPE_KEY)? {
        "Pointer" => Some(Value::Pointer(Pointer {
            class_name: str_field(CLASS_NAME_KEY)?.to_string(),
            object_id: str_field("objectId")?.to_string(),
        })),
        "Object" => {
            let class_name = str_field(CLASS_NAME_KEY)?.to_string();
            let fields = map
                .iter()
                .filter(|(k, _)| k.as_str() != TYPE_KEY && k.as_str() != CLASS_NAME_KEY)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Some(Value::Object(Embedded { class_name, fields }))
        }
        "Date" => parse_date(str_field("iso")?).map(Value::Date),
        "File" => Some(Value::File(FileRef {
            name: str_field("name").map(str::to_string),
            url: str_field("url")?.to_string(),
        })),
        "GeoPoint" => Some(Value::GeoPoint(GeoPoint {
            latitude: map.get("latitude")?.as_f64()?,
            longitude: map.get("longitude")?.as_f64()?,
        })),
        "Relation" => Some(Value::Relation {
            class_name: str_field(CLASS_NAME_KEY)?.to_string(),
        }),
        _ => None,
    }
}

/// Wire form of a pointer.
pub fn pointer_json(pointer: &Pointer) -> Json {
    json!({
        TYPE_KEY: "Pointer",
        CLASS_NAME_KEY: pointer.class_name,
        "objectId": pointer.object_id,
    })
}

/// Identity of a wire item: `(className, objectId)`.
///
/// Pointers and embedded objects carry one; scalars, untagged maps
/// without a class, and unsaved objects do not.
pub fn identity_of(item: &Json) -> Option<(&str, &str)> {
    let map = item.as_object()?;
    let class_name = map.get(CLASS_NAME_KEY)?.as_str()?;
    let object_id = map.get("objectId")?.as_str()?;
    Some((class_name, object_id))
}

/// Format a timestamp the way the backend stores it (`…T…:…:….mmmZ`).
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 / RFC 3339 timestamp into UTC.
pub fn parse_date(iso: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(iso)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_encodes_as_tagged_iso() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap();
        assert_eq!(
            encode(&Value::Date(date)),
            json!({"__type": "Date", "iso": "2024-01-01T12:30:00.000Z"})
        );
    }

    #[test]
    fn date_decodes_to_timestamp() {
        let raw = json!({"__type": "Date", "iso": "2024-01-01T12:30:00.000Z"});
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap();
        assert_eq!(decode(&raw), Value::Date(expected));
    }

    #[test]
    fn pointer_encodes_with_mapped_class() {
        let pointer = Pointer::new("User", "u1");
        assert_eq!(
            encode(&Value::Pointer(pointer)),
            json!({"__type": "Pointer", "className": "_User", "objectId": "u1"})
        );
    }

    #[test]
    fn pointer_round_trips() {
        let pointer = Pointer::new("Role", "R9");
        let decoded = decode(&encode(&Value::Pointer(pointer.clone())));
        assert_eq!(decoded.as_pointer(), Some(&pointer));
    }

    #[test]
    fn embedded_with_id_encodes_as_pointer() {
        let raw = json!({"__type": "Object", "className": "Post", "objectId": "p1", "title": "hi"});
        let decoded = decode(&raw);
        match &decoded {
            Value::Object(embedded) => {
                assert_eq!(embedded.class_name, "Post");
                assert_eq!(embedded.fields.get("title"), Some(&json!("hi")));
                assert!(!embedded.fields.contains_key("__type"));
            }
            other => panic!("expected embedded object, got {:?}", other),
        }
        assert_eq!(
            encode(&decoded),
            json!({"__type": "Pointer", "className": "Post", "objectId": "p1"})
        );
    }

    #[test]
    fn embedded_without_id_keeps_object_tag() {
        let raw = json!({"__type": "Object", "className": "Note", "text": "x"});
        assert_eq!(encode(&decode(&raw)), raw);
    }

    #[test]
    fn file_exposes_url() {
        let raw = json!({"__type": "File", "name": "a.png", "url": "https://files/a.png"});
        match decode(&raw) {
            Value::File(file) => {
                assert_eq!(file.url, "https://files/a.png");
                assert_eq!(file.name.as_deref(), Some("a.png"));
            }
            other => panic!("expected file, got {:?}", other),
        }
        assert_eq!(encode(&decode(&raw)), raw);
    }

    #[test]
    fn geopoint_wraps_fields() {
        let raw = json!({"__type": "GeoPoint", "latitude": 40.5, "longitude": -73.25});
        assert_eq!(decode(&raw), Value::GeoPoint(GeoPoint::new(40.5, -73.25)));
        assert_eq!(encode(&decode(&raw)), raw);
    }

    #[test]
    fn relation_decodes_unresolved() {
        let raw = json!({"__type": "Relation", "className": "_Role"});
        assert_eq!(
            decode(&raw),
            Value::Relation {
                class_name: "_Role".into()
            }
        );
    }

    #[test]
    fn unknown_and_malformed_tags_pass_through() {
        let unknown = json!({"__type": "Bytes", "base64": "AA=="});
        assert_eq!(decode(&unknown), Value::Map(unknown.as_object().unwrap().clone()));

        let bad_date = json!({"__type": "Date", "iso": "yesterday"});
        assert_eq!(decode(&bad_date), Value::Map(bad_date.as_object().unwrap().clone()));

        let op = json!({"__op": "Increment", "amount": 1});
        assert_eq!(encode(&decode(&op)), op);
    }

    #[test]
    fn plain_values_pass_through() {
        for raw in [json!(null), json!(true), json!(3), json!("x"), json!({"a": 1})] {
            assert_eq!(encode(&decode(&raw)), raw);
        }
    }

    #[test]
    fn arrays_encode_item_wise() {
        let value = Value::Array(vec![Value::from("a"), Value::Pointer(Pointer::new("Role", "R1"))]);
        assert_eq!(
            encode(&value),
            json!(["a", {"__type": "Pointer", "className": "_Role", "objectId": "R1"}])
        );
    }

    #[test]
    fn identity_requires_class_and_id() {
        assert_eq!(
            identity_of(&json!({"__type": "Pointer", "className": "_Role", "objectId": "R1"})),
            Some(("_Role", "R1"))
        );
        assert_eq!(identity_of(&json!({"objectId": "R1"})), None);
        assert_eq!(identity_of(&json!("R1")), None);
    }
}
