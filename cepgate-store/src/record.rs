//! Address records, lookup keys and the durable tier envelope

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Field whose presence in an origin payload means "no such postal code"
pub const ORIGIN_ERROR_FIELD: &str = "erro";

/// A validated postal code, used verbatim as the key in every tier
///
/// Surrounding whitespace is trimmed; nothing else is normalized, so
/// `"01001000"` and `"01001-000"` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LookupKey(String);

impl LookupKey {
    /// Validate a raw identifier
    ///
    /// The key ends up in the origin URL path, so only ASCII alphanumerics
    /// and `-` are accepted.
    pub fn parse(raw: &str) -> Result<Self> {
        let key = raw.trim();

        if key.is_empty() {
            return Err(StoreError::InvalidKey {
                key: raw.to_string(),
                reason: "key is empty".to_string(),
            });
        }

        if let Some(c) = key.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '-')) {
            return Err(StoreError::InvalidKey {
                key: raw.to_string(),
                reason: format!("unexpected character {:?}", c),
            });
        }

        Ok(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LookupKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An address as returned by the origin: an opaque field → value map
///
/// The lookup pipeline never interprets the fields, except for the
/// [`ORIGIN_ERROR_FIELD`] marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressRecord {
    fields: BTreeMap<String, String>,
}

impl AddressRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a decoded JSON payload
    ///
    /// String values are kept as-is; other scalars are stored as their JSON
    /// text (`true`, `3550308`), `null` as an empty string. A payload that is
    /// not a JSON object is rejected.
    pub fn from_json(payload: Value) -> Result<Self> {
        let Value::Object(map) = payload else {
            return Err(StoreError::SerializationError(
                "address payload is not a JSON object".to_string(),
            ));
        };

        let fields = map
            .into_iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (name, text)
            })
            .collect();

        Ok(Self { fields })
    }

    /// Builder-style field setter
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Whether the origin flagged this payload as "not found"
    pub fn has_error_marker(&self) -> bool {
        self.fields.contains_key(ORIGIN_ERROR_FIELD)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serialize to the JSON text stored in the cache and durable tiers
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Inverse of [`AddressRecord::to_json_string`]
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// A record as held by the durable tier, with the identity the store assigned
///
/// The identity is a storage artifact; [`StoredRecord::into_record`] is the
/// only way out of the tier and drops it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: Uuid,
    pub key: LookupKey,
    record: AddressRecord,
}

impl StoredRecord {
    /// Wrap a record under a freshly generated identity
    pub fn new(key: LookupKey, record: AddressRecord) -> Self {
        Self::with_id(Uuid::new_v4(), key, record)
    }

    pub fn with_id(id: Uuid, key: LookupKey, record: AddressRecord) -> Self {
        Self { id, key, record }
    }

    /// Strip the identity and hand back the logical record
    pub fn into_record(self) -> AddressRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_key_accepts_digits_and_hyphen() {
        assert_eq!(LookupKey::parse("01001000").unwrap().as_str(), "01001000");
        assert_eq!(LookupKey::parse("01001-000").unwrap().as_str(), "01001-000");
        assert_eq!(LookupKey::parse("  01001000 ").unwrap().as_str(), "01001000");
    }

    #[test]
    fn test_lookup_key_rejects_empty_and_path_characters() {
        assert!(LookupKey::parse("").is_err());
        assert!(LookupKey::parse("   ").is_err());
        assert!(LookupKey::parse("01001/000").is_err());
        assert!(LookupKey::parse("../json").is_err());
        assert!(LookupKey::parse("0100 1000").is_err());
    }

    #[test]
    fn test_record_from_json_stringifies_scalars() {
        let record = AddressRecord::from_json(json!({
            "cep": "01001-000",
            "logradouro": "Praça da Sé",
            "ibge": 3550308,
            "complemento": null
        }))
        .unwrap();

        assert_eq!(record.get("cep"), Some("01001-000"));
        assert_eq!(record.get("logradouro"), Some("Praça da Sé"));
        assert_eq!(record.get("ibge"), Some("3550308"));
        assert_eq!(record.get("complemento"), Some(""));
        assert!(!record.has_error_marker());
    }

    #[test]
    fn test_record_detects_error_marker() {
        let bool_marker = AddressRecord::from_json(json!({"erro": true})).unwrap();
        assert!(bool_marker.has_error_marker());

        let string_marker = AddressRecord::from_json(json!({"erro": "true"})).unwrap();
        assert!(string_marker.has_error_marker());
    }

    #[test]
    fn test_record_rejects_non_object_payload() {
        assert!(AddressRecord::from_json(json!(["01001-000"])).is_err());
        assert!(AddressRecord::from_json(json!("01001-000")).is_err());
    }

    #[test]
    fn test_record_serializes_as_flat_map() {
        let record = AddressRecord::new()
            .with_field("cep", "01001-000")
            .with_field("localidade", "São Paulo");

        let text = record.to_json_string().unwrap();
        assert_eq!(text, r#"{"cep":"01001-000","localidade":"São Paulo"}"#);
        assert_eq!(AddressRecord::from_json_str(&text).unwrap(), record);
    }

    #[test]
    fn test_stored_record_strips_identity() {
        let key = LookupKey::parse("01001000").unwrap();
        let record = AddressRecord::new().with_field("cep", "01001-000");
        let stored = StoredRecord::new(key, record.clone());

        assert!(!stored.id.is_nil());
        let out = stored.into_record();
        assert_eq!(out, record);
        assert!(out.get("id").is_none());
        assert!(out.get("_id").is_none());
    }
}
