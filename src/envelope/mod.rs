//! Request envelope - the unit of dispatch.
//!
//! One `call_service` message per service call:
//! ```text
//! {
//!   "id": "17",
//!   "type": "call_service",
//!   "domain": "media_player",
//!   "service": "volume_set",
//!   "service_data": { "volume_level": 0.5 },     // omitted when empty
//!   "target": { "entity_id": "media_player.kitchen" }  // omitted without entity
//! }
//! ```
//!
//! Id assignment happens in [`ServiceRequest::new`] only, so domain builders
//! never need to care about uniqueness.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Error, IdGenerator, RequestId, Result};

/// Message type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    CallService,
}

/// Entity the service acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub entity_id: String,
}

/// Free-form `service_data` parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceData(Map<String, Value>);

impl ServiceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Encode any serializable value that maps to a JSON object.
    ///
    /// Fails with [`Error::Serialization`] if the value cannot be encoded
    /// or encodes to something other than an object.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let encoded = serde_json::to_value(value)?;
        Self::try_from(encoded)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ServiceData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for ServiceData {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::Serialization(serde::ser::Error::custom(format!(
                "service data must be a JSON object, got {}",
                value_type_name(&other)
            )))),
        }
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A `call_service` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: RequestId,

    #[serde(rename = "type")]
    pub kind: RequestKind,

    pub domain: String,

    pub service: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_data: Option<ServiceData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
}

impl ServiceRequest {
    /// Allocate an envelope with a fresh id.
    ///
    /// An empty `entity_id` leaves `target` absent; a target is never
    /// present with an empty entity id. `domain` and `service` start empty
    /// and are filled in by the caller.
    pub fn new(ids: &IdGenerator, entity_id: &str) -> Self {
        let target = (!entity_id.is_empty()).then(|| Target {
            entity_id: entity_id.to_string(),
        });
        Self {
            id: ids.next_id(),
            kind: RequestKind::CallService,
            domain: String::new(),
            service: String::new(),
            service_data: None,
            target,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Attach parameters. Empty maps are dropped so the field stays omitted.
    pub fn with_service_data(mut self, data: ServiceData) -> Self {
        self.service_data = (!data.is_empty()).then_some(data);
        self
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.target.as_ref().map(|t| t.entity_id.as_str())
    }

    /// Check the envelope invariants: `domain` and `service` are non-empty,
    /// and a present target never carries an empty entity id.
    pub fn validate(&self) -> Result<()> {
        if self.domain.is_empty() {
            return Err(Error::validation(format!("request {} has an empty domain", self.id)));
        }
        if self.service.is_empty() {
            return Err(Error::validation(format!(
                "request {} ({}) has an empty service",
                self.id, self.domain
            )));
        }
        if matches!(&self.target, Some(t) if t.entity_id.is_empty()) {
            return Err(Error::validation(format!(
                "request {} ({}.{}) has a target with an empty entity id",
                self.id, self.domain, self.service
            )));
        }
        Ok(())
    }

    /// Wire form of this envelope.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_new_with_entity_sets_target() {
        let ids = IdGenerator::new();
        let req = ServiceRequest::new(&ids, "light.porch");
        assert_eq!(req.entity_id(), Some("light.porch"));
        assert_eq!(req.kind, RequestKind::CallService);
        assert_eq!(req.id.as_str(), "1");
    }

    #[test]
    fn test_new_without_entity_omits_target() {
        let ids = IdGenerator::new();
        let req = ServiceRequest::new(&ids, "")
            .with_domain("tts")
            .with_service("clear_cache");
        assert!(req.target.is_none());

        let wire: Value = serde_json::from_str(&req.to_json().unwrap()).unwrap();
        assert_eq!(
            wire,
            json!({
                "id": "1",
                "type": "call_service",
                "domain": "tts",
                "service": "clear_cache",
            })
        );
    }

    #[test]
    fn test_each_envelope_gets_fresh_id() {
        let ids = IdGenerator::new();
        let a = ServiceRequest::new(&ids, "switch.a");
        let b = ServiceRequest::new(&ids, "switch.a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_empty_service_data_is_omitted() {
        let ids = IdGenerator::new();
        let req = ServiceRequest::new(&ids, "light.porch")
            .with_domain("light")
            .with_service("turn_on")
            .with_service_data(ServiceData::new());
        assert!(req.service_data.is_none());
        assert!(!req.to_json().unwrap().contains("service_data"));
    }

    #[test]
    fn test_full_wire_shape() {
        let ids = IdGenerator::starting_at(17);
        let req = ServiceRequest::new(&ids, "media_player.kitchen")
            .with_domain("media_player")
            .with_service("volume_set")
            .with_service_data(ServiceData::new().insert("volume_level", 0.5));

        assert_eq!(
            req.to_json().unwrap(),
            r#"{"id":"17","type":"call_service","domain":"media_player","service":"volume_set","service_data":{"volume_level":0.5},"target":{"entity_id":"media_player.kitchen"}}"#
        );
    }

    #[test]
    fn test_wire_form_parses_back() {
        let ids = IdGenerator::new();
        let req = ServiceRequest::new(&ids, "lock.front")
            .with_domain("lock")
            .with_service("unlock")
            .with_service_data(ServiceData::new().insert("code", "1234"));
        let parsed: ServiceRequest = serde_json::from_str(&req.to_json().unwrap()).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn test_validate_accepts_built_envelopes() {
        let ids = IdGenerator::new();
        let targeted = ServiceRequest::new(&ids, "light.porch")
            .with_domain("light")
            .with_service("turn_on");
        let untargeted = ServiceRequest::new(&ids, "")
            .with_domain("tts")
            .with_service("clear_cache");
        assert!(targeted.validate().is_ok());
        assert!(untargeted.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_domain() {
        let ids = IdGenerator::new();
        let req = ServiceRequest::new(&ids, "").with_service("clear_cache");
        let err = req.validate().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("empty domain"));
    }

    #[test]
    fn test_validate_rejects_empty_service() {
        let ids = IdGenerator::new();
        let req = ServiceRequest::new(&ids, "").with_domain("tts");
        let err = req.validate().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("empty service"));
    }

    #[test]
    fn test_validate_rejects_empty_target_entity() {
        let req: ServiceRequest = serde_json::from_value(json!({
            "id": "9",
            "type": "call_service",
            "domain": "light",
            "service": "turn_on",
            "target": {"entity_id": ""},
        }))
        .unwrap();
        let err = req.validate().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("empty entity id"));
    }

    #[test]
    fn test_from_serialize_struct() {
        #[derive(Serialize)]
        struct Seek {
            seek_position: u32,
        }
        let data = ServiceData::from_serialize(&Seek { seek_position: 90 }).unwrap();
        assert_eq!(data.get("seek_position"), Some(&json!(90)));
    }

    #[test]
    fn test_from_serialize_non_object_fails() {
        let err = ServiceData::from_serialize(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_from_serialize_non_string_keys_fails() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], "x");
        let err = ServiceData::from_serialize(&map).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_try_from_json_object() {
        let data = ServiceData::try_from(json!({"brightness": 120})).unwrap();
        assert_eq!(data.len(), 1);
        assert!(ServiceData::try_from(json!("nope")).is_err());
    }

    proptest! {
        #[test]
        fn prop_non_empty_entity_becomes_target(entity in ".{1,64}") {
            let ids = IdGenerator::new();
            let req = ServiceRequest::new(&ids, &entity);
            prop_assert_eq!(req.entity_id(), Some(entity.as_str()));
        }

        #[test]
        fn prop_service_data_round_trips(
            entries in proptest::collection::btree_map("[a-z_]{1,12}", any::<i64>(), 1..8)
        ) {
            let ids = IdGenerator::new();
            let data = ServiceData::from_serialize(&entries).unwrap();
            let req = ServiceRequest::new(&ids, "light.x")
                .with_domain("light")
                .with_service("turn_on")
                .with_service_data(data);
            let wire: Value = serde_json::from_str(&req.to_json().unwrap()).unwrap();
            prop_assert_eq!(&wire["service_data"], &serde_json::to_value(&entries).unwrap());
        }
    }
}
