//! Google Cloud Datastore (v1 REST) backend.
//!
//! Properties are mapped onto typed Datastore values so records stay
//! readable in the console. Conditional writes run inside a transaction and
//! report a commit conflict as "not written".

use super::{same_properties, Entity, EntityKey, KeyValueStore, StoreError};
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const DEFAULT_DATASTORE_API_BASE: &str = "https://datastore.googleapis.com/v1";

#[derive(Debug, Clone)]
pub struct DatastoreStore {
    api_base: String,
    project_id: String,
    namespace: String,
    access_token: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    found: Vec<EntityResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct EntityResult {
    entity: RestEntity,
}

#[derive(Debug, Clone, Deserialize)]
struct RestEntity {
    #[serde(default)]
    properties: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct BeginTransactionResponse {
    transaction: String,
}

enum CommitOutcome {
    Committed,
    Conflict,
}

impl DatastoreStore {
    pub fn new(
        api_base: impl Into<String>,
        project_id: impl Into<String>,
        namespace: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            project_id: project_id.into(),
            namespace: namespace.into(),
            access_token: access_token.into(),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/projects/{}:{}",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.project_id),
            method
        )
    }

    fn rest_key(&self, key: &EntityKey) -> Value {
        json!({
            "partitionId": {
                "projectId": self.project_id,
                "namespaceId": self.namespace,
            },
            "path": [{ "kind": key.kind, "name": key.name }],
        })
    }

    fn rest_entity(&self, entity: &Entity) -> Value {
        let properties: Map<String, Value> = entity
            .properties
            .iter()
            .map(|(name, value)| (name.clone(), encode_value(value, true)))
            .collect();
        json!({
            "key": self.rest_key(&entity.key),
            "properties": properties,
        })
    }

    fn post(&self, method: &str, body: &Value) -> Result<ureq::Response, ureq::Error> {
        ureq::post(&self.endpoint(method))
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .send_json(body.clone())
    }

    fn call<T: for<'de> Deserialize<'de>>(&self, method: &str, body: &Value) -> Result<T, StoreError> {
        let response = self.post(method, body).map_err(request_error)?;
        response
            .into_json::<T>()
            .map_err(|e| StoreError::Request(e.to_string()))
    }

    fn lookup(&self, key: &EntityKey, transaction: Option<&str>) -> Result<Option<Entity>, StoreError> {
        let mut body = json!({ "keys": [self.rest_key(key)] });
        if let Some(transaction) = transaction {
            body["readOptions"] = json!({ "transaction": transaction });
        }
        let response: LookupResponse = self.call("lookup", &body)?;
        let Some(found) = response.found.into_iter().next() else {
            return Ok(None);
        };
        let mut properties = Map::new();
        for (name, value) in found.entity.properties {
            properties.insert(name, decode_value(&value)?);
        }
        Ok(Some(Entity::with_properties(key.clone(), properties)))
    }

    fn commit(&self, mutation: Value, transaction: Option<&str>) -> Result<CommitOutcome, StoreError> {
        let body = match transaction {
            Some(transaction) => json!({
                "mode": "TRANSACTIONAL",
                "transaction": transaction,
                "mutations": [mutation],
            }),
            None => json!({
                "mode": "NON_TRANSACTIONAL",
                "mutations": [mutation],
            }),
        };
        match self.post("commit", &body) {
            Ok(_) => Ok(CommitOutcome::Committed),
            Err(ureq::Error::Status(409, _)) if transaction.is_some() => Ok(CommitOutcome::Conflict),
            Err(err) => Err(request_error(err)),
        }
    }

    fn rollback(&self, transaction: &str) -> Result<(), StoreError> {
        self.post("rollback", &json!({ "transaction": transaction }))
            .map(|_| ())
            .map_err(request_error)
    }
}

impl KeyValueStore for DatastoreStore {
    fn get(&self, key: &EntityKey) -> Result<Option<Entity>, StoreError> {
        self.lookup(key, None)
    }

    fn put(&self, entity: &Entity) -> Result<(), StoreError> {
        self.commit(json!({ "upsert": self.rest_entity(entity) }), None)
            .map(|_| ())
    }

    fn delete(&self, key: &EntityKey) -> Result<(), StoreError> {
        self.commit(json!({ "delete": self.rest_key(key) }), None)
            .map(|_| ())
    }

    fn put_if_unchanged(
        &self,
        expected: Option<&Entity>,
        entity: &Entity,
    ) -> Result<bool, StoreError> {
        let begin: BeginTransactionResponse = self.call("beginTransaction", &json!({}))?;
        let transaction = begin.transaction;
        let current = match self.lookup(&entity.key, Some(&transaction)) {
            Ok(current) => current,
            Err(err) => {
                // The lookup error is the one worth reporting.
                let _ = self.rollback(&transaction);
                return Err(err);
            }
        };
        if !same_properties(current.as_ref().map(|e| &e.properties), expected) {
            self.rollback(&transaction)?;
            return Ok(false);
        }
        let outcome = self.commit(
            json!({ "upsert": self.rest_entity(entity) }),
            Some(&transaction),
        )?;
        Ok(matches!(outcome, CommitOutcome::Committed))
    }
}

fn request_error(err: ureq::Error) -> StoreError {
    match err {
        ureq::Error::Status(status, response) => StoreError::Response {
            status,
            message: response
                .into_string()
                .unwrap_or_else(|_| "unreadable response body".to_string()),
        },
        other => StoreError::Request(other.to_string()),
    }
}

/// Maps a JSON value onto a Datastore `Value`. Array values cannot carry
/// `excludeFromIndexes` themselves, so the flag moves to their elements.
pub fn encode_value(value: &Value, exclude_from_indexes: bool) -> Value {
    let mut encoded = match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(v) => json!({ "booleanValue": v }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items
                .iter()
                .map(|item| encode_value(item, exclude_from_indexes))
                .collect();
            return json!({ "arrayValue": { "values": values } });
        }
        Value::Object(fields) => {
            let properties: Map<String, Value> = fields
                .iter()
                .map(|(name, v)| (name.clone(), encode_value(v, exclude_from_indexes)))
                .collect();
            json!({ "entityValue": { "properties": properties } })
        }
    };
    if exclude_from_indexes {
        encoded["excludeFromIndexes"] = json!(true);
    }
    encoded
}

pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let Some(fields) = value.as_object() else {
        return Err(StoreError::MalformedEntity(format!(
            "property value must be an object, got {value}"
        )));
    };
    if fields.contains_key("nullValue") {
        return Ok(Value::Null);
    }
    if let Some(v) = fields.get("booleanValue") {
        return Ok(Value::Bool(v.as_bool().unwrap_or_default()));
    }
    if let Some(v) = fields.get("integerValue") {
        let parsed = match v {
            Value::String(raw) => raw.parse::<i64>().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        };
        return parsed
            .map(Value::from)
            .ok_or_else(|| StoreError::MalformedEntity(format!("invalid integerValue {v}")));
    }
    if let Some(v) = fields.get("doubleValue") {
        return Ok(v.clone());
    }
    if let Some(v) = fields
        .get("stringValue")
        .or_else(|| fields.get("timestampValue"))
    {
        return Ok(v.clone());
    }
    if let Some(v) = fields.get("arrayValue") {
        let values = v
            .get("values")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
            .transpose()?
            .unwrap_or_default();
        return Ok(Value::Array(values));
    }
    if let Some(v) = fields.get("entityValue") {
        let mut properties = Map::new();
        if let Some(raw) = v.get("properties").and_then(Value::as_object) {
            for (name, value) in raw {
                properties.insert(name.clone(), decode_value(value)?);
            }
        }
        return Ok(Value::Object(properties));
    }
    Err(StoreError::MalformedEntity(format!(
        "unsupported property value {value}"
    )))
}
