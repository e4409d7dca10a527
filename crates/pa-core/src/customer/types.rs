//! Customer record type

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// A customer record from the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Primary key. Exported documents may spell it `_id`.
    #[serde(alias = "_id")]
    pub id: String,
    pub phone_number: String,
    /// Free-form profile fields, kept as-is
    #[serde(default)]
    pub profile: Map<String, Value>,
}

impl Customer {
    pub fn new(id: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phone_number: phone_number.into(),
            profile: Map::new(),
        }
    }

    /// Set a profile field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.profile.insert(key.into(), value.into());
        self
    }

    /// Build a customer from an exported document.
    ///
    /// The id may be `_id` or `id`, as a string, a number or a Mongo
    /// extended-JSON `{"$oid": "..."}`. Fields other than the id,
    /// `phone_number` and `profile` are merged into the profile; a key
    /// already present in `profile` wins.
    pub fn from_document(document: Value) -> Result<Self> {
        let Value::Object(mut fields) = document else {
            return Err(Error::InvalidRecord("record is not a JSON object".to_string()));
        };

        let mongo_id = fields.remove("_id");
        let plain_id = fields.remove("id");
        let id = match mongo_id.or(plain_id) {
            Some(Value::String(id)) => id,
            Some(Value::Number(id)) => id.to_string(),
            Some(Value::Object(oid)) => match oid.get("$oid") {
                Some(Value::String(id)) => id.clone(),
                _ => return Err(Error::InvalidRecord(format!("unsupported id {:?}", oid))),
            },
            Some(other) => return Err(Error::InvalidRecord(format!("unsupported id {}", other))),
            None => return Err(Error::InvalidRecord("record has no id".to_string())),
        };

        let phone_number = match fields.remove("phone_number") {
            Some(Value::String(number)) => number,
            _ => {
                return Err(Error::InvalidRecord(format!(
                    "customer {} has no phone_number string",
                    id
                )));
            }
        };

        let mut profile = match fields.remove("profile") {
            Some(Value::Object(profile)) => profile,
            None | Some(Value::Null) => Map::new(),
            Some(_) => {
                return Err(Error::InvalidRecord(format!(
                    "customer {} has a non-object profile",
                    id
                )));
            }
        };
        for (key, value) in fields {
            profile.entry(key).or_insert(value);
        }

        Ok(Self {
            id,
            phone_number,
            profile,
        })
    }
}
