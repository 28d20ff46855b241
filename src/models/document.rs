use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::JsonValue;

/// An entity that lives in the document store
///
/// Every record names the collection it belongs to, its client-generated id,
/// and the key that collection is queried by (usually the owning user).
pub trait Record: Serialize + DeserializeOwned {
    /// Name of the collection holding records of this type
    const COLLECTION: &'static str;

    /// The record's unique id within its collection
    fn record_id(&self) -> &str;

    /// The equality-filter key used by `list_by_owner`
    fn owner_key(&self) -> &str;
}

/// A raw row of the `documents` table
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::documents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Document {
    /// Collection the document belongs to
    collection: String,

    /// Unique id within the collection
    id: String,

    /// Owner or partition key
    owner_id: String,

    /// The serialized record
    body: JsonValue,

    /// When the document was last written
    updated_at: NaiveDateTime,
}

impl Document {
    /// Serializes a record into a document row stamped with the current time
    ///
    /// ### Errors
    ///
    /// Returns an error if the record cannot be serialized to JSON
    pub fn from_record<R: Record>(record: &R) -> serde_json::Result<Self> {
        Ok(Self {
            collection: R::COLLECTION.to_string(),
            id: record.record_id().to_string(),
            owner_id: record.owner_key().to_string(),
            body: JsonValue(serde_json::to_value(record)?),
            updated_at: Utc::now().naive_utc(),
        })
    }

    /// Deserializes the body back into its record type
    ///
    /// ### Errors
    ///
    /// Returns an error if the stored body does not match the record's shape
    pub fn into_record<R: Record>(self) -> serde_json::Result<R> {
        serde_json::from_value(self.body.0)
    }

    pub fn get_collection(&self) -> &str {
        &self.collection
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.updated_at, Utc)
    }
}
