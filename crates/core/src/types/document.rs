//! Documents, field maps and the traits tying records to collections.
//!
//! Every record managed by the dashboard lives in a named collection of the
//! document database and is addressed by an identifier assigned on creation.
//! Records travel as [`Fields`]: a JSON object without the identifier. The
//! identifier is carried next to the fields in a [`Document`].
//!
//! Defaults for missing or partial documents are resolved while decoding
//! (via `#[serde(default)]` on the record types), never at call sites.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

/// Field map of a single document (identifier excluded).
pub type Fields = Map<String, Value>;

/// A stored document: its identifier plus its fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Identifier assigned by the store.
    pub id: String,
    /// Document fields.
    pub fields: Fields,
}

impl Document {
    /// Create a document from an identifier and fields.
    #[must_use]
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Errors converting between records and field maps.
#[derive(Debug, Error)]
pub enum FieldsError {
    /// The value could not be serialized.
    #[error("failed to encode {entity}: {source}")]
    Encode {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The value serialized to something other than a JSON object.
    #[error("{entity} did not encode to a field map")]
    NotAnObject { entity: &'static str },

    /// A document could not be decoded into a record.
    #[error("failed to decode {entity} {id}: {source}")]
    Decode {
        entity: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Serialize a value into a field map.
///
/// # Errors
///
/// Returns `FieldsError` if serialization fails or does not produce an object.
pub fn encode_fields<T: Serialize>(entity: &'static str, value: &T) -> Result<Fields, FieldsError> {
    match serde_json::to_value(value).map_err(|source| FieldsError::Encode { entity, source })? {
        Value::Object(map) => Ok(map),
        _ => Err(FieldsError::NotAnObject { entity }),
    }
}

/// Overlay `patch` onto `base`, field by field.
///
/// Top-level keys present in the patch replace the base value (including
/// explicit `null`s); keys absent from the patch are left untouched. This is
/// the same merge the document database applies for an update mask.
pub fn merge_fields(base: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        base.insert(key, value);
    }
}

/// A record stored in a document collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name in the document database.
    const COLLECTION: &'static str;
    /// Singular human-readable name ("product").
    const LABEL: &'static str;
    /// Plural human-readable name ("products").
    const PLURAL: &'static str;

    /// Document identifier.
    fn id(&self) -> &str;

    /// Attach the identifier assigned by the store.
    fn set_id(&mut self, id: String);

    /// Encode the record's fields (identifier excluded).
    ///
    /// # Errors
    ///
    /// Returns `FieldsError` if the record cannot be serialized.
    fn to_fields(&self) -> Result<Fields, FieldsError> {
        encode_fields(Self::LABEL, self)
    }

    /// Decode a stored document, resolving defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns `FieldsError::Decode` if a present field has the wrong shape.
    fn from_document(document: Document) -> Result<Self, FieldsError> {
        let Document { id, fields } = document;
        let mut entity: Self =
            serde_json::from_value(Value::Object(fields)).map_err(|source| {
                FieldsError::Decode {
                    entity: Self::LABEL,
                    id: id.clone(),
                    source,
                }
            })?;
        entity.set_id(id);
        Ok(entity)
    }

    /// Return a copy of this record with `patch` merged over its fields.
    ///
    /// The identifier is preserved.
    ///
    /// # Errors
    ///
    /// Returns `FieldsError` if the merged fields no longer decode.
    fn merged(&self, patch: Fields) -> Result<Self, FieldsError> {
        let mut fields = self.to_fields()?;
        merge_fields(&mut fields, patch);
        Self::from_document(Document::new(self.id(), fields))
    }
}

/// A record that can be created and partially updated from the dashboard.
pub trait Editable: Entity {
    /// The record's fields without an identifier (create input).
    type Draft: Serialize + Send + Sync + 'static;
    /// A partial set of fields; absent fields are not submitted (update input).
    type Patch: Serialize + Send + Sync + 'static;

    /// Encode a draft for submission.
    ///
    /// # Errors
    ///
    /// Returns `FieldsError` if the draft cannot be serialized.
    fn draft_fields(draft: &Self::Draft) -> Result<Fields, FieldsError> {
        encode_fields(Self::LABEL, draft)
    }

    /// Encode a patch for submission.
    ///
    /// # Errors
    ///
    /// Returns `FieldsError` if the patch cannot be serialized.
    fn patch_fields(patch: &Self::Patch) -> Result<Fields, FieldsError> {
        encode_fields(Self::LABEL, patch)
    }
}
