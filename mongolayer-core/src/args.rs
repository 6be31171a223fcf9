//! Shape checks for arguments of bulk operations.
//!
//! Bulk operations accept any [`Serialize`] value so callers can pass slices,
//! vectors or arrays of their own types. The value is encoded once and its
//! shape checked before anything reaches the driver.

use bson::{Bson, Document};
use serde::Serialize;

use crate::error::{MongoError, MongoResult};

pub const ERR_NOT_SEQUENCE: &str = "value is not a sequence";
pub const ERR_IS_NIL: &str = "value is nil";

/// Encodes `value` and requires it to be a sequence.
pub fn to_sequence<T>(value: &T) -> MongoResult<Vec<Bson>>
where
    T: Serialize + ?Sized,
{
    match bson::serialize_to_bson(value)? {
        Bson::Array(items) => Ok(items),
        Bson::Null | Bson::Undefined => Err(MongoError::InvalidArgument(ERR_IS_NIL.to_string())),
        _ => Err(MongoError::InvalidArgument(ERR_NOT_SEQUENCE.to_string())),
    }
}

/// Encodes `value` and requires it to be a sequence of documents.
pub fn to_documents<T>(value: &T) -> MongoResult<Vec<Document>>
where
    T: Serialize + ?Sized,
{
    to_sequence(value)?
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Bson::Document(doc) => Ok(doc),
            other => Err(MongoError::InvalidArgument(format!(
                "element {i} is not a document (found {:?})",
                other.element_type()
            ))),
        })
        .collect()
}

/// Encodes a single value as a document.
pub fn to_document<T>(value: &T) -> MongoResult<Document>
where
    T: Serialize + ?Sized,
{
    match bson::serialize_to_bson(value)? {
        Bson::Document(doc) => Ok(doc),
        Bson::Null | Bson::Undefined => Err(MongoError::InvalidArgument(ERR_IS_NIL.to_string())),
        other => Err(MongoError::InvalidArgument(format!(
            "value is not a document (found {:?})",
            other.element_type()
        ))),
    }
}

/// Encodes two sequences that must pair up element by element.
pub fn to_pairs<I, D>(ids: &I, docs: &D) -> MongoResult<Vec<(Bson, Document)>>
where
    I: Serialize + ?Sized,
    D: Serialize + ?Sized,
{
    let ids = to_sequence(ids)?;
    let docs = to_documents(docs)?;

    if ids.len() != docs.len() {
        return Err(MongoError::InvalidArgument(format!(
            "{} ids given for {} documents",
            ids.len(),
            docs.len()
        )));
    }

    Ok(ids.into_iter().zip(docs).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Data {
        #[serde(rename = "_id")]
        id: String,
        data: i32,
    }

    fn data(id: &str, data: i32) -> Data {
        Data { id: id.to_string(), data }
    }

    #[test]
    fn test_sequences_of_structs_become_documents() {
        let docs = to_documents(&vec![data("a", 1), data("b", 2)]).unwrap();

        assert_eq!(docs, vec![doc! { "_id": "a", "data": 1 }, doc! { "_id": "b", "data": 2 }]);
    }

    #[test]
    fn test_slices_and_arrays_are_sequences() {
        let items = [data("a", 1)];
        assert_eq!(to_documents(&items[..]).unwrap().len(), 1);
        assert_eq!(to_sequence(&["x", "y", "z"]).unwrap().len(), 3);
    }

    #[test]
    fn test_non_sequence_is_rejected() {
        let err = to_documents(&data("a", 1)).unwrap_err();
        assert!(matches!(err, MongoError::InvalidArgument(ref m) if m == ERR_NOT_SEQUENCE));

        let err = to_sequence("ids").unwrap_err();
        assert!(matches!(err, MongoError::InvalidArgument(ref m) if m == ERR_NOT_SEQUENCE));
    }

    #[test]
    fn test_nil_is_rejected() {
        let missing: Option<Vec<Data>> = None;
        let err = to_documents(&missing).unwrap_err();
        assert!(matches!(err, MongoError::InvalidArgument(ref m) if m == ERR_IS_NIL));
    }

    #[test]
    fn test_non_document_elements_are_rejected() {
        let err = to_documents(&vec![1, 2, 3]).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_to_document() {
        assert_eq!(to_document(&data("a", 1)).unwrap(), doc! { "_id": "a", "data": 1 });
        assert!(to_document(&42).unwrap_err().is_invalid_argument());
        assert!(to_document(&Option::<Data>::None).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_pairs_require_equal_lengths() {
        let pairs = to_pairs(&["a", "b"], &vec![doc! { "x": 1 }, doc! { "x": 2 }]).unwrap();
        assert_eq!(pairs[1], (Bson::String("b".into()), doc! { "x": 2 }));

        let err = to_pairs(&["a"], &vec![doc! { "x": 1 }, doc! { "x": 2 }]).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
