use crate::db::DbPool;
use crate::models::{Document, Record};
use crate::schema::documents;
use anyhow::{Context, Result};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Writes a record, replacing any document with the same id
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `record` - The record to store
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The record cannot be serialized
/// - The database write fails
#[instrument(skip(pool, record), fields(collection = R::COLLECTION, id = record.record_id()))]
pub fn put<R: Record>(pool: &DbPool, record: &R) -> Result<()> {
    debug!("Upserting document");

    let conn = &mut pool.get()?;
    let doc = Document::from_record(record)
        .with_context(|| format!("Failed to serialize {} document", R::COLLECTION))?;

    diesel::replace_into(documents::table)
        .values(&doc)
        .execute(conn)
        .with_context(|| format!("Failed to write {} document", R::COLLECTION))?;

    Ok(())
}

/// Writes several records of one collection in a single transaction
///
/// Either every record is stored or none is.
///
/// ### Errors
///
/// Returns an error if any record cannot be serialized or written; in that
/// case nothing is persisted
#[instrument(skip(pool, records), fields(collection = R::COLLECTION, count = records.len()))]
pub fn put_all<R: Record>(pool: &DbPool, records: &[R]) -> Result<()> {
    let docs = records
        .iter()
        .map(Document::from_record)
        .collect::<serde_json::Result<Vec<_>>>()
        .with_context(|| format!("Failed to serialize {} documents", R::COLLECTION))?;

    write_batch(pool, &docs)
        .with_context(|| format!("Failed to write batch of {} documents", R::COLLECTION))?;

    info!("Stored {} documents", docs.len());
    Ok(())
}

/// Retrieves a record by id
///
/// ### Returns
///
/// A Result containing an Option with the record if found, or None if not found
///
/// ### Errors
///
/// Returns an error if the query fails or the stored body no longer matches
/// the record type
#[instrument(skip(pool), fields(collection = R::COLLECTION))]
pub fn get<R: Record>(pool: &DbPool, id: &str) -> Result<Option<R>> {
    let conn = &mut pool.get()?;

    let doc = documents::table
        .filter(documents::collection.eq(R::COLLECTION))
        .filter(documents::id.eq(id))
        .select(Document::as_select())
        .first(conn)
        .optional()
        .with_context(|| format!("Failed to get {} document", R::COLLECTION))?;

    match doc {
        Some(doc) => {
            debug!("Document found");
            Ok(Some(decode(doc)?))
        }
        None => {
            debug!("Document not found");
            Ok(None)
        }
    }
}

/// Lists every record of a collection whose owner key equals `owner`
///
/// Records come back in write order.
///
/// ### Errors
///
/// Returns an error if the query fails or a body cannot be decoded
#[instrument(skip(pool), fields(collection = R::COLLECTION))]
pub fn list_by_owner<R: Record>(pool: &DbPool, owner: &str) -> Result<Vec<R>> {
    let conn = &mut pool.get()?;

    let docs = documents::table
        .filter(documents::collection.eq(R::COLLECTION))
        .filter(documents::owner_id.eq(owner))
        .order(documents::updated_at.asc())
        .select(Document::as_select())
        .load(conn)
        .with_context(|| format!("Failed to list {} documents", R::COLLECTION))?;

    debug!("Retrieved {} documents", docs.len());
    docs.into_iter().map(decode).collect()
}

/// Lists every record of a collection
///
/// ### Errors
///
/// Returns an error if the query fails or a body cannot be decoded
#[instrument(skip(pool), fields(collection = R::COLLECTION))]
pub fn list_all<R: Record>(pool: &DbPool) -> Result<Vec<R>> {
    let conn = &mut pool.get()?;

    let docs = documents::table
        .filter(documents::collection.eq(R::COLLECTION))
        .order(documents::updated_at.asc())
        .select(Document::as_select())
        .load(conn)
        .with_context(|| format!("Failed to list {} documents", R::COLLECTION))?;

    debug!("Retrieved {} documents", docs.len());
    docs.into_iter().map(decode).collect()
}

/// Deletes a record by id
///
/// ### Returns
///
/// `true` if a document was removed, `false` if none existed
///
/// ### Errors
///
/// Returns an error if the delete fails
#[instrument(skip(pool), fields(collection = R::COLLECTION))]
pub fn delete<R: Record>(pool: &DbPool, id: &str) -> Result<bool> {
    let conn = &mut pool.get()?;

    let removed = diesel::delete(
        documents::table
            .filter(documents::collection.eq(R::COLLECTION))
            .filter(documents::id.eq(id)),
    )
    .execute(conn)
    .with_context(|| format!("Failed to delete {} document", R::COLLECTION))?;

    if removed > 0 {
        info!("Deleted document {}", id);
    }
    Ok(removed > 0)
}

/// Writes prepared documents, possibly of different collections, in one transaction
///
/// ### Errors
///
/// Returns an error if any write fails; in that case nothing is persisted
pub fn write_batch(pool: &DbPool, docs: &[Document]) -> Result<()> {
    let conn = &mut pool.get()?;
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        for doc in docs {
            diesel::replace_into(documents::table).values(doc).execute(conn)?;
        }
        Ok(())
    })?;
    Ok(())
}

fn decode<R: Record>(doc: Document) -> Result<R> {
    let id = doc.get_id().to_string();
    doc.into_record()
        .with_context(|| format!("Corrupt {} document {}", R::COLLECTION, id))
}

#[cfg(test)]
mod tests;
