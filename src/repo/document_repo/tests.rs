use super::*;
use crate::repo::tests::setup_test_db;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Note {
    id: String,
    owner: String,
    text: String,
}

impl Record for Note {
    const COLLECTION: &'static str = "notes";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner_key(&self) -> &str {
        &self.owner
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Memo {
    id: String,
    owner: String,
}

impl Record for Memo {
    const COLLECTION: &'static str = "memos";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn owner_key(&self) -> &str {
        &self.owner
    }
}

fn note(id: &str, owner: &str, text: &str) -> Note {
    Note { id: id.to_string(), owner: owner.to_string(), text: text.to_string() }
}

#[test]
fn test_put_then_get() {
    let pool = setup_test_db();
    put(&pool, &note("n1", "u1", "hello")).unwrap();

    let fetched: Note = get(&pool, "n1").unwrap().unwrap();
    assert_eq!(fetched, note("n1", "u1", "hello"));
}

#[test]
fn test_get_missing_is_none() {
    let pool = setup_test_db();
    assert!(get::<Note>(&pool, "missing").unwrap().is_none());
}

#[test]
fn test_put_replaces_whole_document() {
    let pool = setup_test_db();
    put(&pool, &note("n1", "u1", "first")).unwrap();
    put(&pool, &note("n1", "u1", "second")).unwrap();

    let all: Vec<Note> = list_all(&pool).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].text, "second");
}

#[test]
fn test_collections_are_isolated() {
    let pool = setup_test_db();
    put(&pool, &note("shared-id", "u1", "note")).unwrap();
    put(&pool, &Memo { id: "shared-id".to_string(), owner: "u1".to_string() }).unwrap();

    assert_eq!(list_all::<Note>(&pool).unwrap().len(), 1);
    assert_eq!(list_all::<Memo>(&pool).unwrap().len(), 1);

    assert!(delete::<Memo>(&pool, "shared-id").unwrap());
    assert!(get::<Note>(&pool, "shared-id").unwrap().is_some());
}

#[test]
fn test_list_by_owner_filters_on_equality() {
    let pool = setup_test_db();
    put(&pool, &note("a", "u1", "x")).unwrap();
    put(&pool, &note("b", "u2", "y")).unwrap();
    put(&pool, &note("c", "u1", "z")).unwrap();

    let mine: Vec<Note> = list_by_owner(&pool, "u1").unwrap();
    let mut ids: Vec<_> = mine.iter().map(|n| n.id.clone()).collect();
    ids.sort();
    assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
    assert!(list_by_owner::<Note>(&pool, "nobody").unwrap().is_empty());
}

#[test]
fn test_delete_reports_existence() {
    let pool = setup_test_db();
    put(&pool, &note("n1", "u1", "x")).unwrap();

    assert!(delete::<Note>(&pool, "n1").unwrap());
    assert!(!delete::<Note>(&pool, "n1").unwrap());
}

#[test]
fn test_put_all_stores_every_record() {
    let pool = setup_test_db();
    let notes = vec![note("a", "u1", "1"), note("b", "u1", "2"), note("c", "u1", "3")];
    put_all(&pool, &notes).unwrap();

    assert_eq!(list_by_owner::<Note>(&pool, "u1").unwrap().len(), 3);
}

#[test]
fn test_corrupt_body_is_an_error() {
    let pool = setup_test_db();
    put(&pool, &Memo { id: "m1".to_string(), owner: "u1".to_string() }).unwrap();

    // Re-tag the memo row as a note; its body lacks `text`
    {
        let conn = &mut pool.get().unwrap();
        diesel::update(documents::table.filter(documents::id.eq("m1")))
            .set(documents::collection.eq("notes"))
            .execute(conn)
            .unwrap();
    }

    let err = get::<Note>(&pool, "m1").unwrap_err();
    assert!(err.to_string().contains("Corrupt notes document m1"));
}
