use std::collections::BTreeMap;

use super::*;
use crate::city::FieldValue;

fn record(city_id: &str, fields: &[(&str, FieldValue)]) -> ClimateRecord {
    ClimateRecord {
        city_id: city_id.to_string(),
        city_label: format!("City {}", city_id),
        population: Some(120_000),
        country: Some("Nowhere".to_string()),
        latitude: Some(1.5),
        longitude: Some(-2.25),
        fields: fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn open() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    Store::new(&conn).init().unwrap();
    conn
}

#[test]
fn test_upsert_then_get() {
    let conn = open();
    let store = Store::new(&conn);
    let r = record("Q1", &[("Jan high C", FieldValue::Number(3.5))]);

    store.upsert(&r).unwrap();

    assert_eq!(store.get("Q1").unwrap(), Some(r));
    assert_eq!(store.get("Q2").unwrap(), None);
}

#[test]
fn test_upsert_is_idempotent() {
    let conn = open();
    let store = Store::new(&conn);
    let r = record("Q1", &[("location", FieldValue::Text("Airport".to_string()))]);

    store.upsert(&r).unwrap();
    let once = store.all().unwrap();
    store.upsert(&r).unwrap();

    assert_eq!(store.all().unwrap(), once);
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_upsert_replaces_document() {
    let conn = open();
    let store = Store::new(&conn);

    store
        .upsert(&record("Q1", &[("Jan sun", FieldValue::Number(100.0))]))
        .unwrap();
    let updated = record("Q1", &[("Feb sun", FieldValue::Number(90.0))]);
    store.upsert(&updated).unwrap();

    let stored = store.get("Q1").unwrap().unwrap();
    assert_eq!(stored, updated);
    assert!(!stored.fields.contains_key("Jan sun"));
}

#[test]
fn test_contains_and_count() {
    let conn = open();
    let store = Store::new(&conn);
    assert!(!store.contains("Q1").unwrap());
    assert_eq!(store.count().unwrap(), 0);

    store.upsert(&record("Q1", &[])).unwrap();
    store.upsert(&record("Q2", &[])).unwrap();

    assert!(store.contains("Q1").unwrap());
    assert_eq!(store.count().unwrap(), 2);
}

#[test]
fn test_all_is_ordered_by_id() {
    let conn = open();
    let store = Store::new(&conn);
    store.upsert(&record("Q90", &[])).unwrap();
    store.upsert(&record("Q1490", &[])).unwrap();

    let ids: Vec<String> = store.all().unwrap().into_iter().map(|r| r.city_id).collect();
    assert_eq!(ids, vec!["Q1490".to_string(), "Q90".to_string()]);
}

#[test]
fn test_init_is_repeatable() {
    let conn = open();
    let store = Store::new(&conn);
    store.upsert(&record("Q1", &[])).unwrap();
    store.init().unwrap();
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_missing_table_is_an_error() {
    let conn = Connection::open_in_memory().unwrap();
    let store = Store::new(&conn);
    assert!(matches!(store.count(), Err(StoreError::Sqlite(_))));
}
