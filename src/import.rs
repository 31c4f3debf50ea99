use anyhow::{Context, Result};
use std::{fs::File, io::BufReader, path::Path};

use crate::{city::ClimateRecord, store::Store};

/// Loads an exported JSON array into `db`, replacing documents with the same
/// city id.
pub fn run(source: &Path, db: &Path) -> Result<()> {
    let records = read_json(source)?;

    let mut conn = rusqlite::Connection::open(db)
        .with_context(|| format!("could not open database at {:?}", db))?;
    let tx = conn.transaction()?;
    {
        let store = Store::new(&tx);
        store.init().context("could not create cities table")?;
        for record in &records {
            store
                .upsert(record)
                .with_context(|| format!("could not store {}", record.city_id))?;
        }
    }
    tx.commit()?;

    println!(
        "Successfully imported {} cities into `{}`",
        records.len(),
        db.to_string_lossy()
    );

    Ok(())
}

pub fn read_json(source: &Path) -> Result<Vec<ClimateRecord>> {
    let file = File::open(source).with_context(|| format!("could not open {:?}", source))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {:?}", source))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::city::FieldValue;
    use crate::export;

    fn record(city_id: &str, fields: &[(&str, FieldValue)]) -> ClimateRecord {
        ClimateRecord {
            city_id: city_id.to_string(),
            city_label: city_id.to_lowercase(),
            population: Some(10_000),
            country: None,
            latitude: Some(48.5),
            longitude: Some(2.25),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    fn fields_by_city(records: &[ClimateRecord]) -> BTreeMap<String, BTreeMap<String, FieldValue>> {
        records
            .iter()
            .map(|r| (r.city_id.clone(), r.fields.clone()))
            .collect()
    }

    #[test]
    fn test_export_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let source_db = dir.path().join("source.db");
        let json = dir.path().join("cities.json");
        let target_db = dir.path().join("target.db");

        let originals = vec![
            record(
                "Q90",
                &[
                    ("Jan high C", FieldValue::Number(7.5)),
                    ("year high C", FieldValue::Number(16.25)),
                    ("location", FieldValue::Text("Paris (Montsouris)".to_string())),
                    ("single line", FieldValue::Text("Y".to_string())),
                ],
            ),
            record("Q64", &[]),
        ];
        {
            let conn = rusqlite::Connection::open(&source_db).unwrap();
            let store = Store::new(&conn);
            store.init().unwrap();
            for r in &originals {
                store.upsert(r).unwrap();
            }
        }

        export::run(&source_db, &json).unwrap();
        run(&json, &target_db).unwrap();

        let conn = rusqlite::Connection::open(&target_db).unwrap();
        let imported = Store::new(&conn).all().unwrap();
        assert_eq!(fields_by_city(&imported), fields_by_city(&originals));
    }

    #[test]
    fn test_export_is_a_plain_array_of_documents() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("cities.json");

        export::write_json(&[record("Q1", &[("Jan sun", FieldValue::Number(80.0))])], &json)
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_reader(File::open(&json).unwrap()).unwrap();
        let documents = value.as_array().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["city_id"], "Q1");
        assert_eq!(documents[0]["fields"]["Jan sun"], 80.0);
        assert!(documents[0].get("rowid").is_none());
    }

    #[test]
    fn test_export_requires_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let result = export::run(&dir.path().join("missing.db"), &dir.path().join("out.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_import_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("broken.json");
        std::fs::write(&json, r#"[{"city_label": "no id"}]"#).unwrap();

        assert!(run(&json, &dir.path().join("target.db")).is_err());
    }
}
