use anyhow::{Context, Result, ensure};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::{city::ClimateRecord, store::Store};

pub fn run(db: &Path, output: &Path) -> Result<()> {
    ensure!(db.exists(), "no database at {:?}", db);

    let conn = rusqlite::Connection::open(db)
        .with_context(|| format!("could not open database at {:?}", db))?;
    let records = Store::new(&conn)
        .all()
        .context("could not read stored cities")?;

    write_json(&records, output)?;

    println!(
        "Successfully exported {} cities to `{}`",
        records.len(),
        output.to_string_lossy()
    );

    Ok(())
}

/// Writes the documents as one JSON array. Only the documents themselves are
/// written, never the table's own keys.
pub fn write_json(records: &[ClimateRecord], output: &Path) -> Result<()> {
    let file =
        File::create(output).with_context(|| format!("could not create {:?}", output))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)
        .context("could not serialize cities to JSON")?;
    writer
        .flush()
        .with_context(|| format!("could not write to {:?}", output))?;

    Ok(())
}
