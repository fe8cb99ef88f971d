use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;

use crate::models::{BatchRow, JoinedRow};

/// Reads `student_id,course_name,score,exam_date` rows. Fields are read as
/// text and short records leave the missing fields empty, so bad rows reach
/// the validator instead of failing the file.
pub fn read_batch<R: Read>(reader: R) -> anyhow::Result<Vec<BatchRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, result) in reader.deserialize::<BatchRow>().enumerate() {
        let row = result.with_context(|| format!("malformed CSV record {}", index + 1))?;
        rows.push(row);
    }

    Ok(rows)
}

pub fn read_batch_file(path: &Path) -> anyhow::Result<Vec<BatchRow>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_batch(file)
}

pub fn write_rows<W: Write>(writer: W, rows: &[JoinedRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_rows_file(path: &Path, rows: &[JoinedRow]) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_rows(file, rows)
}
