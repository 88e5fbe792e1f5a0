use std::io::Error;
use tempfile::NamedTempFile;

pub const HEADER: [&str; 5] = ["action", "card_number", "expiry", "cvc", "message"];

/// Writes a replay script with the standard header. Rows may be shorter than
/// the header; missing trailing columns are padded.
pub fn write_script(rows: &[&[&str]]) -> Result<NamedTempFile, Error> {
    let file = NamedTempFile::new()?;
    let mut wtr = csv::WriterBuilder::new().from_path(file.path())?;

    wtr.write_record(HEADER)?;
    for row in rows {
        let mut record: Vec<&str> = row.to_vec();
        record.resize(HEADER.len(), "");
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(file)
}

#[allow(dead_code)]
pub fn valid_card() -> [&'static str; 4] {
    ["input", "4242424242424242", "12/99", "123"]
}
