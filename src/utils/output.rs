// cloudsql-restore-resource/src/utils/output.rs
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

/// Pretty-prints `value` as the single document on `writer`.
pub fn write_document<T: Serialize, W: Write>(writer: &mut W, value: &T) -> Result<()> {
    let encoded = serde_json::to_string_pretty(value).context("Failed to encode output document")?;
    writeln!(writer, "{}", encoded).context("Failed to write output document")?;
    writer.flush().context("Failed to flush output document")?;
    Ok(())
}

pub fn emit<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write_document(&mut handle, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Version;

    #[test]
    fn test_check_document_is_indented_array() -> anyhow::Result<()> {
        let mut buf = Vec::new();
        write_document(&mut buf, &vec![Version::new("r1"), Version::new("r2")])?;
        assert_eq!(
            String::from_utf8(buf)?,
            "[\n  {\n    \"operation_id\": \"r1\"\n  },\n  {\n    \"operation_id\": \"r2\"\n  }\n]\n"
        );
        Ok(())
    }

    #[test]
    fn test_empty_check_document() -> anyhow::Result<()> {
        let mut buf = Vec::new();
        write_document(&mut buf, &Vec::<Version>::new())?;
        assert_eq!(String::from_utf8(buf)?, "[]\n");
        Ok(())
    }
}
