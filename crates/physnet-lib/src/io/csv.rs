use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs;
use std::path::{Path, PathBuf};

/// Write a column mapping as `{dest}/{name}.csv`: one header row of
/// column names, then the columns zipped positionally. Columns of uneven
/// length truncate to the shortest, matching the historical exporter.
/// `dest` is created recursively; an existing file is overwritten.
pub fn save_columns_csv(
    columns: &[(&str, Vec<String>)],
    name: &str,
    dest: &Path,
) -> Result<PathBuf> {
    fs::create_dir_all(dest).with_context(|| format!("failed to create {}", dest.display()))?;
    let path = dest.join(format!("{name}.csv"));
    let mut writer = WriterBuilder::new()
        .from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(columns.iter().map(|(column, _)| *column))?;
    let rows = columns
        .iter()
        .map(|(_, values)| values.len())
        .min()
        .unwrap_or(0);
    for i in 0..rows {
        writer.write_record(columns.iter().map(|(_, values)| values[i].as_str()))?;
    }
    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_then_zipped_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let columns = vec![
            ("record", vec!["R03".to_string(), "R04".to_string()]),
            ("accion", vec!["1".to_string(), "1".to_string()]),
        ];
        let path = save_columns_csv(&columns, "tabla", tmp.path()).unwrap();
        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["record,accion", "R03,1", "R04,1"]);
    }

    #[test]
    fn uneven_columns_truncate_to_the_shortest() {
        let tmp = tempfile::tempdir().unwrap();
        let columns = vec![
            ("a", vec!["1".to_string(), "2".to_string(), "3".to_string()]),
            ("b", vec!["x".to_string()]),
        ];
        let path = save_columns_csv(&columns, "short", tmp.path()).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn rerun_overwrites_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        let first = vec![("a", vec!["1".to_string(), "2".to_string()])];
        save_columns_csv(&first, "t", tmp.path()).unwrap();
        let second = vec![("a", vec!["9".to_string()])];
        let path = save_columns_csv(&second, "t", tmp.path()).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["a", "9"]);
    }
}
