//! Minimal MAT level 5 writer: one double-precision variable per file,
//! which is all the exporter needs. Layout per the MAT-File Format
//! reference (header, then a single miMATRIX element).

use anyhow::{Context, Result};
use nalgebra::DMatrix;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

const MI_INT8: u32 = 1;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MX_DOUBLE_CLASS: u32 = 6;

/// Write every `(name, matrix)` pair as `{dest}/{name}.mat`, the matrix
/// stored under `name` inside the file. `dest` is created recursively if
/// missing; existing files are overwritten silently.
pub fn save_arrays<'a, I>(arrays: I, dest: &Path) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a DMatrix<f64>)>,
{
    fs::create_dir_all(dest).with_context(|| format!("failed to create {}", dest.display()))?;
    for (name, matrix) in arrays {
        let path = dest.join(format!("{name}.mat"));
        let file =
            File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        write_mat5(&mut writer, name, matrix)?;
        writer.flush()?;
    }
    Ok(())
}

/// Serialize one matrix as a complete MAT 5 stream.
pub fn write_mat5<W: Write>(writer: &mut W, name: &str, matrix: &DMatrix<f64>) -> Result<()> {
    let mut header = [b' '; 128];
    let text = format!(
        "MATLAB 5.0 MAT-file, created by physnet {}",
        env!("CARGO_PKG_VERSION")
    );
    let n = text.len().min(116);
    header[..n].copy_from_slice(&text.as_bytes()[..n]);
    header[116..124].fill(0); // no subsystem data
    header[124..126].copy_from_slice(&0x0100u16.to_le_bytes());
    header[126] = b'I';
    header[127] = b'M';
    writer.write_all(&header)?;

    let name_bytes = name.as_bytes();
    let name_padded = name_bytes.len().div_ceil(8) * 8;
    let data_bytes = matrix.len() * 8;
    let total = 16 + 16 + 8 + name_padded + 8 + data_bytes;

    tag(writer, MI_MATRIX, total as u32)?;

    // array flags
    tag(writer, MI_UINT32, 8)?;
    writer.write_all(&MX_DOUBLE_CLASS.to_le_bytes())?;
    writer.write_all(&0u32.to_le_bytes())?;

    // dimensions
    tag(writer, MI_INT32, 8)?;
    writer.write_all(&(matrix.nrows() as i32).to_le_bytes())?;
    writer.write_all(&(matrix.ncols() as i32).to_le_bytes())?;

    // variable name, padded to the 8-byte boundary
    tag(writer, MI_INT8, name_bytes.len() as u32)?;
    writer.write_all(name_bytes)?;
    for _ in name_bytes.len()..name_padded {
        writer.write_all(&[0u8])?;
    }

    // real part, column-major like the in-memory layout
    tag(writer, MI_DOUBLE, data_bytes as u32)?;
    for value in matrix.as_slice() {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

fn tag<W: Write>(writer: &mut W, data_type: u32, size: u32) -> Result<()> {
    writer.write_all(&data_type.to_le_bytes())?;
    writer.write_all(&size.to_le_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DMatrix<f64> {
        DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn stream_has_the_mat5_layout() {
        let mut buf = Vec::new();
        write_mat5(&mut buf, "x", &sample()).unwrap();

        assert!(buf.starts_with(b"MATLAB 5.0"));
        assert_eq!(&buf[124..128], &[0x00, 0x01, b'I', b'M']);
        // outer element: miMATRIX, then the declared size matches the tail
        assert_eq!(u32_at(&buf, 128), MI_MATRIX);
        assert_eq!(u32_at(&buf, 132) as usize, buf.len() - 136);
        // dimensions subelement
        assert_eq!(u32_at(&buf, 152), MI_INT32);
        assert_eq!(u32_at(&buf, 160), 2);
        assert_eq!(u32_at(&buf, 164), 3);
        // first data value, column-major: (0,0) = 1.0
        let data_start = buf.len() - 6 * 8;
        let first = f64::from_le_bytes(buf[data_start..data_start + 8].try_into().unwrap());
        assert_eq!(first, 1.0);
        // second value is (1,0) = 4.0
        let second = f64::from_le_bytes(buf[data_start + 8..data_start + 16].try_into().unwrap());
        assert_eq!(second, 4.0);
    }

    #[test]
    fn save_creates_and_overwrites_named_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out/mats");
        let a = sample();
        let b = sample();
        save_arrays([("x", &a), ("y", &b)], &dest).unwrap();
        assert!(dest.join("x.mat").exists());
        assert!(dest.join("y.mat").exists());
        // second run with the same names must not fail
        save_arrays([("x", &a), ("y", &b)], &dest).unwrap();
        let names: Vec<_> = fs::read_dir(&dest).unwrap().collect();
        assert_eq!(names.len(), 2);
    }
}
