//! Minimal NumPy `.npy` reader and writer for two-column `u64` arrays.
//!
//! Only the layout used for action-label arrays is supported: format version
//! 1.0 (2.0 on read), little-endian 8-byte integers, C order, shape `(n, 2)`.

use crate::error::LabelError;
use std::io::{Read, Write};

const MAGIC: &[u8] = b"\x93NUMPY";
const HEADER_ALIGN: usize = 64;

/// Write rows as a version 1.0 `.npy` stream.
pub(crate) fn write_pairs<W: Write>(mut writer: W, rows: &[[u64; 2]]) -> Result<(), LabelError> {
    let dict = format!(
        "{{'descr': '<u8', 'fortran_order': False, 'shape': ({}, 2), }}",
        rows.len()
    );
    // magic + version + u16 length + dict + padding + newline
    let unpadded = MAGIC.len() + 2 + 2 + dict.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    let header_len = dict.len() + padding + 1;
    let header_len = u16::try_from(header_len)
        .map_err(|_| LabelError::Format("npy header too long".to_string()))?;

    writer.write_all(MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_all(&header_len.to_le_bytes())?;
    writer.write_all(dict.as_bytes())?;
    writer.write_all(&vec![b' '; padding])?;
    writer.write_all(b"\n")?;

    for row in rows {
        writer.write_all(&row[0].to_le_bytes())?;
        writer.write_all(&row[1].to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a `.npy` stream holding an `(n, 2)` integer array.
///
/// Signed 8-byte arrays are accepted as long as no value is negative.
pub(crate) fn read_pairs<R: Read>(mut reader: R) -> Result<Vec<[u64; 2]>, LabelError> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(LabelError::Format("not an npy file".to_string()));
    }

    let mut version = [0u8; 2];
    reader.read_exact(&mut version)?;
    let header_len = match version[0] {
        1 => {
            let mut len = [0u8; 2];
            reader.read_exact(&mut len)?;
            u16::from_le_bytes(len) as usize
        }
        2 => {
            let mut len = [0u8; 4];
            reader.read_exact(&mut len)?;
            u32::from_le_bytes(len) as usize
        }
        v => return Err(LabelError::Format(format!("unsupported npy version {v}"))),
    };

    let mut header = vec![0u8; header_len];
    reader.read_exact(&mut header)?;
    let header = String::from_utf8(header)
        .map_err(|_| LabelError::Format("npy header is not valid text".to_string()))?;

    let signed = match dict_value(&header, "descr") {
        Some("'<u8'") => false,
        Some("'<i8'") => true,
        other => {
            return Err(LabelError::Format(format!(
                "expected 8-byte little-endian integers, found {other:?}"
            )))
        }
    };
    if dict_value(&header, "fortran_order") != Some("False") {
        return Err(LabelError::Format("fortran-ordered arrays are not supported".to_string()));
    }
    let rows = parse_shape(&header)?;

    let mut data = Vec::with_capacity(rows);
    let mut cell = [0u8; 8];
    for _ in 0..rows {
        let mut row = [0u64; 2];
        for value in row.iter_mut() {
            reader.read_exact(&mut cell)?;
            *value = if signed {
                let v = i64::from_le_bytes(cell);
                u64::try_from(v)
                    .map_err(|_| LabelError::Format(format!("negative label value {v}")))?
            } else {
                u64::from_le_bytes(cell)
            };
        }
        data.push(row);
    }
    Ok(data)
}

/// Raw text of a value in the header dict, up to the next top-level comma.
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!("'{key}':");
    let rest = header[header.find(&pattern)? + pattern.len()..].trim_start();
    let end = if rest.starts_with('(') {
        rest.find(')')? + 1
    } else {
        rest.find([',', '}'])?
    };
    Some(rest[..end].trim())
}

fn parse_shape(header: &str) -> Result<usize, LabelError> {
    let shape = dict_value(header, "shape")
        .ok_or_else(|| LabelError::Format("npy header has no shape".to_string()))?;
    let dims: Vec<usize> = shape
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            d.parse()
                .map_err(|_| LabelError::Format(format!("bad npy shape {shape}")))
        })
        .collect::<Result<_, _>>()?;

    match dims.as_slice() {
        [rows, 2] => Ok(*rows),
        _ => Err(LabelError::Format(format!("expected shape (n, 2), found {shape}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_aligned() {
        let mut buf = Vec::new();
        write_pairs(&mut buf, &[[1, 2], [3, 4], [5, 6]]).unwrap();

        let header_len = u16::from_le_bytes([buf[8], buf[9]]) as usize;
        assert_eq!((10 + header_len) % HEADER_ALIGN, 0);
        assert_eq!(buf[10 + header_len - 1], b'\n');
        assert_eq!(buf.len(), 10 + header_len + 3 * 16);
    }

    #[test]
    fn test_read_back() {
        let rows = vec![[0, 0], [4, 1], [0, u64::MAX]];
        let mut buf = Vec::new();
        write_pairs(&mut buf, &rows).unwrap();
        assert_eq!(read_pairs(buf.as_slice()).unwrap(), rows);
    }

    #[test]
    fn test_reads_signed_numpy_header() {
        // What np.save writes for np.zeros((2, 2), dtype=np.int64)
        let dict = "{'descr': '<i8', 'fortran_order': False, 'shape': (2, 2), }";
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&[1, 0]);
        let header = format!("{dict}{}\n", " ".repeat(128 - 10 - dict.len() - 1));
        buf.extend_from_slice(&(header.len() as u16).to_le_bytes());
        buf.extend_from_slice(header.as_bytes());
        for v in [8i64, 0, 0, 2] {
            buf.extend_from_slice(&v.to_le_bytes());
        }

        assert_eq!(read_pairs(buf.as_slice()).unwrap(), vec![[8, 0], [0, 2]]);
    }

    #[test]
    fn test_rejects_wrong_shape() {
        let header = "{'descr': '<u8', 'fortran_order': False, 'shape': (3,), }";
        assert!(matches!(parse_shape(header), Err(LabelError::Format(_))));
    }
}
