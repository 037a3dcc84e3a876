//! Reader for MATLAB Level 5 MAT-files.
//!
//! Decodes numeric, char, cell and struct arrays, including variables stored
//! in zlib-compressed elements (the default since MATLAB 7). Sparse, object
//! and function-handle arrays are kept as [`MatArray::Unsupported`]. Complex
//! arrays keep only their real part.
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use tracing::debug;

use crate::error::{Error, Result};

const HEADER_LEN: usize = 128;

// Data element types
const MI_INT8: u32 = 1;
const MI_UINT8: u32 = 2;
const MI_INT16: u32 = 3;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_SINGLE: u32 = 7;
const MI_DOUBLE: u32 = 9;
const MI_INT64: u32 = 12;
const MI_UINT64: u32 = 13;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;
const MI_UTF8: u32 = 16;
const MI_UTF16: u32 = 17;
const MI_UTF32: u32 = 18;

// Array classes
const MX_CELL: u8 = 1;
const MX_STRUCT: u8 = 2;
const MX_CHAR: u8 = 4;
const MX_DOUBLE: u8 = 6;
const MX_UINT64: u8 = 15;

type Decoded<T> = std::result::Result<T, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum MatArray {
    Numeric {
        dims: Vec<usize>,
        data: Vec<f64>,
    },
    Char {
        dims: Vec<usize>,
        text: String,
    },
    Cell {
        dims: Vec<usize>,
        cells: Vec<MatArray>,
    },
    /// `elements[i][f]` is field `fields[f]` of element `i`, elements in
    /// column-major order.
    Struct {
        dims: Vec<usize>,
        fields: Vec<String>,
        elements: Vec<Vec<MatArray>>,
    },
    Unsupported {
        class: u8,
    },
}

impl MatArray {
    /// Values of `field` across all struct elements, in storage order.
    pub fn field_values(&self, field: &str) -> Option<Vec<&MatArray>> {
        match self {
            MatArray::Struct {
                fields, elements, ..
            } => {
                let idx = fields.iter().position(|f| f == field)?;
                Some(elements.iter().filter_map(|e| e.get(idx)).collect())
            }
            _ => None,
        }
    }

    pub fn scalar(&self) -> Option<f64> {
        match self {
            MatArray::Numeric { data, .. } => data.first().copied(),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            MatArray::Char { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Named top-level variables of a MAT-file, in file order.
#[derive(Debug, Clone, Default)]
pub struct MatFile {
    variables: Vec<(String, MatArray)>,
}

impl MatFile {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let mat = Self::parse(&bytes, path)?;
        debug!("Loaded {} variables from {:?}", mat.variables.len(), path);
        Ok(mat)
    }

    pub fn parse(bytes: &[u8], path: &Path) -> Result<Self> {
        let fail = |message: String| Error::Mat {
            path: PathBuf::from(path),
            message,
        };
        if bytes.len() < HEADER_LEN {
            return Err(fail("truncated header".to_string()));
        }
        let big_endian = match &bytes[HEADER_LEN - 2..HEADER_LEN] {
            b"IM" => false,
            b"MI" => true,
            _ => return Err(fail("not a Level 5 MAT-file".to_string())),
        };

        let mut mat = MatFile::default();
        let mut top = Elements::new(&bytes[HEADER_LEN..], big_endian);
        while !top.is_empty() {
            let (ty, data) = top.next_element().map_err(fail)?;
            match ty {
                MI_MATRIX => mat.variables.push(read_matrix(data, big_endian).map_err(fail)?),
                MI_COMPRESSED => {
                    let mut inflated = Vec::new();
                    ZlibDecoder::new(data).read_to_end(&mut inflated)?;
                    let mut inner = Elements::new(&inflated, big_endian);
                    while !inner.is_empty() {
                        let (ty, data) = inner.next_element().map_err(fail)?;
                        if ty == MI_MATRIX {
                            mat.variables.push(read_matrix(data, big_endian).map_err(fail)?);
                        }
                    }
                }
                other => debug!("Skipping top-level element of type {}", other),
            }
        }
        Ok(mat)
    }

    pub fn get(&self, name: &str) -> Option<&MatArray> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|(n, _)| n.as_str())
    }
}

/// Cursor over a sequence of tagged data elements.
struct Elements<'a> {
    buf: &'a [u8],
    pos: usize,
    big_endian: bool,
}

impl<'a> Elements<'a> {
    fn new(buf: &'a [u8], big_endian: bool) -> Self {
        Self {
            buf,
            pos: 0,
            big_endian,
        }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize) -> Decoded<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| format!("element of {} bytes overruns the data at offset {}", n, self.pos))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Decoded<u32> {
        let b = self.take(4)?;
        let raw = [b[0], b[1], b[2], b[3]];
        Ok(if self.big_endian {
            u32::from_be_bytes(raw)
        } else {
            u32::from_le_bytes(raw)
        })
    }

    /// Next `(type, payload)`. Small elements pack up to four bytes into the
    /// tag; regular elements are padded to 8 bytes, compressed ones are not.
    fn next_element(&mut self) -> Decoded<(u32, &'a [u8])> {
        let tag = self.u32()?;
        let small_len = (tag >> 16) as usize;
        if small_len != 0 {
            if small_len > 4 {
                return Err(format!("small element claims {} bytes", small_len));
            }
            let data = self.take(4)?;
            return Ok((tag & 0xFFFF, &data[..small_len]));
        }
        let len = self.u32()? as usize;
        let data = self.take(len)?;
        if tag != MI_COMPRESSED {
            let pad = (8 - len % 8) % 8;
            self.pos = (self.pos + pad).min(self.buf.len());
        }
        Ok((tag, data))
    }

    fn expect_matrix(&mut self) -> Decoded<&'a [u8]> {
        match self.next_element()? {
            (MI_MATRIX, data) => Ok(data),
            (ty, _) => Err(format!("expected a matrix element, found type {}", ty)),
        }
    }
}

fn read_matrix(data: &[u8], big_endian: bool) -> Decoded<(String, MatArray)> {
    if data.is_empty() {
        // empty cells and struct fields carry no subelements at all
        let empty = MatArray::Numeric {
            dims: vec![0, 0],
            data: Vec::new(),
        };
        return Ok((String::new(), empty));
    }
    let mut el = Elements::new(data, big_endian);

    let (_, flags) = el.next_element()?;
    let flags = numbers(MI_UINT32, flags, big_endian)?;
    let class = flags.first().map_or(0, |&f| (f as u32 & 0xFF) as u8);

    let (ty, dims) = el.next_element()?;
    let dims: Vec<usize> = numbers(ty, dims, big_endian)?
        .into_iter()
        .map(|d| d as usize)
        .collect();
    let count: usize = dims.iter().product();

    let (_, name) = el.next_element()?;
    let name = String::from_utf8_lossy(name)
        .trim_end_matches('\0')
        .to_string();

    let array = match class {
        MX_CELL => {
            let cells = (0..count)
                .map(|_| read_matrix(el.expect_matrix()?, big_endian).map(|(_, a)| a))
                .collect::<Decoded<Vec<_>>>()?;
            MatArray::Cell { dims, cells }
        }
        MX_STRUCT => {
            let (ty, len) = el.next_element()?;
            let name_len = numbers(ty, len, big_endian)?
                .first()
                .map_or(0, |&n| n as usize);
            if name_len == 0 {
                return Err(format!("struct `{}` has a zero field-name length", name));
            }
            let (_, names) = el.next_element()?;
            let fields: Vec<String> = names
                .chunks(name_len)
                .map(|c| String::from_utf8_lossy(c).trim_end_matches('\0').to_string())
                .collect();
            let mut elements = Vec::with_capacity(count);
            for _ in 0..count {
                let values = fields
                    .iter()
                    .map(|_| read_matrix(el.expect_matrix()?, big_endian).map(|(_, a)| a))
                    .collect::<Decoded<Vec<_>>>()?;
                elements.push(values);
            }
            MatArray::Struct {
                dims,
                fields,
                elements,
            }
        }
        MX_CHAR => {
            let (ty, raw) = el.next_element()?;
            let text = chars(ty, raw, &dims, big_endian)?;
            MatArray::Char { dims, text }
        }
        MX_DOUBLE..=MX_UINT64 => {
            let (ty, raw) = el.next_element()?;
            let data = numbers(ty, raw, big_endian)?;
            MatArray::Numeric { dims, data }
        }
        other => MatArray::Unsupported { class: other },
    };
    Ok((name, array))
}

macro_rules! decode {
    ($bytes:expr, $big_endian:expr, $t:ty) => {{
        const N: usize = std::mem::size_of::<$t>();
        $bytes
            .chunks_exact(N)
            .map(|c| {
                let mut raw = [0u8; N];
                raw.copy_from_slice(c);
                if $big_endian {
                    <$t>::from_be_bytes(raw) as f64
                } else {
                    <$t>::from_le_bytes(raw) as f64
                }
            })
            .collect()
    }};
}

fn numbers(ty: u32, bytes: &[u8], big_endian: bool) -> Decoded<Vec<f64>> {
    Ok(match ty {
        MI_INT8 => decode!(bytes, big_endian, i8),
        MI_UINT8 | MI_UTF8 => decode!(bytes, big_endian, u8),
        MI_INT16 => decode!(bytes, big_endian, i16),
        MI_UINT16 | MI_UTF16 => decode!(bytes, big_endian, u16),
        MI_INT32 => decode!(bytes, big_endian, i32),
        MI_UINT32 | MI_UTF32 => decode!(bytes, big_endian, u32),
        MI_SINGLE => decode!(bytes, big_endian, f32),
        MI_DOUBLE => decode!(bytes, big_endian, f64),
        MI_INT64 => decode!(bytes, big_endian, i64),
        MI_UINT64 => decode!(bytes, big_endian, u64),
        other => return Err(format!("unsupported numeric element type {}", other)),
    })
}

/// Char arrays are stored column-major; rows come back joined by `\n`.
fn chars(ty: u32, bytes: &[u8], dims: &[usize], big_endian: bool) -> Decoded<String> {
    let units: Vec<char> = match ty {
        MI_UTF8 | MI_INT8 | MI_UINT8 => String::from_utf8_lossy(bytes).chars().collect(),
        MI_UINT16 | MI_UTF16 => {
            let units: Vec<u16> = numbers(ty, bytes, big_endian)?
                .into_iter()
                .map(|u| u as u16)
                .collect();
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        MI_UINT32 | MI_UTF32 => numbers(ty, bytes, big_endian)?
            .into_iter()
            .map(|u| char::from_u32(u as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect(),
        other => return Err(format!("unsupported char element type {}", other)),
    };

    let rows = dims.first().copied().unwrap_or(1);
    if rows <= 1 || units.len() % rows != 0 {
        return Ok(units.into_iter().collect());
    }
    let cols = units.len() / rows;
    let lines: Vec<String> = (0..rows)
        .map(|r| (0..cols).map(|c| units[c * rows + r]).collect())
        .collect();
    Ok(lines.join("\n"))
}

/// Little-endian MAT-file writer for test fixtures.
#[cfg(test)]
pub(crate) mod fixture {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    use super::*;

    pub fn element(ty: u32, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        if !data.is_empty() && data.len() <= 4 {
            out.extend_from_slice(&(((data.len() as u32) << 16) | ty).to_le_bytes());
            out.extend_from_slice(data);
            out.resize(8, 0);
            return out;
        }
        out.extend_from_slice(&ty.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
        out.resize(out.len() + (8 - data.len() % 8) % 8, 0);
        out
    }

    fn matrix(class: u8, dims: &[i32], name: &str, body: &[u8]) -> Vec<u8> {
        let mut flags = Vec::new();
        flags.extend_from_slice(&(class as u32).to_le_bytes());
        flags.extend_from_slice(&0u32.to_le_bytes());
        let dims: Vec<u8> = dims.iter().flat_map(|d| d.to_le_bytes()).collect();

        let mut data = element(MI_UINT32, &flags);
        data.extend(element(MI_INT32, &dims));
        data.extend(element(MI_INT8, name.as_bytes()));
        data.extend_from_slice(body);
        element(MI_MATRIX, &data)
    }

    pub fn char_array(name: &str, text: &str) -> Vec<u8> {
        let units: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        let len = text.encode_utf16().count() as i32;
        matrix(MX_CHAR, &[1, len], name, &element(MI_UINT16, &units))
    }

    pub fn double_array(name: &str, values: &[f64]) -> Vec<u8> {
        let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        matrix(MX_DOUBLE, &[1, values.len() as i32], name, &element(MI_DOUBLE, &raw))
    }

    /// `elements[i]` holds the already-encoded field values of element `i`.
    pub fn struct_array(name: &str, fields: &[&str], elements: &[Vec<Vec<u8>>]) -> Vec<u8> {
        let name_len = 32;
        let mut names = Vec::new();
        for f in fields {
            let mut padded = f.as_bytes().to_vec();
            padded.resize(name_len, 0);
            names.extend(padded);
        }
        let mut body = element(MI_INT32, &(name_len as i32).to_le_bytes());
        body.extend(element(MI_INT8, &names));
        for values in elements {
            for v in values {
                body.extend_from_slice(v);
            }
        }
        matrix(MX_STRUCT, &[elements.len() as i32, 1], name, &body)
    }

    pub fn compressed(variable: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(variable).unwrap();
        let data = enc.finish().unwrap();
        let mut out = Vec::new();
        out.extend_from_slice(&MI_COMPRESSED.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend(data);
        out
    }

    pub fn mat_file(elements: &[Vec<u8>]) -> Vec<u8> {
        let mut out = b"MATLAB 5.0 MAT-file, Platform: GLNXA64".to_vec();
        out.resize(116, b' ');
        out.extend_from_slice(&[0u8; 8]);
        out.extend_from_slice(&0x0100u16.to_le_bytes());
        out.extend_from_slice(b"IM");
        for e in elements {
            out.extend_from_slice(e);
        }
        out
    }

    /// `synsets` struct array with `ILSVRC2012_ID`, `WNID` and `words` fields.
    pub fn synsets_mat(entries: &[(f64, &str)], compress: bool) -> Vec<u8> {
        let elements: Vec<Vec<Vec<u8>>> = entries
            .iter()
            .map(|&(id, wnid)| {
                vec![
                    double_array("", &[id]),
                    char_array("", wnid),
                    char_array("", "some words"),
                ]
            })
            .collect();
        let var = struct_array("synsets", &["ILSVRC2012_ID", "WNID", "words"], &elements);
        let var = if compress { compressed(&var) } else { var };
        mat_file(&[var])
    }
}

#[cfg(test)]
mod tests {
    use super::fixture::*;
    use super::*;

    #[test]
    fn reads_plain_variables() {
        let bytes = mat_file(&[double_array("x", &[1.5, -2.0]), char_array("name", "tench")]);
        let mat = MatFile::parse(&bytes, Path::new("t.mat")).unwrap();
        assert_eq!(mat.names().collect::<Vec<_>>(), vec!["x", "name"]);
        assert_eq!(
            mat.get("x"),
            Some(&MatArray::Numeric {
                dims: vec![1, 2],
                data: vec![1.5, -2.0]
            })
        );
        assert_eq!(mat.get("name").and_then(MatArray::text), Some("tench"));
        assert!(mat.get("missing").is_none());
    }

    #[test]
    fn reads_struct_fields_in_order() {
        for compress in [false, true] {
            let bytes = synsets_mat(&[(1.0, "n01440764"), (2.0, "n01443537")], compress);
            let mat = MatFile::parse(&bytes, Path::new("meta.mat")).unwrap();
            let synsets = mat.get("synsets").unwrap();
            let wnids: Vec<&str> = synsets
                .field_values("WNID")
                .unwrap()
                .into_iter()
                .filter_map(MatArray::text)
                .collect();
            assert_eq!(wnids, vec!["n01440764", "n01443537"]);
            let ids: Vec<f64> = synsets
                .field_values("ILSVRC2012_ID")
                .unwrap()
                .into_iter()
                .filter_map(MatArray::scalar)
                .collect();
            assert_eq!(ids, vec![1.0, 2.0]);
            assert!(synsets.field_values("gloss").is_none());
        }
    }

    #[test]
    fn empty_cells_decode_as_empty_arrays() {
        let empty_cell = element(MI_MATRIX, &[]);
        let mut flags = Vec::new();
        flags.extend_from_slice(&(MX_CELL as u32).to_le_bytes());
        flags.extend_from_slice(&0u32.to_le_bytes());
        let dims: Vec<u8> = [1i32, 1].iter().flat_map(|d| d.to_le_bytes()).collect();
        let mut data = element(MI_UINT32, &flags);
        data.extend(element(MI_INT32, &dims));
        data.extend(element(MI_INT8, b"c"));
        data.extend(empty_cell);
        let bytes = mat_file(&[element(MI_MATRIX, &data)]);

        let mat = MatFile::parse(&bytes, Path::new("c.mat")).unwrap();
        match mat.get("c").unwrap() {
            MatArray::Cell { cells, .. } => {
                assert_eq!(cells.len(), 1);
                assert_eq!(cells[0].scalar(), None);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn multi_row_char_arrays_split_into_lines() {
        assert_eq!(
            chars(MI_UINT8, b"acbd", &[2, 2], false).unwrap(),
            "ab\ncd"
        );
    }

    #[test]
    fn rejects_non_mat_and_truncated_input() {
        let err = MatFile::parse(b"hello", Path::new("x.mat")).unwrap_err();
        assert!(matches!(err, Error::Mat { .. }));

        let mut bytes = mat_file(&[double_array("x", &[1.0])]);
        bytes.truncate(bytes.len() - 4);
        let err = MatFile::parse(&bytes, Path::new("x.mat")).unwrap_err();
        assert!(matches!(err, Error::Mat { .. }));

        let mut bytes = vec![b' '; HEADER_LEN];
        bytes[HEADER_LEN - 2..].copy_from_slice(b"XX");
        assert!(MatFile::parse(&bytes, Path::new("x.mat")).is_err());
    }
}
