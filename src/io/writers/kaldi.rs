use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use ndarray::{Array2, ArrayView2};

use crate::error::{Error, Result};

/// Open the destination of a feature archive. `-` means stdout.
pub fn open_output(target: &str) -> Result<Box<dyn Write>> {
    if target == "-" {
        Ok(Box::new(BufWriter::new(io::stdout().lock())))
    } else {
        let file = File::create(Path::new(target))?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

fn write_row<W: Write, I: IntoIterator<Item = f64>>(w: &mut W, row: I) -> io::Result<()> {
    let mut first = true;
    for v in row {
        if !first {
            w.write_all(b" ")?;
        }
        write!(w, "{}", v)?;
        first = false;
    }
    Ok(())
}

fn write_rows<W, R, I>(
    w: &mut W,
    key: Option<&str>,
    (num_rows, num_cols): (usize, usize),
    rows: R,
) -> Result<()>
where
    W: Write,
    R: Iterator<Item = I>,
    I: IntoIterator<Item = f64>,
{
    if num_rows == 0 || num_cols == 0 {
        return Err(Error::EmptyMatrix);
    }
    match key {
        Some(k) => write!(w, "{} [ ", k)?,
        None => w.write_all(b"[ ")?,
    }
    for (i, row) in rows.enumerate() {
        write_row(w, row)?;
        if i + 1 != num_rows {
            w.write_all(b"\n")?;
        }
    }
    // Keyed archive entries close with " ]", a bare matrix with " ] ".
    match key {
        Some(_) => w.write_all(b" ]\n")?,
        None => w.write_all(b" ] \n")?,
    }
    Ok(())
}

/// Write one matrix in Kaldi text format: `key [ r0c0 r0c1 ...\n r1c0 ... ]`.
/// Without a key only the bracketed body is written.
pub fn write_kaldi_matrix<W: Write>(
    w: &mut W,
    key: Option<&str>,
    matrix: ArrayView2<'_, f64>,
) -> Result<()> {
    write_rows(
        w,
        key,
        matrix.dim(),
        matrix.rows().into_iter().map(|r| r.into_iter().copied()),
    )
}

/// Same as [`write_kaldi_matrix`] for row-major nested vectors; rejects ragged rows.
pub fn write_kaldi_rows<W: Write>(w: &mut W, key: Option<&str>, rows: &[Vec<f64>]) -> Result<()> {
    let num_cols = rows.first().map_or(0, Vec::len);
    if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != num_cols) {
        return Err(Error::RaggedMatrix {
            row,
            expected: num_cols,
            found: r.len(),
        });
    }
    write_rows(w, key, (rows.len(), num_cols), rows.iter().map(|r| r.iter().copied()))
}

/// Parse a Kaldi text archive back into `(key, matrix)` pairs. An unkeyed
/// matrix gets an empty key. Used by the integration tests to read archives back.
#[doc(hidden)]
pub fn parse_kaldi_text(text: &str) -> Result<Vec<(String, Array2<f64>)>> {
    let src = Path::new("<text>");
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        let key = rest[..open].trim().to_string();
        let close = rest[open..]
            .find(']')
            .map(|c| open + c)
            .ok_or_else(|| Error::parse(src, out.len() + 1, "unterminated matrix"))?;
        let body = &rest[open + 1..close];

        let mut data = Vec::new();
        let mut cols = None;
        let mut nrows = 0;
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            let row: Vec<f64> = line
                .split_whitespace()
                .map(|t| t.parse::<f64>().map_err(|e| Error::parse(src, nrows + 1, e)))
                .collect::<Result<_>>()?;
            match cols {
                None => cols = Some(row.len()),
                Some(c) if c != row.len() => {
                    return Err(Error::RaggedMatrix {
                        row: nrows,
                        expected: c,
                        found: row.len(),
                    });
                }
                _ => {}
            }
            data.extend(row);
            nrows += 1;
        }
        let matrix = Array2::from_shape_vec((nrows, cols.unwrap_or(0)), data)
            .map_err(|e| Error::parse(src, nrows, e))?;
        out.push((key, matrix));
        rest = &rest[close + 1..];
    }
    Ok(out)
}
