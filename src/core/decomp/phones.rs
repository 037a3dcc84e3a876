use std::io::BufRead;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};

/// One output column: the phone it belongs to and its PDF index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfEntry {
    pub symbol: String,
    pub pdf: usize,
    /// Position within the run of consecutive lines for the same phone
    pub pdf_class: usize,
}

/// `phone pdf-id` table listing every PDF of the model.
#[derive(Debug, Clone, Default)]
pub struct PhoneList {
    entries: Vec<PdfEntry>,
    max_pdf_class: usize,
}

impl PhoneList {
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let list = Self::parse(std::io::BufReader::new(file), path)?;
        info!(
            "Phone list {:?}: {} pdfs, max pdf-class {}",
            path,
            list.len(),
            list.max_pdf_class()
        );
        Ok(list)
    }

    pub fn parse<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut list = PhoneList::default();
        let mut prev: Option<String> = None;
        let mut pdf_class = 0;

        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let Some(symbol) = fields.next() else {
                continue;
            };
            let pdf = fields
                .next()
                .ok_or_else(|| Error::parse(path, n + 1, "missing pdf id"))?;
            let pdf = pdf
                .parse::<usize>()
                .map_err(|e| Error::parse(path, n + 1, format!("bad pdf id {:?}: {}", pdf, e)))?;

            if prev.as_deref() == Some(symbol) {
                pdf_class += 1;
            } else {
                pdf_class = 0;
                prev = Some(symbol.to_string());
            }
            list.max_pdf_class = list.max_pdf_class.max(pdf_class);
            list.entries.push(PdfEntry {
                symbol: symbol.to_string(),
                pdf,
                pdf_class,
            });
        }
        Ok(list)
    }

    pub fn entries(&self) -> &[PdfEntry] {
        &self.entries
    }

    /// Number of PDFs, one per line.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_pdf_class(&self) -> usize {
        self.max_pdf_class
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_classes_count_within_runs() {
        let text = "SIL 0\nSIL 1\na 2\n日 3\n日 4\n日 5\nSIL 6\n";
        let list = PhoneList::parse(text.as_bytes(), Path::new("p")).unwrap();
        let classes: Vec<usize> = list.entries().iter().map(|e| e.pdf_class).collect();
        assert_eq!(classes, vec![0, 1, 0, 0, 1, 2, 0]);
        assert_eq!(list.max_pdf_class(), 2);
        assert_eq!(list.len(), 7);
    }

    #[test]
    fn bad_pdf_id_is_reported_with_line() {
        let err = PhoneList::parse("a 0\nb x\n".as_bytes(), Path::new("p")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
        let err = PhoneList::parse("a\n".as_bytes(), Path::new("p")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }
}
