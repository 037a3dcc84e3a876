use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::io::mat::{MatArray, MatFile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synset {
    pub wnid: String,
    pub ilsvrc_id: i64,
}

/// Ordered ImageNet synset list. A synset's label is its position in the list.
#[derive(Debug, Clone, Default)]
pub struct SynsetTable {
    entries: Vec<Synset>,
    by_wnid: HashMap<String, usize>,
    by_id: HashMap<i64, usize>,
}

impl SynsetTable {
    /// Read a `WNID ILSVRC_ID [words...]` table, one synset per line.
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let table = Self::parse(std::io::BufReader::new(file), path)?;
        debug!("Loaded {} synsets from {:?}", table.len(), path);
        Ok(table)
    }

    pub fn parse<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut table = SynsetTable::default();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let Some(wnid) = fields.next() else {
                continue;
            };
            let id = fields
                .next()
                .ok_or_else(|| Error::parse(path, n + 1, "missing ILSVRC id"))?;
            let ilsvrc_id = id
                .parse::<i64>()
                .map_err(|e| Error::parse(path, n + 1, format!("bad ILSVRC id {:?}: {}", id, e)))?;
            table.push(Synset {
                wnid: wnid.to_string(),
                ilsvrc_id,
            });
        }
        Ok(table)
    }

    /// Read the `synsets` struct array of a devkit `meta.mat`, taking the
    /// `WNID` field and the `id_field` (e.g. `ILSVRC2012_ID`) of each element.
    pub fn open_mat(path: &Path, id_field: &str) -> Result<Self> {
        let mat = MatFile::open(path)?;
        let synsets = mat.get("synsets").ok_or_else(|| Error::Mat {
            path: path.to_path_buf(),
            message: "no `synsets` variable".to_string(),
        })?;
        let table = Self::from_mat_struct(synsets, id_field, path)?;
        debug!("Loaded {} synsets from {:?}", table.len(), path);
        Ok(table)
    }

    pub fn from_mat_struct(synsets: &MatArray, id_field: &str, path: &Path) -> Result<Self> {
        let fail = |message: String| Error::Mat {
            path: path.to_path_buf(),
            message,
        };
        let wnids = synsets
            .field_values("WNID")
            .ok_or_else(|| fail("`synsets` has no `WNID` field".to_string()))?;
        let ids = synsets
            .field_values(id_field)
            .ok_or_else(|| fail(format!("`synsets` has no `{}` field", id_field)))?;

        let mut table = SynsetTable::default();
        for (n, (wnid, id)) in wnids.iter().zip(&ids).enumerate() {
            let wnid = wnid
                .text()
                .ok_or_else(|| fail(format!("synset {} has no WNID text", n + 1)))?;
            let ilsvrc_id = id
                .scalar()
                .ok_or_else(|| fail(format!("synset {} has no numeric {}", n + 1, id_field)))?;
            table.push(Synset {
                wnid: wnid.to_string(),
                ilsvrc_id: ilsvrc_id as i64,
            });
        }
        Ok(table)
    }

    fn push(&mut self, synset: Synset) {
        let idx = self.entries.len();
        // First occurrence wins on lookups.
        self.by_wnid.entry(synset.wnid.clone()).or_insert(idx);
        self.by_id.entry(synset.ilsvrc_id).or_insert(idx);
        self.entries.push(synset);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn label_for_wnid(&self, wnid: &str) -> Result<usize> {
        self.by_wnid
            .get(wnid)
            .copied()
            .ok_or_else(|| Error::UnknownSynset(wnid.to_string()))
    }

    pub fn label_for_id(&self, ilsvrc_id: i64) -> Result<usize> {
        self.by_id
            .get(&ilsvrc_id)
            .copied()
            .ok_or_else(|| Error::UnknownSynset(ilsvrc_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::mat::fixture::synsets_mat;

    fn table() -> SynsetTable {
        let text = "n02119789 1 kit_fox\nn02100735 2 English_setter\n\nn02110185 3 Siberian_husky\n";
        SynsetTable::parse(text.as_bytes(), Path::new("synsets.txt")).unwrap()
    }

    #[test]
    fn labels_are_positions() {
        let t = table();
        assert_eq!(t.len(), 3);
        assert_eq!(t.label_for_wnid("n02100735").unwrap(), 1);
        assert_eq!(t.label_for_id(3).unwrap(), 2);
    }

    #[test]
    fn unknown_lookups_fail() {
        let t = table();
        assert!(matches!(t.label_for_wnid("n0000"), Err(Error::UnknownSynset(_))));
        assert!(matches!(t.label_for_id(1001), Err(Error::UnknownSynset(_))));
    }

    #[test]
    fn meta_mat_keeps_devkit_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.mat");
        let entries = [(1.0, "n02119789"), (2.0, "n02100735"), (3.0, "n02110185")];
        std::fs::write(&path, synsets_mat(&entries, true)).unwrap();

        let t = SynsetTable::open_mat(&path, "ILSVRC2012_ID").unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.label_for_wnid("n02100735").unwrap(), 1);
        assert_eq!(t.label_for_id(3).unwrap(), 2);
    }

    #[test]
    fn meta_mat_without_id_field_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.mat");
        std::fs::write(&path, synsets_mat(&[(1.0, "n01")], false)).unwrap();
        let err = SynsetTable::open_mat(&path, "ILSVRC2010_ID").unwrap_err();
        assert!(matches!(err, Error::Mat { ref message, .. } if message.contains("ILSVRC2010_ID")));
    }

    #[test]
    fn malformed_id_names_line() {
        let err = SynsetTable::parse("n1 x\n".as_bytes(), Path::new("s.txt")).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }
}
