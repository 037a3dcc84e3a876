use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// Line-oriented `key value` file written alongside a feature archive.
pub struct LabelWriter {
    path: PathBuf,
    inner: BufWriter<File>,
    count: usize,
}

impl LabelWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: BufWriter::new(file),
            count: 0,
        })
    }

    pub fn write<V: Display>(&mut self, key: &str, value: V) -> Result<()> {
        writeln!(self.inner, "{} {}", key, value)?;
        self.count += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        self.inner.flush()?;
        debug!("Wrote {} labels to {:?}", self.count, self.path);
        Ok(self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_key_value_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        let mut w = LabelWriter::create(&path).unwrap();
        w.write("00000001", 3).unwrap();
        w.write("00000002", "a01-000u-00").unwrap();
        assert_eq!(w.finish().unwrap(), 2);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "00000001 3\n00000002 a01-000u-00\n"
        );
    }
}
