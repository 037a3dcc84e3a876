use std::io::BufRead;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};

/// Pixel bounds of an annotated object, `[min, max)` on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

/// Read the first object's `<bndbox>` from a PASCAL-VOC style annotation.
pub fn read_bbox(path: &Path) -> Result<BoundingBox> {
    let mut reader = Reader::from_file(path)?;
    parse_bbox(&mut reader, path)
}

pub fn parse_bbox_str(xml: &str) -> Result<BoundingBox> {
    let mut reader = Reader::from_str(xml);
    parse_bbox(&mut reader, Path::new("<string>"))
}

fn parse_coord(txt: &str, path: &Path, pos: usize) -> Result<i64> {
    let txt = txt.trim();
    txt.parse::<i64>()
        .or_else(|_| txt.parse::<f64>().map(|v| v as i64))
        .map_err(|e| Error::parse(path, pos, format!("bad coordinate {:?}: {}", txt, e)))
}

fn parse_bbox<R: BufRead>(reader: &mut Reader<R>, path: &Path) -> Result<BoundingBox> {
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut curr = String::new();
    let mut in_object = false;
    let mut in_bndbox = false;
    let (mut xmin, mut ymin, mut xmax, mut ymax) = (None, None, None, None);

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match tag.as_str() {
                    "object" => in_object = true,
                    "bndbox" if in_object => in_bndbox = true,
                    _ => {}
                }
                curr = tag;
            }
            Event::End(ref e) => {
                match e.name().as_ref() {
                    // Only the first object counts.
                    b"object" if in_object => break,
                    b"bndbox" => in_bndbox = false,
                    _ => {}
                }
                curr.clear();
            }
            Event::Text(e) if in_bndbox => {
                let txt = e.unescape()?;
                let pos = reader.buffer_position();
                match curr.as_str() {
                    "xmin" => xmin = Some(parse_coord(&txt, path, pos)?),
                    "ymin" => ymin = Some(parse_coord(&txt, path, pos)?),
                    "xmax" => xmax = Some(parse_coord(&txt, path, pos)?),
                    "ymax" => ymax = Some(parse_coord(&txt, path, pos)?),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let missing = |field: &'static str| Error::MissingField {
        field,
        path: path.to_path_buf(),
    };
    Ok(BoundingBox {
        xmin: xmin.ok_or_else(|| missing("xmin"))?,
        ymin: ymin.ok_or_else(|| missing("ymin"))?,
        xmax: xmax.ok_or_else(|| missing("xmax"))?,
        ymax: ymax.ok_or_else(|| missing("ymax"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANNOTATION: &str = r#"<annotation>
  <folder>n01440764</folder>
  <filename>n01440764_10026</filename>
  <size><width>250</width><height>250</height><depth>3</depth></size>
  <object>
    <name>n01440764</name>
    <bndbox><xmin>10</xmin><ymin>20</ymin><xmax>200</xmax><ymax>180</ymax></bndbox>
  </object>
  <object>
    <name>n01440764</name>
    <bndbox><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax><ymax>4</ymax></bndbox>
  </object>
</annotation>"#;

    #[test]
    fn first_object_wins() {
        let b = parse_bbox_str(ANNOTATION).unwrap();
        assert_eq!(
            b,
            BoundingBox {
                xmin: 10,
                ymin: 20,
                xmax: 200,
                ymax: 180
            }
        );
    }

    #[test]
    fn missing_coordinate_is_reported() {
        let xml = "<annotation><object><bndbox><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax></bndbox></object></annotation>";
        match parse_bbox_str(xml) {
            Err(Error::MissingField { field, .. }) => assert_eq!(field, "ymax"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn size_block_is_not_a_bbox() {
        let xml = "<annotation><size><xmin>5</xmin></size></annotation>";
        assert!(parse_bbox_str(xml).is_err());
    }
}
