//! I/O layer: image loading, bounding-box annotations, MAT-files, synset tables, and
//! `writers` for Kaldi text matrices, label files and JSON sidecars.
pub mod bbox;
pub use bbox::{BoundingBox, read_bbox};

pub mod images;
pub use images::{load_gray, load_rgb};

pub mod mat;
pub use mat::{MatArray, MatFile};

pub mod synsets;
pub use synsets::{Synset, SynsetTable};

pub mod writers;
