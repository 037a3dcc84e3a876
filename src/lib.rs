#![doc = r#"
featprep: data-preparation tools for Kaldi OCR and image-classification recipes.

This crate turns raw corpora into the text feature archives a Kaldi training
pipeline consumes: IAM handwriting line images, ImageNet photographs with
bounding-box annotations, and Chinese character decomposition lexicons. It
powers the `featprep` CLI and can be embedded in your own Rust tools.

Each tool is a single-pass transformation: read a dataset layout, apply a
fixed numeric transform, and write a Kaldi text matrix plus auxiliary label
files.

Convert IAM lines to an archive
-------------------------------
```rust,no_run
use std::path::Path;
use featprep::{convert_iam_lines, IamParams, IamSplit};

fn main() -> featprep::Result<()> {
    let params = IamParams { dataset: IamSplit::Testset, scale_size: 40 };
    let mut ark = std::fs::File::create("/out/test.ark")?;
    let report = convert_iam_lines(Path::new("/data/iam"), Path::new("/out"), &params, &mut ark)?;
    println!("wrote {} matrices", report.matrices);
    Ok(())
}
```

Build a decomposition matrix
----------------------------
```rust,no_run
use std::path::Path;
use featprep::{write_decomposition_matrix, DecompParams, DecompVariant};

fn main() -> featprep::Result<()> {
    let params = DecompParams { variant: DecompVariant::Positional, ..DecompParams::default() };
    let decomp = write_decomposition_matrix(
        Path::new("data/lang/pdf2phone.txt"),
        Path::new("data/local/dict/cj5-cc.txt"),
        Path::new("exp/decomp"),
        None,
        &params,
    )?;
    println!("{} rows", decomp.layout.rows());
    Ok(())
}
```

Error handling
--------------
All public functions return `featprep::Result<T>`; match on `featprep::Error`
to handle specific cases such as malformed matrices or missing annotations.

Useful modules
--------------
- [`api`]: dataset-level entry points.
- [`core`]: image transforms, the decomposition builder, topology generation.
- [`io`]: image, annotation, MAT-file and synset readers; Kaldi/label/sidecar writers.
- [`types`]: dataset split and variant enums.
- [`error`]: crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Types
pub use crate::core::params::{DecompParams, IamParams, ImageNetParams, load_params};
pub use crate::error::{Error, Result};
pub use crate::types::{DecompVariant, GraphemePosition, IamSplit, ImageNetSplit};

// Building blocks
pub use crate::core::decomp::{DecompositionMatrix, Lexicon, PhoneList, SlotLayout};
pub use crate::io::writers::write_kaldi_matrix;
pub use crate::io::{BoundingBox, MatFile, SynsetTable};

// High-level API re-exports
pub use crate::api::{
    ConversionReport, DevkitLayout, ImageNetSource, Topology, build_decomposition_matrix,
    convert_iam_lines, convert_imagenet, feature_key, generate_topology, load_synsets,
    write_decomposition_matrix,
};
