//! Image transforms: resizing, cropping, feature extraction, and the
//! per-image pipelines that chain them.
pub mod crop;
pub mod features;
pub mod pipeline;
pub mod resize;
