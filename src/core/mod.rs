//! Core building blocks: image processing primitives, the decomposition
//! matrix builder, topology generation, and the parameter structs shared by
//! the CLI and the library API.
pub mod decomp;
pub mod params;
pub mod processing;
pub mod topology;
