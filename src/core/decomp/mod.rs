//! Decomposition-matrix builder: lexicon and phone-list parsing plus the
//! matrix fill that feeds the fixed affine layer of the network.
pub mod lexicon;
pub mod matrix;
pub mod phones;

pub use lexicon::{Decomposition, Lexicon};
pub use matrix::{DecompositionMatrix, SlotLayout};
pub use phones::{PdfEntry, PhoneList};
