use std::collections::HashMap;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::core::decomp::lexicon::Lexicon;
use crate::core::decomp::phones::PhoneList;
use crate::core::params::DecompParams;
use crate::error::{Error, Result};
use crate::types::DecompVariant;

/// Row blocks of the decomposition matrix, top to bottom: plain phones,
/// graphemes, disambiguation ids, pdf-classes, one bias row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotLayout {
    pub variant: DecompVariant,
    pub num_phones: usize,
    pub num_graphemes: usize,
    pub num_disambig: usize,
    pub num_pdf_classes: usize,
    pub num_pdfs: usize,
}

impl SlotLayout {
    pub fn grapheme_offset(&self) -> usize {
        self.num_phones
    }

    pub fn disambig_offset(&self) -> usize {
        self.grapheme_offset() + self.num_graphemes
    }

    pub fn pdf_class_offset(&self) -> usize {
        self.disambig_offset() + self.num_disambig
    }

    pub fn bias_row(&self) -> usize {
        self.pdf_class_offset() + self.num_pdf_classes
    }

    pub fn rows(&self) -> usize {
        self.bias_row() + 1
    }

    pub fn cols(&self) -> usize {
        self.num_pdfs
    }
}

/// Bag-of-features matrix mapping every PDF (column) onto the ID slots
/// (rows) that describe it.
#[derive(Debug, Clone)]
pub struct DecompositionMatrix {
    pub layout: SlotLayout,
    pub phone_ids: HashMap<String, usize>,
    pub matrix: Array2<f64>,
}

impl DecompositionMatrix {
    pub fn build(lexicon: &Lexicon, phones: &PhoneList, params: &DecompParams) -> Result<Self> {
        let mut phone_ids: HashMap<String, usize> = HashMap::new();
        for entry in phones.entries() {
            if !lexicon.contains(&entry.symbol) && !phone_ids.contains_key(&entry.symbol) {
                let next = phone_ids.len();
                phone_ids.insert(entry.symbol.clone(), next);
            }
        }

        let layout = SlotLayout {
            variant: lexicon.variant(),
            num_phones: phone_ids.len(),
            num_graphemes: lexicon.num_graphemes(),
            num_disambig: lexicon.num_disambig(),
            num_pdf_classes: phones.max_pdf_class() + 1,
            num_pdfs: phones.len(),
        };
        if layout.num_pdfs == 0 {
            return Err(Error::EmptyMatrix);
        }
        info!(
            "Decomposition matrix: {} rows x {} pdfs ({} phones, {} graphemes, {} disambig, {} pdf-classes)",
            layout.rows(),
            layout.cols(),
            layout.num_phones,
            layout.num_graphemes,
            layout.num_disambig,
            layout.num_pdf_classes
        );

        let mut matrix = if params.noise_scale > 0.0 {
            let mut rng = StdRng::seed_from_u64(params.seed);
            Array2::from_shape_fn((layout.rows(), layout.cols()), |_| {
                rng.r#gen::<f64>() * params.noise_scale
            })
        } else {
            Array2::zeros((layout.rows(), layout.cols()))
        };

        for entry in phones.entries() {
            let col = entry.pdf;
            if col >= layout.cols() {
                return Err(Error::PdfOutOfRange {
                    pdf: col,
                    total: layout.cols(),
                });
            }
            if let Some(&phone) = phone_ids.get(&entry.symbol) {
                matrix[[phone, col]] = 1.0;
            } else if let Some(decomp) = lexicon.get(&entry.symbol) {
                for &g in &decomp.graphemes {
                    let weight = 1.0 / (lexicon.grapheme_count(g) as f64).sqrt();
                    matrix[[layout.grapheme_offset() + g, col]] = weight;
                }
                matrix[[layout.disambig_offset() + decomp.disambig, col]] = 1.0;
            }
            matrix[[layout.pdf_class_offset() + entry.pdf_class, col]] = 1.0;
        }
        debug!("Filled {} columns", phones.len());

        Ok(Self {
            layout,
            phone_ids,
            matrix,
        })
    }
}
