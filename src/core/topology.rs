//! HMM topology generation for chain models. Punctuation phones get a
//! single-state entry with one pdf-class; every other phone gets a two-pdf
//! entry with a distinct self-loop class.
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Parse a colon-separated list of integer phone IDs, e.g. `4:5:6`.
pub fn parse_phone_ids(arg: &'static str, list: &str) -> Result<Vec<i64>> {
    list.split(':')
        .map(|x| {
            x.trim().parse::<i64>().map_err(|_| Error::InvalidArgument {
                arg,
                value: list.to_string(),
            })
        })
        .collect()
}

/// True when the phone symbol, stripped of its `_B`/`_E`-style suffix, is a
/// single ASCII punctuation character.
pub fn is_punctuation_symbol(symbol: &str) -> bool {
    let base = symbol.split('_').next().unwrap_or("");
    let mut chars = base.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_punctuation())
}

/// IDs of punctuation phones in a `symbol id` phone table.
pub fn read_punctuation_phones<R: BufRead>(reader: R, path: &Path) -> Result<HashSet<i64>> {
    let mut out = HashSet::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let Some(symbol) = fields.next() else {
            continue;
        };
        if !is_punctuation_symbol(symbol) {
            continue;
        }
        let id = fields
            .next()
            .ok_or_else(|| Error::parse(path, n + 1, "missing phone id"))?;
        let id = id
            .parse::<i64>()
            .map_err(|e| Error::parse(path, n + 1, format!("bad phone id {:?}: {}", id, e)))?;
        out.insert(id);
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub regular: Vec<i64>,
    pub punctuation: Vec<i64>,
}

impl Topology {
    /// Partition `silence ++ nonsilence` into regular and punctuation phones,
    /// keeping that order within each entry.
    pub fn new(nonsilence: &[i64], silence: &[i64], punctuation: &HashSet<i64>) -> Self {
        let (punct, regular): (Vec<i64>, Vec<i64>) = silence
            .iter()
            .chain(nonsilence)
            .copied()
            .partition(|p| punctuation.contains(p));
        debug!(
            "Topology: {} regular phones, {} punctuation phones",
            regular.len(),
            punct.len()
        );
        Self {
            regular,
            punctuation: punct,
        }
    }

    pub fn render(&self) -> String {
        let join = |v: &[i64]| {
            v.iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };

        let mut out = String::new();
        out.push_str("<Topology>\n");
        // State 0 happens exactly once and moves to state 1 (self-looping) or
        // the final state; transition probabilities are unused by chain training.
        out.push_str(&format!(
            "<TopologyEntry>\n<ForPhones>\n{}\n</ForPhones>\n",
            join(&self.regular)
        ));
        out.push_str("<State> 0 <ForwardPdfClass> 0 <SelfLoopPdfClass> 1 <Transition> 0 0.5 <Transition> 1 0.5 </State>\n");
        out.push_str("<State> 1 </State>\n");
        out.push_str("</TopologyEntry>\n");
        out.push_str(&format!(
            "<TopologyEntry>\n<ForPhones>\n{}\n</ForPhones>\n",
            join(&self.punctuation)
        ));
        out.push_str("<State> 0 <PdfClass> 0 <Transition> 0 0.5 <Transition> 1 0.5 </State>\n");
        out.push_str("<State> 1 </State>\n");
        out.push_str("</TopologyEntry>\n");
        out.push_str("</Topology>\n");
        out
    }
}

/// Build the topology from the colon lists and a phone table file.
pub fn generate_topology(nonsilence: &str, silence: &str, phone_list: &Path) -> Result<Topology> {
    let silence = parse_phone_ids("silence_phones", silence)?;
    let nonsilence = parse_phone_ids("nonsilence_phones", nonsilence)?;
    let file = std::fs::File::open(phone_list)?;
    let punctuation = read_punctuation_phones(std::io::BufReader::new(file), phone_list)?;
    Ok(Topology::new(&nonsilence, &silence, &punctuation))
}
