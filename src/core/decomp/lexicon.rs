use std::collections::{BTreeSet, HashMap};
use std::io::BufRead;
use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;
use crate::types::{DecompVariant, GraphemePosition};

/// Keystroke prefixes of lexicon entries that are not input-method decompositions.
const SKIPPED_PREFIXES: [&str; 2] = ["yyy", "z"];

/// A grapheme ID is keyed by its keystroke, plus its position in the
/// positional variant.
pub type GraphemeKey = (String, Option<GraphemePosition>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    /// Grapheme IDs in keystroke order
    pub graphemes: Vec<usize>,
    /// Number of earlier entries sharing the same keystroke set
    pub disambig: usize,
}

/// Character decompositions with their grapheme and disambiguation tables.
#[derive(Debug, Clone)]
pub struct Lexicon {
    variant: DecompVariant,
    grapheme_ids: HashMap<GraphemeKey, usize>,
    grapheme_counts: Vec<usize>,
    entries: HashMap<String, Decomposition>,
    num_disambig: usize,
}

impl Lexicon {
    pub fn open(path: &Path, variant: DecompVariant) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let lexicon = Self::parse(std::io::BufReader::new(file), variant)?;
        info!(
            "Lexicon {:?}: {} characters, {} graphemes, {} disambiguation ids",
            path,
            lexicon.num_characters(),
            lexicon.num_graphemes(),
            lexicon.num_disambig()
        );
        Ok(lexicon)
    }

    /// Parse `keystroke... character` lines.
    pub fn parse<R: BufRead>(reader: R, variant: DecompVariant) -> Result<Self> {
        let mut lexicon = Lexicon {
            variant,
            grapheme_ids: HashMap::new(),
            grapheme_counts: Vec::new(),
            entries: HashMap::new(),
            num_disambig: 0,
        };
        let mut bag_counts: HashMap<BTreeSet<String>, usize> = HashMap::new();

        for line in reader.lines() {
            let line = line?;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let Some((character, keystrokes)) = tokens.split_last() else {
                continue;
            };
            let joined = keystrokes.concat();
            if SKIPPED_PREFIXES.iter().any(|p| joined.starts_with(p)) {
                debug!("Skipping non-decomposition entry for {}", character);
                continue;
            }

            let graphemes = keystrokes
                .iter()
                .enumerate()
                .map(|(i, key)| {
                    let position = match variant {
                        DecompVariant::Plain => None,
                        DecompVariant::Positional => Some(GraphemePosition::of(i, keystrokes.len())),
                    };
                    lexicon.intern((key.to_string(), position))
                })
                .collect();

            let bag: BTreeSet<String> = keystrokes.iter().map(|k| k.to_string()).collect();
            let seen = bag_counts.entry(bag).or_insert(0);
            *seen += 1;
            lexicon.num_disambig = lexicon.num_disambig.max(*seen);

            lexicon.entries.insert(
                character.to_string(),
                Decomposition {
                    graphemes,
                    disambig: *seen - 1,
                },
            );
        }
        Ok(lexicon)
    }

    fn intern(&mut self, key: GraphemeKey) -> usize {
        let next = self.grapheme_ids.len();
        let id = *self.grapheme_ids.entry(key).or_insert(next);
        if id == self.grapheme_counts.len() {
            self.grapheme_counts.push(0);
        }
        self.grapheme_counts[id] += 1;
        id
    }

    pub fn variant(&self) -> DecompVariant {
        self.variant
    }

    pub fn get(&self, character: &str) -> Option<&Decomposition> {
        self.entries.get(character)
    }

    pub fn contains(&self, character: &str) -> bool {
        self.entries.contains_key(character)
    }

    pub fn grapheme_id(&self, key: &str, position: Option<GraphemePosition>) -> Option<usize> {
        self.grapheme_ids.get(&(key.to_string(), position)).copied()
    }

    /// Number of times grapheme `id` occurs across accepted entries.
    pub fn grapheme_count(&self, id: usize) -> usize {
        self.grapheme_counts.get(id).copied().unwrap_or(0)
    }

    pub fn num_graphemes(&self) -> usize {
        self.grapheme_counts.len()
    }

    pub fn num_disambig(&self) -> usize {
        self.num_disambig
    }

    pub fn num_characters(&self) -> usize {
        self.entries.len()
    }
}
