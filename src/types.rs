//! Shared types and enums used across featprep.
//! Includes the dataset splits (`IamSplit`, `ImageNetSplit`), the
//! decomposition variant (`DecompVariant`) and `GraphemePosition`.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Subsets of the IAM large writer-independent text line task.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IamSplit {
    Trainset,
    Testset,
    Validationset1,
    Validationset2,
}

impl IamSplit {
    /// File stem of the split's line list.
    pub fn list_name(&self) -> &'static str {
        match self {
            IamSplit::Trainset => "trainset",
            IamSplit::Testset => "testset",
            IamSplit::Validationset1 => "validationset1",
            IamSplit::Validationset2 => "validationset2",
        }
    }
}

impl std::fmt::Display for IamSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.list_name())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageNetSplit {
    Train,
    Test,
}

impl std::fmt::Display for ImageNetSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageNetSplit::Train => write!(f, "train"),
            ImageNetSplit::Test => write!(f, "test"),
        }
    }
}

/// How grapheme IDs are assigned when building the decomposition matrix.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecompVariant {
    /// One ID per keystroke symbol.
    Plain,
    /// One ID per (keystroke, begin/middle/end position) pair.
    Positional,
}

impl std::fmt::Display for DecompVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecompVariant::Plain => write!(f, "plain"),
            DecompVariant::Positional => write!(f, "positional"),
        }
    }
}

/// Position of a keystroke inside a character's decomposition.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum GraphemePosition {
    Begin,
    Middle,
    End,
}

impl GraphemePosition {
    /// Index 0 is Begin, the last index of a sequence longer than one is End,
    /// everything else is Middle.
    pub fn of(index: usize, len: usize) -> Self {
        if index == 0 {
            GraphemePosition::Begin
        } else if index + 1 == len {
            GraphemePosition::End
        } else {
            GraphemePosition::Middle
        }
    }
}
