use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use featprep::{DecompVariant, IamSplit, ImageNetSplit};

#[derive(Parser)]
#[command(name = "featprep", version, about = "Kaldi feature preparation tools")]
pub struct CliArgs {
    /// Enable logging (written to stderr)
    #[arg(long, global = true, default_value_t = false)]
    pub log: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print a chain-model HMM topology with a separate entry for punctuation phones
    GenTopo(GenTopoArgs),
    /// Convert IAM handwriting line images into a feature archive
    IamLines(IamArgs),
    /// Convert ImageNet images into a feature archive with class labels
    Imagenet(ImageNetArgs),
    /// Build the character decomposition matrix for the fixed affine layer
    DecompMatrix(DecompArgs),
}

#[derive(Args)]
pub struct GenTopoArgs {
    /// Non-silence phones as integers separated by colons, e.g. 4:5:6:7:8:9
    pub nonsilence_phones: String,

    /// Silence phones as integers separated by colons, e.g. 1:2:3
    pub silence_phones: String,

    /// File containing all phones and their corresponding number
    pub phone_list: PathBuf,
}

#[derive(Args)]
pub struct IamArgs {
    /// Path to the downloaded IAM data
    pub database_path: PathBuf,

    /// Output directory
    pub dir: PathBuf,

    /// Line list to convert
    #[arg(long, value_enum)]
    pub dataset: Option<IamSplit>,

    /// Where to write the output feature archive ("-" for stdout)
    #[arg(long, default_value = "-")]
    pub out_ark: String,

    /// Height every line image is scaled to
    #[arg(long)]
    pub scale_size: Option<usize>,

    /// JSON file with default parameters; command-line flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImageNetArgs {
    /// Path to the downloaded ImageNet images
    pub database_path: PathBuf,

    /// Path to the bounding-box annotations
    pub database_bbox_path: PathBuf,

    /// Path to the devkit meta data
    pub devkit_path: PathBuf,

    /// Name of the devkit tar file; locates the folder extracted from it
    pub tar_name: String,

    /// Output directory
    pub dir: PathBuf,

    #[arg(long, value_enum)]
    pub dataset: Option<ImageNetSplit>,

    /// Where to write the output feature archive ("-" for stdout)
    #[arg(long, default_value = "-")]
    pub out_ark: String,

    /// Short side a test image is rescaled to before cropping
    #[arg(long)]
    pub scale_size: Option<usize>,

    /// Side of each test crop
    #[arg(long)]
    pub crop_size: Option<usize>,

    /// Synset table: a MAT-file with a `synsets` struct, or a text file with
    /// `WNID ILSVRC_ID [words]` per line; defaults to <devkit>/<tar folder>/data/meta.mat
    #[arg(long)]
    pub synsets: Option<PathBuf>,

    /// JSON file with default parameters; command-line flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct DecompArgs {
    /// Phone list with one `phone pdf-id` line per pdf
    pub phones_path: PathBuf,

    /// Decomposition lexicon (`keystrokes... character` per line)
    pub decomp_path: PathBuf,

    /// Output directory for decomp.mat, decomp.dim and decomp.json
    pub out_dir: PathBuf,

    /// Grapheme ID scheme
    #[arg(long, value_enum)]
    pub variant: Option<DecompVariant>,

    /// Matrix destination overriding <out_dir>/decomp.mat ("-" for stdout)
    #[arg(long)]
    pub out_mat: Option<String>,

    /// Upper bound of uniform noise added to every cell before filling
    #[arg(long)]
    pub noise_scale: Option<f64>,

    /// Seed for the noise generator
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON file with default parameters; command-line flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,
}
