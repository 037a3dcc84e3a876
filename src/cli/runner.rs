use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::EnvFilter;

use featprep::io::writers::open_output;
use featprep::{
    DecompParams, IamParams, ImageNetParams, ImageNetSource, convert_iam_lines, convert_imagenet,
    generate_topology, load_params, write_decomposition_matrix,
};

use super::args::{CliArgs, Command, DecompArgs, GenTopoArgs, IamArgs, ImageNetArgs};
use super::errors::AppError;

fn base_params<T: DeserializeOwned + Default>(config: Option<&Path>) -> Result<T, AppError> {
    match config {
        Some(path) => {
            info!("Loading parameters from {:?}", path);
            Ok(load_params(path)?)
        }
        None => Ok(T::default()),
    }
}

fn require_positive(arg: &'static str, size: usize) -> Result<usize, AppError> {
    if size == 0 {
        return Err(AppError::ZeroSize { arg, size });
    }
    Ok(size)
}

fn run_gen_topo(args: GenTopoArgs) -> Result<(), AppError> {
    let topo = generate_topology(&args.nonsilence_phones, &args.silence_phones, &args.phone_list)?;
    let mut out = open_output("-")?;
    out.write_all(topo.render().as_bytes())?;
    out.flush()?;
    Ok(())
}

fn run_iam(args: IamArgs) -> Result<(), AppError> {
    let mut params: IamParams = base_params(args.config.as_deref())?;
    if let Some(dataset) = args.dataset {
        params.dataset = dataset;
    }
    if let Some(size) = args.scale_size {
        params.scale_size = size;
    }
    require_positive("scale_size", params.scale_size)?;

    let mut out = open_output(&args.out_ark)?;
    let report = convert_iam_lines(&args.database_path, &args.dir, &params, &mut out)?;
    info!("Processed: {}", report.matrices);
    Ok(())
}

fn run_imagenet(args: ImageNetArgs) -> Result<(), AppError> {
    let mut params: ImageNetParams = base_params(args.config.as_deref())?;
    if let Some(dataset) = args.dataset {
        params.dataset = dataset;
    }
    if let Some(size) = args.scale_size {
        params.scale_size = size;
    }
    if let Some(size) = args.crop_size {
        params.crop_size = size;
    }
    if args.synsets.is_some() {
        params.synsets = args.synsets;
    }
    require_positive("scale_size", params.scale_size)?;
    require_positive("crop_size", params.crop_size)?;
    if params.crop_size > params.scale_size {
        return Err(AppError::CropLargerThanScale {
            crop: params.crop_size,
            scale: params.scale_size,
        });
    }

    let source = ImageNetSource {
        database: &args.database_path,
        bbox_root: &args.database_bbox_path,
        devkit: &args.devkit_path,
        tar_name: &args.tar_name,
    };
    let mut out = open_output(&args.out_ark)?;
    let report = convert_imagenet(&source, &args.dir, &params, &mut out)?;
    info!("Processed: {}", report.matrices);
    info!("Skipped: {}", report.skipped);
    Ok(())
}

fn run_decomp(args: DecompArgs) -> Result<(), AppError> {
    let mut params: DecompParams = base_params(args.config.as_deref())?;
    if let Some(variant) = args.variant {
        params.variant = variant;
    }
    if let Some(noise) = args.noise_scale {
        params.noise_scale = noise;
    }
    if let Some(seed) = args.seed {
        params.seed = seed;
    }
    if !params.noise_scale.is_finite() || params.noise_scale < 0.0 {
        return Err(AppError::InvalidNoise(params.noise_scale));
    }

    let decomp = write_decomposition_matrix(
        &args.phones_path,
        &args.decomp_path,
        &args.out_dir,
        args.out_mat.as_deref(),
        &params,
    )?;
    info!(
        "Decomposition matrix: {} x {}",
        decomp.layout.rows(),
        decomp.layout.cols()
    );
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match args.command {
        Command::GenTopo(a) => run_gen_topo(a)?,
        Command::IamLines(a) => run_iam(a)?,
        Command::Imagenet(a) => run_imagenet(a)?,
        Command::DecompMatrix(a) => run_decomp(a)?,
    }
    Ok(())
}
