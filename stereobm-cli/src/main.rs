use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use stereobm::image::io::{load_gray_image, save_gray_image};
use stereobm::{compute_disparity_with, Passthrough, SobelClip, StereoConfig, FILTERED};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "stereobm CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PrefilterConfig {
    #[default]
    Sobel,
    None,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct StereoConfigJson {
    window_size: usize,
    num_disparities: usize,
    lane_width: usize,
    pre_filter_cap: u8,
    texture_threshold: i32,
    uniqueness_ratio: i32,
    parallel: bool,
}

impl Default for StereoConfigJson {
    fn default() -> Self {
        let cfg = StereoConfig::default();
        Self {
            window_size: cfg.window_size,
            num_disparities: cfg.num_disparities,
            lane_width: cfg.lane_width,
            pre_filter_cap: cfg.pre_filter_cap,
            texture_threshold: cfg.texture_threshold,
            uniqueness_ratio: cfg.uniqueness_ratio,
            parallel: cfg.parallel,
        }
    }
}

impl From<StereoConfigJson> for StereoConfig {
    fn from(value: StereoConfigJson) -> Self {
        Self {
            window_size: value.window_size,
            num_disparities: value.num_disparities,
            lane_width: value.lane_width,
            pre_filter_cap: value.pre_filter_cap,
            texture_threshold: value.texture_threshold,
            uniqueness_ratio: value.uniqueness_ratio,
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    left_path: String,
    right_path: String,
    output_path: Option<String>,
    raw_output_path: Option<String>,
    prefilter: PrefilterConfig,
    stereo: StereoConfigJson,
}

#[derive(Debug, Serialize)]
struct RawOutput {
    width: usize,
    height: usize,
    scale: i32,
    filtered: i16,
    valid: usize,
    range: Option<(i16, i16)>,
    data: Vec<i16>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("stereobm=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.left_path.is_empty() || config.right_path.is_empty() {
        return Err("left_path and right_path must be set in the config".into());
    }

    let left = load_gray_image(&config.left_path)?;
    let right = load_gray_image(&config.right_path)?;
    let stereo: StereoConfig = config.stereo.into();

    let map = match config.prefilter {
        PrefilterConfig::Sobel => compute_disparity_with(
            &SobelClip::new(stereo.pre_filter_cap)?,
            left.view(),
            right.view(),
            &stereo,
        )?,
        PrefilterConfig::None => {
            compute_disparity_with(&Passthrough, left.view(), right.view(), &stereo)?
        }
    };
    tracing::info!(
        valid = map.valid_count(),
        total = map.as_slice().len(),
        "disparity computed"
    );

    if let Some(path) = &config.output_path {
        save_gray_image(path, &map.to_gray_normalized()?)?;
    }

    let raw = RawOutput {
        width: map.width(),
        height: map.height(),
        scale: stereobm::DISPARITY_SCALE,
        filtered: FILTERED,
        valid: map.valid_count(),
        range: map.disparity_range(),
        data: map.into_vec(),
    };
    match config.raw_output_path {
        Some(path) => fs::write(path, serde_json::to_string(&raw)?)?,
        None if config.output_path.is_none() => {
            println!("{}", serde_json::to_string_pretty(&summary(&raw))?);
        }
        None => {}
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct Summary {
    width: usize,
    height: usize,
    valid: usize,
    range_px: Option<(f32, f32)>,
}

fn summary(raw: &RawOutput) -> Summary {
    let scale = raw.scale as f32;
    Summary {
        width: raw.width,
        height: raw.height,
        valid: raw.valid,
        range_px: raw
            .range
            .map(|(lo, hi)| (lo as f32 / scale, hi as f32 / scale)),
    }
}
