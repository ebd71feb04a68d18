use clap::{Parser, Subcommand};
use framefit::cache::{self, PlanCache, PlanKey};
use framefit::engine::Engine;
use framefit::imaging::{self, ImageAnalysis};
use framefit::types::{OptimizedConfig, Strategy};
use framefit::{config, output};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared flags for commands that plan placements.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Ignore previously cached plans
    #[arg(long)]
    no_cache: bool,

    /// Directory holding .plan-cache.json
    #[arg(long, default_value = ".")]
    cache_dir: PathBuf,
}

#[derive(Parser)]
#[command(name = "framefit")]
#[command(about = "Plan how an image is scaled, cropped and toned to fit a device screen")]
#[command(long_about = "\
Plan how an image is scaled, cropped and toned to fit a device screen

Each image is decoded once and analysed (resolution, sharpness, noise,
orientation). A plan for a device combines that analysis with the device's
frame spec and a strategy:

  contain   whole image visible, padded
  cover     viewport filled, overflow cropped around a focus point
  fill      alias of cover (never distorts)
  smart     picks contain or cover from the image and the frame (default)

Devices come from the [[devices]] catalog in config.toml; run
'framefit devices' to list them and 'framefit gen-config' for a documented
config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse one or more images
    Analyze {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Plan placement of an image on a device
    Plan {
        image: PathBuf,
        #[arg(long)]
        device: String,
        #[arg(long, default_value = "smart")]
        strategy: Strategy,
        /// Plan every strategy
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        cache: CacheArgs,
    },
    /// Score image/device compatibility
    Check {
        image: PathBuf,
        #[arg(long)]
        device: String,
        #[arg(long)]
        json: bool,
    },
    /// Write a full JSON audit report
    Report {
        image: PathBuf,
        #[arg(long)]
        device: String,
        #[arg(long, default_value = "smart")]
        strategy: Strategy,
        /// Output file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the device catalog
    Devices,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Analyze { images, json } => {
            let engine = load_engine(&cli.config)?;
            let analyses = images
                .par_iter()
                .map(|path| analyze_path(&engine, path))
                .collect::<Result<Vec<_>, _>>()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&analyses)?);
            } else {
                for (path, analysis) in images.iter().zip(&analyses) {
                    output::print_analysis(&path.display().to_string(), analysis);
                }
            }
        }
        Command::Plan {
            image,
            device,
            strategy,
            all,
            json,
            cache: cache_args,
        } => {
            let engine = load_engine(&cli.config)?;
            let frame = engine.frame_for(&device)?;
            let strategies: Vec<Strategy> = if all {
                Strategy::ALL.to_vec()
            } else {
                vec![strategy]
            };

            let mut plan_cache = if cache_args.no_cache {
                PlanCache::empty()
            } else {
                PlanCache::load(&cache_args.cache_dir)
            };
            let image_hash =
                cache::hash_file(&image).map_err(|e| format!("{}: {e}", image.display()))?;
            let policy_hash = cache::hash_policy(engine.config(), &frame)?;

            let mut analysis: Option<ImageAnalysis> = None;
            let mut plans: Vec<OptimizedConfig> = Vec::new();
            for strategy in strategies {
                let key = PlanKey {
                    image_hash: image_hash.clone(),
                    device_id: frame.device_id.clone(),
                    strategy,
                    policy_hash: policy_hash.clone(),
                };
                let plan = plan_cache.get_or_plan(&key, || -> Result<_, BoxError> {
                    // Decoded at most once, and only on a cache miss.
                    let analysis = match analysis {
                        Some(ref a) => a,
                        None => &*analysis.insert(analyze_path(&engine, &image)?),
                    };
                    Ok(engine.plan_placement(analysis, &frame, strategy))
                })?;
                plans.push(plan);
            }
            plan_cache.save(&cache_args.cache_dir)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&plans)?);
            } else {
                for plan in &plans {
                    output::print_plan(&frame, plan);
                }
                println!("{}", output::format_cache_stats(plan_cache.stats()));
            }
        }
        Command::Check {
            image,
            device,
            json,
        } => {
            let engine = load_engine(&cli.config)?;
            let frame = engine.frame_for(&device)?;
            let analysis = analyze_path(&engine, &image)?;
            let report = engine.validate_compatibility(&analysis, &frame);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_compatibility(&frame, &report);
            }
        }
        Command::Report {
            image,
            device,
            strategy,
            out,
        } => {
            let engine = load_engine(&cli.config)?;
            let frame = engine.frame_for(&device)?;
            let analysis = analyze_path(&engine, &image)?;
            let plan = engine.plan_placement(&analysis, &frame, strategy);
            let json = engine.generate_report(&analysis, &frame, &plan).to_json()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    log::info!("wrote report to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Devices => {
            let engine = load_engine(&cli.config)?;
            output::print_devices(&engine.catalog()?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `config.toml` and size the rayon pool from it.
fn load_engine(config_dir: &Path) -> Result<Engine, BoxError> {
    let engine = Engine::new(config::load_config(config_dir)?)?;
    init_thread_pool(&engine.config().processing);
    Ok(engine)
}

/// Decode and analyse one file, prefixing errors with its path.
fn analyze_path(engine: &Engine, path: &Path) -> Result<ImageAnalysis, BoxError> {
    let decoded =
        imaging::decode_file(path).map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(engine
        .analyze_image(&decoded)
        .map_err(|e| format!("{}: {e}", path.display()))?)
}

/// Route `log` output to stderr; `RUST_LOG` overrides `-v`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default));
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
