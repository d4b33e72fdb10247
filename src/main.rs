use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use morphogen::colormap::ColorMap;
use morphogen::config::Config;
use morphogen::fractal::FractalKind;
use morphogen::model::ModelId;
use morphogen::stepper::Backend;
use morphogen::viewer::{self, Mode};

#[derive(Parser)]
#[command(name = "morphogen", version, about = "Reaction-diffusion lab and fractal explorer")]
struct Cli {
    /// JSON config file; flags given on the command line override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a reaction-diffusion model.
    Patterns(PatternsArgs),
    /// Explore fractals.
    Fractals(FractalsArgs),
}

#[derive(Args)]
struct PatternsArgs {
    /// Model id, e.g. gray-scott or brusselator.
    #[arg(long)]
    model: Option<ModelId>,
    /// Grid edge in cells.
    #[arg(long)]
    size: Option<u32>,
    /// Simulation steps per frame.
    #[arg(long)]
    steps: Option<u32>,
    #[arg(long)]
    colormap: Option<ColorMap>,
    #[arg(long, value_enum)]
    backend: Option<Backend>,
    /// Seed for reproducible initial conditions.
    #[arg(long)]
    seed: Option<u64>,
    /// Start with side-by-side comparison on.
    #[arg(long)]
    compare: bool,
}

#[derive(Args)]
struct FractalsArgs {
    /// Fractal kind, e.g. julia or burning-ship.
    #[arg(long)]
    kind: Option<FractalKind>,
    #[arg(long)]
    max_iter: Option<u32>,
    #[arg(long)]
    palette: Option<ColorMap>,
    /// Click on the Mandelbrot set to open its Julia set.
    #[arg(long)]
    linked: bool,
    #[arg(long)]
    infinite_zoom: bool,
}

fn mode(cli: Cli) -> Result<Mode, Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    Ok(match cli.command {
        Command::Patterns(args) => {
            let mut lab = config.lab_config()?;
            if let Some(model) = args.model {
                lab = lab.with_model(model);
            }
            if let Some(size) = args.size {
                lab = lab.with_size(size);
            }
            if let Some(steps) = args.steps {
                lab = lab.with_steps_per_frame(steps);
            }
            if let Some(colormap) = args.colormap {
                lab = lab.with_colormap(colormap);
            }
            if let Some(backend) = args.backend {
                lab = lab.with_backend(backend);
            }
            if let Some(seed) = args.seed {
                lab = lab.with_seed(seed);
            }
            if args.compare {
                lab = lab.with_comparison(true);
            }
            Mode::Patterns(lab)
        }
        Command::Fractals(args) => {
            let mut explorer = config.explorer_config()?;
            if let Some(kind) = args.kind {
                explorer = explorer.with_kind(kind);
            }
            if let Some(max_iter) = args.max_iter {
                explorer = explorer.with_max_iter(max_iter);
            }
            if let Some(palette) = args.palette {
                explorer = explorer.with_palette(palette);
            }
            if args.linked {
                explorer = explorer.with_linked(true);
            }
            if args.infinite_zoom {
                explorer = explorer.with_infinite_zoom(true);
            }
            Mode::Fractals(explorer)
        }
    })
}

fn run() -> Result<(), Box<dyn Error>> {
    let mode = mode(Cli::parse())?;
    viewer::run(mode)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
