//! geeplan CLI - build, inspect and submit Earth Engine composite recipes

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use geeplan::{Config, DateRange, EarthEngineClient, Geometry, Recipe, RecipeParams};

#[derive(Parser)]
#[command(name = "geeplan")]
#[command(author, version, about = "Earth Engine composite and export recipes", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to <config dir>/geeplan/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the bundled recipes
    List,
    /// Print the JSON requests a recipe would send
    Plan {
        #[command(flatten)]
        recipe: RecipeArgs,
        /// Write the plan to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Start the recipe's export job (returns once the job is accepted)
    Export {
        #[command(flatten)]
        recipe: RecipeArgs,
    },
    /// Create map tiles for every layer of a recipe
    Map {
        #[command(flatten)]
        recipe: RecipeArgs,
    },
    /// Descriptive statistics for every .tif in a folder (needs the `gdal` feature)
    Stats {
        /// Folder of exported rasters
        folder: PathBuf,
        /// Report file (defaults to <folder>/raster_statistics.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Histogram bins
        #[arg(long, default_value = "50")]
        bins: usize,
    },
}

#[derive(Args)]
struct RecipeArgs {
    /// Recipe name (see `geeplan list`)
    name: String,
    /// Boundary table asset
    #[arg(long)]
    boundary_asset: Option<String>,
    /// GeoJSON file with the boundary's shape, for local extents
    #[arg(long)]
    boundary_geojson: Option<PathBuf>,
    /// First day (YYYY-MM-DD), inclusive
    #[arg(long, requires = "end")]
    start: Option<String>,
    /// Last day (YYYY-MM-DD), exclusive
    #[arg(long, requires = "start")]
    end: Option<String>,
    /// Export resolution in metres
    #[arg(long)]
    scale: Option<f64>,
    /// Export task description
    #[arg(long)]
    description: Option<String>,
    /// Export file name prefix
    #[arg(long)]
    prefix: Option<String>,
    /// Map zoom level
    #[arg(long)]
    zoom: Option<u8>,
}

impl RecipeArgs {
    fn resolve(&self) -> Result<(Recipe, RecipeParams)> {
        let recipe: Recipe = self.name.parse()?;

        let dates = match (&self.start, &self.end) {
            (Some(start), Some(end)) => Some(DateRange::from_dates(start, end)?),
            _ => None,
        };
        let boundary_geometry = match &self.boundary_geojson {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Some(Geometry::from_geojson(&text)?)
            }
            None => None,
        };

        Ok((
            recipe,
            RecipeParams {
                boundary_asset: self.boundary_asset.clone(),
                boundary_geometry,
                dates,
                scale: self.scale,
                description: self.description.clone(),
                file_name_prefix: self.prefix.clone(),
                zoom: self.zoom,
            },
        ))
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::List => {
            for recipe in Recipe::ALL {
                println!("{:<20} {}", recipe.name(), recipe.summary());
            }
        }

        Commands::Plan { recipe, output } => {
            let (recipe, params) = recipe.resolve()?;
            let script = recipe.build(&params, &config)?;
            let text = serde_json::to_string_pretty(&script.plan()?)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    log::info!("Plan written to {}", path.display());
                }
                None => println!("{}", text),
            }
        }

        Commands::Export { recipe } => {
            let (recipe, params) = recipe.resolve()?;
            let script = recipe.build(&params, &config)?;
            let export = script
                .export
                .as_ref()
                .with_context(|| format!("Recipe {} has no export (try --scale)", recipe))?;

            let client = EarthEngineClient::new(&config)?;
            let task = client.start_export(export)?;
            println!("Started export '{}' as {}", export.description(), task.name);
            println!("Track progress in the Earth Engine task manager.");
        }

        Commands::Map { recipe } => {
            let (recipe, params) = recipe.resolve()?;
            let script = recipe.build(&params, &config)?;
            let client = EarthEngineClient::new(&config)?;
            for layer in script.map.layers() {
                let map = client.create_map(layer)?;
                println!("{}: {}", layer.name, client.tile_url(&map));
            }
        }

        #[cfg(not(feature = "gdal"))]
        Commands::Stats { .. } => {
            anyhow::bail!("Raster statistics require building with --features gdal");
        }

        #[cfg(feature = "gdal")]
        Commands::Stats { folder, output, bins } => {
            let params = geeplan::core::StatisticsParams { histogram_bins: bins };
            let reports = geeplan::io::summarize_folder(&folder, &params)?;
            for report in &reports {
                println!("\n{}", report.file);
                for (label, value) in report.statistics.rows() {
                    println!("  {:<15} {:.4}", label, value);
                }
            }
            let output = output.unwrap_or_else(|| folder.join("raster_statistics.json"));
            geeplan::io::write_report(&output, &reports)?;
            println!("\nAll rasters processed. Output saved to: {}", output.display());
        }
    }

    Ok(())
}
