//! Schematic Resolver CLI
//!
//! Inspect schematic regions and resolve their blocks into face records.

use clap::{Parser, Subcommand};
use schematic_resolver::{
    load_resource_pack, BlockEntry, BlockPosition, Identifier, Pipeline, PipelineConfig, PropertyValue,
    RegionSource, Regions,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "schematic-resolver")]
#[command(author, version, about = "Resolve Litematica schematic regions into textured faces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the regions of a schematic and their palettes
    Inspect {
        /// Schematic regions as simplified NBT JSON
        #[arg(long)]
        regions: PathBuf,
    },

    /// Resolve a single block state (useful for testing)
    Resolve {
        /// Block name (e.g., "minecraft:oak_stairs" or "oak_stairs")
        #[arg(short, long)]
        block: String,

        /// Block properties as key=value pairs (e.g., "facing=north")
        #[arg(short, long, value_parser = parse_property)]
        property: Vec<(String, String)>,

        /// Path to resource pack (ZIP or directory)
        #[arg(short, long)]
        resource_pack: PathBuf,

        /// Pin the variant picker
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Resolve every block of a schematic into face records
    Faces {
        /// Schematic regions as simplified NBT JSON
        #[arg(long)]
        regions: PathBuf,

        /// Only this region
        #[arg(long)]
        region: Option<String>,

        /// Path to resource pack (ZIP or directory)
        #[arg(short, long)]
        resource_pack: PathBuf,

        /// Pipeline configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use all threads
        #[arg(long)]
        parallel: bool,
    },
}

fn parse_property(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("Invalid property format: '{}'. Use key=value", s)),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { regions } => inspect(&regions)?,
        Commands::Resolve {
            block,
            property,
            resource_pack,
            seed,
        } => resolve_block(&block, property, &resource_pack, seed)?,
        Commands::Faces {
            regions,
            region,
            resource_pack,
            config,
            output,
            parallel,
        } => faces(&regions, region.as_deref(), &resource_pack, config.as_deref(), output.as_deref(), parallel)?,
    }

    Ok(())
}

fn load_regions(path: &Path) -> Result<Regions, Box<dyn std::error::Error>> {
    let file = fs::File::open(path)?;
    Ok(Regions::from_reader(std::io::BufReader::new(file))?)
}

fn inspect(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let regions = load_regions(path)?;
    println!("{} region(s) in {:?}", regions.len(), path);

    for region in regions.iter() {
        let bounds = region.bounds();
        let counts = region.palette_counts()?;
        println!("\nRegion {}", region.name);
        println!("  Size: {} x {} x {}", region.size.x, region.size.y, region.size.z);
        println!(
            "  Bounds: ({}, {}, {}) to ({}, {}, {})",
            bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
        );
        println!("  Bits per entry: {}", region.bits_per_entry());
        println!("  Palette:");
        for (entry, count) in region.palette.iter().zip(counts) {
            println!("    {:>8}  {}", count, entry.state_key());
        }
    }
    Ok(())
}

fn resolve_block(
    block: &str,
    properties: Vec<(String, String)>,
    resource_pack: &Path,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let pack = load_resource_pack(resource_pack)?;
    let mut config = PipelineConfig::default().with_skip_air(false);
    if let Some(seed) = seed {
        config = config.with_variant_seed(seed);
    }
    let pipeline = Pipeline::with_config(pack, config);

    let entry = BlockEntry::new(
        Identifier::parse(block),
        properties
            .iter()
            .map(|(k, v)| (k.as_str(), PropertyValue::parse(v)))
            .collect(),
    );

    let parts = pipeline.resolve(&entry)?;
    println!("{} resolves to {} model(s):", entry.state_key(), parts.len());
    for part in &parts {
        let transform = part.transform();
        println!(
            "  {} (x={}, y={}, uvlock={}): {} element(s)",
            part.model.id,
            transform.x,
            transform.y,
            transform.uvlock,
            part.model.elements.len()
        );
        for (variable, texture) in &part.model.textures {
            println!("    #{} = {}", variable, texture);
        }
    }
    println!("  Block type: {:?}", pipeline.classify(&entry, &parts));

    let faces = pipeline.block_faces(&entry, BlockPosition::new(0, 0, 0))?;
    println!("{}", serde_json::to_string_pretty(&faces)?);
    Ok(())
}

fn faces(
    regions_path: &Path,
    region: Option<&str>,
    resource_pack: &Path,
    config_path: Option<&Path>,
    output: Option<&Path>,
    parallel: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => PipelineConfig::from_json_str(&fs::read_to_string(path)?)?,
        None => PipelineConfig::default(),
    };
    let regions = load_regions(regions_path)?;
    let pack = load_resource_pack(resource_pack)?;
    let pipeline = Pipeline::with_config(pack, config);

    let results = if parallel {
        let names = match region {
            Some(name) => vec![name],
            None => regions.region_names(),
        };
        let mut results = Vec::with_capacity(names.len());
        for name in names {
            let region = regions
                .region(name)
                .ok_or_else(|| format!("No region named {:?}", name))?;
            results.push(pipeline.par_region_faces(region)?);
        }
        results
    } else {
        pipeline.source_faces(&regions, region)?
    };

    for result in &results {
        log::info!(
            "Region {}: {} blocks, {} faces, {} failures",
            result.region,
            result.blocks.len(),
            result.face_count(),
            result.failures.len()
        );
    }
    let stats = pipeline.assets().stats();
    log::info!(
        "Asset cache: {} hits, {} misses, {} entries",
        stats.hits,
        stats.misses,
        stats.entries
    );

    let json = serde_json::to_string(&results)?;
    match output {
        Some(path) => {
            fs::write(path, json)?;
            println!("Wrote face records to {:?}", path);
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
