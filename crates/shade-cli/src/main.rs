//! `shadegen`: generate ShadeChange levels from the command line.

use anyhow::Context;
use clap::Parser;
use shade_core::{render, Generator, GeneratorConfig};

/// Generate levels for ShadeChange.
#[derive(Debug, Parser)]
#[command(name = "shadegen", version, about)]
struct Args {
    /// Level width in cells.
    #[arg(long, default_value_t = 4)]
    width: i32,

    /// Level height in cells.
    #[arg(long, default_value_t = 4)]
    height: i32,

    /// Directional moves the shortest solution must take.
    #[arg(long, default_value_t = 3)]
    steps: usize,

    /// Board swaps the level is built around.
    #[arg(long, default_value_t = 0)]
    swaps: usize,

    /// Free blocks to place beyond the slide stoppers.
    #[arg(long, default_value_t = 0)]
    blocks: usize,

    /// Place an enemy entity.
    #[arg(long)]
    enable_enemy: bool,

    /// Place spiral hazards.
    #[arg(long)]
    enable_spiral: bool,

    /// Seed for reproducible generation; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Whole-level attempts before giving up.
    #[arg(long, default_value_t = 50)]
    max_attempts: usize,

    /// Print the human-oriented rendering instead of the machine dump.
    #[arg(long)]
    pretty: bool,

    /// Print the level as JSON.
    #[arg(long, conflicts_with = "pretty")]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = GeneratorConfig {
        width: args.width,
        height: args.height,
        steps: args.steps,
        swaps: args.swaps,
        blocks: args.blocks,
        enable_enemy: args.enable_enemy,
        enable_spiral: args.enable_spiral,
        max_attempts: args.max_attempts,
    };
    let mut generator = match args.seed {
        Some(seed) => Generator::with_seed(config, seed),
        None => Generator::new(config),
    };
    let level = generator.generate().context("level generation failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&level)?);
    } else if args.pretty {
        print!("{}", render::render_level(&level));
    } else {
        print!("{}", render::dump_level(&level));
    }
    Ok(())
}
