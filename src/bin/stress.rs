//! btree_list Stress Binary
//!
//! Times random-position insert, extract and set passes over lists of
//! growing size (10, 100, 1000, ... up to `--max-size`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use btree_list::{BTreeList, Config, Result};
use clap::{Parser, Subcommand};
use rand::Rng;
use tracing_subscriber::{fmt, EnvFilter};

/// Size multiplier between passes
const STEP: u64 = 10;

/// btree_list stress driver
#[derive(Parser, Debug)]
#[command(name = "btree-list-stress")]
#[command(about = "Time positional operations on persistent B-tree lists")]
#[command(version)]
struct Args {
    /// Scratch directory for list files
    #[arg(short, long, default_value = "./btree_list_stress")]
    dir: String,

    /// B-tree order T
    #[arg(short, long, default_value = "200")]
    order: usize,

    /// Largest list size to test
    #[arg(short, long, default_value = "1000000")]
    max_size: u64,

    /// Upper bound on operations per timed round
    #[arg(short = 'n', long, default_value = "1000")]
    operations: u64,

    /// Timed rounds per list size
    #[arg(short, long, default_value = "10")]
    rounds: u32,

    #[command(subcommand)]
    command: Operation,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Operation {
    /// Insert at random positions
    Insert,
    /// Extract from random positions
    Extract,
    /// Overwrite random positions
    Set,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,btree_list=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    tracing::info!("btree_list stress v{}", btree_list::VERSION);
    tracing::info!("Scratch directory: {}", args.dir);
    tracing::info!("Operation: {:?}, order {}", args.command, args.order);

    if let Err(e) = run(&args) {
        tracing::error!("Stress run failed: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Stress run finished");
}

fn run(args: &Args) -> Result<()> {
    let dir = PathBuf::from(&args.dir);
    fs::create_dir_all(&dir)?;

    let config = Config::builder().order(args.order).build();
    config.validate()?;

    let mut size = STEP;
    while size <= args.max_size {
        let base = dir.join(format!("base_{}.btl", size));
        BTreeList::<i32>::create_with_size(&base, config.clone(), size)?.close()?;

        let operations = (size / STEP).clamp(1, args.operations);
        let mut total_micros = 0u128;

        for _ in 0..args.rounds {
            total_micros += timed_round(args.command, &base, &config, operations)?;
        }

        let per_op = total_micros as f64 / (args.rounds as f64 * operations as f64);
        tracing::info!(
            size,
            operations,
            rounds = args.rounds,
            "{:?}: {:.3} us/op",
            args.command,
            per_op
        );

        fs::remove_file(&base)?;
        size *= STEP;
    }

    Ok(())
}

/// Run `operations` random operations on a copy of `base`, returning the
/// elapsed microseconds
fn timed_round(operation: Operation, base: &Path, config: &Config, operations: u64) -> Result<u128> {
    let copy = base.with_extension("round");
    fs::copy(base, &copy)?;

    let mut list = BTreeList::<i32>::open(&copy, config.clone())?;
    let mut rng = rand::thread_rng();

    let start = Instant::now();
    for _ in 0..operations {
        match operation {
            Operation::Insert => {
                let index = rng.gen_range(0..=list.len());
                list.insert(index, rng.gen())?;
            }
            Operation::Extract => {
                if list.is_empty() {
                    break;
                }
                let index = rng.gen_range(0..list.len());
                list.extract(index)?;
            }
            Operation::Set => {
                let index = rng.gen_range(0..list.len());
                list.set(index, rng.gen())?;
            }
        }
    }
    let elapsed = start.elapsed().as_micros();

    list.close()?;
    fs::remove_file(&copy)?;

    Ok(elapsed)
}
