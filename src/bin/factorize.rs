//! Expands the active features of one sample and prints the training example.
//!
//! Usage:
//!   cargo run --release --bin factorize -- [OPTIONS]
//!
//! Options:
//!   --leaf SPEC         Feature type, first leaf first (repeatable, required)
//!   --black N           Active compact index for black (repeatable)
//!   --white N           Active compact index for white (repeatable)
//!   --random N          Add N random active indices per perspective
//!   --seed N            Random seed, 0 for entropy (default: 0)
//!   --option NAME=VAL   Send a message to the options and leaves (repeatable)
//!   --messages FILE     Send `setoption name <id> value <x>` lines from FILE
//!   --config FILE       JSON expansion options
//!   --target V          Target evaluation (default: 0)
//!   --sign S            Target sign, 1 or -1 (default: 1)
//!   --output FILE       Output file path (default: stdout)
//!
//! Leaf specs are `identity:N` or `product:OxI`. Set `RUST_LOG=debug` for
//! layout details.

use std::env;
use std::error::Error;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};

use log::{error, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use nnue_factorizer::factorizer::{build_feature_set_from_specs, FeatureSetFactorizer, LeafSpec};
use nnue_factorizer::trainer::{
    parse_assignment, parse_setoption, Example, ExpansionOptions, Message,
};

#[derive(Default)]
struct Args {
    leaves: Vec<LeafSpec>,
    black: Vec<u32>,
    white: Vec<u32>,
    random: usize,
    seed: u64,
    messages: Vec<Message>,
    messages_path: Option<String>,
    config_path: Option<String>,
    target: i32,
    sign: i8,
    output_path: Option<String>,
}

fn main() {
    env_logger::init();

    let args = match parse_args(env::args().skip(1).collect()) {
        Ok(Some(args)) => args,
        Ok(None) => return,
        Err(e) => {
            eprintln!("{}", e);
            print_usage();
            std::process::exit(2);
        }
    };

    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Returns `Ok(None)` when help was requested.
fn parse_args(argv: Vec<String>) -> Result<Option<Args>, Box<dyn Error>> {
    let mut args = Args {
        sign: 1,
        ..Args::default()
    };

    let mut iter = argv.into_iter();
    while let Some(flag) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .ok_or_else(|| format!("missing value for {}", name))
        };
        match flag.as_str() {
            "--leaf" => args.leaves.push(LeafSpec::parse(&value("--leaf")?)?),
            "--black" => args.black.push(value("--black")?.parse()?),
            "--white" => args.white.push(value("--white")?.parse()?),
            "--random" => args.random = value("--random")?.parse()?,
            "--seed" => args.seed = value("--seed")?.parse()?,
            "--option" => {
                let raw = value("--option")?;
                let message = parse_assignment(&raw)
                    .ok_or_else(|| format!("malformed --option '{}'", raw))?;
                args.messages.push(message);
            }
            "--messages" => args.messages_path = Some(value("--messages")?),
            "--config" => args.config_path = Some(value("--config")?),
            "--target" => args.target = value("--target")?.parse()?,
            "--sign" => {
                args.sign = value("--sign")?.parse()?;
                if args.sign != 1 && args.sign != -1 {
                    return Err("--sign must be 1 or -1".into());
                }
            }
            "--output" => args.output_path = Some(value("--output")?),
            "--help" | "-h" => {
                print_usage();
                return Ok(None);
            }
            other => return Err(format!("unknown argument: {}", other).into()),
        }
    }

    if args.leaves.is_empty() {
        return Err("at least one --leaf is required".into());
    }
    Ok(Some(args))
}

fn run(mut args: Args) -> Result<(), Box<dyn Error>> {
    let mut options = match &args.config_path {
        Some(path) => ExpansionOptions::from_json(&fs::read_to_string(path)?)?,
        None => ExpansionOptions::default(),
    };

    if let Some(path) = &args.messages_path {
        let mut from_file = read_setoption_lines(&fs::read_to_string(path)?)?;
        from_file.append(&mut args.messages);
        args.messages = from_file;
    }

    for message in &mut args.messages {
        options.receive_message(message)?;
        for leaf in &mut args.leaves {
            leaf.receive_message(message)?;
        }
        if message.num_receivers == 0 {
            warn!("message '{}' was not received", message.name);
        }
    }

    let set = build_feature_set_from_specs(&args.leaves)?;
    info!(
        "{} feature types: compact {} expanded {}",
        args.leaves.len(),
        set.compact_dimensions(),
        set.dimensions()
    );

    if args.random > 0 {
        let mut rng = if args.seed != 0 {
            SmallRng::seed_from_u64(args.seed)
        } else {
            SmallRng::from_entropy()
        };
        let compact = set.compact_dimensions();
        if compact == 0 {
            return Err("cannot draw random indices from an empty feature set".into());
        }
        for _ in 0..args.random {
            args.black.push(rng.gen_range(0..compact));
            args.white.push(rng.gen_range(0..compact));
        }
    }

    let example = Example::from_active_indices(
        set.as_ref(),
        [args.black.as_slice(), args.white.as_slice()],
        args.target,
        args.sign,
        &options,
    )?;

    match &args.output_path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_example(&example, &mut writer)?;
            info!("wrote example to {}", path);
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write_example(&example, &mut writer)?;
        }
    }
    Ok(())
}

/// Parses a message file. Blank lines and `#` comments are skipped.
fn read_setoption_lines(text: &str) -> Result<Vec<Message>, Box<dyn Error>> {
    let mut messages = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let message = parse_setoption(line)
            .ok_or_else(|| format!("line {}: expected 'setoption name <id> value <x>'", number + 1))?;
        messages.push(message);
    }
    Ok(messages)
}

/// Writes one example as a JSON line.
fn write_example<W: Write>(example: &Example, out: &mut W) -> io::Result<()> {
    serde_json::to_writer(&mut *out, example)?;
    writeln!(out)?;
    out.flush()
}

fn print_usage() {
    eprintln!("Usage: factorize [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --leaf SPEC        Feature type: identity:N or product:OxI (repeatable)");
    eprintln!("  --black N          Active compact index for black (repeatable)");
    eprintln!("  --white N          Active compact index for white (repeatable)");
    eprintln!("  --random N         Add N random active indices per perspective");
    eprintln!("  --seed N           Random seed, 0 for entropy (default: 0)");
    eprintln!("  --option NAME=VAL  Send a message, e.g. factors[0]=off or weight=0.5");
    eprintln!("  --messages FILE    Send setoption lines from FILE before --option messages");
    eprintln!("  --config FILE      JSON expansion options");
    eprintln!("  --target V         Target evaluation (default: 0)");
    eprintln!("  --sign S           Target sign, 1 or -1 (default: 1)");
    eprintln!("  --output FILE      Output file path (default: stdout)");
    eprintln!("  --help             Show this help");
}
