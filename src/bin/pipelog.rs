//! Command-line front end: logs a single message and prints the resulting line.

use std::{env, process};

use pipelog::config::{ConfigFile, DEFAULT_SECTION};
use pipelog::log::{Config, Context, Logger};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

struct Args {
    config: Option<String>,
    section: String,
    level: String,
    message: String,
    context: Context,
}

fn usage(program: &str) -> ! {
    eprintln!("Usage:");
    eprintln!("  {program} [--config FILE] [--section NAME] LEVEL MESSAGE [KEY=VALUE ...]");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {program} info \"user {{id}} logged in\" id=42");
    eprintln!("  {program} --config app.ini warning \"disk at {{pct}}%\" pct=91");
    process::exit(2);
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Args {
    let program = args.next().unwrap_or_else(|| "pipelog".to_owned());
    let mut config = None;
    let mut section = DEFAULT_SECTION.to_owned();
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(args.next().unwrap_or_else(|| usage(&program))),
            "--section" => section = args.next().unwrap_or_else(|| usage(&program)),
            "-h" | "--help" => usage(&program),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let (Some(level), Some(message)) = (positional.next(), positional.next()) else {
        usage(&program);
    };

    let mut context = Context::new();
    for pair in positional {
        match pair.split_once('=') {
            Some((k, v)) => context.insert(k, v),
            None => usage(&program),
        }
    }

    Args {
        config,
        section,
        level,
        message,
        context,
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "pipelog=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = parse_args(env::args());

    let config = match &args.config {
        Some(path) => ConfigFile::load(path).and_then(|file| file.log_config(&args.section)),
        None => Ok(Config::default()),
    };
    let config = config.unwrap_or_else(|e| {
        eprintln!("pipelog: {e} [{}]", e.code());
        process::exit(2);
    });

    let mut logger = Logger::from_config(config);
    match logger.log(args.level.as_str(), &args.message, &args.context) {
        Ok(true) => {
            if let Some(line) = logger.get_last_message(true) {
                print!("{line}");
            }
        }
        Ok(false) => {
            eprintln!("pipelog: message not written ({logger})");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("pipelog: {e} [{}]", e.code());
            process::exit(2);
        }
    }
}
