use std::path::{Path, PathBuf};

use clap::{Arg, ArgAction, ArgMatches, Command};

mod cache;
mod config;
mod errors;
mod formatter;
mod mdx;
mod pipeline;
mod processor;
mod rules;
mod source;
mod stardict;
mod util;
mod writer;

use config::*;
use errors::*;
use pipeline::*;
use stardict::*;
use util::*;


fn cli() -> Command {
    let file = || Arg::new("file")
        .help("Spreadsheet (xlsx, ods) or tab separated export (tsv, txt, bz2)")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf));

    Command::new("volubilis_rs")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds offline Thai-English dictionaries from the Volubilis spreadsheet")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("txt")
            .about("Processes the spreadsheet into dictionary texts")
            .arg(file()))
        .subcommand(Command::new("stardict")
            .about("Converts the dictionary texts to StarDict and packages them"))
        .subcommand(Command::new("workflow")
            .about("txt, then stardict")
            .arg(file()))
        .subcommand(Command::new("mdx")
            .about("Prepares a dictionary text for MdxBuilder")
            .arg(Arg::new("file")
                .help("Dictionary text (.txt)")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)))
            .arg(Arg::new("limit")
                .help("Number of 100 line blocks to convert")
                .value_parser(clap::value_parser!(usize))))
        .subcommand(Command::new("clean")
            .about("Removes the output directories"))
        .arg(Arg::new("config")
            .long("config")
            .short('c')
            .global(true)
            .help("TOML configuration file")
            .value_parser(clap::value_parser!(PathBuf)))
        .arg(Arg::new("output-dir")
            .long("output-dir")
            .short('o')
            .global(true)
            .help("Directory of the dictionary texts")
            .value_parser(clap::value_parser!(PathBuf)))
        .arg(Arg::new("columns")
            .long("columns")
            .global(true)
            .help("Number of spreadsheet columns")
            .value_parser(clap::value_parser!(usize)))
        .arg(Arg::new("no-paiboon")
            .long("no-paiboon")
            .global(true)
            .help("Keeps the tone markers of the source transcription")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("debug-rows")
            .long("debug-rows")
            .global(true)
            .help("Stops after the configured row limit")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("no-cache")
            .long("no-cache")
            .global(true)
            .action(ArgAction::SetTrue))
        .arg(Arg::new("refresh-cache")
            .long("refresh-cache")
            .global(true)
            .help("Ignores the cache and rebuilds it")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("mobi")
            .long("mobi")
            .global(true)
            .help("Also builds MOBI e-books (needs calibre)")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("verbose")
            .long("verbose")
            .short('v')
            .global(true)
            .action(ArgAction::SetTrue))
}

/// Configuration file, then command line overrides.
fn build_config(matches: &ArgMatches, source_file: Option<&PathBuf>) -> Result<Config> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(path) = source_file {
        config.source_file = path.clone();
    }
    if let Some(dir) = matches.get_one::<PathBuf>("output-dir") {
        config.output_dir = dir.clone();
    }
    if let Some(columns) = matches.get_one::<usize>("columns") {
        config.columns = *columns;
    }
    if matches.get_flag("no-paiboon") {
        config.paiboon = false;
    }
    if matches.get_flag("debug-rows") {
        config.row_limit_debug = true;
    }
    if matches.get_flag("no-cache") {
        config.use_cache = false;
    }
    if matches.get_flag("refresh-cache") {
        config.force_refresh_cache = true;
    }
    if matches.get_flag("mobi") {
        config.enable_mobi_build = true;
    }
    Ok(config)
}

fn run_txt(config: &Config) -> Result<()> {
    let summary = Pipeline::new(config)?.run()?;
    if summary.from_cache {
        log::info!("{} entries restored from cache", summary.entries);
    } else {
        log::info!("{} rows read, {} entries, {} skipped",
                   summary.rows_read, summary.entries, summary.skipped);
    }
    Ok(())
}

fn run_stardict(config: &Config) -> Result<()> {
    StardictBuilder::new(&config.output_dir, &config.stardict_dir).build(config)?;
    Ok(())
}

fn run_clean(config: &Config) -> Result<()> {
    for dir in &[&config.output_dir, &config.stardict_dir] {
        if remove_dir_if_exists(dir)? {
            log::info!("Removed {}", dir.display());
        }
    }
    Ok(())
}

/// Execute command.
fn command_runner(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("txt", sub)) => run_txt(&build_config(sub, sub.get_one::<PathBuf>("file"))?),
        Some(("stardict", sub)) => run_stardict(&build_config(sub, None)?),
        Some(("workflow", sub)) => {
            let config = build_config(sub, sub.get_one::<PathBuf>("file"))?;
            run_txt(&config).and_then(|_| run_stardict(&config))?;
            log::info!("Processing completed successfully");
            Ok(())
        },
        Some(("mdx", sub)) => {
            let file = sub.get_one::<PathBuf>("file").map_or(Path::new(""), |p| p.as_path());
            mdx::convert_file(file, sub.get_one::<usize>("limit").copied())?;
            Ok(())
        },
        Some(("clean", sub)) => run_clean(&build_config(sub, None)?),
        _ => Ok(()),
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info });
    }
    builder.format_timestamp_secs().init();
}

fn main() {
    let matches = cli().get_matches();

    let verbose = matches.subcommand().map_or(false, |(_, sub)| sub.get_flag("verbose"));
    init_logging(verbose);

    if let Err(e) = command_runner(&matches) {
        log::error!("Processing failed: {}", e);
        std::process::exit(1);
    }
}
