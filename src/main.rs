use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use sbwt::block::DEFAULT_BLOCK_SIZE;
use sbwt::cli::{
    compress_file, decompress_file, default_output_path, load_key, show_info, show_info_json,
    CompressOptions, DecompressOptions,
};
use sbwt::header::CodecId;
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Version info from build.rs
const VERSION: &str = env!("SBWT_VERSION");
const BUILD: &str = env!("SBWT_BUILD");
const PROFILE: &str = env!("SBWT_PROFILE");
const GIT_HASH: &str = env!("SBWT_GIT_HASH");

/// Combined version string (compile-time concatenation not possible, so we build at runtime)
fn get_version() -> &'static str {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();
    VERSION_STRING.get_or_init(|| {
        format!("{} {} build {} ({})", PROFILE, VERSION, BUILD, GIT_HASH)
    })
}

#[derive(Parser)]
#[command(name = "sbwt")]
#[command(author, about = "Keyed block-sorting compressor", long_about = None)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write log output to this file
    #[arg(short, long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into an archive
    #[command(alias = "c")]
    Compress {
        /// Secret key
        #[arg(long, conflicts_with = "key_file", required_unless_present = "key_file")]
        key: Option<String>,

        /// Read the secret key from a file (surrounding whitespace is trimmed)
        #[arg(long)]
        key_file: Option<PathBuf>,

        /// Entropy coder
        #[arg(long, default_value = "huffman", value_parser = parse_codec)]
        codec: CodecId,

        /// Block size in bytes (1 B to 64 MiB)
        #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,

        /// Store an integrity tag so a wrong key is reported instead of
        /// producing garbage
        #[arg(long)]
        tag: bool,

        /// Input file
        input: PathBuf,

        /// Output archive (defaults to INPUT.sbwt)
        output: Option<PathBuf>,
    },

    /// Decompress an archive
    #[command(alias = "d")]
    Decompress {
        /// Secret key
        #[arg(long, conflicts_with = "key_file", required_unless_present = "key_file")]
        key: Option<String>,

        /// Read the secret key from a file (surrounding whitespace is trimmed)
        #[arg(long)]
        key_file: Option<PathBuf>,

        /// Input archive
        input: PathBuf,

        /// Output file
        output: PathBuf,
    },

    /// Show information about an archive
    #[command(alias = "i")]
    Info {
        /// Archive to inspect
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_codec(s: &str) -> Result<CodecId, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<(), String> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        let file = File::create(path)
            .map_err(|e| format!("cannot open log file {}: {}", path.display(), e))?;
        loggers.push(WriteLogger::new(
            level.max(LevelFilter::Info),
            Config::default(),
            file,
        ));
    }

    CombinedLogger::init(loggers).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Handle --version flag
    if cli.version {
        println!("sbwt {}", get_version());
        return ExitCode::SUCCESS;
    }

    // Require a command if not showing version
    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            // Show help when no command provided
            use clap::CommandFactory;
            let _ = Cli::command().print_help();
            println!();
            return ExitCode::SUCCESS;
        }
    };

    if let Err(e) = init_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let result = match command {
        Commands::Compress {
            key,
            key_file,
            codec,
            block_size,
            tag,
            input,
            output,
        } => {
            let output = output.unwrap_or_else(|| default_output_path(&input));
            load_key(key.as_deref(), key_file.as_deref()).and_then(|key| {
                let options = CompressOptions {
                    key,
                    codec,
                    block_size,
                    tag,
                };
                let report = compress_file(&input, &output, &options)?;
                println!(
                    "Compressed {} bytes into {} blocks ({} bytes, {:.1}%) to {}",
                    report.original_bytes,
                    report.blocks,
                    report.archive_bytes,
                    report.ratio(),
                    output.display()
                );
                Ok(())
            })
        }

        Commands::Decompress {
            key,
            key_file,
            input,
            output,
        } => load_key(key.as_deref(), key_file.as_deref()).and_then(|key| {
            let options = DecompressOptions { key };
            let report = decompress_file(&input, &output, &options)?;
            println!(
                "Decompressed {} blocks ({} bytes) to {}",
                report.blocks,
                report.original_bytes,
                output.display()
            );
            Ok(())
        }),

        Commands::Info { file, json } => {
            let info = if json {
                show_info_json(&file).map(|s| s + "\n")
            } else {
                show_info(&file)
            };
            info.map(|info| print!("{}", info))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
