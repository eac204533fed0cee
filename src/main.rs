use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use blockc::config::{Config, OutputFormat};
use blockc::error::{CompilerError, SyntaxError};
use blockc::samples::Sample;
use blockc::{compile, parse, scan, scan_with_report, Compilation};
use clap::{ArgAction, Parser as ClapParser, Subcommand};
use log::{info, LevelFilter};
use serde::Serialize;

#[derive(ClapParser)]
#[command(author, version, about = "Scanner and grammar checker for block programs")]
struct Cli {
    /// Log more (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    verbose: u8,
    /// Log less (-q, -qq)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    quiet: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a file and print the token report
    Lex {
        file: PathBuf,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Scan and parse a file, printing only the grammar diagnostics
    Parse {
        file: PathBuf,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Run the full pipeline over files, or over the configured sources directory
    Check {
        files: Vec<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Run the pipeline on a built-in sample program
    Sample {
        /// Name of the sample (see --list)
        name: Option<String>,
        /// List the available samples
        #[arg(long)]
        list: bool,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a config file with defaults if none exists
    Init,
    /// Print where the config file lives
    Path,
}

#[derive(Serialize)]
struct FileResult<'a> {
    file: &'a Path,
    #[serde(flatten)]
    compilation: &'a Compilation,
}

fn read_source(path: &Path) -> Result<String, CompilerError> {
    if !path.exists() {
        return Err(CompilerError::FileNotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

fn adjust_level(level: LevelFilter, verbose: u8, quiet: u8) -> LevelFilter {
    const LEVELS: [LevelFilter; 6] = [
        LevelFilter::Off,
        LevelFilter::Error,
        LevelFilter::Warn,
        LevelFilter::Info,
        LevelFilter::Debug,
        LevelFilter::Trace,
    ];
    let base = LEVELS.iter().position(|l| *l == level).unwrap_or(2) as i32;
    let index = (base + verbose as i32 - quiet as i32).clamp(0, LEVELS.len() as i32 - 1);
    LEVELS[index as usize]
}

fn init_logging(config: &Config, cli: &Cli) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(adjust_level(config.level_filter(), cli.verbose, cli.quiet));
    // RUST_LOG, when set, takes precedence over the config and flags.
    builder.parse_default_env();
    builder.init();
}

fn print_syntax_errors(errors: &[SyntaxError]) {
    if errors.is_empty() {
        println!("Parse succeeded.");
    } else {
        println!("Parse failed with {} error(s):", errors.len());
        for error in errors {
            println!("  {}", error);
        }
    }
}

fn print_compilation(compilation: &Compilation) {
    print!("{}", compilation.report);
    print_syntax_errors(&compilation.syntax_errors);
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_check(files: Vec<PathBuf>, format: OutputFormat, config: &Config) -> Result<ExitCode, CompilerError> {
    let files = if files.is_empty() {
        config.source_files()?
    } else {
        files
    };

    let mut failed = false;
    let mut results = Vec::new();
    for path in &files {
        info!("checking {}", path.display());
        let compilation = compile(&read_source(path)?);
        failed |= compilation.has_errors();
        results.push((path, compilation));
    }

    match format {
        OutputFormat::Text => {
            for (path, compilation) in &results {
                println!("==> {}", path.display());
                print_compilation(compilation);
                println!();
            }
        }
        OutputFormat::Json => {
            let results: Vec<FileResult> = results
                .iter()
                .map(|(file, compilation)| FileResult {
                    file: file.as_path(),
                    compilation,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(exit_code(failed))
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_logging(&config, &cli);

    let code = match cli.command {
        Commands::Lex { file, format } => {
            let (stream, report) = scan_with_report(&read_source(&file)?);
            match format.unwrap_or(config.format) {
                OutputFormat::Text => print!("{}", report),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stream)?),
            }
            exit_code(stream.has_errors())
        }
        Commands::Parse { file, format } => {
            let stream = scan(&read_source(&file)?);
            let errors = parse(&stream);
            match format.unwrap_or(config.format) {
                OutputFormat::Text => print_syntax_errors(&errors),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&errors)?),
            }
            exit_code(!errors.is_empty())
        }
        Commands::Check { files, format } => run_check(files, format.unwrap_or(config.format), &config)?,
        Commands::Sample { name, list, format } => {
            let sample = match name {
                Some(name) if !list => {
                    Some(Sample::from_name(&name).ok_or(CompilerError::UnknownSample(name))?)
                }
                _ => None,
            };

            match sample {
                Some(sample) => {
                    let compilation = compile(sample.source());
                    match format.unwrap_or(config.format) {
                        OutputFormat::Text => {
                            println!("=== {} ===", sample.name());
                            println!("{}", sample.source());
                            print_compilation(&compilation);
                        }
                        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&compilation)?),
                    }
                    exit_code(compilation.has_errors())
                }
                None => {
                    println!("Available samples:");
                    for sample in Sample::all() {
                        println!("  {:8} - {}", sample.name(), sample.description());
                    }
                    ExitCode::SUCCESS
                }
            }
        }
        Commands::Config { command } => {
            match command {
                ConfigCommands::Show => {
                    println!("Environment: {}", config.env_name);
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                ConfigCommands::Init => {
                    let path = Config::get_config_path();
                    if path.exists() {
                        println!("Config file already exists at: {}", path.display());
                    } else {
                        Config::default().save_to(&path)?;
                        println!("Initialized new config file at: {}", path.display());
                    }
                }
                ConfigCommands::Path => println!("{}", Config::get_config_path().display()),
            }
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}
