use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cspforge::config::Config;
use cspforge::error::CspError;
use cspforge::extract::ExtractOptions;
use cspforge::hash::HashAlgorithm;
use cspforge::output::OutputFormat;
use cspforge::policy::{validate, Modification, Severity};
use cspforge::BuildOptions;

#[derive(Parser)]
#[command(
    name = "cspforge",
    about = "Content-Security-Policy generator for static HTML",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a CSP header from one or more HTML files or directories
    Scan {
        /// HTML files or directories to process
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Existing CSP header to extend (default: generate a strict policy)
        #[arg(long)]
        csp: Option<String>,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Hash algorithm (sha256, sha384, sha512)
        #[arg(long)]
        hash_algo: Option<String>,

        /// Collect external resources and add their origins to the policy
        #[arg(long)]
        external: bool,

        /// Infer additional origins the pages will need (implies --external)
        #[arg(long)]
        heuristics: bool,

        /// Add require-trusted-types-for 'script' to the generated policy
        #[arg(long)]
        trusted_types: bool,

        /// Directive edit, add:<directive>:<value> or remove:<directive>:<value>
        /// (repeatable, applied in order)
        #[arg(long = "modify", short = 'm')]
        modifications: Vec<String>,

        /// Skip inline <script> elements
        #[arg(long)]
        no_scripts: bool,

        /// Skip inline <style> tags
        #[arg(long)]
        no_styles: bool,

        /// Skip style attributes
        #[arg(long)]
        no_style_attrs: bool,

        /// Skip event handler attributes (onclick, ...)
        #[arg(long)]
        no_event_handlers: bool,

        /// Skip validation of the resulting policy
        #[arg(long)]
        no_validate: bool,

        /// Output format (console, json)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Validate an existing CSP header and report misconfigurations
    Validate {
        /// The CSP header string
        csp: String,
    },

    /// List the heuristic inference rules
    ListRules {
        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .cspforge.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan {
            paths,
            csp,
            config,
            hash_algo,
            external,
            heuristics,
            trusted_types,
            modifications,
            no_scripts,
            no_styles,
            no_style_attrs,
            no_event_handlers,
            no_validate,
            format,
            output,
        } => cmd_scan(ScanArgs {
            paths,
            csp,
            config,
            hash_algo,
            external,
            heuristics,
            trusted_types,
            modifications,
            no_scripts,
            no_styles,
            no_style_attrs,
            no_event_handlers,
            no_validate,
            format,
            output,
        }),
        Commands::Validate { csp } => cmd_validate(csp),
        Commands::ListRules { format } => cmd_list_rules(format),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

struct ScanArgs {
    paths: Vec<PathBuf>,
    csp: Option<String>,
    config: Option<PathBuf>,
    hash_algo: Option<String>,
    external: bool,
    heuristics: bool,
    trusted_types: bool,
    modifications: Vec<String>,
    no_scripts: bool,
    no_styles: bool,
    no_style_attrs: bool,
    no_event_handlers: bool,
    no_validate: bool,
    format: String,
    output: Option<PathBuf>,
}

fn cmd_scan(args: ScanArgs) -> Result<i32, CspError> {
    let format = OutputFormat::from_str_lenient(&args.format).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", args.format);
        OutputFormat::Console
    });

    let hash_algorithm = match args.hash_algo {
        Some(s) => Some(
            HashAlgorithm::from_str_lenient(&s).ok_or(CspError::UnknownAlgorithm(s))?,
        ),
        None => None,
    };

    let modifications = args
        .modifications
        .iter()
        .map(|spec| Modification::parse(spec))
        .collect::<Result<Vec<_>, _>>()?;

    let options = BuildOptions {
        config_path: args.config,
        csp: args.csp,
        hash_algorithm,
        include_external: args.external.then_some(true),
        heuristics: args.heuristics.then_some(true),
        validate: args.no_validate.then_some(false),
        require_trusted_types: args.trusted_types,
        modifications,
        extract: ExtractOptions {
            scripts: !args.no_scripts,
            styles: !args.no_styles,
            style_attrs: !args.no_style_attrs,
            event_handlers: !args.no_event_handlers,
        },
    };

    let report = cspforge::build(&args.paths, &options)?;
    let rendered = cspforge::render_report(&report, format)?;

    match args.output {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    Ok(0)
}

fn cmd_validate(csp: String) -> Result<i32, CspError> {
    let result = validate(&csp);

    if result.is_clean() {
        println!("CSP validation passed with no warnings");
        return Ok(0);
    }

    if !result.valid {
        println!("CSP validation failed");
    } else {
        println!("CSP validation passed with {} warning(s)", result.warnings.len());
    }
    println!();

    for warning in &result.warnings {
        let tag = match warning.severity {
            Severity::Error => "[ERROR]  ",
            Severity::Warning => "[WARNING]",
        };
        println!("{} {}", tag, warning.message);
        println!("          fix: {}", warning.fix);
    }

    Ok(if result.valid { 0 } else { 1 })
}

fn cmd_list_rules(format: String) -> Result<i32, CspError> {
    let rules = cspforge::infer::rule_catalog();

    match format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&rules)?;
            println!("{}", json);
        }
        _ => {
            println!("{:<22} {:<12} {:<10} DESCRIPTION", "ID", "FAMILY", "CONFIDENCE");
            println!("{}", "-".repeat(90));
            for rule in &rules {
                println!(
                    "{:<22} {:<12} {:<10} {}",
                    rule.id, rule.family, rule.confidence, rule.description
                );
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, CspError> {
    let path = PathBuf::from(".cspforge.toml");

    if path.exists() && !force {
        eprintln!(".cspforge.toml already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created .cspforge.toml");

    Ok(0)
}
