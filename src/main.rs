//! Refit CLI - scan and rewrite method bodies for structural smells

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use refit::config::{ColorMode, Config, OutputFormat};
use refit::engine::Engine;
use refit::output::formatter_for;
use refit::rewriter::Rewriter;
use refit::rules::RuleRegistry;
use refit::unit::SourceUnit;
use refit::{Rule, Severity};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "refit",
    version,
    about = "Rule-based code quality scanner",
    long_about = "Scans method bodies for structural smells (nested conditionals, \
                  compound conditions, repeated computations, magic numbers) and \
                  rewrites them into cleaner equivalents."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan source units and report findings
    Scan {
        /// Source unit files (JSON)
        units: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,

        /// Only enable specific rules (comma-separated, `*` wildcards allowed)
        #[arg(long, value_delimiter = ',')]
        select: Option<Vec<String>>,

        /// Disable specific rules (comma-separated, `*` wildcards allowed)
        #[arg(long, value_delimiter = ',')]
        disable: Option<Vec<String>>,

        /// Minimum severity to report
        #[arg(long, value_enum)]
        min_severity: Option<MinSeverity>,

        /// Number of parallel jobs (0 = auto)
        #[arg(short, long, default_value = "0")]
        jobs: usize,

        /// Show per-rule timing statistics
        #[arg(long)]
        timing: bool,
    },
    /// Apply rewrites to a source unit until no fixable finding remains
    Fix {
        /// Source unit file (JSON)
        unit: PathBuf,

        /// Only apply rewrites for this rule
        #[arg(long)]
        rule: Option<String>,

        /// Write the rewritten unit back to the file (prints to stdout otherwise)
        #[arg(long)]
        write: bool,
    },
    /// List available rules
    Rules {
        /// Filter by category (complexity, duplication, readability, style)
        #[arg(long)]
        category: Option<String>,
    },
    /// Show detailed information about a rule
    Explain {
        /// Rule ID to explain
        rule_id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Compact,
}

#[derive(Clone, Copy, ValueEnum)]
enum MinSeverity {
    Info,
    Warning,
    Error,
}

impl From<MinSeverity> for Severity {
    fn from(s: MinSeverity) -> Self {
        match s {
            MinSeverity::Info => Severity::Info,
            MinSeverity::Warning => Severity::Warning,
            MinSeverity::Error => Severity::Error,
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    Ok(config)
}

fn print_rule(rule: &dyn Rule) {
    let meta = rule.meta();
    let severity = match meta.severity {
        Severity::Error => "error".red(),
        Severity::Warning => "warning".yellow(),
        Severity::Info => "info".blue(),
    };
    println!("  {} [{}] ({})", meta.id.cyan(), severity, meta.category);
    println!("    {}", meta.description);
}

fn explain_rule(rule: &dyn Rule) {
    let meta = rule.meta();
    println!("{}", "Rule Details".bold());
    println!();
    println!("  {}: {}", "ID".bold(), meta.id.cyan());
    println!("  {}: {}", "Name".bold(), meta.name);
    println!(
        "  {}: {}",
        "Severity".bold(),
        match meta.severity {
            Severity::Error => "error".red(),
            Severity::Warning => "warning".yellow(),
            Severity::Info => "info".blue(),
        }
    );
    println!("  {}: {}", "Category".bold(), meta.category);

    println!();
    println!("  {}", "Description".bold());
    println!("  {}", meta.description);

    if let Some(rationale) = &meta.rationale {
        println!();
        println!("  {}", "Rationale".bold());
        println!("  {}", rationale);
    }

    if let Some(bad) = &meta.example_bad {
        println!();
        println!("  {} {}", "Example".bold(), "(before)".red());
        for line in bad.lines() {
            println!("    {}", line);
        }
    }

    if let Some(good) = &meta.example_good {
        println!();
        println!("  {} {}", "Example".bold(), "(after)".green());
        for line in good.lines() {
            println!("    {}", line);
        }
    }

    if rule.has_rewrite() {
        println!();
        println!("  {}", "Auto-fix available".bold());
    }
}

fn run_scan(
    cli: &Cli,
    units: &[PathBuf],
    format: Format,
    select: Option<Vec<String>>,
    disable: Option<Vec<String>>,
    min_severity: Option<MinSeverity>,
    jobs: usize,
    timing: bool,
) -> anyhow::Result<i32> {
    if units.is_empty() {
        anyhow::bail!("no source units given");
    }

    let mut config = load_config(cli)?;
    let cli_format = match format {
        Format::Text => OutputFormat::Text,
        Format::Json => OutputFormat::Json,
        Format::Compact => OutputFormat::Compact,
    };
    config.merge_cli(
        Some(cli_format),
        Some(cli.verbose),
        Some(jobs),
        disable,
        select,
    );

    let mut methods = Vec::new();
    for path in units {
        let unit = SourceUnit::load(path)?;
        methods.extend(unit.methods);
    }

    let engine = Engine::new(config.clone());
    let mut result = engine.scan_all(&methods)?;

    if let Some(min) = min_severity {
        result.retain_min_severity(min.into());
    }

    let colored = match config.output.color {
        ColorMode::Always => {
            if !cli.no_color {
                colored::control::set_override(true);
            }
            !cli.no_color
        }
        ColorMode::Never => false,
        ColorMode::Auto => !cli.no_color,
    };
    let formatter = formatter_for(config.output.format, colored, config.output.statistics);
    print!("{}", formatter.format(&result));

    if timing {
        println!("\n{}", result.format_timings());
    }

    Ok(result.exit_code())
}

fn run_fix(
    cli: &Cli,
    unit_path: &PathBuf,
    rule: Option<&str>,
    write: bool,
) -> anyhow::Result<i32> {
    let config = load_config(cli)?;
    let unit = SourceUnit::load(unit_path)?;

    let engine = Engine::new(config);
    let rewriter = Rewriter::new(engine.rules().to_vec());

    let mut fixed_methods = Vec::new();
    let mut extracted = Vec::new();
    let mut total_fixes = 0;

    for method in &unit.methods {
        let report = rewriter.fix_all(&engine, method, rule)?;
        total_fixes += report.fixes_applied;
        fixed_methods.push(report.method);
        extracted.extend(report.extracted);
    }
    fixed_methods.extend(extracted);

    let fixed = SourceUnit {
        name: unit.name.clone(),
        methods: fixed_methods,
    };

    if write {
        fixed.save(unit_path)?;
        eprintln!(
            "{} {} applied to {}",
            total_fixes,
            if total_fixes == 1 { "fix" } else { "fixes" },
            unit_path.display()
        );
    } else {
        for method in &fixed.methods {
            println!("{}", method.to_source());
        }
        eprintln!(
            "{} {} available (use --write to apply)",
            total_fixes,
            if total_fixes == 1 { "fix" } else { "fixes" }
        );
    }

    Ok(0)
}

fn run_rules(category: Option<&str>) -> anyhow::Result<i32> {
    let registry = RuleRegistry::standard();
    println!("{}", "Available rules".bold());
    println!();
    for rule in registry.iter() {
        if let Some(cat) = category {
            if !rule.meta().category.to_string().eq_ignore_ascii_case(cat) {
                continue;
            }
        }
        print_rule(rule.as_ref());
    }
    Ok(0)
}

fn run_explain(rule_id: &str) -> anyhow::Result<i32> {
    let registry = RuleRegistry::standard();
    match registry.get(rule_id) {
        Some(rule) => {
            explain_rule(rule.as_ref());
            Ok(0)
        }
        None => {
            eprintln!("{}: rule '{}' not found", "error".red().bold(), rule_id);
            eprintln!();
            eprintln!("Use {} to see all available rules", "refit rules".cyan());
            Ok(2)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let outcome = match &cli.command {
        Commands::Scan {
            units,
            format,
            select,
            disable,
            min_severity,
            jobs,
            timing,
        } => run_scan(
            &cli,
            units,
            *format,
            select.clone(),
            disable.clone(),
            *min_severity,
            *jobs,
            *timing,
        ),
        Commands::Fix { unit, rule, write } => run_fix(&cli, unit, rule.as_deref(), *write),
        Commands::Rules { category } => run_rules(category.as_deref()),
        Commands::Explain { rule_id } => run_explain(rule_id),
    };

    match outcome {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            std::process::exit(2);
        }
    }
}
