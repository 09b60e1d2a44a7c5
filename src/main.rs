use clap::Parser;
use closeout_breakdown::{
    BreakdownConfig, BreakdownPipeline, CommandProtector, ProtectionStatus, StatementJob,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Generate settlement breakdown workbooks from closeout statements.
#[derive(Parser, Debug)]
#[command(name = "closeout-breakdown", version, about)]
struct Cli {
    /// Closeout statement spreadsheets to process
    #[arg(required_unless_present = "print_config_schema")]
    inputs: Vec<PathBuf>,

    /// Directory the breakdowns are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// JSON configuration overriding columns, phrases and match budgets
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Treat every statement as litigation (40% fee)
    #[arg(long, conflicts_with = "pre_litigation")]
    litigation: bool,

    /// Treat every statement as pre-litigation (one-third fee)
    #[arg(long)]
    pre_litigation: bool,

    /// Passphrase required to open the generated workbooks
    #[arg(long, requires = "protect_with")]
    password: Option<String>,

    /// External program that password-protects a workbook
    #[arg(long)]
    protect_with: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    print_config_schema: bool,
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Asks on stdin whether a statement is a litigation case.
fn prompt_litigation(input: &Path) -> io::Result<bool> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "Is {} a litigation case? [y/n] ", input.display())?;
        stdout.flush()?;

        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no answer to litigation prompt",
            ));
        }
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(stdout, "Please answer y or n.")?,
        }
    }
}

fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    if cli.print_config_schema {
        println!("{}", BreakdownConfig::schema_as_json()?);
        return Ok(true);
    }

    let config = match &cli.config {
        Some(path) => BreakdownConfig::load(path)?,
        None => BreakdownConfig::default(),
    };

    let mut pipeline = BreakdownPipeline::new(config, &cli.output_dir);
    if let Some(program) = &cli.protect_with {
        pipeline = pipeline.with_protector(Box::new(CommandProtector::new(program)));
    }

    let mut jobs = Vec::with_capacity(cli.inputs.len());
    for input in &cli.inputs {
        let is_litigation = if cli.litigation {
            true
        } else if cli.pre_litigation {
            false
        } else {
            prompt_litigation(input)?
        };
        let mut job = StatementJob::new(input, is_litigation);
        if let Some(password) = &cli.password {
            job = job.with_passphrase(password.clone());
        }
        jobs.push(job);
    }

    let report = pipeline.process_batch(&jobs);
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(processed) => {
                let note = match &processed.protection {
                    ProtectionStatus::NotRequested => String::new(),
                    ProtectionStatus::Applied => " (password protected)".to_string(),
                    ProtectionStatus::Failed(reason) => format!(" (NOT protected: {})", reason),
                };
                println!(
                    "OK    {} -> {}{}",
                    outcome.input.display(),
                    processed.output.display(),
                    note
                );
            }
            Err(e) => println!("FAIL  {}: {}", outcome.input.display(), e),
        }
    }

    Ok(report.all_succeeded())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}
