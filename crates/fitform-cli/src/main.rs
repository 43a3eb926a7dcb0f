//! fitform CLI: Command-line interface for the form progress controller

use clap::{Parser, Subcommand};
use fitform_engine::{
    engine_version, FormConfig, FormProgressController, FormProgressSnapshot, RequestOutcome,
    SharedController,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Multi-step form progress controller with simulated request progress
#[derive(Parser)]
#[command(name = "fitform")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Config file path
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },

    /// Check a config file and print its step sequence
    Validate {
        /// Config file path
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Walk the form and run a simulated generation request
    Simulate {
        /// Config file path (defaults are used when it does not exist)
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,

        /// How the simulated request ends (completed or cancelled)
        #[arg(long, default_value = "completed")]
        outcome: RequestOutcome,

        /// Milliseconds before the request settles
        #[arg(long, default_value = "4000")]
        settle_after_ms: u64,

        /// Clock resolution in milliseconds
        #[arg(long, default_value = "100")]
        tick_ms: u64,

        /// Milliseconds between printed status lines
        #[arg(long, default_value = "500")]
        print_every_ms: u64,

        /// Output snapshots as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print the engine version
    Version,
}

const DEFAULT_CONFIG_PATH: &str = ".fitform/config.json";

const BAR_WIDTH: usize = 20;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { path, json } => cmd_validate(&path, json),
        Commands::Simulate {
            path,
            outcome,
            settle_after_ms,
            tick_ms,
            print_every_ms,
            json,
        } => {
            let options = SimulateOptions {
                outcome,
                settle_after: Duration::from_millis(settle_after_ms),
                tick: Duration::from_millis(tick_ms),
                print_every: Duration::from_millis(print_every_ms.max(1)),
                json,
            };
            cmd_simulate(&path, &options);
        }
        Commands::Version => {
            println!("fitform-engine {}", engine_version());
        }
    }
}

fn cmd_init(path: &Path) {
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return;
    }

    match FormConfig::default().save(path) {
        Ok(()) => println!("Created {}", path.display()),
        Err(e) => {
            eprintln!("Failed to write config: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_validate(path: &Path, json: bool) {
    let config = match FormConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            if json {
                let output = serde_json::json!({ "valid": false, "error": e.to_string() });
                println!("{output}");
            } else {
                eprintln!("{}: {e}", path.display());
            }
            std::process::exit(1);
        }
    };

    if json {
        let output = serde_json::json!({ "valid": true, "config": config });
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Failed to serialize config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!("{} is valid\n", path.display());
    println!("Steps:");
    for (index, step) in config.steps.iter().enumerate() {
        let marker = if *step == config.request_initiated_step {
            "  <- request starts here"
        } else {
            ""
        };
        println!("  {}. {step}{marker}", index + 1);
    }
    println!("  -> {} (on completion)", config.request_completed_step);

    let sim = config.simulated_progress;
    println!();
    println!(
        "Simulated progress: {}% after {}ms, +{}% every {}ms, ceiling {}%",
        sim.initial_jump_value,
        sim.initial_jump_ms,
        sim.increment_value,
        sim.increment_interval_ms,
        sim.max_progress
    );
}

struct SimulateOptions {
    outcome: RequestOutcome,
    settle_after: Duration,
    tick: Duration,
    print_every: Duration,
    json: bool,
}

fn cmd_simulate(path: &Path, options: &SimulateOptions) {
    let config = if path.exists() {
        match FormConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                std::process::exit(1);
            }
        }
    } else {
        FormConfig::default()
    };

    let controller = match FormProgressController::new(&config) {
        Ok(controller) => controller,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let started = rt.block_on(simulate(
        SharedController::new(controller),
        &config.request_initiated_step,
        options,
    ));
    if !started {
        eprintln!("Request did not start");
        std::process::exit(1);
    }
}

async fn simulate(form: SharedController, initiated_step: &str, options: &SimulateOptions) -> bool {
    print_snapshot(&form.snapshot(), options.json);

    let step_count = form.lock().steps().len();
    for _ in 0..step_count {
        if form.lock().current_step().as_str() == initiated_step {
            break;
        }
        form.lock().go_to_next_step();
        print_snapshot(&form.snapshot(), options.json);
    }

    let clock = form.spawn_clock(options.tick);
    let printer = {
        let form = form.clone();
        let every = options.print_every;
        let json = options.json;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                print_snapshot(&form.snapshot(), json);
            }
        })
    };

    let outcome = options.outcome;
    let settle_after = options.settle_after;
    let settled = form
        .run_request(async move {
            tokio::time::sleep(settle_after).await;
            outcome
        })
        .await;

    printer.abort();
    clock.stop();

    print_snapshot(&form.snapshot(), options.json);
    settled.is_some()
}

fn print_snapshot(snapshot: &FormProgressSnapshot, json: bool) {
    if json {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("Failed to serialize snapshot: {e}"),
        }
    } else {
        println!("{}", render_status_line(snapshot));
    }
}

/// One-line text rendering of a snapshot.
fn render_status_line(snapshot: &FormProgressSnapshot) -> String {
    let overall = usize::from(snapshot.overall_progress.min(100));
    let filled = overall * BAR_WIDTH / 100;
    let bar = format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled));
    let status = snapshot.status.to_string();

    format!(
        "{:<14}[{bar}] {:>3}% | request {status:<9} {:>3}%",
        snapshot.current_step.as_str(),
        snapshot.overall_progress,
        snapshot.progress,
    )
}
