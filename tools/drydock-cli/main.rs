use clap::Parser;
use drydock::canvas::render::{DisplayList, DrawCommand};
use drydock::prelude::*;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs;
use std::time::Instant;

/// Writes log records to stderr, one line each.
struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let tag = match record.level() {
                Level::Error => "ERROR",
                Level::Warn => "WARN ",
                Level::Info => "INFO ",
                Level::Debug => "DEBUG",
                Level::Trace => "TRACE",
            };
            eprintln!("[{}] {}: {}", tag, record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Load a pipeline document into a canvas, check it, and report what a user would see
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the pipeline JSON document
    pipeline_path: String,

    /// Optional canvas configuration JSON; missing keys take defaults
    #[arg(short, long)]
    config: Option<String>,

    /// Canvas width in pixels (overrides the configuration)
    #[arg(long)]
    width: Option<f64>,

    /// Canvas height in pixels (overrides the configuration)
    #[arg(long)]
    height: Option<f64>,

    /// Write the re-serialized document to this path
    #[arg(short, long)]
    emit: Option<String>,

    /// Print the draw commands of one frame
    #[arg(long)]
    render: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    if log::set_boxed_logger(Box::new(StderrLogger { level }))
        .map(|()| log::set_max_level(level))
        .is_err()
    {
        eprintln!("Warning: a logger was already installed");
    }

    let total_start = Instant::now();

    // --- 1. Configuration ---
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to read config file '{}': {}", path, e))
            });
            CanvasConfig::from_json(&json)
                .unwrap_or_else(|e| exit_with_error(&format!("Invalid config: {}", e)))
        }
        None => CanvasConfig::default(),
    };
    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(height) = cli.height {
        config.height = height;
    }
    let mut canvas = CanvasBuilder::from_config(config)
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to build canvas: {}", e)));

    // --- 2. Load ---
    let load_start = Instant::now();
    let json = fs::read_to_string(&cli.pipeline_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read pipeline file '{}': {}",
            cli.pipeline_path, e
        ))
    });
    serializer::load_json(&mut canvas, &json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load pipeline: {}", e)));
    let load_duration = load_start.elapsed();

    println!(
        "Loaded {} shapes and {} cables onto a {}x{} canvas",
        canvas.shape_count(),
        canvas.connector_count(),
        canvas.width(),
        canvas.height()
    );

    // --- 3. Execution order ---
    match canvas.execution_order() {
        Ok(order) => {
            println!("\nExecution order:");
            for (i, id) in order.iter().enumerate() {
                if let Some(shape) = canvas.shape(*id) {
                    println!("  {:>3}. {}", i + 1, shape.name());
                }
            }
        }
        Err(cycle) => {
            let names: Vec<&str> = cycle
                .steps
                .iter()
                .filter_map(|id| canvas.shape(*id).map(|s| s.name()))
                .collect();
            println!("\nSteps form a cycle: {}", names.join(" -> "));
        }
    }

    // --- 4. Validation ---
    let issues = canvas.validate();
    if issues.is_empty() {
        println!("\nNo issues. The pipeline can be submitted.");
    } else {
        println!("\n{} issue(s):", issues.len());
        for issue in &issues {
            println!("  -> {}", issue);
        }
    }
    let overlaps = canvas.overlapping_pairs();
    if !overlaps.is_empty() {
        println!("{} pair(s) of shapes still overlap", overlaps.len());
    }

    // --- 5. Output ---
    if cli.render {
        let mut frame = DisplayList::new();
        canvas.draw(&mut frame);
        println!("\n--- Frame ---");
        for command in &frame.commands {
            match command {
                DrawCommand::Text(at, text, _) => println!("  text {} '{}'", at, text),
                other => println!("  {:?}", other),
            }
        }
    }

    if let Some(path) = &cli.emit {
        let json = serializer::to_json(&canvas)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize pipeline: {}", e)));
        fs::write(path, json)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", path, e)));
        println!("\nWrote normalized document to '{}'", path);
    }

    println!("\n--- Performance Summary ---");
    println!("Load:                 {:?}", load_duration);
    println!("Total Execution:      {:?}", total_start.elapsed());
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
