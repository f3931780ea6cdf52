use anyhow::{Context, Result};
use clap::{ArgAction, Args, ColorChoice, CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use log::warn;
use ripesense::detection::{parse_raw_detections, prepare_detections};
use ripesense::labels::{ClassTable, parse_class_name};
use ripesense::spectral::{ReplayScanner, create_scanner};
use ripesense::{Agreement, Config, FusedResult, QualityStatus, ScanSummary};
use serde_json::{Map, Value, json};
use std::io::{IsTerminal, stdout};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "ripesense",
    about = "Fuse fruit detections with NIR spectral readings",
    arg_required_else_help = true
)]
struct Cli {
    /// Disable color
    #[arg(long = "no-color", global = true)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Read configuration from this file instead of the user config
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fuse detections from a JSON file with spectral readings
    Fuse(FuseArgs),
    /// Show what a class label says about fruit type and ripeness
    Parse(ParseArgs),
    /// List the detector class table
    Classes(ClassesArgs),
    /// Print the JSON schema of a fused result
    Schema,
}

#[derive(Args, Clone)]
struct FuseArgs {
    /// Detector output: an array of detections or {"detections": [...]}
    #[arg(value_name = "DETECTIONS")]
    input: PathBuf,

    /// Output JSON
    #[arg(long)]
    json: bool,

    /// Seed the mock scanner for reproducible readings
    #[arg(long)]
    seed: Option<u64>,

    /// Weight given to the vision detector
    #[arg(long, requires = "spectral_weight")]
    vision_weight: Option<f32>,

    /// Weight given to the spectral reading
    #[arg(long, requires = "vision_weight")]
    spectral_weight: Option<f32>,

    /// Skip spectral readings entirely
    #[arg(long, conflicts_with = "spectral")]
    vision_only: bool,

    /// Replay recorded spectral analyses from a JSON array (null = failed reading)
    #[arg(long, value_name = "FILE")]
    spectral: Option<PathBuf>,
}

#[derive(Args, Clone)]
struct ParseArgs {
    /// Class labels such as "Banana Ripe"
    #[arg(value_name = "CLASS_NAME", required = true)]
    names: Vec<String>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Clone)]
struct ClassesArgs {
    /// Load class names from a detector data.yaml
    #[arg(long, value_name = "PATH")]
    data_yaml: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn fail(err: anyhow::Error, code: i32) -> i32 {
    eprintln!("Error: {:#}", err);
    code
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load(),
    };
    config.apply_env_overrides();
    Ok(config)
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn paint_heading(text: &str, color: bool) -> String {
    if color {
        text.bold().cyan().to_string()
    } else {
        text.to_string()
    }
}

fn paint_quality(status: QualityStatus, color: bool) -> String {
    let text = status.as_str();
    if !color {
        return text.to_string();
    }
    match status {
        QualityStatus::Fresh | QualityStatus::Ripe => text.green().to_string(),
        QualityStatus::Unripe => text.yellow().to_string(),
        QualityStatus::Overripe | QualityStatus::Rotten => text.red().to_string(),
        QualityStatus::Unknown => text.dimmed().to_string(),
    }
}

fn describe_agreement(result: &FusedResult) -> &'static str {
    if !result.is_fused() {
        return "vision only";
    }
    match result.agreement {
        Some(Agreement::High) => "high",
        Some(Agreement::Moderate) | None => "moderate",
    }
}

fn render_fuse(results: &[FusedResult], summary: &ScanSummary, color: bool) -> String {
    let mut out = String::new();
    out.push_str(&paint_heading("Detections:", color));
    if results.is_empty() {
        out.push_str("\n  none");
    }
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "\n  {}. {} [{}] quality={} ripeness={} ({:.2}) confidence={:.2} agreement={}",
            i + 1,
            result.class_name,
            result.fruit_type,
            paint_quality(result.quality_status, color),
            result.ripeness,
            result.ripeness_confidence,
            result.confidence,
            describe_agreement(result),
        ));
    }

    out.push_str("\n\n");
    out.push_str(&paint_heading("Summary:", color));
    out.push_str(&format!("\n  total = {}", summary.total_fruits));
    for (fruit, count) in &summary.fruit_counts {
        out.push_str(&format!("\n  {} = {}", fruit, count));
    }
    for (quality, count) in &summary.quality_counts {
        out.push_str(&format!("\n  quality.{} = {}", quality, count));
    }
    out
}

fn run_fuse(args: FuseArgs, config_path: Option<&Path>, color: ColorChoice) -> Result<(), i32> {
    let mut config = load_config(config_path).map_err(|e| fail(e, 2))?;
    if let Some(seed) = args.seed {
        config.scanner.seed = Some(seed);
    }
    if let (Some(vision), Some(spectral)) = (args.vision_weight, args.spectral_weight) {
        config.fusion.vision_weight = vision;
        config.fusion.spectral_weight = spectral;
    }
    let engine = config.build_engine().map_err(|e| fail(e.into(), 2))?;
    let classes = config.class_table();

    let raw = read_input(&args.input)
        .and_then(|content| {
            parse_raw_detections(&content)
                .with_context(|| format!("parsing detections in {}", args.input.display()))
        })
        .map_err(|e| fail(e, 2))?;
    let detections = prepare_detections(raw, &classes);

    let results = if args.vision_only {
        engine.vision_only(&detections)
    } else if let Some(path) = args.spectral.as_deref() {
        let mut scanner = read_input(path)
            .and_then(|content| {
                ReplayScanner::from_json(&content)
                    .with_context(|| format!("parsing spectral readings in {}", path.display()))
            })
            .map_err(|e| fail(e, 2))?;
        engine.fuse_detections(&detections, &mut scanner)
    } else {
        let mut scanner = create_scanner(&config.scanner);
        if let Err(e) = scanner.connect() {
            warn!("{} scanner failed to connect: {}", scanner.name(), e);
        }
        let results = engine.fuse_detections(&detections, scanner.as_mut());
        scanner.disconnect();
        results
    };
    let summary = ScanSummary::from_results(&results);

    if args.json {
        let v = json!({
            "results": results,
            "summary": summary,
        });
        match serde_json::to_string_pretty(&v) {
            Ok(s) => println!("{}", s),
            Err(e) => return Err(fail(e.into(), 1)),
        }
    } else {
        let want_color = stdout().is_terminal() && !matches!(color, ColorChoice::Never);
        println!("{}", render_fuse(&results, &summary, want_color));
    }
    Ok(())
}

fn run_parse(args: ParseArgs, color: ColorChoice) -> Result<(), i32> {
    let parsed: Vec<_> = args.names.iter().map(|n| parse_class_name(n)).collect();

    if args.json {
        match serde_json::to_string_pretty(&parsed) {
            Ok(s) => println!("{}", s),
            Err(e) => return Err(fail(e.into(), 1)),
        }
        return Ok(());
    }

    let want_color = stdout().is_terminal() && !matches!(color, ColorChoice::Never);
    let mut out = String::new();
    for (i, label) in parsed.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        out.push_str(&paint_heading(&format!("{}:", label.class_name), want_color));
        out.push_str(&format!("\n  fruit_type = {}", label.fruit_type));
        out.push_str(&format!("\n  ripeness = {}", label.ripeness));
        out.push_str(&format!(
            "\n  quality_status = {}",
            paint_quality(label.quality_status, want_color)
        ));
    }
    println!("{}", out);
    Ok(())
}

fn run_classes(args: ClassesArgs, config_path: Option<&Path>) -> Result<(), i32> {
    let table = match args.data_yaml.as_deref() {
        Some(path) => {
            let content = read_input(path).map_err(|e| fail(e, 2))?;
            ClassTable::from_yaml_str(&content)
                .with_context(|| format!("parsing class table {}", path.display()))
                .map_err(|e| fail(e, 2))?
        }
        None => load_config(config_path).map_err(|e| fail(e, 2))?.class_table(),
    };

    if args.json {
        let map: Map<String, Value> = table
            .iter()
            .map(|(id, name)| (id.to_string(), Value::String(name.to_string())))
            .collect();
        match serde_json::to_string_pretty(&Value::Object(map)) {
            Ok(s) => println!("{}", s),
            Err(e) => return Err(fail(e.into(), 1)),
        }
    } else {
        for (id, name) in table.iter() {
            println!("{:>3}  {}", id, name);
        }
    }
    Ok(())
}

fn run_schema() -> Result<(), i32> {
    let schema = schemars::schema_for!(FusedResult);
    match serde_json::to_string_pretty(&schema) {
        Ok(s) => println!("{}", s),
        Err(e) => return Err(fail(e.into(), 1)),
    }
    Ok(())
}

fn detect_color_choice() -> ColorChoice {
    // Scan args before clap so help/errors honor `--no-color`.
    // Stop at `--`, which terminates flags.
    let mut args = std::env::args_os();
    args.next();
    let mut flag = false;
    for arg in args {
        if arg == "--" {
            break;
        }
        if arg == "--no-color" {
            flag = true;
            break;
        }
    }
    if flag || std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

fn main() {
    let color = detect_color_choice();
    let matches = Cli::command().color(color).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    init_logging(cli.verbose);

    let config_path = cli.config.as_deref();
    let outcome = match cli.command {
        Some(Commands::Fuse(args)) => run_fuse(args, config_path, color),
        Some(Commands::Parse(args)) => run_parse(args, color),
        Some(Commands::Classes(args)) => run_classes(args, config_path),
        Some(Commands::Schema) => run_schema(),
        None => Ok(()),
    };
    if let Err(code) = outcome {
        std::process::exit(code);
    }
}
