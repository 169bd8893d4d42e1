use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fde_core::{AnalysisResult, EngineConfig, FieldDistortionEngine, ModuleKind, export_json};
use fde_store::{AnalysisRecord, Store};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "fde", about = "Field Distortion Engine: narrative instability analysis")]
struct Cli {
    /// Engine settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a file, literal text, or stdin
    Analyze {
        /// Path to a text file, or the text itself
        input: Option<String>,

        /// Write render data (JSON) into this directory
        #[arg(short = 'o', long)]
        output_dir: Option<PathBuf>,

        /// Maximum segment length in characters
        #[arg(long)]
        segment_length: Option<usize>,

        #[arg(long, value_enum, default_value_t = AnalysisType::Full)]
        analysis_type: AnalysisType,

        /// Seed for the observer simulation
        #[arg(long)]
        seed: Option<u64>,

        /// Print the full result envelope as JSON
        #[arg(long)]
        json: bool,

        /// Persist the summary to the analysis store
        #[arg(long)]
        save: bool,
    },

    /// Score a live text buffer
    Stream {
        text: String,
    },

    /// List saved analyses, newest first
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Show one saved analysis
    Show {
        id: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum AnalysisType {
    Drift,
    Entropy,
    Symbolic,
    Echo,
    Observer,
    Full,
}

impl AnalysisType {
    fn modules(self) -> Vec<ModuleKind> {
        match self {
            AnalysisType::Drift => vec![ModuleKind::Drift],
            AnalysisType::Entropy => vec![ModuleKind::Entropy],
            AnalysisType::Symbolic => vec![ModuleKind::Symbolic],
            AnalysisType::Echo => vec![ModuleKind::Echo],
            AnalysisType::Observer => vec![ModuleKind::Observer],
            AnalysisType::Full => ModuleKind::ALL.to_vec(),
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

fn open_store() -> Result<Store> {
    fde_store::open_default(None).context("failed to open analysis store")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            input,
            output_dir,
            segment_length,
            analysis_type,
            seed,
            json,
            save,
        } => {
            let mut config = config;
            if let Some(n) = segment_length {
                config.max_segment_length = n;
            }
            if analysis_type != AnalysisType::Full {
                config.modules = analysis_type.modules();
            }
            if seed.is_some() {
                config.seed = seed;
            }
            cmd_analyze(config, input.as_deref(), output_dir.as_deref(), json, save)
        }
        Commands::Stream { text } => cmd_stream(config, &text),
        Commands::History { limit } => cmd_history(limit),
        Commands::Show { id } => cmd_show(&id),
    }
}

fn read_input(input: Option<&str>) -> Result<String> {
    match input {
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
        Some(arg) if Path::new(arg).is_file() => {
            std::fs::read_to_string(arg).with_context(|| format!("failed to read {arg}"))
        }
        Some(text) => Ok(text.to_string()),
    }
}

fn cmd_analyze(
    config: EngineConfig,
    input: Option<&str>,
    output_dir: Option<&Path>,
    json: bool,
    save: bool,
) -> Result<()> {
    let text = read_input(input)?;
    if text.trim().is_empty() {
        anyhow::bail!("no input text provided");
    }
    tracing::info!("analyzing text ({} characters)", text.chars().count());

    let mut engine = FieldDistortionEngine::new(config);
    let result = match engine.analyze(&text) {
        Ok(result) => result,
        Err(e) => {
            println!("{}", serde_json::json!({ "error": e.to_string() }));
            return Err(e).context("analysis failed");
        }
    };

    if json {
        println!("{}", export_json(&result).context("failed to serialize result")?);
    } else {
        print_summary(&result);
    }

    if let Some(dir) = output_dir {
        write_render_data(&result, dir)?;
    }

    if save {
        let store = open_store()?;
        let id = store
            .save_analysis(&text, &result.summary())
            .context("failed to save analysis")?;
        println!("saved analysis {id}");
    }

    Ok(())
}

fn print_divider() {
    println!("{}", "─".repeat(80));
}

fn print_summary(result: &AnalysisResult) {
    let summary = result.summary();

    print_divider();
    println!("FIELD DISTORTION ENGINE - ANALYSIS SUMMARY");
    print_divider();

    println!("Field Classification: {}", summary.classification);
    println!("Field Score: {:.4}", result.field_score());
    println!("Number of Segments Analyzed: {}", summary.num_segments);

    if let Some(entropy) = &result.narrative_entropy {
        println!("\nNarrative Entropy:");
        println!("  Mean Entropy: {:.4}", entropy.mean_entropy);
        println!("  Max Entropy: {:.4}", entropy.max_entropy);
        println!("  Entropy Variance: {:.4}", entropy.entropy_variance);
    }

    if let Some(drift) = &result.fractal_drift {
        println!("\nFractal Drift:");
        println!("  Recursion Score: {:.4}", drift.recursion_score);
        println!("  Narrative Stability: {:.4}", drift.narrative_stability);
        if let Some(err) = &drift.error {
            println!("  (skipped: {err})");
        }
    }

    if let Some(symbolic) = &result.symbolic_density {
        println!("\nSymbolic Density:");
        println!("  Mean Density: {:.4}", symbolic.mean_density);
        println!("  Max Density: {:.4}", symbolic.max_density);
        let top: Vec<&str> = symbolic.top_symbols.iter().take(5).map(String::as_str).collect();
        println!("  Top Symbols: {}", top.join(", "));
    }

    if let Some(echo) = &result.echo_patterns {
        println!("\nEcho Patterns:");
        println!("  Echo Count: {}", echo.echo_count);
        println!("  Mean Echo Intensity: {:.4}", echo.mean_intensity);
        if let Some((phrase, intensity)) = echo.top_echoes.first() {
            println!("  Top Echo: \"{phrase}\" (intensity: {intensity:.2})");
        }
    }

    if let Some(observer) = &result.observer_simulation {
        println!("\nObserver Resonance:");
        for (persona, score) in &observer.resonance_scores {
            println!("  {persona}: {score:.4}");
        }
        println!("  Feedback Loops: {}", observer.feedback_loops.len());
    }

    print_divider();
    println!("INTERPRETATION GUIDELINES:");
    for line in summary.classification.guidelines() {
        println!("  • {line}");
    }
    print_divider();
}

fn write_render_data(result: &AnalysisResult, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let plan = result.render_plan(dir);
    let mut written = Vec::new();
    for artifact in &plan.artifacts {
        let body = serde_json::to_string_pretty(&artifact.data)?;
        match std::fs::write(&artifact.path, body) {
            Ok(()) => written.push(&artifact.path),
            Err(e) => tracing::warn!("failed to write {}: {e}", artifact.path.display()),
        }
    }

    println!("\nRender data saved to: {}", dir.display());
    for path in written {
        println!("  • {}", path.display());
    }
    Ok(())
}

fn cmd_stream(config: EngineConfig, text: &str) -> Result<()> {
    let engine = FieldDistortionEngine::new(config);
    let result = engine.analyze_stream(text).context("stream analysis failed")?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_history(limit: usize) -> Result<()> {
    let store = open_store()?;
    let records = store.recent(limit).context("failed to list analyses")?;
    if records.is_empty() {
        println!("(no saved analyses)");
        return Ok(());
    }
    for record in &records {
        println!(
            "{}  {}  {:<16}  entropy={:.4}  segments={}  {}",
            record.id,
            record.created_at,
            record.summary.classification.as_str(),
            record.summary.entropy_score,
            record.summary.num_segments,
            preview(&record.text, 40),
        );
    }
    Ok(())
}

fn cmd_show(id: &str) -> Result<()> {
    let id = Uuid::parse_str(id).with_context(|| format!("invalid analysis id '{id}'"))?;
    let store = open_store()?;
    let record = store
        .get_analysis(id)
        .context("failed to load analysis")?
        .with_context(|| format!("no saved analysis with id {id}"))?;
    print_record(&record);
    Ok(())
}

fn print_record(record: &AnalysisRecord) {
    let s = &record.summary;
    println!("id:             {}", record.id);
    println!("created_at:     {}", record.created_at);
    println!("classification: {}", s.classification);
    println!("entropy:        {:.4}", s.entropy_score);
    println!("recursion:      {:.4}", s.fractal_recursion_score);
    println!("symbol_density: {:.4}", s.symbol_density);
    println!("echo_intensity: {:.4}", s.echo_intensity);
    println!("segments:       {}", s.num_segments);
    println!("text:           {}", preview(&record.text, 200));
    println!();
    println!("{}", s.summary);
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}
