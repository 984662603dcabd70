//! CLI binary for stepcast.
//!
//! A thin shim over the library crate that maps CLI flags onto the adapter
//! configs, wires the pipeline together and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stepcast::pipeline::{extract::PdfiumExtractor, store::JsonStore, vision::LlmClassifier};
use stepcast::{
    hash_file, ExtractionConfig, Pipeline, PipelineConfig, PipelineProgress, SpeechClient,
    SpeechConfig, Stage, VisionConfig,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that names the running stage and logs one line per finished stage.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl PipelineProgress for CliProgress {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message("…");
    }

    fn on_stage_complete(&self, stage: Stage) {
        self.bar.println(format!("  {} {}", green("✓"), stage));
        if stage == Stage::Persist {
            self.bar.finish_and_clear();
        }
    }

    fn on_audio_generated(&self, step: u32, total: usize, filename: &str) {
        self.bar.set_message(format!("step {step}/{total}"));
        self.bar
            .println(format!("    {} {}", dim(&format!("step {step:>3}")), filename));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Classify a manual and store the results under ./volume
  stepcast process volume/test.pdf

  # Also narrate every instructional step
  FISH_AUDIO_API_KEY=... stepcast process --speech volume/test.pdf

  # Narrate a single step from a text file
  stepcast tts --id a1b2c3d4e5f6 --step 1 --file volume/instructions/a1b2c3d4e5f6-1.txt

  # Print a document's content id
  stepcast hash volume/test.pdf

  # List stored documents
  stepcast list --json

ENVIRONMENT VARIABLES:
  FISH_AUDIO_API_KEY      Fish Audio API key (speech synthesis)
  OPENAI_API_KEY          OpenAI API key (vision classification)
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium; defaults to the system library
  RUST_LOG                Log filter, e.g. stepcast=debug
"#;

/// Turn PDF manuals into narrated instructional steps.
#[derive(Parser, Debug)]
#[command(
    name = "stepcast",
    version,
    about = "Turn PDF manuals into narrated instructional steps",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "STEPCAST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "STEPCAST_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract, classify, optionally narrate, and store one PDF.
    Process(ProcessArgs),
    /// Narrate one step of a document.
    Tts(TtsArgs),
    /// Print the content id of a file.
    Hash {
        /// File to hash.
        file: PathBuf,
    },
    /// List stored documents.
    List {
        /// Directory holding stored records.
        #[arg(long, env = "STEPCAST_WORK_DIR", default_value = "volume")]
        work_dir: PathBuf,

        /// Output JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// PDF manual to process.
    input: PathBuf,

    /// Directory for extracted images, records, and audio.
    #[arg(long, env = "STEPCAST_WORK_DIR", default_value = "volume")]
    work_dir: PathBuf,

    /// Narrate each instructional step with Fish Audio.
    #[arg(long, env = "STEPCAST_SPEECH")]
    speech: bool,

    #[command(flatten)]
    speech_opts: SpeechOpts,

    /// Vision model ID (e.g. gpt-4.1-nano, gemini-2.0-flash).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Vision provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Path to a text file containing a custom classification prompt.
    #[arg(long, env = "STEPCAST_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "STEPCAST_PASSWORD")]
    password: Option<String>,

    /// Longest edge of rendered page images, in pixels.
    #[arg(long, env = "STEPCAST_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// Path to libpdfium.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print the full PipelineOutput as JSON instead of the summary.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct TtsArgs {
    /// Content id of the document the step belongs to.
    #[arg(long)]
    id: String,

    /// 1-indexed step number.
    #[arg(long)]
    step: u32,

    /// Text to narrate.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    text: Option<String>,

    /// Read the text to narrate from this file (trimmed).
    #[arg(long)]
    file: Option<PathBuf>,

    /// Directory the audio file is written to.
    #[arg(long, env = "STEPCAST_AUDIO_DIR", default_value = "volume")]
    out_dir: PathBuf,

    #[command(flatten)]
    speech_opts: SpeechOpts,
}

#[derive(Args, Debug)]
struct SpeechOpts {
    /// Fish Audio voice ID.
    #[arg(long, env = "STEPCAST_VOICE")]
    voice: Option<String>,

    /// Fish Audio API key.
    #[arg(long = "fish-api-key", env = "FISH_AUDIO_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Process(args) => process(args, cli.quiet).await,
        Command::Tts(args) => tts(args).await,
        Command::Hash { file } => {
            let id = hash_file(&file).with_context(|| format!("Failed to hash {}", file.display()))?;
            println!("{id}");
            Ok(())
        }
        Command::List { work_dir, json } => list(work_dir, json).await,
    }
}

fn speech_config(opts: &SpeechOpts, out_dir: PathBuf) -> Result<SpeechConfig> {
    let mut builder = SpeechConfig::builder().output_dir(out_dir);
    if let Some(ref key) = opts.api_key {
        builder = builder.api_key(key.clone());
    }
    builder.build().context("Invalid speech configuration")
}

async fn process(args: ProcessArgs, quiet: bool) -> Result<()> {
    let system_prompt = match args.system_prompt {
        Some(ref path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        ),
        None => None,
    };

    let extraction = ExtractionConfig {
        max_rendered_pixels: args.max_pixels,
        password: args.password.clone(),
        pdfium_library: args.pdfium_lib.clone(),
    };
    let vision = VisionConfig {
        model: args.model.clone(),
        provider_name: args.provider.clone(),
        system_prompt,
        ..Default::default()
    };
    let classifier = LlmClassifier::from_config(vision).context("Vision provider setup failed")?;

    let config = PipelineConfig {
        generate_speech: args.speech,
        voice: args.speech_opts.voice.clone(),
    };

    let mut pipeline = Pipeline::new(
        Arc::new(PdfiumExtractor::new(&args.work_dir, extraction)),
        Arc::new(classifier),
        Arc::new(JsonStore::new(&args.work_dir)),
        config,
    );

    if args.speech {
        let speech = speech_config(&args.speech_opts, args.work_dir.join("audio"))?;
        pipeline = pipeline.with_synthesizer(Arc::new(SpeechClient::new(speech)?));
    }
    if !quiet && !args.json {
        pipeline = pipeline.with_progress(CliProgress::new());
    }

    let output = pipeline
        .run(&args.input)
        .await
        .with_context(|| format!("Pipeline failed for {}", args.input.display()))?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
        return Ok(());
    }

    println!("\n{}", output.report);
    if !output.audio_files.is_empty() {
        println!("\nGenerated {} audio files", output.audio_files.len());
    }
    if !quiet {
        eprintln!(
            "\n{} Pipeline complete! {}  {}",
            green("✔"),
            bold(&output.document_id),
            dim(&format!("{}ms", output.duration_ms)),
        );
    }
    Ok(())
}

async fn tts(args: TtsArgs) -> Result<()> {
    let config = speech_config(&args.speech_opts, args.out_dir.clone())?;
    let client = SpeechClient::new(config)?;
    let voice = args.speech_opts.voice.as_deref();

    let filename = match (&args.text, &args.file) {
        (_, Some(path)) => client
            .synthesize_from_file(path, &args.id, args.step, voice)
            .await
            .with_context(|| format!("Speech synthesis from {} failed", path.display()))?,
        (Some(text), None) => client
            .synthesize(text, &args.id, args.step, voice)
            .await
            .context("Speech synthesis failed")?,
        (None, None) => anyhow::bail!("either --text or --file is required"),
    };

    println!("{}", args.out_dir.join(filename).display());
    Ok(())
}

async fn list(work_dir: PathBuf, json: bool) -> Result<()> {
    let docs = JsonStore::new(&work_dir)
        .list()
        .await
        .with_context(|| format!("Failed to list records in {}", work_dir.display()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&docs).context("Failed to serialise listing")?
        );
        return Ok(());
    }

    if docs.is_empty() {
        eprintln!("No documents stored in {}", work_dir.display());
        return Ok(());
    }
    println!("{:<14}  {:>5}  {}", "HASH", "STEPS", "FILE");
    for d in docs {
        println!("{:<14}  {:>5}  {}", d.hash, d.step_count, d.pdf_filename);
    }
    Ok(())
}
