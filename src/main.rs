// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use chunkwise::app_config::{self, Config, TranslationProvider};
use chunkwise::app_controller::{Controller, RunOptions};
use chunkwise::checkpoint::CheckpointStore;
use chunkwise::file_utils::FileManager;
use chunkwise::translation::TranslationService;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Mistral,
    OpenAI,
    DeepSeek,
    Kimi,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Mistral => TranslationProvider::Mistral,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::DeepSeek => TranslationProvider::DeepSeek,
            CliTranslationProvider::Kimi => TranslationProvider::Kimi,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a document directory (default command)
    Translate(TranslateArgs),

    /// Inspect or reset resumable-run state
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate shell completions for chunkwise
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum CheckpointAction {
    /// List translated files, for one document or all of them
    Show {
        /// Document directory as passed to `translate`
        document: Option<String>,
    },
    /// Forget progress, for one document or all of them
    Clear {
        /// Document directory as passed to `translate`
        document: Option<String>,
    },
}

/// Options shared by every command that reads the configuration
#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Checkpoint state file (overrides the configuration)
    #[arg(long)]
    state_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Document directory containing .html/.htm/.xhtml files
    #[arg(value_name = "INPUT_DIR")]
    input_dir: PathBuf,

    #[command(flatten)]
    options: TranslateOptions,
}

/// Translation flags, accepted with or without the `translate` subcommand
#[derive(Args, Debug)]
struct TranslateOptions {
    /// Output directory (default: <INPUT_DIR>-<target language>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite non-markup files already present in the output directory
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'zh', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Maximum tokens per translation request
    #[arg(short = 'b', long)]
    token_budget: Option<usize>,

    /// Clear this document's checkpoint before starting
    #[arg(long, conflicts_with = "no_resume")]
    restart: bool,

    /// Ignore the checkpoint entirely for this run
    #[arg(long)]
    no_resume: bool,

    #[command(flatten)]
    common: CommonArgs,
}

/// chunkwise - structure-preserving markup translation with AI
///
/// Translates HTML/XHTML documents through LLM APIs in token-bounded chunks
/// while keeping every tag, attribute and embedded script intact.
#[derive(Parser, Debug)]
#[command(name = "chunkwise")]
#[command(version)]
#[command(about = "Structure-preserving markup translation with AI")]
#[command(long_about = "chunkwise translates directories of HTML/XHTML files with AI providers,
splitting them into token-bounded chunks and protecting non-translatable markup.

EXAMPLES:
    chunkwise book/                             # Translate using default config
    chunkwise -p openai -m gpt-4o book/         # Use specific provider and model
    chunkwise -s en -t ja -o book-ja book/      # Translate to Japanese into book-ja/
    chunkwise --restart book/                   # Start over, ignoring earlier progress
    chunkwise checkpoint show                   # List recorded progress
    chunkwise checkpoint clear book/            # Forget progress for one document
    chunkwise completions bash > chunkwise.bash # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. API keys left empty in the config are read from
    <PROVIDER>_API_KEY (e.g. MISTRAL_API_KEY).

SUPPORTED PROVIDERS:
    mistral   - Mistral chat completions (default: mistral-small-latest)
    openai    - OpenAI chat completions
    deepseek  - DeepSeek chat completions
    kimi      - Moonshot Kimi chat completions
    anthropic - Anthropic messages API")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Document directory containing .html/.htm/.xhtml files
    #[arg(value_name = "INPUT_DIR")]
    input_dir: Option<PathBuf>,

    #[command(flatten)]
    options: TranslateOptions,
}

// @struct: Custom logger implementation; filtering follows `log::max_level()`
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, colour) = Self::decoration(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                colour,
                now,
                emoji,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config or CLI says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "chunkwise", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Checkpoint { action, common }) => run_checkpoint(action, common),
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - top-level args without the subcommand
            let input_dir = cli
                .input_dir
                .ok_or_else(|| anyhow!("INPUT_DIR is required when no subcommand is specified"))?;
            run_translate(TranslateArgs {
                input_dir,
                options: cli.options,
            })
            .await
        }
    }
}

/// Load the config and apply the options every command shares
fn load_config(common: &CommonArgs) -> Result<Config> {
    let mut config = Config::load_or_create(&common.config_path)?;

    if let Some(log_level) = &common.log_level {
        config.log_level = log_level.clone().into();
    }
    if let Some(state_file) = &common.state_file {
        config.checkpoint.state_file = state_file.clone();
    }

    log::set_max_level(config.log_level.to_level_filter());
    Ok(config)
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let options = &args.options;
    let mut config = load_config(&options.common)?;

    // Override config with CLI options if provided
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(token_budget) = options.token_budget {
        config.chunking.token_budget = token_budget;
    }

    config.validate().context("Configuration validation failed")?;

    let service = TranslationService::new(&config).context("Failed to create translation service")?;
    info!(
        "Using {} ({})",
        config.translation.provider.display_name(),
        service.model()
    );
    if let Err(e) = service.test_connection().await {
        warn!("Connection check failed, continuing anyway: {}", e);
    }

    let controller = Controller::with_translator(config, Arc::new(service))?;
    let run_options = RunOptions {
        output_dir: options.output.clone(),
        force_overwrite: options.force_overwrite,
        restart: options.restart,
        resume: !options.no_resume,
    };

    tokio::select! {
        result = controller.run_folder(&args.input_dir, &run_options) => {
            let report = result?;
            if !report.is_complete() {
                return Err(anyhow!(
                    "{} file(s) incomplete, {} failed",
                    report.incomplete.len(),
                    report.failed.len()
                ));
            }
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; finished files are checkpointed and will be skipped next time");
            Err(anyhow!("Interrupted"))
        }
    }
}

fn run_checkpoint(action: CheckpointAction, common: CommonArgs) -> Result<()> {
    let config = load_config(&common)?;
    let mut store = CheckpointStore::open(&config.checkpoint.state_file);

    // Documents are keyed by their normalized directory path
    match action {
        CheckpointAction::Show { document } => {
            let documents: Vec<String> = match document {
                Some(dir) => vec![FileManager::document_id(dir)],
                None => store.documents().map(str::to_string).collect(),
            };
            if documents.is_empty() {
                println!("No recorded progress in {}", store.path().display());
            }
            for id in documents {
                let processed = store.processed_subfiles(&id);
                println!("{} ({} file(s))", id, processed.len());
                for subfile in processed {
                    println!("  {}", subfile);
                }
            }
        }
        CheckpointAction::Clear { document } => {
            let document = document.map(FileManager::document_id);
            store
                .clear(document.as_deref())
                .with_context(|| format!("Failed to update {}", store.path().display()))?;
            match document {
                Some(id) => info!("Cleared progress for {}", id),
                None => info!("Cleared all recorded progress"),
            }
        }
    }
    Ok(())
}
