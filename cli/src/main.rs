//! CLI entrypoint for tavern
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tavern_application::{
    Agent, ConversationLogger, GameMaster, GameRuntime, HumanInputPort, ModelGateway,
    PlayerCharacter, Responder, RuntimePorts, SessionParams,
};
use tavern_domain::catalog::{self, persona};
use tavern_domain::{Controller, GameState, ModelSpec, PercentileDie, RandomDie};
use tavern_infrastructure::{
    CachedSpeechSynthesizer, CommandAudioPlayer, ConfigLoader, ElevenLabsClient, FileAgentConfig,
    FileConfig, JsonlConversationLogger, SpeechCache, build_gateway,
};
use tavern_presentation::{Cli, ConsoleFormatter, ConsoleHumanInput, ConsoleNarrator, StageProgress};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// How long exit waits for blocking work, such as a console prompt still
/// reading stdin after Ctrl-C.
const BLOCKING_SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let result = runtime.block_on(run(cli));
    runtime.shutdown_timeout(BLOCKING_SHUTDOWN_GRACE);
    result
}

async fn run(cli: Cli) -> Result<()> {

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{line}");
        }
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {e}"))?
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(cli.verbose, config.logging.file.as_deref())?;
    info!("Starting tavern");

    apply_overrides(&cli, &mut config)?;
    check_config(&config)?;

    let params: SessionParams = config.game.to_session_params(config.audio.gap_ms);
    debug!(?params, "Session parameters");
    let (dm_spec, enforcer_spec, chronicler_spec) = (
        agent_model(&config.agents.dm, "agents.dm")?,
        agent_model(&config.agents.enforcer, "agents.enforcer")?,
        agent_model(&config.agents.chronicler, "agents.chronicler")?,
    );
    let controllers = config
        .players
        .iter()
        .map(|player| {
            player
                .parse_controller()
                .0
                .ok_or_else(|| anyhow!("Invalid model for player {}", player.name()))
        })
        .collect::<Result<Vec<Controller>>>()?;

    // === Dependency Injection ===
    // Only providers that some persona actually uses are built
    let mut used_models: Vec<&ModelSpec> = vec![&dm_spec, &enforcer_spec];
    if params.chronicle_rounds {
        used_models.push(&chronicler_spec);
    }
    used_models.extend(controllers.iter().filter_map(|c| match c {
        Controller::Model(spec) => Some(spec),
        Controller::Human => None,
    }));
    let gateway = Arc::new(build_gateway(
        &config.providers,
        &config.gateway,
        used_models,
    )?);

    let progress = (!cli.quiet).then(|| Arc::new(StageProgress::new()));

    let mut ports = RuntimePorts::default().with_playback_gap(params.playback_gap);
    if params.speech_enabled {
        ports = with_speech(ports, &config)?;
    }
    if controllers.iter().any(Controller::is_human) {
        let mut input = ConsoleHumanInput::new();
        if let Some(progress) = &progress {
            input = input.with_progress(Arc::clone(progress));
        }
        ports = ports.with_human_input(Arc::new(input) as Arc<dyn HumanInputPort>);
    }
    let runtime = GameRuntime::start(ports);

    let mut narrator = ConsoleNarrator::new().with_diffs(!cli.quiet);
    if let Some(progress) = &progress {
        narrator = narrator.with_progress(Arc::clone(progress));
    }

    let players = config
        .players
        .iter()
        .zip(&controllers)
        .map(|(player, controller)| {
            let system = catalog::player_system(player.name(), &player.sheet.to_string());
            let responder = Responder::for_controller(
                player.name(),
                controller,
                system,
                player.temperature,
                &gateway,
            );
            let character = PlayerCharacter::new(player.sheet.clone(), responder);
            match &player.voice {
                Some(voice) => character.with_voice(voice),
                None => character,
            }
        })
        .collect::<Vec<_>>();

    let die: Arc<dyn PercentileDie> = match config.game.seed {
        Some(seed) => Arc::new(RandomDie::seeded(seed)),
        None => Arc::new(RandomDie::from_entropy()),
    };
    let state = match params.summary_lookback {
        Some(rounds) => GameState::new(config.game.initial_situation()).with_summary_lookback(rounds),
        None => GameState::new(config.game.initial_situation()),
    };

    let cancel = CancellationToken::new();
    let mut game = GameMaster::new(
        persona_agent(
            persona::DUNGEON_MASTER,
            catalog::DUNGEON_MASTER_SYSTEM,
            dm_spec,
            &config.agents.dm,
            &gateway,
        ),
        persona_agent(
            persona::ENFORCER,
            catalog::ENFORCER_SYSTEM,
            enforcer_spec,
            &config.agents.enforcer,
            &gateway,
        ),
        players,
        state,
        runtime.handle(),
    )
    .with_dm_voice(&config.speech.narrator_voice)
    .with_die(die)
    .with_observer(Arc::new(narrator))
    .with_speech(params.speech_enabled)
    .with_cancellation(cancel.clone());

    if params.chronicle_rounds {
        game = game.with_chronicler(persona_agent(
            persona::CHRONICLER,
            catalog::CHRONICLER_SYSTEM,
            chronicler_spec,
            &config.agents.chronicler,
            &gateway,
        ));
    }

    if let Some(path) = &config.logging.transcript {
        let logger = JsonlConversationLogger::create(path)
            .with_context(|| format!("Failed to open transcript {}", path.display()))?;
        info!(path = %path.display(), "Writing transcript");
        game = game.with_logger(Arc::new(logger) as Arc<dyn ConversationLogger>);
    }

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping after the current request");
                cancel.cancel();
            }
        }
    });

    if !cli.quiet {
        println!();
        println!("{}", ConsoleFormatter::banner("Tavern"));
        println!(
            "Party: {}",
            game.players()
                .iter()
                .map(PlayerCharacter::name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("Rounds: {}", params.rounds);
    }

    let result = game.run(params.rounds).await;
    runtime.shutdown().await;

    match result {
        Ok(reports) => {
            info!(rounds = reports.len(), "Session finished");
            if !cli.quiet {
                println!("\nThe session ends after {} round(s).", reports.len());
            }
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            println!("\nSession cancelled.");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Session aborted");
            Err(e.into())
        }
    }
}

/// Install the console subscriber and, when configured, a file writer.
fn init_logging(
    verbose: u8,
    file: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        });

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match file {
        Some(path) => {
            let dir = path.parent().filter(|d| !d.as_os_str().is_empty());
            let name = path
                .file_name()
                .ok_or_else(|| anyhow!("Invalid log file path: {}", path.display()))?;
            if let Some(dir) = dir {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            }
            let appender = tracing_appender::rolling::never(dir.unwrap_or(Path::new(".")), name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Fold command line flags into the loaded configuration.
fn apply_overrides(cli: &Cli, config: &mut FileConfig) -> Result<()> {
    if let Some(rounds) = cli.rounds {
        config.game.rounds = rounds;
    }
    if let Some(story) = &cli.story {
        config.game.initial_situation = Some(story.clone());
    }
    if let Some(path) = &cli.story_file {
        let story = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read story file {}", path.display()))?;
        config.game.initial_situation = Some(story.trim().to_string());
    }
    if let Some(speech) = cli.speech_override() {
        config.game.speech = speech;
    }
    if let Some(chronicle) = cli.chronicle_override() {
        config.game.chronicle_rounds = chronicle;
    }
    if cli.seed.is_some() {
        config.game.seed = cli.seed;
    }
    if cli.transcript.is_some() {
        config.logging.transcript = cli.transcript.clone();
    }
    Ok(())
}

/// Log warnings and refuse to start on errors.
fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    for issue in issues.iter().filter(|i| !i.is_error()) {
        warn!(code = ?issue.code, "{}", issue.message);
    }

    let errors: Vec<_> = issues.iter().filter(|i| i.is_error()).collect();
    if errors.is_empty() {
        return Ok(());
    }
    for issue in &errors {
        error!(code = ?issue.code, "{}", issue.message);
    }
    bail!(
        "Invalid configuration:\n{}",
        errors
            .iter()
            .map(|i| format!("  - {}", i.message))
            .collect::<Vec<_>>()
            .join("\n")
    )
}

fn agent_model(agent: &FileAgentConfig, field: &str) -> Result<ModelSpec> {
    agent
        .parse_model(field)
        .0
        .ok_or_else(|| anyhow!("{field}.model is not a valid model"))
}

fn persona_agent(
    name: &str,
    system_prompt: &str,
    model: ModelSpec,
    config: &FileAgentConfig,
    gateway: &Arc<ModelGateway>,
) -> Arc<Agent> {
    Arc::new(
        Agent::new(name, system_prompt, model, Arc::clone(gateway))
            .with_temperature(config.temperature),
    )
}

fn with_speech(ports: RuntimePorts, config: &FileConfig) -> Result<RuntimePorts> {
    let speech = &config.speech;
    let api_key = speech.resolve_api_key().ok_or_else(|| {
        anyhow!(
            "Speech is enabled but no API key was found: set {} or speech.api_key",
            speech.api_key_env
        )
    })?;

    let client = ElevenLabsClient::new(api_key, &speech.base_url)
        .with_model_id(&speech.model_id)
        .with_output_format(&speech.output_format);
    let cache_dir = speech.resolve_cache_dir();
    let cache = match &speech.session_dir {
        Some(session_dir) => SpeechCache::new(cache_dir, session_dir),
        None => SpeechCache::timestamped(cache_dir),
    };
    info!(
        cache = %cache.cache_dir().display(),
        session = %cache.session_dir().display(),
        "Speech enabled"
    );

    Ok(ports.with_speech(
        Arc::new(CachedSpeechSynthesizer::new(client, cache)),
        Arc::new(CommandAudioPlayer::from_config(&config.audio)),
    ))
}
