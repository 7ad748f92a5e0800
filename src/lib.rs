pub mod audio;
pub mod completion;
pub mod console;
pub mod db;
pub mod error;
pub mod models;
pub mod navigation;
pub mod player;
pub mod routines;
pub mod settings;
pub mod utils;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use audio::{CueDispatcher, SoundCue};
use console::ConsoleCommand;
use db::Database;
use models::RoutineDocument;
use navigation::{ChannelNavigator, NavigationEvent};
use player::{estimated_duration, PlayerController, SessionServices};
use routines::{validate, RoutineLoader, RoutineRegistry, UserContext, UserRoutineStore};
use settings::{SettingsStore, SoundSettings};

/// Plays a workout routine in the terminal with audio cues.
#[derive(Debug, Parser)]
#[command(name = "routine-player", version, about)]
pub struct Args {
    /// Routine to play (built-in id or one of the user's routines).
    #[arg(required_unless_present_any = ["list", "import", "delete"])]
    pub routine_id: Option<String>,

    /// Signed-in user whose stored routines are available.
    #[arg(long, env = "ROUTINE_PLAYER_USER")]
    pub user: Option<String>,

    /// Directory holding settings.json and the session database.
    #[arg(long, env = "ROUTINE_PLAYER_DATA_DIR", default_value = ".routine-player")]
    pub data_dir: PathBuf,

    /// List available routines and recent sessions, then exit.
    #[arg(long)]
    pub list: bool,

    /// Store a routine JSON document in the user's collection.
    #[arg(long, value_name = "FILE", requires = "user")]
    pub import: Option<PathBuf>,

    /// Remove a routine from the user's collection.
    #[arg(long, value_name = "ID", requires = "user")]
    pub delete: Option<String>,
}

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")
        .and_then(|runtime| runtime.block_on(run_with(args)));

    if let Err(err) = result {
        log::error!("{err:?}");
        std::process::exit(1);
    }
}

pub async fn run_with(args: Args) -> Result<()> {
    std::fs::create_dir_all(&args.data_dir).with_context(|| {
        format!("failed to create data directory {}", args.data_dir.display())
    })?;

    let settings = SettingsStore::new(args.data_dir.join("settings.json"))?;
    let database = Database::new(args.data_dir.join("routine-player.sqlite3"))?;
    let registry = RoutineRegistry::built_in()?;
    let loader = RoutineLoader::new(registry, database.clone(), settings.rest_defaults());

    let user = args
        .user
        .clone()
        .map(UserContext::user)
        .unwrap_or_default();

    if let (Some(path), Some(user_id)) = (&args.import, user.user_id.as_deref()) {
        let id = import_routine(&database, loader.registry(), &settings, user_id, path).await?;
        println!("Imported {} as {id}", path.display());
    }

    if let (Some(routine_id), Some(user_id)) = (&args.delete, user.user_id.as_deref()) {
        if database.delete_user_routine(user_id, routine_id).await? {
            println!("Deleted {routine_id}");
        } else {
            println!("No routine {routine_id} for {user_id}");
        }
    }

    if args.list {
        return list(&loader, &database, &settings, &user).await;
    }

    match args.routine_id {
        Some(routine_id) => play(&loader, database, &settings, &routine_id, &user).await,
        None => Ok(()),
    }
}

async fn import_routine(
    database: &Database,
    registry: &RoutineRegistry,
    settings: &SettingsStore,
    user_id: &str,
    path: &std::path::Path,
) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read routine file {}", path.display()))?;
    let document: RoutineDocument = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse routine file {}", path.display()))?;

    if let Some(id) = document.id.as_deref().filter(|id| registry.contains(id)) {
        bail!("routine id '{id}' is taken by a built-in routine");
    }

    validate(document.clone(), "import", &settings.rest_defaults())?;
    database.save_user_routine(user_id, &document).await
}

async fn list(
    loader: &RoutineLoader<Database>,
    database: &Database,
    settings: &SettingsStore,
    user: &UserContext,
) -> Result<()> {
    let pacing = settings.pacing();
    let rest_defaults = settings.rest_defaults();

    println!("Built-in routines:");
    for id in loader.registry().ids() {
        if let Some(document) = loader.registry().get(id) {
            let routine = validate(document.clone(), id, &rest_defaults)?;
            let minutes = estimated_duration(&routine, &pacing).as_secs().div_ceil(60);
            println!("  {id:<28} {} (~{minutes} min)", routine.name);
        }
    }

    if let Some(user_id) = user.user_id.as_deref() {
        println!("Routines for {user_id}:");
        for document in loader.store().fetch_user_routines(user_id).await? {
            let id = document.id.clone().unwrap_or_default();
            match validate(document, &id, &rest_defaults) {
                Ok(routine) => {
                    let minutes = estimated_duration(&routine, &pacing).as_secs().div_ceil(60);
                    println!("  {id:<28} {} (~{minutes} min)", routine.name);
                }
                Err(err) => println!("  {id:<28} unplayable: {err}"),
            }
        }
    }

    println!("Recent sessions:");
    for record in database.list_session_records(None, 10).await? {
        println!(
            "  {} {:<24} {:<9} {} ticks, {} exercises, {} skips",
            record.started_at.format("%Y-%m-%d %H:%M"),
            record.routine_id,
            record.status.as_str(),
            record.stats.elapsed_ticks,
            record.stats.exercises_completed,
            record.stats.skips,
        );
    }

    Ok(())
}

fn cue_dispatcher(sound: &SoundSettings) -> CueDispatcher {
    #[cfg(feature = "audio")]
    let cues: Arc<dyn SoundCue> = Arc::new(audio::ToneCuePlayer::new(sound.volume));
    #[cfg(not(feature = "audio"))]
    let cues: Arc<dyn SoundCue> = Arc::new(audio::SilentCues);

    CueDispatcher::new(cues, sound.enabled)
}

async fn play(
    loader: &RoutineLoader<Database>,
    database: Database,
    settings: &SettingsStore,
    routine_id: &str,
    user: &UserContext,
) -> Result<()> {
    let (navigator, mut navigation_rx) = ChannelNavigator::new();
    let services = SessionServices {
        cues: cue_dispatcher(&settings.sound()),
        navigator: Arc::new(navigator),
        sink: Some(Arc::new(database)),
    };
    let controller = PlayerController::new(services, settings.pacing());

    let snapshot = controller.open(loader, routine_id, user).await?;
    println!("Playing {} ({})", snapshot.routine_name, snapshot.routine_id);
    println!("{}", console::HELP);

    let cancel_token = CancellationToken::new();
    let watcher = tokio::spawn(console::watch_loop(
        controller.clone(),
        cancel_token.clone(),
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let event = loop {
        tokio::select! {
            event = navigation_rx.recv() => break event,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match console::parse_command(&line) {
                    Some(command) => {
                        if let Err(err) = console::apply(&controller, command).await {
                            log::warn!("Command {command:?} rejected: {err}");
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => println!("{}", console::HELP),
                },
                Ok(None) => stdin_open = false,
                Err(err) => {
                    log::warn!("Stopped reading commands: {err}");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                console::apply(&controller, ConsoleCommand::Quit).await?;
            }
        }
    };

    cancel_token.cancel();
    if let Err(err) = watcher.await {
        log::warn!("Console watcher ended abnormally: {err}");
    }
    controller.leave().await;

    match event {
        Some(NavigationEvent::Finished(summary)) | Some(NavigationEvent::Abandoned(summary)) => {
            println!(
                "Session {} {}: {} ticks, {} exercises, {} blocks, {} skips",
                summary.session_id,
                summary.status.as_str(),
                summary.stats.elapsed_ticks,
                summary.stats.exercises_completed,
                summary.stats.blocks_completed,
                summary.stats.skips,
            );
        }
        None => log::warn!("Navigation channel closed before the session ended"),
    }

    Ok(())
}
