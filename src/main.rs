//! Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{debug, info, log_enabled, Level};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use config::GameConfig;
use domain::entity::Action;
use sim::event::GameEvent;
use sim::level::load_levels;
use sim::view::BoardView;
use sim::world::{Phase, Session};
use ui::gamepad::GamepadState;
use ui::input::{action_for_click, Command, InputState};
use ui::renderer::Renderer;
use ui::sound::{Sfx, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);
/// Message-bar countdown rate.
const UI_TICK: Duration = Duration::from_millis(75);
const DEFAULT_LOG: &str = "diamondswap.log";

fn main() {
    setup_logging();

    let config = GameConfig::load();
    debug!("{config:?}");

    // Bad level data is fatal, and reported before the terminal is touched.
    let levels = match load_levels(&config.levels_dir) {
        Ok(levels) => levels,
        Err(e) => {
            eprintln!("Could not load levels: {e}");
            std::process::exit(1);
        }
    };
    info!("{} levels from {}", levels.len(), levels.origin());

    let mut session = Session::new(levels, config.rules);
    let mut renderer = Renderer::new(&config.display);

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Diamond Swap!");
    println!("Reached level {} with {} moves.", session.state.level + 1, session.state.total_moves);
}

/// `--debug` logs to `diamondswap.log`, `--log <path>` to a chosen file.
/// Without either flag no logger is installed.
fn setup_logging() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let path = match log_path(&args) {
        Ok(Some(path)) => path,
        Ok(None) => return,
        Err(msg) => {
            eprintln!("{msg}");
            return;
        }
    };

    let file = match File::create(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Could not create log file {}: {e}", path.display());
            return;
        }
    };
    let log_config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .build();
    if let Err(e) = WriteLogger::init(LevelFilter::Debug, log_config, file) {
        eprintln!("Logger init failed: {e}");
    }
}

/// Log file chosen on the command line, if any.
fn log_path(args: &[String]) -> Result<Option<PathBuf>, String> {
    if let Some(i) = args.iter().position(|a| a == "--log") {
        return match args.get(i + 1) {
            Some(p) if !p.starts_with("--") => Ok(Some(PathBuf::from(p))),
            _ => Err("--log needs a file path, logging disabled".to_string()),
        };
    }
    if args.iter().any(|a| a == "--debug") {
        return Ok(Some(PathBuf::from(DEFAULT_LOG)));
    }
    Ok(None)
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        info!("gamepad detected");
    }
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }

        let commands: Vec<Command> = kb.commands().into_iter().chain(gp.commands()).collect();
        if commands.into_iter().any(|cmd| handle_command(session, sound, cmd)) {
            break;
        }

        for &(column, row) in &kb.clicks {
            handle_click(session, renderer, sound, column, row);
        }

        if last_tick.elapsed() >= UI_TICK {
            session.tick_message();
            last_tick = Instant::now();
        }

        renderer.render(session)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Returns true when the player asked to quit.
fn handle_command(session: &mut Session, sound: Option<&SoundEngine>, cmd: Command) -> bool {
    match cmd {
        Command::Quit => return true,
        Command::Confirm => {
            if session.acknowledge() {
                info!("starting over from level 1");
            }
        }
        Command::ToggleHelp => {
            if session.phase == Phase::Playing {
                session.toggle_help();
            }
        }
        Command::Game(action) => {
            session.show_help = false;
            play_action(session, sound, action);
        }
    }
    false
}

fn handle_click(session: &mut Session, renderer: &Renderer, sound: Option<&SoundEngine>, column: u16, row: u16) {
    if session.phase != Phase::Playing || session.show_help {
        return;
    }
    let Some(pos) = renderer.screen_to_grid(column, row) else { return };
    match action_for_click(&session.state, pos) {
        Some(action) => {
            debug!("click at {pos} -> {action:?}");
            play_action(session, sound, action);
        }
        None => debug!("click at {pos} ignored"),
    }
}

fn play_action(session: &mut Session, sound: Option<&SoundEngine>, action: Action) {
    let events = session.dispatch(action);
    process_sound_events(sound, &events);

    if log_enabled!(Level::Debug) && !events.is_empty() {
        debug!("after {action:?}:\n{}", BoardView::new(&session.state).to_ascii());
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    let finale = events.iter().any(|e| matches!(e, GameEvent::AllLevelsComplete { .. }));
    for event in events {
        match event {
            GameEvent::Slid { collected, .. } if *collected > 0 => sfx.play(Sfx::Coin),
            GameEvent::Blocked { .. } | GameEvent::BudgetExhausted => sfx.play(Sfx::Bump),
            GameEvent::Swapped { .. } => sfx.play(Sfx::Swap),
            GameEvent::LevelReset { .. } => sfx.play(Sfx::Reset),
            GameEvent::LevelComplete { .. } if !finale => sfx.play(Sfx::Clear),
            GameEvent::AllLevelsComplete { .. } => sfx.play(Sfx::AllClear),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn log_flags() {
        assert_eq!(log_path(&args(&[])), Ok(None));
        assert_eq!(log_path(&args(&["--debug"])), Ok(Some(PathBuf::from(DEFAULT_LOG))));
        assert_eq!(log_path(&args(&["--log", "run.log"])), Ok(Some(PathBuf::from("run.log"))));
    }

    #[test]
    fn log_without_path_is_rejected() {
        assert!(log_path(&args(&["--log"])).is_err());
        assert!(log_path(&args(&["--log", "--debug"])).is_err());
    }
}
