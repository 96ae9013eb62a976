//! Entry point: parses CLI options, loads persisted configuration, wires
//! up the shared state (`ConfigStore`, `RuntimeState`, `VirtualState`,
//! `ActivationOverride`, `LogRing`), starts the control loop on its own
//! thread and the HTTP control surface on a small worker pool, then waits
//! on SIGINT/SIGTERM for a clean shutdown.

use ::anyhow::{Context, Result};
use ::std::path::PathBuf;
use ::std::sync::atomic::{AtomicBool, Ordering};
use ::std::sync::Arc;

use ::argh::FromArgs;

use ::config::{ConfigStore, PersistPaths};

mod activation;
mod buttons;
mod conditioner;
mod control;
mod evdev;
mod frame;
mod http;
mod indicators;
mod input;
mod logbuffer;
mod netinfo;
mod runtime;

use activation::ActivationOverride;
use control::ControlLoop;
use indicators::{LoggingFixtureStatus, LoggingIndicators};
use input::{InputSource, VirtualState};
use logbuffer::LogRing;
use runtime::RuntimeState;

#[derive(FromArgs, PartialEq, Debug)]
/// Headless follow-spot lighting controller: reads a HOTAS-style joystick
/// (or the virtual on-screen one), conditions its axes into pan/tilt/dim/
/// zoom, and streams the result out as sACN/E1.31.
struct FollowSpotOpts {
    #[argh(option, short = 'c', default = "PathBuf::from(\"/etc/followspot\")")]
    /// directory holding config.json / fixtures.csv (default: /etc/followspot)
    config_dir: PathBuf,

    #[argh(option, short = 'b', default = "String::from(\"0.0.0.0:8080\")")]
    /// address:port the JSON control surface listens on
    bind: String,

    #[argh(option, short = 'l')]
    /// log filter directive (e.g. "debug", "daemon=trace"); overrides RUST_LOG
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let log_ring = LogRing::new();

    let opts: FollowSpotOpts = argh::from_env();
    logbuffer::init(log_ring.clone(), opts.log_level.as_deref());

    ::std::fs::create_dir_all(&opts.config_dir)
        .with_context(|| format!("creating config directory {}", opts.config_dir.display()))?;

    let persist_paths = PersistPaths::new(&opts.config_dir);
    let snapshot = ::config::load_persisted(&persist_paths).unwrap_or_else(|e| {
        ::log::warn!("loading persisted config failed, starting from defaults: {}", e);
        ::config::ConfigSnapshot::default()
    });
    let config = Arc::new(ConfigStore::new(snapshot));

    let runtime_state = Arc::new(RuntimeState::new());
    let virtual_state = Arc::new(VirtualState::default());
    let activation = Arc::new(ActivationOverride::new());
    let running = Arc::new(AtomicBool::new(true));

    let mut input_source = InputSource::new(virtual_state.clone());
    input_source.rescan();

    let mut control_loop = ControlLoop::new(
        config.clone(),
        runtime_state.clone(),
        input_source,
        activation.clone(),
        Box::new(LoggingIndicators::new()),
        Box::new(LoggingFixtureStatus::new()),
    )
    .context("initializing sACN emitter")?;

    let control_running = running.clone();
    let control_thread = ::std::thread::Builder::new()
        .name("control-loop".into())
        .spawn(move || control_loop.run(control_running))
        .context("spawning control loop thread")?;

    let app_state = Arc::new(http::AppState::new(
        config,
        runtime_state,
        virtual_state,
        activation,
        log_ring,
        persist_paths,
        running.clone(),
    ));

    {
        let running = running.clone();
        ::ctrlc::set_handler(move || {
            ::log::info!("received shutdown signal");
            running.store(false, Ordering::SeqCst);
        })
        .context("installing signal handler")?;
    }

    let bind = opts.bind.clone();
    let http_state = app_state.clone();
    let http_running = running.clone();
    let http_thread = ::std::thread::Builder::new()
        .name("http".into())
        .spawn(move || {
            if let Err(e) = http::serve(&bind, http_state, http_running) {
                ::log::error!("HTTP control surface exited: {}", e);
            }
        })
        .context("spawning HTTP server thread")?;

    while running.load(Ordering::SeqCst) {
        ::std::thread::sleep(::std::time::Duration::from_millis(200));
    }

    control_thread.join().ok();
    http_thread.join().ok();
    Ok(())
}
