//! `hexos-cli` – hexapod control console.
//!
//! Entry point for the hexapod stack. It:
//!
//! 1. Initialises structured logging (and OTLP span export when configured).
//! 2. Loads `~/.hexos/config.toml`, writing defaults on first run.
//! 3. Wires the full stack: sim servo bank → gait sequencer, governor,
//!    arbiter, optional remote reasoner → decision pipeline → control loop.
//! 4. Intercepts Ctrl-C so `/auto` mode stops cleanly and the robot parks
//!    in the seated pose.
//! 5. Drops the operator into the interactive console.

mod config;
mod repl;
mod sensors;

use std::sync::atomic::Ordering;
use std::time::Duration;

use colored::Colorize;
use tracing::warn;

use hexos_hal::SimServoBank;
use hexos_kernel::MotionSafetyGovernor;
use hexos_kinematics::{GaitParams, GaitSequencer, LegGeometry};
use hexos_runtime::{
    BehaviorArbiter, ControlLoop, ControlLoopConfig, DecisionPipeline, PipelineConfig,
    RemoteReasoningClient, RemoteReasoningConfig, telemetry,
};
use sensors::SimSensorRig;

#[tokio::main]
async fn main() {
    // The guard flushes pending OTLP spans on drop; keep it for the whole
    // process lifetime.
    let _telemetry_guard = telemetry::init_tracing("hexos");

    print_banner();

    let cfg = load_config();

    let sequencer = GaitSequencer::new(
        LegGeometry::default(),
        GaitParams {
            time_scale: cfg.time_scale,
            ..Default::default()
        },
        Box::new(SimServoBank::new()),
    );

    let remote = build_remote(&cfg);
    let pipeline = DecisionPipeline::new(
        MotionSafetyGovernor::new(),
        BehaviorArbiter::with_default_behaviors(),
        remote,
        PipelineConfig {
            robot_name: cfg.robot_name.clone(),
            decision_interval: Duration::from_millis(cfg.decision_interval_ms),
            remote_required: cfg.remote_required,
        },
    );

    let control = ControlLoop::new(
        pipeline,
        sequencer,
        Box::new(SimSensorRig::new()),
        ControlLoopConfig {
            tick_interval: Duration::from_millis(cfg.tick_interval_ms),
            ..Default::default()
        },
    );

    // Ctrl-C clears the shared running flag: `/auto` mode notices at the
    // next tick boundary, parks the robot, and returns to the prompt loop,
    // which then exits.
    let running = control.shutdown_handle();
    let running_for_ctrlc = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "Ctrl-C received – stopping and sitting down …".yellow().bold());
        running_for_ctrlc.store(false, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown will not be available");
    }

    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());
    repl::run(control, running).await;
}

// ─────────────────────────────────────────────────────────────────────────────
// Startup helpers
// ─────────────────────────────────────────────────────────────────────────────

fn load_config() -> config::Config {
    match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Wrote default config to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Could not write default config".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

fn build_remote(cfg: &config::Config) -> Option<RemoteReasoningClient> {
    if !cfg.remote_enabled {
        if cfg.remote_required {
            println!(
                "  {} remote reasoning is required but disabled; the robot will fail-safe (stop).",
                "Warning:".yellow().bold()
            );
        }
        return None;
    }
    if cfg.api_key.is_empty() {
        println!(
            "  {} remote reasoning enabled but no API key set (HEXOS_API_KEY); {}",
            "Warning:".yellow().bold(),
            if cfg.remote_required {
                "the robot will fail-safe (stop)."
            } else {
                "falling back to local behaviors."
            }
        );
        return None;
    }

    let mut models = vec![cfg.remote_model.clone()];
    models.extend(cfg.fallback_models.iter().cloned());
    println!(
        "  Remote reasoning via {} ({} model(s) configured)",
        cfg.remote_base_url.dimmed(),
        models.len()
    );
    Some(RemoteReasoningClient::new(RemoteReasoningConfig {
        base_url: cfg.remote_base_url.clone(),
        api_key: Some(cfg.api_key.clone()),
        models,
        ..Default::default()
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   __ __          ____  ____"#.bold().cyan());
    println!("{}", r#"  / // /____ __ _/ __ \/ __/"#.bold().cyan());
    println!("{}", r#" / _  / -_) \ // /_/ /\ \   "#.bold().cyan());
    println!("{}", r#"/_//_/\__/_\_\ \____/___/   "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "HexOS".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Hexapod Robot Control Stack");
    println!();
}
