//! `power-control` – Panther power & E-Stop controller
//!
//! This binary brings the power controller up against the simulated power
//! stage and hands control to an interactive shell.  It:
//!
//! 1. Initialises structured logging (and optional OTLP span export).
//! 2. Loads `~/.panther/power_control.toml`, falling back to defaults.
//! 3. Samples the power stage once, publishing the initial E-Stop state and
//!    IO snapshot, then spawns the motor-state synchronizer.
//! 4. Drops the operator into a **REPL** that injects velocity commands and
//!    motor-controller reports and calls the trigger/reset services.
//! 5. Intercepts **Ctrl-C** to trigger the E-Stop before exiting.
//!
//! A hardware-access failure in the synchronizer terminates the process.

mod config;
mod repl;
mod telemetry;

use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use panther_hal::SimPowerStage;
use panther_middleware::{StateBus, Topic, TopicReceiver};
use panther_power::bring_up;
use panther_types::{Event, EventPayload};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let _telemetry = telemetry::init_tracing("panther-power-control");

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => config::defaults_with_env(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::defaults_with_env()
        }
    };
    let power_cfg = match cfg.power_config() {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    // ── Bring-up ──────────────────────────────────────────────────────────
    let bus = StateBus::new(cfg.bus_capacity);
    let stage = SimPowerStage::new(cfg.sim_power_stage_ready);
    let stage_handle = stage.handle();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    // Subscribe before bring-up so the initial publications are logged too.
    let e_stop_rx = bus.subscribe(Topic::EStop);
    let io_rx = bus.subscribe(Topic::IoState);

    let (control, synchronizer) =
        match bring_up(Box::new(stage), bus, &power_cfg, Instant::now()) {
            Ok(parts) => parts,
            Err(e) => {
                error!(error = %e, "power stage unavailable at startup");
                return ExitCode::FAILURE;
            }
        };

    runtime.spawn(log_publications(e_stop_rx, io_rx));
    runtime.spawn(async move {
        if let Err(e) = synchronizer.run().await {
            error!(error = %e, "fatal hardware failure; terminating");
            std::process::exit(1);
        }
    });

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    let control_for_ctrlc = control.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – triggering E-Stop …".yellow().bold());
        let response = control_for_ctrlc.trigger();
        println!("  ✓ {}", response.message.green());
        shutdown_clone.store(true, Ordering::SeqCst);
        // The shell may be blocked on stdin; leave the process directly.
        std::process::exit(130);
    }) {
        warn!(
            error = %e,
            "Failed to install Ctrl-C handler; E-Stop on Ctrl-C will not be available"
        );
    }

    println!(
        "  E-Stop {}, motors {}",
        if control.e_stop_active() { "ACTIVE".red().bold() } else { "cleared".green() },
        if control.io_state().motor_on { "powered".green() } else { "unpowered".dimmed() },
    );
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(control, stage_handle, shutdown);

    // Dropping the runtime aborts the synchronizer, which releases the
    // power stage.
    runtime.shutdown_background();
    info!("power control stopped");
    ExitCode::SUCCESS
}

/// Log every event published on the state bus.
async fn log_publications(mut e_stop_rx: TopicReceiver, mut io_rx: TopicReceiver) {
    loop {
        let received = tokio::select! {
            r = e_stop_rx.recv() => r,
            r = io_rx.recv() => r,
        };
        match received {
            Ok(event) => log_event(&event),
            Err(RecvError::Lagged(n)) => warn!(lagged_by = n, "publication logger lagged"),
            Err(RecvError::Closed) => return,
        }
    }
}

fn log_event(event: &Event) {
    match &event.payload {
        EventPayload::EStop(active) => {
            info!(topic = %event.source, e_stop = *active, "published");
        }
        EventPayload::IoState(io) => {
            info!(
                topic = %event.source,
                motor_on = io.motor_on,
                digital_power = io.digital_power,
                "published"
            );
        }
    }
}

fn print_banner() {
    println!();
    println!("  {} {}",
        "Panther Power Control".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  E-Stop latch and motor power supervisor");
    println!();
}
