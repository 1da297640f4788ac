//! REPL – interactive operator shell for the power controller.
//!
//! Supported slash-commands:
//!   /help                   – show this list
//!   /cmd_vel                – inject a velocity command
//!   /status <front> <rear>  – inject a motor-controller report (CAN error flags)
//!   /trigger                – call the E-Stop trigger service
//!   /reset                  – call the E-Stop reset service
//!   /ready <on|off>         – drive the simulated power-stage-ready line
//!   /estop                  – show the E-Stop state
//!   /io                     – show the IO snapshot
//!   /quit | /exit           – exit

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use panther_hal::SimPowerStageHandle;
use panther_power::PowerControl;
use panther_types::{ServiceResponse, names};
use tracing::info;

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    CmdVel,
    Status { front: bool, rear: bool },
    Trigger,
    Reset,
    Ready(bool),
    EStop,
    Io,
    Quit,
}

/// Parse one input line.  Returns a usage message on malformed input.
pub fn parse(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let command = match (head, args.as_slice()) {
        ("/help", []) => Command::Help,
        ("/cmd_vel", []) => Command::CmdVel,
        ("/status", [front, rear]) => Command::Status {
            front: parse_flag(front)?,
            rear: parse_flag(rear)?,
        },
        ("/status", _) => return Err("usage: /status <front> <rear>".to_string()),
        ("/trigger", []) => Command::Trigger,
        ("/reset", []) => Command::Reset,
        ("/ready", [level]) => Command::Ready(parse_flag(level)?),
        ("/ready", _) => return Err("usage: /ready <on|off>".to_string()),
        ("/estop", []) => Command::EStop,
        ("/io", []) => Command::Io,
        ("/quit" | "/exit", []) => Command::Quit,
        _ => return Err(format!("unknown command '{}'", line.trim())),
    };
    Ok(command)
}

fn parse_flag(word: &str) -> Result<bool, String> {
    match word.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "err" | "error" => Ok(true),
        "0" | "false" | "off" | "ok" => Ok(false),
        other => Err(format!("expected on/off, got '{other}'")),
    }
}

/// Entry point for the interactive shell.
///
/// `shutdown` is polled each iteration; when set the shell exits.
pub fn run(control: PowerControl, stage: SimPowerStageHandle, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "panther>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        if line.trim().is_empty() {
            continue;
        }

        match parse(&line) {
            Ok(Command::Quit) => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Ok(command) => execute(&control, &stage, command),
            Err(e) => println!(
                "{} {}. Type {} for available commands.",
                "Error:".red(),
                e.yellow(),
                "/help".bold()
            ),
        }
    }
}

fn execute(control: &PowerControl, stage: &SimPowerStageHandle, command: Command) {
    match command {
        Command::Help => cmd_help(),
        Command::CmdVel => {
            control.on_velocity_command(Instant::now());
            println!("  velocity command received on {}", names::CMD_VEL_TOPIC);
        }
        Command::Status { front, rear } => {
            control.record_status(front, rear);
            println!(
                "  {} front={} rear={}",
                names::DRIVER_STATE_TOPIC,
                flag(front),
                flag(rear)
            );
        }
        Command::Trigger => {
            info!(service = names::E_STOP_TRIGGER_SERVICE, "trigger requested");
            print_response(&control.trigger());
        }
        Command::Reset => {
            info!(service = names::E_STOP_RESET_SERVICE, "reset requested");
            print_response(&ServiceResponse::from(control.reset(Instant::now())));
        }
        Command::Ready(level) => {
            stage.set_ready(level);
            println!("  power-stage-ready line set {}", if level { "high" } else { "low" });
        }
        Command::EStop => {
            let state = if control.e_stop_active() {
                "ACTIVE".red().bold()
            } else {
                "cleared".green()
            };
            println!("  E-Stop: {state}");
        }
        Command::Io => {
            let io = control.io_state();
            println!("{}", "IO state".bold().underline());
            println!("  motor_on          : {}", flag(io.motor_on));
            println!("  aux_power         : {}", flag(io.aux_power));
            println!("  charger_connected : {}", flag(io.charger_connected));
            println!("  fan               : {}", flag(io.fan));
            println!("  power_button      : {}", flag(io.power_button));
            println!("  digital_power     : {}", flag(io.digital_power));
            println!("  charger_enabled   : {}", flag(io.charger_enabled));
        }
        Command::Quit => {}
    }
}

fn cmd_help() {
    println!();
    println!("{}", "Power Control Commands".bold().underline());
    println!("  {}                – inject a velocity command", "/cmd_vel".bold().cyan());
    println!("  {}  – inject a motor-controller report", "/status <front> <rear>".bold().cyan());
    println!("  {}                – trigger the E-Stop", "/trigger".bold().cyan());
    println!("  {}                  – request an E-Stop reset", "/reset".bold().cyan());
    println!("  {}         – drive the simulated ready line", "/ready <on|off>".bold().cyan());
    println!("  {}                  – show the E-Stop state", "/estop".bold().cyan());
    println!("  {}                     – show the IO snapshot", "/io".bold().cyan());
    println!("  {}           – exit", "/quit  /exit".bold().cyan());
    println!();
}

fn print_response(response: &ServiceResponse) {
    if response.success {
        println!("  {} {}", "✓".green().bold(), response.message);
    } else {
        println!("  {} {}", "✗".red().bold(), response.message);
    }
}

fn flag(value: bool) -> colored::ColoredString {
    if value { "on".green() } else { "off".dimmed() }
}
