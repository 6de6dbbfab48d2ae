//! Operator console for the hexapod stack.
//!
//! Supported slash-commands:
//!   /help       – show this list
//!   /status     – print the current control-loop status snapshot
//!   /say <txt>  – inject a voice command (consumed at the next tick)
//!   /tick [n]   – run n control-loop ticks (default 1) and show decisions
//!   /auto       – run autonomously until Ctrl-C
//!   /quit|/exit – leave the console

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hexos_runtime::{ControlLoop, TickReport};

/// Entry point for the interactive console. Owns the control loop; every
/// tick runs on this task, so motion commands are never issued concurrently.
///
/// `running` is polled each iteration; Ctrl-C clears it and the console
/// exits cleanly (stopping `/auto` first if it is active).
pub async fn run(mut control: ControlLoop, running: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "hexos>".bold().cyan());
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

        let cmd = line.trim();
        if cmd.is_empty() {
            continue;
        }

        match cmd.split_once(' ').map_or((cmd, ""), |(c, rest)| (c, rest.trim())) {
            ("/help", _) => cmd_help(),
            ("/status", _) => cmd_status(&control),
            ("/say", text) if !text.is_empty() => {
                if let Ok(mut slot) = control.voice_slot().lock() {
                    *slot = Some(text.to_string());
                    println!("  queued voice command: {}", text.italic());
                }
            }
            ("/say", _) => println!("  usage: {}", "/say <text>".bold()),
            ("/tick", arg) => {
                let n: u32 = arg.parse().unwrap_or(1);
                for _ in 0..n {
                    let report = control.tick().await;
                    print_report(&report);
                }
            }
            ("/auto", _) => {
                println!(
                    "  {} (press Ctrl-C to stop)",
                    "Running autonomously".green().bold()
                );
                control.run().await;
            }
            ("/quit", _) | ("/exit", _) => {
                println!("{}", "Goodbye.".green());
                running.store(false, Ordering::SeqCst);
                break;
            }
            (other, _) => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Console Commands".bold().underline());
    println!("  {}    – control-loop status snapshot", "/status".bold().cyan());
    println!("  {}  – inject a voice command", "/say <txt>".bold().cyan());
    println!("  {}  – run n ticks (default 1)", "/tick [n]".bold().cyan());
    println!("  {}      – run autonomously until Ctrl-C", "/auto".bold().cyan());
    println!("  {} – leave the console", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_status(control: &ControlLoop) {
    let status = control.status();
    println!();
    println!("{}", "Status".bold().underline());
    println!("  heading          : {:.1}°", status.heading);
    println!("  ticks            : {}", status.tick_count);
    println!("  decisions        : {}", status.decision_count);
    println!(
        "  provenance       : remote {} / local {} / rate-limited {} / fail-safe {}",
        status.provenance_counts.remote,
        status.provenance_counts.local,
        status.provenance_counts.rate_limited,
        status.provenance_counts.fail_safe
    );
    println!(
        "  active behavior  : {}",
        status.active_behavior.unwrap_or("none")
    );
    println!(
        "  last command     : {}",
        status
            .last_command
            .as_ref()
            .map_or("none".to_string(), |c| c.action.label().to_string())
    );
    println!("  watchdog overruns: {}", status.watchdog_overruns);
    println!();
}

fn print_report(report: &TickReport) {
    let cmd = &report.decision.command;
    let mut line = format!(
        "  [{:?}] {}",
        report.decision.provenance,
        cmd.action.label().bold()
    );
    if let Some(reason) = &cmd.reason {
        line.push_str(&format!("  ({})", reason.dimmed()));
    }
    if let Some(speech) = &cmd.speech {
        line.push_str(&format!("  \"{}\"", speech.italic()));
    }
    if report.overrun {
        line.push_str(&format!("  {}", "watchdog overrun".yellow()));
    }
    println!("{line}");
}
