// CLI entry point for the surf draft coordinator.
//
// Hosts the overlay relay and the draft coordinator in one process: overlay
// viewers connect over TCP while an operator drives the draft from stdin.
// The console stands in for the chat-side command surface; the overlay
// protocol it publishes is the production one, so a browser overlay pointed
// at the printed session id renders the draft live.
//
// Usage:
//   draftd [OPTIONS]
//     --port <PORT>    Overlay relay listen port (default: 8080)
//
// Console commands:
//   start <name_a> <name_b>   Open a draft between two participants
//   ban <name> <map>          Submit a ban for the named participant
//   pick <name> <map>         Submit a pick for the named participant
//   info                      Show the active draft's status
//   maps                      List the map pool in tiebreak order
//   quit                      Exit

use std::io::{self, BufRead, Write};

use surfdraft_coordinator::coordinator::DraftCoordinator;
use surfdraft_protocol::message::Participant;
use surfdraft_protocol::types::{ActionKind, ActorId};
use surfdraft_relay::server::{RelayConfig, start_relay};

fn main() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = parse_args();
    let (handle, addr) = match start_relay(config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to start relay: {e}");
            std::process::exit(1);
        }
    };
    println!("Overlay relay listening on {addr}");

    let mut coordinator = DraftCoordinator::new(handle.publisher());
    run_console(&mut coordinator);

    println!("Shutting down...");
    handle.stop();
}

/// Parse command-line arguments into a `RelayConfig`. Uses simple
/// `std::env::args()` matching — no clap dependency.
fn parse_args() -> RelayConfig {
    let mut config = RelayConfig::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                config.port = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--port requires a valid port number");
                    std::process::exit(1);
                });
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    config
}

fn print_usage() {
    println!("Usage: draftd [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --port <PORT>    Overlay relay listen port (default: 8080)");
    println!("  --help, -h       Show this help");
}

/// Read console commands until EOF or `quit`.
fn run_console(coordinator: &mut DraftCoordinator) {
    print_console_help();
    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => {}
            ["start", a, b] => handle_start(coordinator, a, b),
            ["ban", name, map] => handle_action(coordinator, name, ActionKind::Ban, map),
            ["pick", name, map] => handle_action(coordinator, name, ActionKind::Pick, map),
            ["info"] => handle_info(coordinator),
            ["maps"] => handle_maps(coordinator),
            ["quit" | "exit"] => break,
            _ => println!("Unrecognized command. Type a command like: start Alice Bob"),
        }
    }
}

fn print_console_help() {
    println!("Commands:");
    println!("  start <name_a> <name_b>   Open a draft between two participants");
    println!("  ban <name> <map>          Submit a ban for the named participant");
    println!("  pick <name> <map>         Submit a pick for the named participant");
    println!("  info                      Show the active draft's status");
    println!("  maps                      List the map pool in tiebreak order");
    println!("  quit                      Exit");
}

fn handle_start(coordinator: &mut DraftCoordinator, a: &str, b: &str) {
    let starter = Participant { id: ActorId(a.to_string()), name: a.to_string() };
    let opponent = Participant { id: ActorId(b.to_string()), name: b.to_string() };
    match coordinator.start(starter, opponent) {
        Ok(receipt) => {
            println!("Map selection started: {a} vs {b}");
            println!("Session ID: {} (use this to connect to the web page)", receipt.session_id);
            if let Some(prompt) = receipt.prompt {
                println!("{prompt}");
            }
        }
        Err(e) => println!("{e}"),
    }
}

fn handle_action(coordinator: &mut DraftCoordinator, name: &str, kind: ActionKind, map: &str) {
    let actor = ActorId(name.to_string());
    match coordinator.submit_action(&actor, kind, map) {
        Ok(receipt) => {
            let verb = match receipt.action.kind {
                ActionKind::Ban => "banned",
                ActionKind::Pick => "picked",
            };
            println!("{} {verb} {}", receipt.action.actor_label, receipt.action.map);
            if let Some(prompt) = receipt.next_prompt {
                println!("{prompt}");
            }
            if let Some(summary) = receipt.summary {
                println!("All turns completed!");
                if let Some(winner) = summary.tiebreak {
                    println!("Tie Breaker auto-picked: {winner}");
                }
                println!("Map selection complete!");
            }
        }
        Err(e) => println!("{e}"),
    }
}

fn handle_info(coordinator: &DraftCoordinator) {
    match coordinator.describe() {
        Ok(status) => {
            println!("Users: {} vs {}", status.participants[0], status.participants[1]);
            println!("Session ID: {}", status.session_id);
            println!("Turn: {}/{}", status.turn_number, status.turn_total);
            println!("Current Turn: {}", status.current_turn);
            println!("Actions Completed: {}", status.actions_completed);
        }
        Err(e) => println!("{e}"),
    }
}

fn handle_maps(coordinator: &DraftCoordinator) {
    for name in coordinator.pool().names() {
        println!("{name}");
    }
}
