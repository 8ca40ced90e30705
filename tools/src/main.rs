//! runway-runner: headless simulation runner for Runway.
//!
//! Usage:
//!   runway-runner --seed 12345 --days 365 --template crm
//!   runway-runner --seed 7 --difficulty hard --speed 4
//!   runway-runner --seed 12345 --ipc-mode
//!
//! Batch mode plays a simple founder strategy and prints a summary.
//! IPC mode reads one JSON request per line on stdin and answers each
//! with the current snapshot (or an error) on stdout.

use anyhow::Result;
use runway_core::{
    clock::GameSpeed,
    command::PlayerCommand,
    config::{Difficulty, GameConfig},
    engine::SimEngine,
    funding_subsystem::RoundType,
    product_subsystem::{daily_progress, days_to_complete, Milestone},
    snapshot::GameState,
    team_subsystem::Role,
    types::Days,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcRequest {
    GetState,
    SelectProduct {
        template_id: String,
    },
    Tick {
        #[serde(default = "one_day")]
        days: Days,
        #[serde(default = "one_step")]
        count: u64,
    },
    Command {
        command: PlayerCommand,
    },
    Quit,
}

fn one_day() -> Days {
    1.0
}

fn one_step() -> u64 {
    1
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let days = parse_arg(&args, "--days", 365u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let template = string_arg(&args, "--template");
    let speed = GameSpeed::from_factor(parse_arg(&args, "--speed", 1u32));

    let mut config = match GameConfig::load(data_dir) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Cannot load config from {data_dir}: {e}; using built-in catalog");
            GameConfig::builtin()
        }
    };
    if let Some(raw) = string_arg(&args, "--difficulty") {
        match parse_difficulty(raw) {
            Some(difficulty) => config = config.with_difficulty(difficulty),
            None => log::warn!("Unknown difficulty '{raw}'; keeping {:?}", config.difficulty),
        }
    }

    let run_id = format!("run-{seed}-{}", chrono::Utc::now().format("%Y%m%d%H%M%S"));
    let mut engine = SimEngine::new(run_id.clone(), seed, config)?;

    if ipc_mode {
        if let Some(template) = template {
            engine.select_product(template)?;
        }
        return run_ipc_loop(&mut engine);
    }

    let template = template.unwrap_or("crm");
    println!("Runway — runway-runner");
    println!("  seed:      {seed}");
    println!("  days:      {days}");
    println!("  template:  {template}");
    println!("  speed:     {}x", speed.multiplier());
    println!("  data_dir:  {data_dir}");
    println!();

    engine.select_product(template)?;
    engine.set_game_speed(speed)?;
    let mut journal_entries = 0usize;
    for _ in 0..days {
        if engine.state().game_over {
            break;
        }
        play_day(&mut engine);
        engine.tick(engine.state().clock.days_per_step())?;
        journal_entries += engine.drain_event_log().len();
    }
    journal_entries += engine.drain_event_log().len();
    print_summary(&engine, &run_id, journal_entries);
    Ok(())
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let request: IpcRequest = match serde_json::from_str(&buffer) {
            Ok(r) => r,
            Err(e) => {
                reply_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        let outcome = match request {
            IpcRequest::Quit => break,
            IpcRequest::GetState => Ok(()),
            IpcRequest::SelectProduct { template_id } => {
                engine.select_product(&template_id).map(|_| ())
            }
            IpcRequest::Tick { days, count } => {
                (0..count).try_for_each(|_| engine.tick(days).map(|_| ()))
            }
            IpcRequest::Command { command } => engine.apply_command(command).map(|_| ()),
        };
        // The IPC client only ever sees snapshots.
        engine.drain_event_log();

        match outcome {
            Ok(()) => {
                writeln!(stdout, "{}", engine.state().to_json()?)?;
                stdout.flush()?;
            }
            Err(e) => reply_error(&mut stdout, &e.to_string())?,
        }
    }
    Ok(())
}

fn reply_error(stdout: &mut io::Stdout, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(stdout, "{}", err_json)?;
    stdout.flush()?;
    Ok(())
}

/// A cautious founder: hire a small team while runway allows, answer every
/// event with its first option, raise a seed round once, take the first offer.
fn play_day(engine: &mut SimEngine) {
    let state = engine.snapshot();
    let mut commands = Vec::new();

    for event in &state.events.pending_events {
        if let Some(option) = event.options.first() {
            commands.push(PlayerCommand::RespondToEvent {
                event_id: event.id.clone(),
                option_id: option.id.clone(),
            });
        }
    }

    if let Some(role) = next_hire(&state) {
        let cheapest = state
            .team
            .candidate_pool
            .iter()
            .filter(|c| c.role == role)
            .min_by(|a, b| a.expected_salary.total_cmp(&b.expected_salary));
        if let Some(candidate) = cheapest {
            commands.push(PlayerCommand::Hire { candidate_id: candidate.id.clone() });
        }
    }

    match &state.funding.active_round {
        None if state.funding.total_raised <= 0.0 => {
            commands.push(PlayerCommand::StartFundraising {
                round_type: RoundType::Seed,
                investor_interest: None,
            });
        }
        Some(round) => {
            if let Some(offer) = round.offers.first() {
                commands.push(PlayerCommand::AcceptFundingOffer { offer_id: offer.id.clone() });
            }
        }
        None => {}
    }

    for command in commands {
        if let Err(e) = engine.apply_command(command) {
            log::debug!("strategy command skipped: {e}");
        }
    }
}

fn next_hire(state: &GameState) -> Option<Role> {
    let comfortable = state.runway().map_or(true, |months| months > 9.0);
    if !comfortable {
        return None;
    }
    let count = |role: Role| state.team.employees.iter().filter(|e| e.role == role).count();
    if count(Role::Engineer) < 3 {
        Some(Role::Engineer)
    } else if state.product.current_milestone >= Milestone::Mvp && count(Role::Sales) < 2 {
        Some(Role::Sales)
    } else if count(Role::Designer) < 1 {
        Some(Role::Designer)
    } else {
        None
    }
}

fn print_summary(engine: &SimEngine, run_id: &str, journal_entries: usize) {
    let state = engine.state();
    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {run_id}");
    println!("  days elapsed:   {:.0}", state.current_time());
    println!("  date:           {}", state.clock.current_date());
    println!("  money:          ${:.0}", state.money());
    println!("  expenses/mo:    ${:.0}", state.finance.monthly_expenses);
    println!("  revenue/mo:     ${:.0}", state.finance.monthly_revenue);
    match state.runway() {
        Some(months) => println!("  runway:         {months:.1} months"),
        None => println!("  runway:         unbounded"),
    }
    println!("  headcount:      {}", state.team.headcount());
    println!(
        "  product:        {:?} ({:.1}% built, {} of {} features)",
        state.product.current_milestone,
        state.product.overall_progress,
        state.product.completed_count(),
        state.product.features.len()
    );
    let next_feature = state
        .product
        .features
        .iter()
        .filter(|f| !f.is_complete())
        .min_by_key(|f| f.priority);
    if let Some(feature) = next_feature {
        match days_to_complete(feature, daily_progress(&state.team)) {
            Some(eta) => println!("  next feature:   {} (~{eta:.0} days)", feature.name),
            None => println!("  next feature:   {} (stalled)", feature.name),
        }
    }
    println!("  pmf:            {:.3}", state.product.product_market_fit);
    println!("  raised:         ${:.0} for {:.1}%", state.funding.total_raised, state.funding.total_equity);
    println!("  events handled: {}", state.events.event_history.len());
    println!("  journal size:   {journal_entries}");
    if let Some(reason) = &state.game_over_reason {
        println!();
        println!("  GAME OVER: {reason}");
    }
}

fn parse_difficulty(raw: &str) -> Option<Difficulty> {
    match raw.to_ascii_lowercase().as_str() {
        "easy" => Some(Difficulty::Easy),
        "medium" => Some(Difficulty::Medium),
        "hard" => Some(Difficulty::Hard),
        _ => None,
    }
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
