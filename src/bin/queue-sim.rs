//! Queue Simulator CLI Tool
//!
//! Runs scripted matchmaking scenarios against an in-process matchmaker with
//! a simulated clock and prints the resulting queue and ratings.
//!
//! Usage:
//!   cargo run --bin queue-sim -- --help
//!   cargo run --bin queue-sim run-scenario --scenario requeue
//!   cargo run --bin queue-sim run-all-scenarios
//!   cargo run --bin queue-sim rotation --players 8 --rounds 5 --interval-minutes 20

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use match_hall::config::AppConfig;
use match_hall::{Matchmaker, Participant, ParticipantId, QueueEntryView};

#[derive(Parser)]
#[command(name = "queue-sim")]
#[command(about = "Scripted matchmaking scenarios against an in-process match-hall matchmaker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Participants per session
    #[arg(long, default_value = "4")]
    group_size: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a predefined scenario
    RunScenario {
        /// Scenario name (first-session, requeue, assistance, upset)
        #[arg(short, long)]
        scenario: String,
    },
    /// Run all predefined scenarios
    RunAllScenarios,
    /// Cycle a fixed roster through several rounds of sessions
    Rotation {
        /// Number of participants
        #[arg(short, long, default_value = "8")]
        players: usize,
        /// Number of rounds
        #[arg(short, long, default_value = "3")]
        rounds: usize,
        /// Simulated minutes between rounds
        #[arg(short, long, default_value = "15")]
        interval_minutes: i64,
    },
}

const SCENARIOS: [&str; 4] = ["first-session", "requeue", "assistance", "upset"];

/// Matchmaker plus a simulated clock
struct Simulation {
    matchmaker: Matchmaker,
    now: DateTime<Utc>,
}

impl Simulation {
    fn new(group_size: usize) -> Result<Self> {
        let mut config = AppConfig::default();
        config.matchmaking.group_size = group_size;
        Ok(Self {
            matchmaker: Matchmaker::from_config(&config)?,
            now: Utc::now(),
        })
    }

    fn advance(&mut self, minutes: i64) {
        self.now += Duration::minutes(minutes);
    }

    fn admit(&mut self, name: &str) -> Result<ParticipantId> {
        let admission = self.matchmaker.admit_at(name, self.now)?.value;
        Ok(admission.participant.id)
    }

    fn admit_with_rating(&mut self, name: &str, rating: i32) -> Result<ParticipantId> {
        let id = uuid::Uuid::new_v4();
        self.matchmaker
            .insert_participant(Participant::new(id, name.to_string(), rating, self.now))?;
        self.admit(name)
    }

    /// Form one session and resolve it with the first half of its roster winning
    fn play_session(&mut self) -> Result<Vec<ParticipantId>> {
        let session = self.matchmaker.form_session_at(self.now)?.value;
        let winners: Vec<ParticipantId> =
            session.roster[..session.roster.len() / 2].to_vec();
        self.matchmaker
            .resolve_session_at(&session.id, &winners, self.now)?;
        Ok(session.roster)
    }

    fn rating(&self, id: &ParticipantId) -> Result<i32> {
        Ok(self.matchmaker.participant(id)?.rating)
    }

    fn queue(&self) -> Vec<QueueEntryView> {
        self.matchmaker.queue_snapshot()
    }
}

fn print_queue(queue: &[QueueEntryView]) {
    if queue.is_empty() {
        println!("  (queue empty)");
        return;
    }
    println!("  {:>4}  {:<12} {:>6} {:>7}", "rank", "name", "rating", "weight");
    for entry in queue {
        println!(
            "  {:>4}  {:<12} {:>6} {:>7.2}",
            entry.rank, entry.name, entry.rating, entry.weight
        );
    }
}

fn print_ratings(sim: &Simulation) {
    let mut participants = sim.matchmaker.status().participants;
    participants.sort_by(|a, b| b.rating.cmp(&a.rating).then(a.name.cmp(&b.name)));
    println!("  {:<12} {:>6} {:>5} {:>6}", "name", "rating", "wins", "losses");
    for p in participants {
        println!(
            "  {:<12} {:>6} {:>5} {:>6}",
            p.name, p.rating, p.wins, p.losses
        );
    }
}

/// Four newcomers play once; winners gain and losers lose 16 points
fn first_session(group_size: usize) -> Result<bool> {
    let mut sim = Simulation::new(group_size)?;
    let ids = ["ana", "ben", "cai", "dee"]
        .iter()
        .map(|name| sim.admit(name))
        .collect::<Result<Vec<_>>>()?;
    print_queue(&sim.queue());

    sim.play_session()?;
    print_ratings(&sim);

    Ok(sim.rating(&ids[0])? == 1216 && sim.rating(&ids[3])? == 1184)
}

/// A participant returning after a session outranks a newcomer who queued first
fn requeue(group_size: usize) -> Result<bool> {
    let mut sim = Simulation::new(group_size)?;
    for name in ["ana", "ben", "cai", "dee"] {
        sim.admit(name)?;
    }
    sim.play_session()?;

    sim.admit("eve")?;
    sim.advance(30);
    let ana = sim.admit("ana")?;
    print_queue(&sim.queue());

    let queue = sim.queue();
    Ok(queue.first().map(|e| e.participant_id) == Some(ana)
        && queue.first().map(|e| e.weight) == Some(2.0))
}

/// A participant rated under the assistance threshold gets a head start
fn assistance(group_size: usize) -> Result<bool> {
    let mut sim = Simulation::new(group_size)?;
    sim.admit("ana")?;
    let novice = sim.admit_with_rating("nia", 950)?;
    print_queue(&sim.queue());

    let queue = sim.queue();
    Ok(queue.first().map(|e| e.participant_id) == Some(novice)
        && queue.first().map(|e| e.weight) == Some(1.3))
}

/// An underdog team beating a favoured one gains more than an even match pays
fn upset(group_size: usize) -> Result<bool> {
    let mut sim = Simulation::new(group_size)?;
    let underdogs = [
        sim.admit_with_rating("uma", 1000)?,
        sim.admit_with_rating("ugo", 1000)?,
    ];
    sim.advance(1);
    sim.admit_with_rating("fay", 1400)?;
    sim.admit_with_rating("fin", 1400)?;

    let session = sim.matchmaker.form_session_at(sim.now)?.value;
    sim.matchmaker
        .resolve_session_at(&session.id, &underdogs, sim.now)?;
    print_ratings(&sim);

    Ok(sim.rating(&underdogs[0])? == 1029)
}

fn run_scenario(name: &str, group_size: usize) -> Result<bool> {
    match name {
        "first-session" => first_session(group_size),
        "requeue" => requeue(group_size),
        "assistance" => assistance(group_size),
        "upset" => upset(group_size),
        _ => Err(anyhow!(
            "Unknown scenario '{}'. Available: {}",
            name,
            SCENARIOS.join(", ")
        )),
    }
}

fn rotation(group_size: usize, players: usize, rounds: usize, interval_minutes: i64) -> Result<()> {
    let mut sim = Simulation::new(group_size)?;
    let names: Vec<String> = (1..=players).map(|i| format!("player{:02}", i)).collect();

    for round in 1..=rounds {
        for name in &names {
            sim.admit(name)?;
        }
        println!("Round {} queue:", round);
        print_queue(&sim.queue());

        let mut played = 0;
        while sim.matchmaker.queue_len() >= group_size {
            sim.play_session()?;
            played += 1;
        }

        // Leftovers sit out this round
        for entry in sim.queue() {
            sim.matchmaker.withdraw(&entry.participant_id)?;
        }

        println!("Round {}: {} sessions played\n", round, played);
        sim.advance(interval_minutes);
    }

    println!("Final ratings:");
    print_ratings(&sim);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::RunScenario { scenario } => {
            println!("Running scenario: {}", scenario);
            if run_scenario(&scenario.to_lowercase(), cli.group_size)? {
                println!("Scenario completed successfully");
            } else {
                println!("Scenario produced unexpected results");
                std::process::exit(1);
            }
        }

        Commands::RunAllScenarios => {
            let mut passed = 0;
            let mut failed = 0;

            for name in SCENARIOS {
                println!("Running '{}' scenario...", name);
                match run_scenario(name, cli.group_size) {
                    Ok(true) => {
                        println!("PASSED\n");
                        passed += 1;
                    }
                    Ok(false) => {
                        println!("FAILED (unexpected results)\n");
                        failed += 1;
                    }
                    Err(e) => {
                        println!("FAILED ({})\n", e);
                        failed += 1;
                    }
                }
            }

            println!("Results: {} passed, {} failed", passed, failed);
            if failed > 0 {
                std::process::exit(1);
            }
        }

        Commands::Rotation {
            players,
            rounds,
            interval_minutes,
        } => rotation(cli.group_size, players, rounds, interval_minutes)?,
    }

    Ok(())
}
