// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event Matcher terminal client
//!
//! Loads the event catalog (remote API with cached/local/sample fallback),
//! ranks it against saved preferences, and runs an interactive swipe loop:
//! [l]ike, [p]ass, [s]uper-like, [m]atches, [q]uit.

use std::io::BufRead;

use chrono::Utc;
use event_matcher::{
    config::Config,
    engine::{MatchEngine, SimulatedSignals},
    models::{EventFormat, Interest, Occupation, Preferences, ScoredEvent},
    services::{AnalyticsSink, CatalogService, IdentityProvider, StoredIdentity},
    session::{Decision, Screen},
    store::{KvStore, UserStore},
    SessionController,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!("Starting Event Matcher");

    // Shared key-value store (the browser-profile analog).
    let kv = match &config.storage_path {
        Some(path) => KvStore::open_file(path),
        None => KvStore::in_memory(),
    };

    let store = UserStore::new(kv.clone());
    let identity = StoredIdentity::new(kv.clone());
    let analytics = AnalyticsSink::new(config.webhook_endpoint.clone());
    let _flush_task = analytics.spawn_periodic_flush();
    let catalog_service = CatalogService::new(config.clone(), kv.clone());

    let mut session = SessionController::new(store, MatchEngine::default(), analytics.clone())
        .with_signals(Box::new(SimulatedSignals::new(Utc::now())));

    // Interactive OAuth is out of scope for the terminal shell: reuse the
    // stored identity or continue as guest.
    let user = identity
        .current_user()
        .unwrap_or_else(|| identity.sign_in_as_guest());
    session.initialize(Some(user));

    if session.screen() == Screen::PreferencesNeeded {
        let preferences = prompt_preferences();
        session.save_preferences(&preferences);
    }

    let load = catalog_service.load().await;
    println!("{} events loaded ({})", load.events.len(), load.source.label());
    session.set_catalog(load.events);

    run_swipe_loop(&mut session);

    analytics.track_session_end().await;
    Ok(())
}

/// One-time preferences form on stdin. Empty answers are skipped.
fn prompt_preferences() -> Preferences {
    println!("Set your preferences (press enter to skip a field).");

    let occupation = read_line("Occupation (student/developer/designer/pm/entrepreneur/marketing): ")
        .parse::<Occupation>()
        .ok();
    let interests: Vec<Interest> = read_line(
        "Interests, comma-separated (tech/business/arts/networking/education/health): ",
    )
    .split(',')
    .filter_map(|s| s.trim().parse().ok())
    .collect();
    let format = read_line("Format (in-person/virtual/both): ")
        .parse::<EventFormat>()
        .ok();
    let location = read_line("Location (e.g. San Francisco): ");

    Preferences {
        display_name: None,
        occupation,
        interests,
        format,
        location,
        updated_at: None,
    }
}

fn run_swipe_loop(session: &mut SessionController) {
    let stdin = std::io::stdin();
    loop {
        let Some(card) = session.current_card() else {
            println!("No more events - you've seen them all!");
            break;
        };
        print_card(card);

        print!("[l]ike / [p]ass / [s]uper-like / [m]atches / [q]uit > ");
        use std::io::Write;
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break; // EOF
        }

        match line.trim() {
            "l" => {
                session.decide(Decision::Like);
                println!("Liked!");
            }
            "s" => {
                session.decide(Decision::SuperLike);
                println!("Super-liked!");
            }
            "p" => {
                session.decide(Decision::Pass);
            }
            "m" => {
                let matches = session.view_matches();
                println!("--- {} matches ---", matches.len());
                for m in &matches {
                    println!("  {} ({})", m.event.name, m.matched_at);
                }
                session.back_to_browsing();
            }
            "q" => break,
            _ => println!("Unknown command"),
        }
    }
}

fn print_card(card: &ScoredEvent) {
    println!();
    println!("=== {} ===", card.event.name);
    println!(
        "  by {} | {} | {:?}",
        card.event.organizer_name, card.event.start_at, card.event.location_type
    );
    if let Some(city_state) = &card.event.city_state {
        println!("  {}", city_state);
    }
    println!("  match score: {:.0}%", card.match_score * 100.0);
    if !card.match_details.interests_matched.is_empty() {
        let labels: Vec<String> = card
            .match_details
            .interests_matched
            .iter()
            .map(|i| i.to_string())
            .collect();
        println!("  matches your interests: {}", labels.join(", "));
    }
}

fn read_line(prompt: &str) -> String {
    use std::io::Write;
    print!("{}", prompt);
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
    line.trim().to_string()
}

/// Initialize logging with an env-filter; defaults keep the crate at info.
fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("event_matcher=info".parse().unwrap())
                .add_directive("warn".parse().unwrap()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
