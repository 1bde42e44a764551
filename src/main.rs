mod cli;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::info;

use cli::{Args, Command};
use courtmate_scheduler::compatibility::{
    format_distance, haversine_miles, recommend_players, DEFAULT_RECOMMENDATION_LIMIT,
};
use courtmate_scheduler::config::Config;
use courtmate_scheduler::display::{print_candidates, print_suggestions, write_suggestions_to_file};
use courtmate_scheduler::logging::setup_logging;
use courtmate_scheduler::parser::load_store;
use courtmate_scheduler::rating::{ntrp_from_quiz, utr_to_ntrp, validate_utr};
use courtmate_scheduler::schedule::SmartScheduler;
use courtmate_scheduler::web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load config and setup logging before anything else so startup logs are never dropped
    let mut config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.port,
        "starting courtmate"
    );

    let store = load_store(&config.data).context("failed to load player data")?;
    info!(players = store.player_count(), "player data loaded");

    match args.command {
        Command::Web { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            println!("Access the API at http://localhost:{}", config.port);
            web::start_server(config, store).await?;
        }
        Command::Suggest {
            user,
            opponents,
            from,
            output,
        } => {
            let from = from.unwrap_or_else(|| Local::now().date_naive());
            let scheduler = SmartScheduler::new(&store, &config.scheduling, config.weights.clone());
            let suggestions = if opponents.is_empty() {
                scheduler.suggest_for_recommended(&user, from)?
            } else {
                scheduler.suggest(&user, &opponents, from)?
            };

            print_suggestions(&user, &suggestions);
            if let Some(path) = output {
                write_suggestions_to_file(&user, &suggestions, &path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Suggestions saved to {}", path.display());
            }
        }
        Command::Mutual {
            user,
            opponent,
            date,
        } => {
            let scheduler = SmartScheduler::new(&store, &config.scheduling, config.weights.clone());
            let slots = scheduler.mutual_availability(&user, &opponent, date)?;
            print_candidates(&user, &opponent, &slots);
        }
        Command::ConvertUtr { utr } => {
            let utr = validate_utr(utr)?;
            println!("UTR {:.2} -> NTRP {:.1}", utr, utr_to_ntrp(utr));
        }
        Command::Quiz { answers } => {
            let ntrp = ntrp_from_quiz(&answers)?;
            println!("Estimated NTRP {:.1} from {} answers", ntrp, answers.len());
        }
        Command::Recommend { user } => {
            let profile = store
                .profile(&user)
                .with_context(|| format!("no profile for player {user}"))?;
            let recommendations =
                recommend_players(profile, &store.profiles(), DEFAULT_RECOMMENDATION_LIMIT);

            println!("\n=== Recommended opponents for {} ===", user);
            if recommendations.is_empty() {
                println!("No compatible players found.");
            }
            for rec in &recommendations {
                // Distance only when both players shared coordinates
                let distance = store
                    .profile(&rec.recommended_player_id)
                    .and_then(|other| other.coordinates)
                    .zip(profile.coordinates)
                    .map(|(to, from)| format!(", {} away", format_distance(haversine_miles(from, to))))
                    .unwrap_or_default();
                println!(
                    "  {} ({:.0}%{}) {}",
                    rec.recommended_player_id,
                    rec.recommendation_score * 100.0,
                    distance,
                    rec.reasoning
                );
            }
        }
    }

    Ok(())
}
