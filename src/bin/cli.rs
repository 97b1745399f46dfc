use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prediction_widgets::checkout::{CheckoutForm, CheckoutWidget};
use prediction_widgets::config::Config;
use prediction_widgets::data::{FileStore, KeyValueStore};
use prediction_widgets::league_metrics::{load_league_metrics, LeagueSelector};
use prediction_widgets::live_matches::LiveMatchesWidget;
use prediction_widgets::login::{GateState, LicenseGate};
use prediction_widgets::manual_odds::Side;
use prediction_widgets::news_feed::NewsFeedWidget;
use prediction_widgets::standings::{format_table, StandingsWidget};
use prediction_widgets::upcoming::UpcomingMatchesWidget;
use prediction_widgets::weekly_results::WeeklyResultsWidget;
use prediction_widgets::{
    fetch_league_overview, HttpTransport, LeagueId, LoadState, RemoteAccessor, SubscriptionPlan,
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cli", about = "Match predictions in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List supported leagues
    Leagues,
    /// Landing-page summary for a league
    Overview { league: u32 },
    /// Follow live matches, refreshed on the poll interval
    Live {
        league: u32,
        /// Print the first result and exit
        #[arg(long)]
        once: bool,
    },
    Standings { league: u32 },
    News { league: u32 },
    Metrics { league: u32 },
    /// Past predictions grouped by week
    Results { league: u32, year: i32 },
    /// Upcoming matches, optionally predicting one with manual odds
    Upcoming {
        league: u32,
        #[arg(long)]
        predict: Option<String>,
        #[arg(long)]
        home_odds: Option<String>,
        #[arg(long)]
        away_odds: Option<String>,
    },
    Login { key: String },
    Logout,
    Status,
    Subscribe {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum, default_value = "monthly")]
        plan: SubscriptionPlan,
    },
}

fn print_state<T>(state: &LoadState<T>, show: impl FnOnce(&T)) {
    match state {
        LoadState::Loaded(value) => show(value),
        LoadState::Failed(msg) => eprintln!("Error: {}", msg),
        LoadState::Idle => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load();

    let transport = HttpTransport::new(&config).context("Failed to build HTTP transport")?;
    let api = Arc::new(RemoteAccessor::new(transport).with_timeout(config.request_timeout));
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.session_store_path));

    match cli.command {
        Command::Leagues => {
            let selector = LeagueSelector::default();
            for league in selector.leagues() {
                println!("{:>4}  {} ({})", league.id, league.name, league.country);
            }
        }
        Command::Overview { league } => {
            let overview = fetch_league_overview(&api, LeagueId(league)).await;
            println!("{}\n", overview.metrics.league);
            println!(
                "Accuracy: {} | Matches analyzed: {} | Avg goals: {}\n",
                overview.metrics.accuracy,
                overview.metrics.matches_analyzed,
                overview.metrics.avg_goals
            );
            print_state(&overview.standings, |rows| print!("{}", format_table(rows)));
            println!("\nUPCOMING\n");
            print_state(&overview.upcoming, |matches| {
                for m in matches {
                    println!("{}", m.format());
                }
            });
            println!("\nNEWS\n");
            print_state(&overview.news, |items| {
                for item in items.iter().take(5) {
                    println!("{} | {}", item.timestamp.format("%Y-%m-%d %H:%M"), item.title);
                }
            });
        }
        Command::Live { league, once } => {
            let mut live = LiveMatchesWidget::with_interval(api, config.live_poll_interval);
            let mut rx = live.subscribe();
            live.activate(LeagueId(league));

            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = rx.borrow_and_update().clone();
                        if snapshot.sequence == 0 {
                            continue;
                        }
                        // nothing is printed for an empty list
                        if let Some(matches) = snapshot.render() {
                            println!("\nLIVE ({})\n", chrono::Local::now().format("%H:%M:%S"));
                            for m in matches {
                                println!("{}", m.format());
                            }
                        }
                        if once {
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            live.deactivate();
        }
        Command::Standings { league } => {
            let mut standings = StandingsWidget::new(api);
            print_state(standings.load(LeagueId(league)).await, |rows| {
                print!("{}", format_table(rows))
            });
        }
        Command::News { league } => {
            let mut news = NewsFeedWidget::new(api);
            print_state(news.load(LeagueId(league)).await, |items| {
                for item in items {
                    println!(
                        "[{}] {:?}: {}",
                        item.timestamp.format("%Y-%m-%d %H:%M"),
                        item.kind,
                        item.title
                    );
                }
            });
            if !news.trending().is_empty() {
                println!("\nTRENDING\n");
                for topic in news.trending() {
                    println!("{} ({})", topic.title, topic.mentions);
                }
            }
        }
        Command::Metrics { league } => {
            let view = load_league_metrics(&api, LeagueId(league)).await;
            println!("{}", view.league);
            println!("  Accuracy:         {}", view.accuracy);
            println!("  Matches analyzed: {}", view.matches_analyzed);
            println!("  Avg goals:        {}", view.avg_goals);
            println!("  Home win rate:    {}", view.home_win_rate);
        }
        Command::Results { league, year } => {
            let mut results = WeeklyResultsWidget::new(api);
            print_state(results.load(LeagueId(league), year).await, |groups| {
                for group in groups {
                    let accuracy = group
                        .accuracy()
                        .map_or_else(|| "pending".to_string(), |a| format!("{:.0}%", a * 100.0));
                    println!(
                        "Week {:>2}: {}/{} correct ({})",
                        group.week,
                        group.correct(),
                        group.settled(),
                        accuracy
                    );
                }
            });
            if let Some(overall) = results.overall_accuracy() {
                println!("\nSeason accuracy: {:.1}%", overall * 100.0);
            }
        }
        Command::Upcoming {
            league,
            predict,
            home_odds,
            away_odds,
        } => {
            let mut upcoming = UpcomingMatchesWidget::new(api);
            print_state(upcoming.load(LeagueId(league)).await, |matches| {
                for m in matches {
                    println!("{:>10}  {} ({})", m.id, m.format(), m.date.format("%Y-%m-%d %H:%M"));
                }
            });

            if let Some(match_id) = predict {
                let fixture = upcoming
                    .find(&match_id)
                    .cloned()
                    .with_context(|| format!("Match {} is not in the upcoming list", match_id))?;
                if let Some(raw) = home_odds {
                    upcoming.odds_mut().edit(&fixture, Side::Home, &raw);
                }
                if let Some(raw) = away_odds {
                    upcoming.odds_mut().edit(&fixture, Side::Away, &raw);
                }
                match upcoming.predict(&match_id).await {
                    Ok(prediction) => {
                        println!("\nPrediction for {}: {:?}", fixture.format(), prediction);
                        let odds = upcoming.odds().for_match(&fixture);
                        if let (Some((home, away)), Some(confidence)) =
                            (odds.implied_probabilities(), prediction.confidence)
                        {
                            println!(
                                "Market: home {:.1}% / away {:.1}% | Model confidence: {:.1}%",
                                home * 100.0,
                                away * 100.0,
                                confidence * 100.0
                            );
                        }
                    }
                    Err(e) => eprintln!("Error: {}", e.user_message()),
                }
            }
        }
        Command::Login { key } => {
            let mut gate = LicenseGate::new(api, store);
            gate.set_input(&key);
            match gate.submit().await {
                Ok(session) => println!(
                    "Logged in ({} plan, expires {})",
                    session.subscription_type,
                    session.expires_at.format("%Y-%m-%d")
                ),
                Err(e) => eprintln!("Login failed: {}", e.user_message()),
            }
        }
        Command::Logout => {
            let mut gate = LicenseGate::new(api, store);
            gate.logout().context("Failed to log out")?;
            println!("Logged out");
        }
        Command::Status => {
            let mut gate = LicenseGate::new(api, store);
            gate.restore();
            let session = match gate.state() {
                GateState::Authenticated { session } => Some(session.clone()),
                _ => None,
            };
            match session {
                Some(session) => {
                    let expired = session.is_expired(chrono::Utc::now());
                    println!(
                        "License {} ({}), {} {}",
                        session.email,
                        session.subscription_type,
                        if expired { "expired" } else { "valid until" },
                        session.expires_at.format("%Y-%m-%d")
                    );
                }
                None => match gate.prefill_remembered() {
                    Some(_) => println!("Not logged in (remembered key: {})", gate.input()),
                    None => println!("Not logged in"),
                },
            }
        }
        Command::Subscribe { email, name, plan } => {
            let mut checkout = CheckoutWidget::new(api)
                .with_publishable_key(config.payment_publishable_key.clone());
            let form = CheckoutForm { email, name, plan };
            match checkout.submit(&form).await {
                Ok(receipt) => {
                    println!("Subscription {} created", receipt.subscription_id);
                    if let Some(url) = receipt.checkout_url {
                        println!("Complete payment at {}", url);
                    }
                    if let Some(key) = receipt.license_key {
                        println!("License key: {}", key);
                    }
                }
                Err(e) => eprintln!("Checkout failed: {}", e.user_message()),
            }
        }
    }

    Ok(())
}
