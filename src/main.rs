use clap::{Parser, Subcommand};
use clicker::{
    models::Score,
    scoring::{compute_rank, top_k, LevelState},
    server,
    storage::{GameStore, SqliteStore},
    Settings,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "clicker")]
#[clap(about = "Clicker game server", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the game server
    Serve {
        /// Address to bind, overrides configuration
        #[clap(long)]
        host: Option<String>,

        /// Port to listen on, overrides configuration
        #[clap(short, long)]
        port: Option<u16>,
    },

    /// Show the level reached with a given click count
    Level {
        /// Lifetime clicks
        clicks: u64,
    },

    /// Print the top players from the database
    Leaderboard {
        /// Number of players to show
        #[clap(short, long)]
        limit: Option<usize>,
    },

    /// Create the database schema
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut settings = Settings::new().unwrap_or_else(|e| {
        eprintln!("Using default settings: {}", e);
        Settings::default()
    });

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.app.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Validate settings
    if let Err(e) = settings.validate() {
        error!("Invalid settings: {}", e);
        return Err(anyhow::anyhow!(e));
    }

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }

            info!("Starting {} v{}", settings.app.name, settings.app.version);
            server::start_server(settings).await?;
        }

        Commands::Level { clicks } => {
            let state = LevelState::from_score(Score(clicks));
            let rules = &settings.game;

            println!("\n=== Level for {} clicks ===", clicks);
            println!("Points: {}", state.points);
            println!("Level: {}", state.level);
            println!("Progress: {}/{} ({}%)", state.points_into_level, state.threshold, state.progress_percent);
            println!("Avatar upload: {}", if rules.can_upload_avatar(Score(clicks)) { "unlocked" } else { "locked" });
            if rules.is_winning_tap(Score(clicks)) {
                println!("This click count is a winning tap!");
            }
        }

        Commands::Leaderboard { limit } => {
            let store = SqliteStore::connect(&settings.database).await?;
            store.migrate().await?;

            let limit = limit.unwrap_or(settings.game.leaderboard_size);
            let all = store.player_scores().await?;
            let peers: Vec<Score> = all.iter().map(|p| Score(p.clicks)).collect();
            let players = top_k(all, limit);

            println!("\n=== Top {} ===", limit);
            for player in &players {
                let place = compute_rank(Score(player.clicks), peers.iter().copied());
                let level = LevelState::from_score(Score(player.clicks)).level;
                println!("{:>3}. {:<20} {:>10} clicks  (level {})", place, player.username, player.clicks, level);
            }
        }

        Commands::Migrate => {
            let store = SqliteStore::connect(&settings.database).await?;
            store.migrate().await?;
            info!("Database ready at {}", settings.database.url);
        }
    }

    Ok(())
}
