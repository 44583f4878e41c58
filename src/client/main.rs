//! AI Dex command-line front end.
//!
//! Prints one page of the public gallery:
//!
//! ```text
//! aidex [--page N] [--type TYPE]... [--search TEXT] [--mine]
//! ```
//!
//! `AIDEX_API_URL` and `AIDEX_CONFIG` select the server and config file;
//! `RUST_LOG` controls logging.

use aidex::client::{AppState, Config};
use aidex::shared::monster::MonsterType;
use aidex::shared::pagination::{showing_range, visible_pages, PageItem};
use aidex::shared::rarity::calculate_rarity;
use clap::Parser;

/// Print a page of AI Dex monsters
#[derive(Parser, Debug)]
#[command(name = "aidex")]
#[command(version, about = "Browse the AI Dex monster catalog", long_about = None)]
struct Args {
    /// Page to show, starting at 1
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Filter by type; give at most two
    #[arg(long = "type", value_name = "TYPE")]
    types: Vec<MonsterType>,

    /// Search monster names
    #[arg(long)]
    search: Option<String>,

    /// List the signed-in user's monsters instead of the gallery
    #[arg(long)]
    mine: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    tracing::info!("Using API at {}", config.server_url());

    let mut state = AppState::new(config)?;
    state.start().await;

    for monster_type in &args.types {
        if !state.toggle_type(*monster_type) {
            tracing::warn!("Ignoring type {}: at most two types can be selected", monster_type);
        }
    }
    if let Some(search) = args.search {
        state.input_search(search);
        state.settle_search().await;
    }
    state.set_page(args.page);

    let result = if args.mine {
        state.load_my_monsters().await
    } else {
        state.load_gallery().await
    };

    let data = match result {
        Ok(data) => data,
        Err(e) => {
            tracing::error!("Failed to load monsters: {}", e);
            return Err(e.into());
        }
    };

    for monster in &data.monsters {
        let rarity = calculate_rarity(monster);
        let types: Vec<&str> = monster.types.iter().map(MonsterType::as_str).collect();
        println!(
            "{:<24} {:<10} {:>4}  {}",
            monster.name,
            rarity.style().label,
            monster.stats.total(),
            types.join("/")
        );
    }

    let pagination = data.pagination;
    match showing_range(pagination.page, pagination.page_size, pagination.total_items) {
        Some((from, to)) => println!(
            "\nShowing {} to {} of {} monsters",
            from, to, pagination.total_items
        ),
        None => println!("\nNo monsters found"),
    }

    let pager: Vec<String> = visible_pages(pagination.page, pagination.total_pages())
        .into_iter()
        .map(|item| match item {
            PageItem::Page(n) if n == pagination.page => format!("[{}]", n),
            PageItem::Page(n) => n.to_string(),
            PageItem::Ellipsis => "...".to_string(),
        })
        .collect();
    if !pager.is_empty() {
        println!("{}", pager.join(" "));
    }

    for notification in state.notifications() {
        eprintln!("{}", notification);
    }

    Ok(())
}
