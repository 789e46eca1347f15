mod api;
mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::api::ApiClient;
use crate::commands::{
    cmd_categories, cmd_history, cmd_history_clear, cmd_history_remove, cmd_list_add,
    cmd_list_clear, cmd_list_remove, cmd_list_servings, cmd_list_show, cmd_recipes, cmd_shop,
    cmd_shop_check, cmd_show,
};
use crate::config::Config;
use choosy_core::history::DEFAULT_PAGE_SIZE;
use choosy_core::service::ChoosyService;

const DEFAULT_LOG_FILTER: &str = "choosy=warn,choosy_core=warn";

#[derive(Parser)]
#[command(
    name = "choosy",
    version,
    about = "Pick recipes, then get one merged shopping list",
    long_about = "Browse the recipe catalog, keep a cooking list with the servings you \
                  want, and build a single shopping list with quantities merged across \
                  recipes.\n\nSet CHOOSY_API_URL to point at the recipe API."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the recipe catalog
    Recipes {
        /// Only show recipes in this category
        #[arg(short, long)]
        category: Option<String>,
        /// Search recipe names and descriptions
        #[arg(short, long)]
        search: Option<String>,
        /// Page number, starting at 1
        #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recipe categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a recipe (recorded in browsing history)
    Show {
        /// Recipe ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the cooking list
    List {
        #[command(subcommand)]
        command: ListCommands,
    },
    /// Show the merged shopping list for the cooking list
    Shop {
        #[command(subcommand)]
        command: Option<ShopCommands>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show browsing history
    History {
        #[command(subcommand)]
        command: Option<HistoryCommands>,
        /// Number of entries to show
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: i64,
        /// Number of entries to skip
        #[arg(short, long, default_value = "0")]
        offset: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ListCommands {
    /// Add a recipe to the cooking list
    Add {
        /// Recipe ID
        id: String,
        /// Servings to cook (default: the recipe's own servings)
        #[arg(short, long)]
        servings: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a recipe from the cooking list
    Remove {
        /// Recipe ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the servings for a recipe on the list
    Servings {
        /// Recipe ID
        id: String,
        /// New number of servings
        servings: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the cooking list
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every recipe from the cooking list
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ShopCommands {
    /// Toggle an ingredient between to-buy and purchased
    Check {
        /// Ingredient name, exactly as shown in the list
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// Delete every view of the given recipes
    Remove {
        /// Recipe IDs
        #[arg(required = true)]
        ids: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete all browsing history
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("CHOOSY_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let svc = ChoosyService::new(&config.db_path)?;
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        api = %config.api.base_url,
        "loaded config"
    );
    // Commands that never touch the network skip building the client
    let api = || ApiClient::new(&config.api);

    match cli.command {
        Commands::Recipes {
            category,
            search,
            page,
            json,
        } => cmd_recipes(&api()?, category, search, page, json),
        Commands::Categories { json } => cmd_categories(&api()?, json),
        Commands::Show { id, json } => cmd_show(&svc, &api()?, &id, json),
        Commands::List { command } => match command {
            ListCommands::Add { id, servings, json } => {
                cmd_list_add(&svc, &api()?, &id, servings, json)
            }
            ListCommands::Remove { id, json } => cmd_list_remove(&svc, &id, json),
            ListCommands::Servings { id, servings, json } => {
                cmd_list_servings(&svc, &id, servings, json)
            }
            ListCommands::Show { json } => cmd_list_show(&svc, json),
            ListCommands::Clear { json } => cmd_list_clear(&svc, json),
        },
        Commands::Shop { command, json } => match command {
            Some(ShopCommands::Check { name, json: sub_json }) => {
                cmd_shop_check(&svc, &api()?, &name, json || sub_json)
            }
            None => cmd_shop(&svc, &api()?, json),
        },
        Commands::History {
            command,
            limit,
            offset,
            json,
        } => match command {
            Some(HistoryCommands::Remove { ids, json: sub_json }) => {
                cmd_history_remove(&svc, &ids, json || sub_json)
            }
            Some(HistoryCommands::Clear { json: sub_json }) => {
                cmd_history_clear(&svc, json || sub_json)
            }
            None => cmd_history(&svc, limit, offset, json),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_add_with_servings() {
        let cli = Cli::try_parse_from(["choosy", "list", "add", "r1", "--servings", "4"]).unwrap();
        match cli.command {
            Commands::List {
                command: ListCommands::Add { id, servings, json },
            } => {
                assert_eq!(id, "r1");
                assert_eq!(servings, Some(4.0));
                assert!(!json);
            }
            _ => panic!("expected list add"),
        }
    }

    #[test]
    fn test_parse_shop_check() {
        let cli = Cli::try_parse_from(["choosy", "shop", "check", "鸡蛋", "--json"]).unwrap();
        match cli.command {
            Commands::Shop {
                command: Some(ShopCommands::Check { name, json }),
                ..
            } => {
                assert_eq!(name, "鸡蛋");
                assert!(json);
            }
            _ => panic!("expected shop check"),
        }
    }

    #[test]
    fn test_parse_history_defaults() {
        let cli = Cli::try_parse_from(["choosy", "history"]).unwrap();
        match cli.command {
            Commands::History {
                command: None,
                limit,
                offset,
                ..
            } => {
                assert_eq!(limit, DEFAULT_PAGE_SIZE);
                assert_eq!(offset, 0);
            }
            _ => panic!("expected history"),
        }
    }

    #[test]
    fn test_page_must_be_positive() {
        assert!(Cli::try_parse_from(["choosy", "recipes", "--page", "0"]).is_err());
        assert!(Cli::try_parse_from(["choosy", "history", "remove"]).is_err());
    }
}
