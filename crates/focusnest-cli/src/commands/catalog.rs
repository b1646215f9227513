use clap::Subcommand;
use focusnest_core::{Config, Rarity};

use super::{load_catalog, print_json, CliResult};

#[derive(Subcommand)]
pub enum CatalogAction {
    /// List catalog entries
    List {
        #[arg(long)]
        rarity: Option<Rarity>,
    },
}

pub fn run(action: CatalogAction) -> CliResult {
    let config = Config::load()?;
    let catalog = load_catalog(&config)?;

    match action {
        CatalogAction::List { rarity } => {
            let entries: Vec<_> = catalog
                .entries()
                .iter()
                .filter(|entry| rarity.map_or(true, |r| entry.rarity == r))
                .collect();
            print_json(&entries)
        }
    }
}
