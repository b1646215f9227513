use clap::Subcommand;
use focusnest_core::{OwnedCollectible, Rarity};
use serde::Serialize;

use super::{print_json, App, CliResult};

#[derive(Subcommand)]
pub enum AviaryAction {
    /// List hatched birds, newest first
    List {
        /// Only birds of this rarity
        #[arg(long)]
        rarity: Option<Rarity>,
    },
    /// Give a bird a nickname (empty clears it)
    Rename {
        /// Collectible id
        id: String,
        nickname: String,
    },
}

#[derive(Serialize)]
struct BirdView<'a> {
    #[serde(flatten)]
    bird: &'a OwnedCollectible,
    name: &'a str,
    stage_progress_pct: f64,
}

pub async fn run(action: AviaryAction, owner: Option<String>) -> CliResult {
    let app = App::open(owner)?;
    let owner = app.owner.as_str();

    match action {
        AviaryAction::List { rarity } => {
            let birds = app.progression.list_collectibles(owner, rarity).await?;
            let views: Vec<_> = birds
                .iter()
                .map(|bird| BirdView {
                    bird,
                    name: bird.display_name(app.species_name(&bird.catalog_ref)),
                    stage_progress_pct: bird.stage_progress_pct(),
                })
                .collect();
            print_json(&views)?;
        }
        AviaryAction::Rename { id, nickname } => {
            let bird = app
                .progression
                .rename_collectible(owner, &id, &nickname)
                .await?;
            print_json(&bird)?;
        }
    }
    Ok(())
}
