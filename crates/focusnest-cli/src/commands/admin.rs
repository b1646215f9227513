use clap::Subcommand;
use focusnest_core::{AffinityTag, Rarity};

use super::{print_json, App, CliResult};

#[derive(Subcommand)]
pub enum AdminAction {
    /// Lay eggs of a fixed rarity that are ready immediately
    ForceEggs {
        #[arg(long, default_value = "1")]
        count: u32,
        #[arg(long, default_value = "common")]
        rarity: Rarity,
        #[arg(long, default_value = "seed")]
        affinity: AffinityTag,
    },
    /// Hatch every egg regardless of its deadline
    HatchAll,
    /// Zero cumulative statistics
    ResetStats,
}

pub async fn run(action: AdminAction, owner: Option<String>) -> CliResult {
    let app = App::open(owner)?;
    let owner = app.owner.as_str();

    match action {
        AdminAction::ForceEggs {
            count,
            rarity,
            affinity,
        } => {
            let eggs = app
                .progression
                .force_generate_eggs(owner, count, affinity, rarity)
                .await?;
            print_json(&eggs)
        }
        AdminAction::HatchAll => {
            let birds = app.progression.force_hatch_all(owner).await?;
            print_json(&birds)
        }
        AdminAction::ResetStats => {
            let stats = app.progression.reset_stats(owner).await?;
            print_json(&stats)
        }
    }
}
