use clap::Subcommand;
use focusnest_core::Egg;
use serde::Serialize;

use super::{benign_or_fail, format_hms, print_json, App, CliResult};

#[derive(Subcommand)]
pub enum EggsAction {
    /// List unhatched eggs, oldest first
    List,
    /// Hatch a matured egg
    Hatch {
        /// Egg id
        id: Option<String>,
        /// Hatch every egg whose deadline has passed
        #[arg(long, conflicts_with = "id")]
        all_ready: bool,
    },
    /// Spend boosts to pull an egg's hatch time earlier
    Accelerate {
        /// Egg id
        id: String,
        #[arg(long, default_value = "1")]
        boosts: u32,
    },
}

#[derive(Serialize)]
struct EggView<'a> {
    #[serde(flatten)]
    egg: &'a Egg,
    species: &'a str,
    ready: bool,
    remaining: String,
    boosts_to_hatch: u32,
}

pub async fn run(action: EggsAction, owner: Option<String>) -> CliResult {
    let app = App::open(owner)?;
    let owner = app.owner.as_str();

    match action {
        EggsAction::List => {
            let eggs = app.progression.list_unhatched_eggs(owner).await?;
            let now = app.progression.now();
            let credit = app.config.progression.boost_credit();
            let views: Vec<_> = eggs
                .iter()
                .map(|egg| EggView {
                    egg,
                    species: app.species_name(&egg.catalog_ref),
                    ready: egg.is_ready(now),
                    remaining: format_hms(egg.remaining(now)),
                    boosts_to_hatch: egg.boosts_to_hatch(now, credit),
                })
                .collect();
            print_json(&views)?;
        }
        EggsAction::Hatch { id: Some(id), .. } => match app.progression.hatch_egg(owner, &id).await {
            Ok(collectible) => print_json(&collectible)?,
            Err(e) => benign_or_fail(e)?,
        },
        EggsAction::Hatch { id: None, all_ready } => {
            if !all_ready {
                return Err("specify an egg id or --all-ready".into());
            }
            let now = app.progression.now();
            let mut hatched = Vec::new();
            for egg in app.progression.list_unhatched_eggs(owner).await? {
                if !egg.is_ready(now) {
                    continue;
                }
                match app.progression.hatch_egg(owner, &egg.id).await {
                    Ok(collectible) => hatched.push(collectible),
                    Err(e) if e.is_benign() => {}
                    Err(e) => return Err(e.into()),
                }
            }
            print_json(&hatched)?;
        }
        EggsAction::Accelerate { id, boosts } => {
            match app.progression.accelerate_egg(owner, &id, boosts).await {
                Ok(egg) => print_json(&egg)?,
                Err(e) => benign_or_fail(e)?,
            }
        }
    }
    Ok(())
}
