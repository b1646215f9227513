use super::{print_json, App, CliResult};

pub async fn run(owner: Option<String>) -> CliResult {
    let app = App::open(owner)?;
    let stats = app.progression.owner_stats(&app.owner).await?;
    let birds = app.progression.list_collectibles(&app.owner, None).await?;
    let eggs = app.progression.list_unhatched_eggs(&app.owner).await?;

    print_json(&serde_json::json!({
        "owner": stats.owner,
        "total_focus_minutes": stats.total_focus_minutes,
        "total_sessions": stats.total_sessions,
        "eggs_hatched": stats.eggs_hatched,
        "eggs_incubating": eggs.len(),
        "birds": birds.len(),
    }))
}
