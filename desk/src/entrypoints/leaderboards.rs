use rocket::{serde::json::Json, State};
use shared::{
    leaderboard, performer_summary, LeaderboardEntry, PerformerSummary, TaskStatsProvider, Worker,
};
use tracing::error;

use super::types::ApiFailure;
use crate::context::Context;

/// Workers of `route`: the loaded directory for the open project, a fresh
/// fetch for any other configured route.
async fn workers_for(context: &Context, route: Option<&str>) -> Result<Vec<Worker>, ApiFailure> {
    let (current, loaded) = {
        let session = context.session.lock().await;
        (session.scope().project_route.clone(), session.workers().to_vec())
    };
    let route = match route {
        Some(route) if route != current => route,
        _ => return Ok(loaded),
    };

    if !context.serves_leaderboard(route) {
        return Err(ApiFailure::not_found(format!("Unknown project {route}")));
    }

    context
        .backend
        .worker_stats(route)
        .await
        .inspect_err(|e| error!("Failed to get leaderboard for {route}: {e}"))
        .map_err(Into::into)
}

#[get("/leaderboard?<route>")]
async fn get_leaderboard(
    context: &State<Context>,
    route: Option<&str>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiFailure> {
    let workers = workers_for(context, route).await?;
    Ok(Json(leaderboard(&workers)))
}

#[get("/performers?<route>")]
async fn get_performers(
    context: &State<Context>,
    route: Option<&str>,
) -> Result<Json<PerformerSummary>, ApiFailure> {
    let workers = workers_for(context, route).await?;
    Ok(Json(performer_summary(&workers)))
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing leaderboard entrypoints", |rocket| async {
        rocket.mount("/", rocket::routes![get_leaderboard, get_performers])
    })
}
