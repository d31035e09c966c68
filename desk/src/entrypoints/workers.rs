use rocket::{serde::json::Json, State};
use shared::{
    distinct_locations, distinct_skills, personal_stats, PersonalStats, ProjectSummary,
    WorkerFilter,
};

use super::types::{
    ApiFailure, ApiResult, AvailabilityResponse, FilterResponse, ReloadResponse, WorkerResponse,
    WorkersResponse,
};
use crate::{api::prometheus::OperationKind, context::Context};

/// Lists the loaded directory through the session filter. Any query
/// parameter given overrides the matching part of the session filter for
/// this request only.
#[get("/workers?<location>&<skill>&<search>")]
async fn get_workers(
    context: &State<Context>,
    location: Option<&str>,
    skill: Option<&str>,
    search: Option<&str>,
) -> Json<WorkersResponse> {
    let session = context.session.lock().await;
    let current = session.filter();
    let filter = WorkerFilter::new(
        location.unwrap_or(current.location.as_str()),
        skill.unwrap_or(current.skill.as_str()),
        search.unwrap_or(current.search.as_str()),
    );

    let records: Vec<WorkerResponse> = filter
        .apply(session.workers())
        .into_iter()
        .map(|worker| WorkerResponse::new(worker, session.request()))
        .collect();
    Json(WorkersResponse {
        total_records: records.len(),
        records,
        locations: distinct_locations(session.workers()),
        skills: distinct_skills(session.workers()),
    })
}

#[post("/workers/reload")]
async fn reload_workers(context: &State<Context>) -> ApiResult<ReloadResponse> {
    let applied = context.reload().await?;
    let session = context.session.lock().await;
    Ok(Json(ReloadResponse {
        applied,
        workers: session.workers().len(),
        available: session.availability().total,
    }))
}

#[get("/availability")]
async fn get_availability(context: &State<Context>) -> Json<AvailabilityResponse> {
    let session = context.session.lock().await;
    Json(AvailabilityResponse {
        total: session.availability().total,
        skills: session.availability().skill_counts(),
        capacity: session.capacity(),
    })
}

#[get("/filter")]
async fn get_filter(context: &State<Context>) -> Json<WorkerFilter> {
    Json(context.session.lock().await.filter().clone())
}

#[put("/filter", data = "<filter>")]
async fn put_filter(
    context: &State<Context>,
    filter: Json<WorkerFilter>,
) -> Json<FilterResponse> {
    let filter = filter.into_inner();
    let allocation_reset = context.session.lock().await.set_filter(filter.clone());
    context.prometheus.record(OperationKind::Filter, true);
    context.publish_directory().await;
    Json(FilterResponse {
        filter,
        allocation_reset,
    })
}

#[get("/summary")]
async fn get_summary(context: &State<Context>) -> Json<ProjectSummary> {
    Json(ProjectSummary::from_workers(
        context.session.lock().await.workers(),
    ))
}

#[get("/workers/<email>/stats")]
async fn get_personal_stats(
    context: &State<Context>,
    email: &str,
) -> Result<Json<PersonalStats>, ApiFailure> {
    personal_stats(context.session.lock().await.workers(), email)
        .map(Json)
        .ok_or_else(|| ApiFailure::not_found(format!("No stats for {email}")))
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing worker entrypoints", |rocket| async {
        rocket.mount(
            "/",
            rocket::routes![
                get_workers,
                reload_workers,
                get_availability,
                get_filter,
                put_filter,
                get_summary,
                get_personal_stats
            ],
        )
    })
}
