use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use shared::{client::TaraClient, ProjectScope, Role, WorkerFilter, ALL_LOCATIONS};
use tara_desk::{api::prometheus::PrometheusClient, Context};
use tokio::signal;
use tracing::{error, info, instrument, warn};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

#[derive(Deserialize)]
struct Env {
    backend_url: String,
    project_id: String,
    project_route: String,
    #[serde(default)]
    acting_role: Role,
    default_skill: Option<String>,
    refresh_interval_in_minutes: Option<u64>,
    #[serde(default)]
    leaderboard_routes: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let env = envy::from_env::<Env>()?;

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;

    let prometheus: Arc<PrometheusClient> = Default::default();
    let backend = TaraClient::new(env.backend_url);
    let context = Context::new(
        ProjectScope::new(env.project_id, env.project_route),
        Arc::new(backend),
        prometheus,
        env.acting_role,
    )
    .with_leaderboard_routes(env.leaderboard_routes);

    if let Some(skill) = &env.default_skill {
        context
            .session
            .lock()
            .await
            .set_filter(WorkerFilter::new(ALL_LOCATIONS, skill, ""));
    }

    let refresh =
        Duration::from_secs(env.refresh_interval_in_minutes.unwrap_or(10).max(1) * 60);

    tokio::select! {
        _ = run(context.clone(), refresh) => {
        }
        _ = signal::ctrl_c() => {
            warn!("Received SIGINT. Exiting.");
        }
        result = tara_desk::rocket(context).launch() => {
            if let Err(e) = result {
                error!("Rocket stopped: {e}");
            }
        }
    }
    warn!("Exiting desk...");

    Ok(())
}

/// Keeps the worker directory fresh. The first tick fires immediately and
/// performs the initial load.
#[instrument(skip(context))]
async fn run(context: Context, refresh: Duration) {
    info!("Starting directory refresh every {}s", refresh.as_secs());
    let mut interval = tokio::time::interval(refresh);

    loop {
        interval.tick().await;
        if let Err(e) = context.reload().await {
            error!("Failed to refresh the worker directory: {e}");
        }
    }
}
