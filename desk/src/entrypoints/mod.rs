use rocket::{fairing::AdHoc, http::ContentType, response::content::RawText, State};

use crate::context::Context;

pub mod allocation;
pub mod leaderboards;
pub mod types;
pub mod workers;

#[get("/metrics")]
async fn metrics(context: &State<Context>) -> Option<(ContentType, RawText<String>)> {
    context.publish_directory().await;
    let metrics = context.prometheus.encode().ok()?;
    Some((
        ContentType::new("application/openmetrics-text", " version=1.0.0; charset=utf-8"),
        RawText(metrics),
    ))
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket
            .mount("/", routes![metrics])
            .attach(workers::stage())
            .attach(allocation::stage())
            .attach(leaderboards::stage())
    })
}
