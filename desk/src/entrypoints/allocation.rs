use rocket::{serde::json::Json, State};
use shared::driver::SubmissionReceipt;

use super::types::{AllocationResponse, ApiResult, QuantityInput};
use crate::{api::prometheus::OperationKind, context::Context};

#[get("/allocation")]
async fn get_allocation(context: &State<Context>) -> Json<AllocationResponse> {
    let session = context.session.lock().await;
    Json(AllocationResponse::new(
        session.request(),
        session.capacity(),
        session.is_submitting(),
    ))
}

#[put("/allocation/workers/<worker_id>", data = "<input>")]
async fn put_worker_quantity(
    context: &State<Context>,
    worker_id: &str,
    input: Json<QuantityInput>,
) -> ApiResult<AllocationResponse> {
    let mut session = context.session.lock().await;
    let result = session.set_individual_quantity(worker_id, input.quantity.as_ref());
    context
        .prometheus
        .record(OperationKind::IndividualQuantity, result.is_ok());
    result?;

    Ok(Json(AllocationResponse::new(
        session.request(),
        session.capacity(),
        session.is_submitting(),
    )))
}

/// Bulk fill for every worker the current filter shows.
#[put("/allocation/global", data = "<input>")]
async fn put_global_quantity(
    context: &State<Context>,
    input: Json<QuantityInput>,
) -> ApiResult<AllocationResponse> {
    let mut session = context.session.lock().await;
    let result = session.set_global_quantity(input.quantity.as_ref());
    context
        .prometheus
        .record(OperationKind::GlobalQuantity, result.is_ok());
    result?;

    Ok(Json(AllocationResponse::new(
        session.request(),
        session.capacity(),
        session.is_submitting(),
    )))
}

#[post("/allocation/submit")]
async fn submit_allocation(context: &State<Context>) -> ApiResult<SubmissionReceipt> {
    Ok(Json(context.submit().await?))
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing allocation entrypoints", |rocket| async {
        rocket.mount(
            "/",
            rocket::routes![
                get_allocation,
                put_worker_quantity,
                put_global_quantity,
                submit_allocation
            ],
        )
    })
}
