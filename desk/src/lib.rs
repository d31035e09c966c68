#[macro_use]
extern crate rocket;

use rocket::{Build, Rocket};

pub mod api;
pub mod context;
pub mod entrypoints;

pub use context::Context;

pub fn rocket(context: Context) -> Rocket<Build> {
    rocket::build()
        .manage(context)
        .attach(entrypoints::stage())
}
