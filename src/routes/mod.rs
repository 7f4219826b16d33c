// Route exports
pub mod rounds;

use actix_web::web;

pub use rounds::{AppState, EngineState};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(rounds::configure_engine)
            .configure(rounds::configure),
    );
}
