pub mod clients;
pub mod materials;
pub mod projects;
pub mod system;

use axum::routing::get;
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/api", get(system::index))
        // Projects
        .route("/api/projects", get(projects::list).post(projects::create))
        .route("/api/projects/stats", get(projects::stats))
        .route(
            "/api/projects/{id}",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
        // Clients
        .route("/api/clients", get(clients::list).post(clients::create))
        .route(
            "/api/clients/{id}",
            get(clients::get)
                .put(clients::update)
                .delete(clients::delete),
        )
        // Materials
        .route("/api/materials", get(materials::list).post(materials::create))
        .route(
            "/api/materials/{id}",
            get(materials::get)
                .put(materials::update)
                .delete(materials::delete),
        )
}
