//! Consulta HTTP service: runs the temporal chat pipeline once per turn.

pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
