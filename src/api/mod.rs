//! HTTP API for Leafling
//!
//! **[LFL-API-010]** JSON routes consumed by the browser UI. Route modules
//! are assembled by [`crate::build_router`].

pub mod health;
pub mod identify;
pub mod plants;
pub mod search;
pub mod sessions;
pub mod settings;

pub use health::health_routes;
pub use identify::identify_routes;
pub use plants::plant_routes;
pub use search::search_routes;
pub use sessions::session_routes;
pub use settings::settings_routes;
