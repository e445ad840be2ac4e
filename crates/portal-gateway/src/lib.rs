//! HTTP front end for Portal.

pub mod app;
pub mod cli;
pub mod error;
pub mod handlers;
pub mod model;
pub mod startup;
pub mod state;
pub mod telemetry;

pub use app::App;
pub use state::AppState;
