pub mod auth;
pub mod cache;
pub mod convert;
pub mod error;
pub mod follow;
pub mod forms;
pub mod groups;
pub mod media;
pub mod middleware;
pub mod posts;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{AppState, AppStateInner};
