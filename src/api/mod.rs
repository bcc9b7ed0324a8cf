mod error;
pub mod queue;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use queue::{JobQueue, QueueError};
pub use routes::create_router;
pub use state::AppState;
