pub mod dispatch;
pub mod prompts;
pub mod relay;
pub mod router;
pub mod state;
pub mod ws;

pub use dispatch::{Dispatch, MessageRouter, Origin, RouterHandle};
pub use relay::{ContentRelay, SurfaceFrame, SurfaceRegistry};
pub use router::build_router;
pub use state::{AppState, SharedState};
