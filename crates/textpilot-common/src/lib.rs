pub mod envelope;
pub mod error;

pub use envelope::{ActionResponse, RequestEnvelope, ResponseData, ShowResult};
pub use error::{Error, Result};
