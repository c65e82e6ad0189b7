mod environment;
mod error;
mod event;
mod response;

pub use environment::Environment;
pub use error::HandlerError;
pub use event::ApiEvent;
pub use response::HandlerResponse;
