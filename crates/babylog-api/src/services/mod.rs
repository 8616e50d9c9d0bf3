// Services layer for business logic
// Services combine the interpreter with the store; handlers only map HTTP

pub mod activity;

pub use activity::{ActivityService, LogOutcome, ServiceError};
