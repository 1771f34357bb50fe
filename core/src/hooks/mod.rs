//! Stateful request hooks.
//!
//! # Overview
//! A hook wraps one kind of call (GET, POST, PUT, DELETE, upload or paginated
//! GET) in an idle → loading → success | error state machine. Hooks are the
//! only layer that turns a failed request into observable state instead of
//! an error value: `execute` returns the fresh data on success and `None` on
//! failure, with the failure text left in `error()`.

mod paginated;
mod request;
mod state;

pub use paginated::{PaginatedRequest, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use request::{DeleteRequest, GetRequest, PostRequest, PutRequest, UploadRequest};
pub use state::{RequestState, RequestStatus, Ticket};
