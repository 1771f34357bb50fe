//! The idle → loading → success | error state machine shared by every hook.
//!
//! # Design
//! A call is split into `begin` and `settle` so a host that drives I/O on its
//! own schedule can interleave calls. `begin` hands out a [`Ticket`]; only the
//! most recently issued ticket may settle the state, so a superseded call that
//! finishes late is dropped instead of overwriting newer results. `reset`
//! invalidates every outstanding ticket.

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Identifies one issued call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
pub struct RequestState<T> {
    data: Option<T>,
    error: Option<String>,
    status: RequestStatus,
    generation: u64,
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            status: RequestStatus::Idle,
            generation: 0,
        }
    }
}

impl<T> RequestState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == RequestStatus::Loading
    }

    /// Enter `Loading`, clearing any previous error. Data is kept.
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.status = RequestStatus::Loading;
        self.error = None;
        Ticket(self.generation)
    }

    /// Whether `ticket` is the call the state is currently waiting on.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.generation && self.status == RequestStatus::Loading
    }

    /// Apply the outcome of the call identified by `ticket`. Returns `false`
    /// and leaves the state untouched when the ticket was superseded.
    ///
    /// A failure records the error text and keeps the previous data.
    pub fn settle(&mut self, ticket: Ticket, outcome: Result<T, ApiError>) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(ticket = ticket.0, current = self.generation, "dropping superseded result");
            return false;
        }
        match outcome {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
                self.status = RequestStatus::Success;
            }
            Err(e) => {
                self.error = Some(e.user_message());
                self.status = RequestStatus::Error;
            }
        }
        true
    }

    /// Back to `Idle` with no data, from any state.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.data = None;
        self.error = None;
        self.status = RequestStatus::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::http::HttpResponse;

    fn bad_request(message: &str) -> ApiError {
        ApiError::from_response(&HttpResponse::json(
            400,
            format!(r#"{{"message":"{message}","success":false}}"#),
        ))
    }

    #[test]
    fn starts_idle() {
        let state: RequestState<u32> = RequestState::new();
        assert_eq!(state.status(), RequestStatus::Idle);
        assert!(state.data().is_none());
        assert!(state.error().is_none());
        assert!(!state.is_loading());
    }

    #[test]
    fn success_sets_data_and_clears_loading() {
        let mut state = RequestState::new();
        let t = state.begin();
        assert!(state.is_loading());
        assert!(state.settle(t, Ok(5)));
        assert_eq!(state.status(), RequestStatus::Success);
        assert_eq!(state.data(), Some(&5));
        assert!(!state.is_loading());
    }

    #[test]
    fn failure_keeps_previous_data() {
        let mut state = RequestState::new();
        let t = state.begin();
        state.settle(t, Ok(1));

        let t = state.begin();
        state.settle(t, Err(bad_request("boom")));
        assert_eq!(state.status(), RequestStatus::Error);
        assert_eq!(state.error(), Some("boom"));
        assert_eq!(state.data(), Some(&1));
    }

    #[test]
    fn begin_clears_previous_error() {
        let mut state: RequestState<u32> = RequestState::new();
        let t = state.begin();
        state.settle(t, Err(ApiError::Network(TransportError::Timeout)));
        assert!(state.error().is_some());

        state.begin();
        assert!(state.error().is_none());
        assert!(state.is_loading());
    }

    #[test]
    fn superseded_call_is_ignored() {
        let mut state = RequestState::new();
        let first = state.begin();
        let second = state.begin();

        assert!(!state.settle(first, Ok("first")));
        assert!(state.is_loading());

        assert!(state.settle(second, Ok("second")));
        assert!(!state.settle(first, Ok("late")));
        assert_eq!(state.data(), Some(&"second"));
    }

    #[test]
    fn reset_returns_to_idle_and_drops_in_flight() {
        let mut state = RequestState::new();
        let t = state.begin();
        state.reset();
        assert_eq!(state.status(), RequestStatus::Idle);
        assert!(!state.settle(t, Ok(9)));
        assert!(state.data().is_none());
    }
}
