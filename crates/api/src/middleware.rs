//! API middleware and shared state.

#![allow(missing_docs)]

use liveq_core::{AttendeeService, EventService, PollService, QuestionService};

use crate::streaming::BroadcastHub;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub event_service: EventService,
    pub attendee_service: AttendeeService,
    pub poll_service: PollService,
    pub question_service: QuestionService,
    pub hub: BroadcastHub,
}
