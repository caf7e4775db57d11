//! Business logic services.

pub mod attendee;
pub mod broadcast;
pub mod event;
pub mod poll;
pub mod question;

pub use attendee::AttendeeService;
pub use broadcast::{BroadcasterService, EventBroadcaster, NoOpBroadcaster};
pub use event::{CreateEventInput, EventService};
pub use poll::{
    CreatePollInput, OptionResult, PollOptionView, PollResults, PollService, PollView,
    PollWithResults,
};
pub use question::{QuestionService, QuestionView, SubmitQuestionInput, UpvoteOutcome};
