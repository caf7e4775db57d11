//! Database entities.

#![allow(missing_docs)]

pub mod attendee;
pub mod event;
pub mod poll;
pub mod poll_option;
pub mod poll_response;
pub mod question;
pub mod question_vote;

pub use attendee::Entity as Attendee;
pub use event::Entity as Event;
pub use poll::Entity as Poll;
pub use poll_option::Entity as PollOption;
pub use poll_response::Entity as PollResponse;
pub use question::Entity as Question;
pub use question_vote::Entity as QuestionVote;
