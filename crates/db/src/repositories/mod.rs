//! Repository layer over the database entities.

#![allow(missing_docs)]

pub mod attendee;
pub mod event;
pub mod poll;
pub mod question;

pub use attendee::AttendeeRepository;
pub use event::EventRepository;
pub use poll::{OptionVoteCount, PollRepository};
pub use question::QuestionRepository;
