//! Engagement events - the inputs of the matching state machine

mod engagement_event;

pub use engagement_event::{Decision, EngagementEvent};
