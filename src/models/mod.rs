pub mod comment;
pub mod outcome;
pub mod post;
pub mod profile;
pub mod reaction;
pub mod response;
pub mod saved_post;
pub mod tag;
pub mod user;

pub use outcome::{IgnoreReason, WriteOutcome};
