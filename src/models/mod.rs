//! Data models for the WiseHub training platform.
//!
//! These models match the frontend TypeScript interfaces exactly for seamless interoperability.

mod assignment;
mod build;
mod completion;
mod localized;
mod member;
mod organization;
mod revision;
mod tag;

pub use assignment::*;
pub use build::*;
pub use completion::*;
pub use localized::*;
pub use member::*;
pub use organization::*;
pub use revision::*;
pub use tag::*;
