//! Per-request gates run before any body byte is read.
//!
//! - [`should_proceed`]: decides whether the stage acts on a request at all
//! - [`resolve_charset`]: extracts the declared charset of the payload

mod charset;
mod eligibility;

pub use charset::DEFAULT_CHARSET;
pub use charset::resolve_charset;
pub use eligibility::Eligibility;
pub use eligibility::SkipReason;
pub use eligibility::has_body;
pub use eligibility::should_proceed;
