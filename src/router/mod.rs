//! Message handling.
//!
//! [`RequestRouter`] validates each [`Request`], answers analytics requests from the cache when
//! it can, and otherwise runs the fetch, classify and aggregate pipeline before caching the
//! result. Every outcome, including every failure, becomes a [`Response`].

mod error;
mod messages;
mod pipeline;
#[expect(clippy::module_inception, reason = "the module is named after the type it holds")]
mod router;
mod validation;

pub use error::AnalyticsError;
pub use messages::{AnalyticsPayload, Origin, Request, Response, Source};
pub use pipeline::Pipeline;
pub use router::{RequestRouter, UNKNOWN_MESSAGE, encode_response};
pub use validation::{MAX_USERNAME_LEN, validate_days, validate_username};
