//! Recorded HTTP exchanges
//!
//! A broker given a [`CassetteRecorder`] appends every exchange it completes.
//! Cassettes are stored as YAML and are always scrubbed on save, so API keys
//! in headers, query strings and bodies never land in fixtures.

mod recorder;
mod types;

pub use recorder::CassetteRecorder;
pub use types::{Cassette, Interaction, RecordedRequest, RecordedResponse};
