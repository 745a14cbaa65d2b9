mod client;
pub mod event_reader;
pub mod headers;

pub use client::{is_auth_rejection, UpstreamClient};
pub use event_reader::{EventSource, VendorEvent};
