//! Header names and values shared by upstream requests and inbound responses.

/// Vendor client marker expected on every upstream call.
pub const X_MERLIN_VERSION: &str = "x-merlin-version";
pub const MERLIN_VERSION_WEB: &str = "web-merlin";

/// Cookie name carrying `MERLIN_SESSION_TOKEN` on the session exchange.
pub const SESSION_COOKIE_NAME: &str = "__Secure-authjs.session-token";

/// Disables proxy buffering (nginx) on streamed responses.
pub const X_ACCEL_BUFFERING: &str = "X-Accel-Buffering";

/// Vendor model id chosen for an inbound model name.
pub const X_MAPPED_MODEL: &str = "X-Mapped-Model";

pub const EVENT_STREAM: &str = "text/event-stream";
