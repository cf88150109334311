//! Line protocol spoken with the kernel build server
//!
//! Requests are single lines of the form `<KEYWORD>[ <payload>]`. Responses
//! may carry diagnostic noise; the real payload starts after the [`TAG`]
//! literal. Free-form payloads escape newline, carriage return and space as
//! `[LF]`, `[CR]` and `[SP]`.
//!
//! ```rust
//! use kernel_build_client::protocol::{decode_response, Payload, Request};
//! use kernel_build_client::{ControlToken, Reply};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let request = Request::Start(Payload::new(r#"{"op":"add"}"#)?);
//! assert_eq!(request.to_line(), r#"START {"op":"add"}"#);
//!
//! assert_eq!(
//!     decode_response("garbage[~]Success")?,
//!     Reply::Control(ControlToken::Success)
//! );
//! assert_eq!(
//!     decode_response("[~]line1[LF]line2")?,
//!     Reply::Text("line1\nline2".to_string())
//! );
//! # Ok(())
//! # }
//! ```

mod escape;
mod request;
mod response;

/// Marker preceding the real payload of every response
pub const TAG: &str = "[~]";

pub use escape::{ESCAPES, escape, unescape};
pub use request::{Payload, Request, check_single_line};
pub use response::{decode_response, extract_payload};
