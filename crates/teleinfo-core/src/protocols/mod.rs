//! Teleinfo protocol decoding.
//!
//! Data-group decoding follows the same layered structure for both variants:
//! - `group::layout`: control bytes, separators and token counts (source of truth)
//! - `group::reader`: framing-byte stripping and safe token access
//! - `group::parser`: label/value/checksum extraction (no direct indexing)
//! - `group::error`: explicit, actionable errors
//!
//! `variant` selects the per-variant rules (separator, token count, textual
//! labels, checksum input), `checksum` verifies groups and `value` types raw
//! values. Everything here is pure; line sources and the frame state machine
//! live in `source` and `decode`.

pub mod checksum;
pub mod group;
pub mod value;
pub mod variant;
