//! # esc-id
//!
//! Stable names and identifiers shared by the esc serialization layer.
//!
//! ## Design Principles
//!
//! - Type names are opaque, case-sensitive and never empty
//! - Names compare and hash by value, so they can key registries directly
//! - Event identity is UUID-backed and independent of the payload
//!
//! ## Name Types
//!
//! - [`SerializedDataType`]: the logical type tag used as the primary registry key
//! - [`EventType`]: the domain-level event type carried by a `CommonEvent`
//! - [`StreamId`]: the stream an event store appends to
//!
//! ```
//! use esc_id::SerializedDataType;
//!
//! let book_added: SerializedDataType = "BookAdded".parse()?;
//! assert_eq!(book_added.as_str(), "BookAdded");
//! # Ok::<(), esc_id::IdError>(())
//! ```

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use macros::MAX_NAME_LENGTH;
pub use types::*;

/// Re-export uuid for consumers that need raw UUID operations
pub use uuid::Uuid;
