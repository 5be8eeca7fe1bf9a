//! Protocol implementation module
//!
//! This module defines the power state message, its freshness test and
//! the fixed-size datagram encoding.

pub mod codec;
pub mod message;

pub use self::codec::{decode, encode, MonitorStateCodec, RECORD_LEN};
pub use self::message::{Freshness, MonitorState};

/// Maximum message size in bytes
pub const MAX_MESSAGE_SIZE: usize = 65507; // Maximum UDP payload size
