use bincode::Options;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use tokio_util::codec::{Decoder, Encoder};

use crate::core::{Error, Result};
use super::message::MonitorState;

/// Padding after the power flag, matching the padded in-memory record layout
const PADDING_LEN: usize = 7;

/// Size of one encoded record: `i64` + `f64` + `bool` + padding
pub const RECORD_LEN: usize = 8 + 8 + 1 + PADDING_LEN;

/// On-the-wire field layout
#[derive(Serialize, Deserialize)]
struct WireRecord {
    epoch_ms: i64,
    poll_rate_hz: f64,
    powered_on: bool,
    padding: [u8; PADDING_LEN],
}

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Encodes a state into its fixed-size wire form
pub fn encode(state: &MonitorState) -> Result<[u8; RECORD_LEN]> {
    let record = WireRecord {
        epoch_ms: state.epoch_ms,
        poll_rate_hz: state.poll_rate_hz,
        powered_on: state.powered_on,
        padding: [0; PADDING_LEN],
    };

    let mut out = [0u8; RECORD_LEN];
    wire_options()
        .serialize_into(&mut out[..], &record)
        .map_err(|e| Error::protocol(format!("Failed to serialize state: {}", e)))?;
    Ok(out)
}

/// Decodes one datagram payload
///
/// Anything other than exactly [`RECORD_LEN`] bytes is rejected, as is a
/// record whose poll rate is not a positive finite number.
pub fn decode(payload: &[u8]) -> Result<MonitorState> {
    if payload.len() != RECORD_LEN {
        return Err(Error::protocol(format!(
            "Expected {} byte record, got {} bytes",
            RECORD_LEN,
            payload.len()
        )));
    }

    let record: WireRecord = wire_options()
        .deserialize(payload)
        .map_err(|e| Error::protocol(format!("Failed to deserialize state: {}", e)))?;

    if !(record.poll_rate_hz.is_finite() && record.poll_rate_hz > 0.0) {
        return Err(Error::protocol(format!("Invalid poll rate {}", record.poll_rate_hz)));
    }

    Ok(MonitorState {
        epoch_ms: record.epoch_ms,
        poll_rate_hz: record.poll_rate_hz,
        powered_on: record.powered_on,
    })
}

/// Datagram codec for [`MonitorState`] records
///
/// Each buffer handed to the decoder is treated as one whole datagram.
#[derive(Clone, Default)]
pub struct MonitorStateCodec;

impl MonitorStateCodec {
    /// Creates a new codec
    pub fn new() -> Self {
        MonitorStateCodec
    }
}

impl Decoder for MonitorStateCodec {
    type Item = MonitorState;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }

        // One datagram, one record: consume the buffer whether or not it decodes
        let datagram = src.split();
        decode(&datagram).map(Some)
    }
}

impl Encoder<MonitorState> for MonitorStateCodec {
    type Error = Error;

    fn encode(&mut self, item: MonitorState, dst: &mut BytesMut) -> Result<()> {
        let bytes = encode(&item)?;
        dst.extend_from_slice(&bytes);
        Ok(())
    }
}
