//! Update stream message codec.
//!
//! Every binary websocket message carries two frames: an action frame
//! (routing header) followed by a payload frame. Each frame is
//!
//! ```text
//! 0        1        2         3          4                 8
//! +--------+--------+---------+----------+-----------------+----------
//! | type   | format | deflate | reserved | body length (BE) | body ...
//! +--------+--------+---------+----------+-----------------+----------
//! ```
//!
//! and the body is zlib-compressed when the deflate byte is non-zero.

use std::io::Read;

use flate2::read::ZlibDecoder;
use serde::Deserialize;
use serde_json::Value;

use protectbridge_domain::packet::{EventPacket, ModelKey, PacketHeader};

const HEADER_LEN: usize = 8;

const ACTION_FRAME: u8 = 1;
const PAYLOAD_FRAME: u8 = 2;

const FORMAT_JSON: u8 = 1;
const FORMAT_UTF8: u8 = 2;
const FORMAT_BUFFER: u8 = 3;

/// A message could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("expected packet type {expected}, got {actual}")]
    UnexpectedPacketType { expected: u8, actual: u8 },

    #[error("unknown payload format {0}")]
    UnknownFormat(u8),

    #[error("failed to inflate frame body")]
    Inflate(#[source] std::io::Error),

    #[error("invalid JSON frame body")]
    Json(#[from] serde_json::Error),

    #[error("invalid UTF-8 frame body")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A decoded update message.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateMessage {
    pub packet: EventPacket,
    /// Resume point to use if the stream has to be reopened.
    pub new_update_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionDocument {
    action: String,
    model_key: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    record_id: Option<String>,
    #[serde(default)]
    new_update_id: Option<String>,
}

/// Decode one binary update message into a packet.
pub fn decode(message: &[u8]) -> Result<UpdateMessage, FrameError> {
    let (action, rest) = read_frame(message, ACTION_FRAME)?;
    let (payload, _) = read_frame(rest, PAYLOAD_FRAME)?;

    let action: ActionDocument = serde_json::from_value(action)?;
    let header = PacketHeader {
        action: action.action,
        model_key: ModelKey::from(action.model_key.as_str()),
        id: action.id,
        record_id: action.record_id,
    };

    Ok(UpdateMessage {
        packet: EventPacket::new(header, payload),
        new_update_id: action.new_update_id,
    })
}

/// Read one frame from the front of `data`, returning its decoded body and
/// the bytes that follow it.
fn read_frame(data: &[u8], packet_type: u8) -> Result<(Value, &[u8]), FrameError> {
    let Some(header) = data.get(..HEADER_LEN) else {
        return Err(FrameError::Truncated {
            expected: HEADER_LEN,
            actual: data.len(),
        });
    };
    if header[0] != packet_type {
        return Err(FrameError::UnexpectedPacketType {
            expected: packet_type,
            actual: header[0],
        });
    }

    let format = header[1];
    let deflated = header[2] != 0;
    let length = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
    let length = usize::try_from(length).unwrap_or(usize::MAX);

    let end = HEADER_LEN.saturating_add(length);
    let Some(body) = data.get(HEADER_LEN..end) else {
        return Err(FrameError::Truncated {
            expected: end,
            actual: data.len(),
        });
    };

    let body = if deflated {
        let mut inflated = Vec::new();
        ZlibDecoder::new(body)
            .read_to_end(&mut inflated)
            .map_err(FrameError::Inflate)?;
        inflated
    } else {
        body.to_vec()
    };

    let value = match format {
        FORMAT_JSON => serde_json::from_slice(&body)?,
        FORMAT_UTF8 => Value::String(String::from_utf8(body)?),
        FORMAT_BUFFER => Value::Null,
        other => return Err(FrameError::UnknownFormat(other)),
    };

    Ok((value, &data[end..]))
}
