use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- Inbound frame taxonomy ---

/// Classification of one parsed inbound frame from the real-time service.
///
/// Frames are ad hoc JSON on the wire; routing only ever inspects the
/// `msg_type` and `request_id` fields, so everything collapses into a
/// closed set of shapes before dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Handshake acknowledgement (`msg_type: "rt_connect_ok"`).
    ConnectOk,
    /// Protocol-level error report (`msg_type: "rt_nok"`). Carries the full
    /// frame; the protocol gives no way to attribute it to a caller.
    Error(Value),
    /// A reply or pushed update addressed to one pending call.
    Data {
        /// Composite request identifier the frame was addressed with.
        request_id: String,
        /// The full frame, including the payload fields.
        frame: Value,
    },
    /// No `request_id` and no recognized `msg_type`.
    Unroutable(Value),
}

impl InboundFrame {
    /// Classifies a parsed frame. `msg_type` wins over `request_id`, so a
    /// handshake ack or error frame is never mistaken for routable data.
    pub fn classify(frame: Value) -> Self {
        let msg_type = frame
            .get("msg_type")
            .and_then(Value::as_str)
            .map(str::to_string);
        match msg_type.as_deref() {
            Some("rt_connect_ok") => return InboundFrame::ConnectOk,
            Some("rt_nok") => return InboundFrame::Error(frame),
            _ => {}
        }
        let request_id = frame
            .get("request_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        match request_id {
            Some(request_id) => InboundFrame::Data { request_id, frame },
            None => InboundFrame::Unroutable(frame),
        }
    }
}

// --- Send status ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    RtOk,
    RtNok,
}

/// Synchronous outcome of a send attempt.
///
/// Reflects only whether the transport could accept the frame right now.
/// `rt_ok` means a send was attempted, not that the message was delivered;
/// `rt_nok` means the message was dropped (never queued) and the caller must
/// re-issue it, typically by re-subscribing from a connect callback.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SendStatus {
    pub status: SendOutcome,
    pub reason: String,
}

impl SendStatus {
    pub(crate) fn ok(reason: &str) -> Self {
        Self {
            status: SendOutcome::RtOk,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn nok(reason: &str) -> Self {
        Self {
            status: SendOutcome::RtNok,
            reason: reason.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == SendOutcome::RtOk
    }
}
