use rtmonitor_connector_rs::types::{InboundFrame, SendOutcome, SendStatus};
use serde_json::json;

#[test]
fn classify_handshake_ack() {
    let frame = json!({ "msg_type": "rt_connect_ok" });
    assert_eq!(InboundFrame::classify(frame), InboundFrame::ConnectOk);
}

#[test]
fn classify_error_frame() {
    let frame = json!({ "msg_type": "rt_nok", "reason": "bad filter" });
    match InboundFrame::classify(frame.clone()) {
        InboundFrame::Error(carried) => assert_eq!(carried, frame),
        other => panic!("expected Error, got {:?}", other),
    }
}

#[test]
fn classify_data_frame() {
    let frame = json!({
        "msg_type": "rt_data",
        "request_id": "A_1",
        "request_data": [{ "Latitude": 52.2053 }]
    });
    match InboundFrame::classify(frame.clone()) {
        InboundFrame::Data { request_id, frame: carried } => {
            assert_eq!(request_id, "A_1");
            assert_eq!(carried, frame);
        }
        other => panic!("expected Data, got {:?}", other),
    }
}

#[test]
fn classify_unroutable_frames() {
    for frame in [json!({ "msg_type": "rt_heartbeat" }), json!({})] {
        match InboundFrame::classify(frame.clone()) {
            InboundFrame::Unroutable(carried) => assert_eq!(carried, frame),
            other => panic!("expected Unroutable, got {:?}", other),
        }
    }
}

#[test]
fn send_status_uses_protocol_tags() {
    let status = SendStatus {
        status: SendOutcome::RtOk,
        reason: "send attempted".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&status).unwrap(),
        json!({ "status": "rt_ok", "reason": "send attempted" })
    );

    let status: SendStatus =
        serde_json::from_value(json!({ "status": "rt_nok", "reason": "not connected" })).unwrap();
    assert_eq!(status.status, SendOutcome::RtNok);
    assert!(!status.is_ok());
}
