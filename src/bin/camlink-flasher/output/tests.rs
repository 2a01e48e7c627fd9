use camlink_flasher::operation::OperationEvent;
use camlink_flasher::transport::DeviceSummary;

use super::percent_done;

#[test]
fn json_event_has_schema_and_event() {
    let ev = super::json::operation_event_to_json(OperationEvent::ChunkRead {
        addr: 4096,
        start: 0,
        length: 8192,
    });
    let v = serde_json::to_value(&ev).unwrap();
    assert_eq!(v.get("schema").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(v.get("event").and_then(|v| v.as_str()), Some("chunk_read"));
    assert_eq!(v.get("addr").and_then(|v| v.as_u64()), Some(4096));
    assert_eq!(v.get("percent").and_then(|v| v.as_u64()), Some(50));
}

#[test]
fn percent_done_is_relative_to_start() {
    assert_eq!(percent_done(0, 0, 100), 0);
    assert_eq!(percent_done(4096, 0, 4096), 100);
    assert_eq!(percent_done(8192, 4096, 8192), 50);
    // Over-advance past the requested length never exceeds 100.
    assert_eq!(percent_done(u32::MAX, 0, 1), 100);
}

#[test]
fn device_summary_serializes_with_index() {
    let d = DeviceSummary {
        vid: 0x04B4,
        pid: 0x4720,
        bus: 3,
        address: 7,
    };
    let v = super::device_to_value(2, &d);
    assert_eq!(v.get("index").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(v.get("vid").and_then(|v| v.as_u64()), Some(0x04B4));
    assert_eq!(v.get("bus").and_then(|v| v.as_u64()), Some(3));
}
