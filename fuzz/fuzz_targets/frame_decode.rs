//! Inbound frame parsing must never panic, whatever the server sends.

#![no_main]

use draftdesk_proto::InboundFrame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(frame) = InboundFrame::parse(text) {
            let _ = frame.kind();
        }
    }
});
