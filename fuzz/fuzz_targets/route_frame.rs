//! Routing arbitrary text either yields actions or a typed error, and every
//! enqueued draft satisfies the draft invariants.

#![no_main]

use draftdesk_core::{DraftQueue, RouteAction, Router};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    let router = Router::default();
    let mut queue = DraftQueue::new();

    if let Ok(actions) = router.route(text) {
        for action in actions {
            if let RouteAction::Enqueue(item) = action {
                assert!(!item.sender().trim().is_empty());
                assert!(!item.subject().trim().is_empty());
                assert!(!item.candidates().is_empty());
                queue.enqueue(item);
            }
        }
    }

    assert_eq!(queue.cursor().is_some(), !queue.is_empty());
});
