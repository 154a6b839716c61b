//! Auxiliary telemetry producer tests.

use std::sync::Arc;
use std::thread;

use flowsentry::probes::{log_connect_attempt, log_process_exec, TcpStateTracker};

#[test]
fn tcp_state_transitions_count_per_destination() {
    let tracker: TcpStateTracker = TcpStateTracker::new();
    let a = u32::from_be_bytes([192, 168, 1, 1]);
    let b = u32::from_be_bytes([192, 168, 1, 2]);

    for _ in 0..4 {
        tracker.record(a);
    }
    tracker.record(b);

    assert_eq!(tracker.count(a), 4);
    assert_eq!(tracker.count(b), 1);
    assert_eq!(tracker.count(u32::from_be_bytes([10, 0, 0, 1])), 0);

    let mut snapshot = tracker.snapshot();
    snapshot.sort_by_key(|(addr, _)| *addr);
    assert_eq!(snapshot.len(), 2);
    assert_eq!(tracker.overflow(), 0);
}

#[test]
fn tracker_overflow_is_tallied_not_fatal() {
    // One shard, two slots: the third destination cannot be recorded.
    let tracker: TcpStateTracker<1, 2> = TcpStateTracker::new();
    tracker.record(1);
    tracker.record(2);
    tracker.record(3);

    assert_eq!(tracker.count(1), 1);
    assert_eq!(tracker.count(3), 0);
    assert_eq!(tracker.overflow(), 1);
}

#[test]
fn concurrent_transition_recording_loses_nothing() {
    let tracker: Arc<TcpStateTracker> = Arc::new(TcpStateTracker::new());
    let dst = u32::from_be_bytes([203, 0, 113, 5]);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let tracker = Arc::clone(&tracker);
        handles.push(thread::spawn(move || {
            for _ in 0..1_000 {
                tracker.record(dst);
            }
        }));
    }
    for handle in handles {
        handle.join().expect("tracker thread panicked");
    }

    assert_eq!(tracker.count(dst), 4_000);
}

#[test]
fn emit_only_probes_do_not_panic() {
    log_process_exec("curl");
    log_connect_attempt("curl", 4321, u32::from_be_bytes([93, 184, 216, 34]), 443);
}
