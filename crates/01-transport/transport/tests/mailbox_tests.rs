//! Mailbox semantics integration tests.
//! This suite exercises coalescing behaviour, cross-thread visibility, and
//! property-based last-write-wins checks.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

use transport::{Mailbox, MailboxSend};

/// Rapid writes should coalesce so the consumer only observes the final value.
#[test]
fn mailbox_coalesces_many_writes() {
    let mailbox = Mailbox::new();

    let outcomes: Vec<MailboxSend> = (1..=10).map(|x| mailbox.write(x)).collect();

    assert_eq!(outcomes[0], MailboxSend::Accepted);
    assert!(outcomes
        .iter()
        .skip(1)
        .all(|o| matches!(o, MailboxSend::Coalesced)));

    assert_eq!(mailbox.try_drain(), Some(10));
    assert_eq!(mailbox.try_drain(), None);
}

/// A drain resets the coalescing window so the next write is accepted fresh.
#[test]
fn mailbox_drain_resets_coalescing() {
    let mailbox = Mailbox::new();
    mailbox.write(111);
    mailbox.write(222);
    assert_eq!(mailbox.try_drain(), Some(222));

    assert_eq!(mailbox.write(333), MailboxSend::Accepted);
    assert_eq!(mailbox.try_drain(), Some(333));
    assert_eq!(mailbox.coalesced_writes(), 1);
}

/// Concurrent writers should produce a non-decreasing sequence at the reader even
/// if intermediate values are skipped.
#[test]
fn mailbox_concurrency_writer_fast_reader_slow() {
    let mailbox = Arc::new(Mailbox::new());
    let stop = Arc::new(AtomicBool::new(false));

    let writer = {
        let mailbox = Arc::clone(&mailbox);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let start = Instant::now();
            let mut x = 0u32;
            while start.elapsed() < Duration::from_millis(100) {
                mailbox.write(x);
                x = x.wrapping_add(1);
            }
            stop.store(true, Ordering::SeqCst);
            x
        })
    };

    let mut seen = Vec::new();
    while !stop.load(Ordering::SeqCst) {
        if let Some(v) = mailbox.try_drain() {
            seen.push(v);
        }
        thread::yield_now();
    }
    let written = writer.join().unwrap();
    if let Some(v) = mailbox.try_drain() {
        seen.push(v);
    }

    assert!(!seen.is_empty(), "expected at least one value");
    assert_eq!(seen.last().copied(), Some(written - 1));
    for window in seen.windows(2) {
        assert!(
            window[1] > window[0],
            "drained sequence must be strictly increasing: {window:?}"
        );
    }
}

mod prop {
    use super::*;
    use proptest::collection;
    use proptest::prelude::*;

    #[derive(Clone, Debug)]
    enum Op {
        Write(u32),
        Drain,
    }

    proptest! {
        /// Random write/drain sequences must uphold last-write-wins semantics at every drain point.
        #[test]
        fn mailbox_last_write_wins_prop(seq in collection::vec(0u32..1000, 0..200)) {
            let mailbox = Mailbox::new();
            let ops: Vec<Op> = seq.into_iter().flat_map(|x| {
                if x % 3 == 0 {
                    vec![Op::Write(x), Op::Drain]
                } else {
                    vec![Op::Write(x)]
                }
            }).chain(std::iter::once(Op::Drain)).collect();

            let mut last_before_drain: Option<u32> = None;

            for op in ops {
                match op {
                    Op::Write(x) => {
                        mailbox.write(x);
                        last_before_drain = Some(x);
                    }
                    Op::Drain => {
                        prop_assert_eq!(mailbox.try_drain(), last_before_drain);
                        last_before_drain = None;
                    }
                }
            }
        }
    }
}
