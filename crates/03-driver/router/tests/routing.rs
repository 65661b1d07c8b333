use std::sync::Arc;

use proptest::prelude::*;
use router::{AddressRegistry, DistributeError, Distributor, Inbox};
use wire::{Arg, Bundle, Decoder, Message, OscDecoder, OtherArg, Packet};

fn setup() -> (Arc<AddressRegistry>, Distributor) {
    let registry = Arc::new(AddressRegistry::new());
    let distributor = Distributor::new(Arc::clone(&registry));
    (registry, distributor)
}

#[test]
fn int_and_float_subscribers_are_partitioned_by_type() {
    let (registry, distributor) = setup();
    let ints = Inbox::<i32>::new("/knob");
    let floats = Inbox::<f32>::new("/knob");
    registry.register(Arc::clone(&ints));
    registry.register(Arc::clone(&floats));

    let report = distributor.distribute_message(&Message::new("/knob", vec![Arg::Int(4)]));
    assert_eq!(report.delivered, 1);
    assert_eq!(ints.try_drain(), Some(4));
    assert_eq!(floats.try_drain(), None);

    distributor.distribute_message(&Message::new("/knob", vec![Arg::Float(0.75)]));
    assert_eq!(ints.try_drain(), None);
    assert_eq!(floats.try_drain(), Some(0.75));
}

#[test]
fn every_subscriber_at_an_address_receives_the_value() {
    let (registry, distributor) = setup();
    let inboxes: Vec<_> = (0..3).map(|_| Inbox::<i32>::new("/all")).collect();
    for inbox in &inboxes {
        registry.register(Arc::clone(inbox));
    }
    let other = Inbox::<i32>::new("/elsewhere");
    registry.register(Arc::clone(&other));

    let report = distributor.distribute_message(&Message::new("/all", vec![Arg::Int(9)]));
    assert_eq!(report.delivered, 3);
    for inbox in &inboxes {
        assert_eq!(inbox.try_drain(), Some(9));
    }
    assert_eq!(other.try_drain(), None);
}

#[test]
fn unknown_address_is_a_silent_no_op() {
    let (_registry, distributor) = setup();
    let report = distributor.distribute_message(&Message::new("/nobody", vec![Arg::Int(1)]));
    assert_eq!(report.delivered, 0);
    assert!(report.is_clean());
}

#[test]
fn last_argument_wins_within_one_message() {
    let (registry, distributor) = setup();
    let inbox = Inbox::<i32>::new("/seq");
    registry.register(Arc::clone(&inbox));

    distributor.distribute_message(&Message::new(
        "/seq",
        vec![Arg::Int(1), Arg::Int(2), Arg::Int(3)],
    ));
    assert_eq!(inbox.try_drain(), Some(3));
    assert_eq!(inbox.mailbox().coalesced_writes(), 2);
}

#[test]
fn unsupported_argument_does_not_stop_its_siblings() {
    let (registry, distributor) = setup();
    let inbox = Inbox::<f32>::new("/mix");
    registry.register(Arc::clone(&inbox));

    let report = distributor.distribute_message(&Message::new(
        "/mix",
        vec![
            Arg::Float(0.1),
            Arg::Other(OtherArg::Str("label".into())),
            Arg::Float(0.9),
        ],
    ));

    assert_eq!(report.delivered, 2);
    assert_eq!(
        report.errors.as_slice(),
        &[DistributeError::UnsupportedArgument {
            address: "/mix".into(),
            index: 1,
            type_name: "string",
            tag: 's',
        }]
    );
    assert_eq!(inbox.try_drain(), Some(0.9));
}

#[test]
fn array_argument_is_reported_while_scalars_route() {
    let (registry, distributor) = setup();
    let inbox = Inbox::<f32>::new("/m");
    registry.register(Arc::clone(&inbox));

    let mut datagram = Vec::new();
    datagram.extend_from_slice(b"/m\0\0,f[i]\0\0\0");
    datagram.extend_from_slice(&0.5f32.to_be_bytes());
    datagram.extend_from_slice(&7i32.to_be_bytes());
    let packet = OscDecoder::new().decode(&datagram, 0).expect("decode");

    let report = distributor.distribute(&packet);
    assert_eq!(report.delivered, 1);
    assert_eq!(
        report.errors.as_slice(),
        &[DistributeError::UnsupportedArgument {
            address: "/m".into(),
            index: 1,
            type_name: "array",
            tag: '[',
        }]
    );
    assert_eq!(inbox.try_drain(), Some(0.5));
}

#[test]
fn double_arguments_reach_float_subscribers() {
    let (registry, distributor) = setup();
    let floats = Inbox::<f32>::new("/d");
    let ints = Inbox::<i32>::new("/d");
    registry.register(Arc::clone(&floats));
    registry.register(Arc::clone(&ints));

    distributor.distribute_message(&Message::new("/d", vec![Arg::Double(0.25)]));
    assert_eq!(floats.try_drain(), Some(0.25));
    assert_eq!(ints.try_drain(), None);
}

#[test]
fn bundle_messages_apply_in_order() {
    let (registry, distributor) = setup();
    let inbox = Inbox::<i32>::new("/x");
    registry.register(Arc::clone(&inbox));

    let packet = Packet::Bundle(Bundle::immediate(vec![
        Message::new("/x", vec![Arg::Int(1)]),
        Message::new("/y", vec![Arg::Int(5)]),
        Message::new("/x", vec![Arg::Int(2)]),
    ]));
    let report = distributor.distribute(&packet);
    assert_eq!(report.messages, 3);
    assert_eq!(report.delivered, 2);
    assert_eq!(inbox.try_drain(), Some(2));
}

#[test]
fn drain_between_bundle_messages_sees_only_what_has_landed() {
    let (registry, distributor) = setup();
    let x = Inbox::<i32>::new("/x");
    let y = Inbox::<f32>::new("/y");
    registry.register(Arc::clone(&x));
    registry.register(Arc::clone(&y));

    // Bundle elements are distributed one message at a time.
    let bundle = Bundle::immediate(vec![
        Message::new("/x", vec![Arg::Int(1)]),
        Message::new("/y", vec![Arg::Float(0.5)]),
    ]);
    let mut messages = bundle.messages.iter();
    let first = messages.next().expect("first message");
    distributor.distribute_message(first);
    assert_eq!(x.try_drain(), Some(1));
    assert_eq!(y.try_drain(), None);

    let second = messages.next().expect("second message");
    distributor.distribute_message(second);
    assert_eq!(y.try_drain(), Some(0.5));
}

#[test]
fn unregister_removes_only_that_inbox_and_prunes_empty_addresses() {
    let registry = AddressRegistry::new();
    let a = Inbox::<f32>::new("/shared");
    let b = Inbox::<f32>::new("/shared");
    assert!(registry.register(Arc::clone(&a)));
    assert!(registry.register(Arc::clone(&b)));
    assert!(!registry.register(Arc::clone(&a)), "duplicate registration");
    assert_eq!(registry.subscriber_count::<f32>("/shared"), 2);
    assert!(!registry.contains::<i32>("/shared"));

    assert!(registry.unregister(&a));
    assert!(!registry.unregister(&a));
    assert_eq!(registry.subscriber_count::<f32>("/shared"), 1);
    assert_eq!(registry.lookup_and_broadcast("/shared", 1.0f32), 1);
    assert_eq!(b.try_drain(), Some(1.0));
    assert_eq!(a.try_drain(), None);

    assert!(registry.unregister(&b));
    assert!(!registry.contains::<f32>("/shared"));
    assert!(registry.addresses::<f32>().is_empty());
    assert!(registry.is_empty());
}

#[test]
fn concurrent_registration_and_broadcast_do_not_lose_subscribers() {
    let registry = Arc::new(AddressRegistry::new());
    let stable = Inbox::<i32>::new("/busy");
    registry.register(Arc::clone(&stable));

    let writer = {
        let registry = Arc::clone(&registry);
        std::thread::spawn(move || {
            for value in 0..2_000 {
                registry.lookup_and_broadcast("/busy", value);
            }
        })
    };
    for _ in 0..500 {
        let churn = Inbox::<i32>::new("/busy");
        registry.register(Arc::clone(&churn));
        registry.unregister(&churn);
    }
    writer.join().expect("writer thread");

    assert_eq!(registry.subscriber_count::<i32>("/busy"), 1);
    assert_eq!(stable.try_drain(), Some(1_999));
}

proptest! {
    /// Whatever sequence of ints is sent, each subscriber holds only the last.
    #[test]
    fn mailbox_holds_last_value_per_address(
        values in proptest::collection::vec(any::<i32>(), 1..32),
    ) {
        let (registry, distributor) = setup();
        let inbox = Inbox::<i32>::new("/p");
        registry.register(Arc::clone(&inbox));
        for value in &values {
            distributor.distribute_message(&Message::new("/p", vec![Arg::Int(*value)]));
        }
        prop_assert_eq!(inbox.try_drain(), values.last().copied());
        prop_assert_eq!(inbox.try_drain(), None);
    }
}
