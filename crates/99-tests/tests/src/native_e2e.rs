#![cfg(all(test, not(target_arch = "wasm32")))]

use std::cell::RefCell;
use std::net::{SocketAddr, UdpSocket};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use app::{Bridge, ListenerConfig, Remap, Scale, StartOutcome};
use parking_lot::Mutex;
use receiver::{Dispatch, Listener};
use router::{AddressRegistry, Distributor, Inbox};
use transport::{ActionQueue, EnqueueOutcome};
use wire::{encode, encode_message, Arg, Bundle, Message, OtherArg, Packet, WireResult};

const TIMEOUT: Duration = Duration::from_secs(3);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> ListenerConfig {
    ListenerConfig::default().with_port(0).with_logging(true)
}

struct Sender {
    socket: UdpSocket,
    to: SocketAddr,
}

impl Sender {
    fn new(listening: SocketAddr) -> Self {
        Self {
            socket: UdpSocket::bind("127.0.0.1:0").expect("sender socket"),
            to: SocketAddr::from(([127, 0, 0, 1], listening.port())),
        }
    }

    fn raw(&self, bytes: &[u8]) {
        self.socket.send_to(bytes, self.to).expect("send");
    }

    fn message(&self, address: &str, args: Vec<Arg>) {
        self.raw(&encode_message(&Message::new(address, args)));
    }

    fn bundle(&self, messages: Vec<Message>) {
        self.raw(&encode(&Packet::Bundle(Bundle::immediate(messages))));
    }
}

/// Ticks `bridge` until `done` holds or the timeout passes.
fn tick_until<F: FnMut() -> bool>(bridge: &mut Bridge, mut done: F) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        bridge.tick();
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}

fn start(bridge: &mut Bridge) -> Sender {
    let outcome = bridge.start(config()).expect("start");
    assert_eq!(outcome, StartOutcome::Started);
    let addr = bridge
        .listener()
        .wait_until_bound(TIMEOUT)
        .expect("listener bound");
    Sender::new(addr)
}

#[test]
fn datagrams_reach_subscribers_through_the_tick() {
    init_logger();
    let mut bridge = Bridge::new();
    let ints = Rc::new(RefCell::new(Vec::new()));
    let floats = Rc::new(RefCell::new(Vec::new()));
    {
        let ints = Rc::clone(&ints);
        bridge.subscribe_int("/a", Scale::new(2), move |v| ints.borrow_mut().push(v));
    }
    {
        let floats = Rc::clone(&floats);
        let remap = Remap::new(0.0, 1.0, -1.0, 1.0).unwrap();
        bridge.subscribe_float("/f", remap, move |v| floats.borrow_mut().push(v));
    }
    let sender = start(&mut bridge);

    sender.message("/a", vec![Arg::Int(4)]);
    sender.message("/f", vec![Arg::Double(0.5)]);
    assert!(tick_until(&mut bridge, || {
        !ints.borrow().is_empty() && !floats.borrow().is_empty()
    }));
    assert_eq!(*ints.borrow(), vec![8]);
    assert_eq!(*floats.borrow(), vec![0.0]);
    bridge.shutdown();
}

#[test]
fn bundle_writes_every_address_in_order() {
    let registry = Arc::new(AddressRegistry::new());
    let x = Inbox::<i32>::new("/x");
    let y = Inbox::<f32>::new("/y");
    registry.register(Arc::clone(&x));
    registry.register(Arc::clone(&y));

    let order = Arc::new(Mutex::new(Vec::new()));
    let distributor = Distributor::new(Arc::clone(&registry));
    let handler = {
        let order = Arc::clone(&order);
        Arc::new(move |msg: &Message| {
            distributor.distribute_message(msg);
            order.lock().push(msg.address.clone());
        })
    };

    let mut listener = Listener::new(Arc::new(ActionQueue::new()));
    let config = ListenerConfig::default().with_port(0);
    let dispatch = Dispatch::Handler(handler);
    listener.start(config, dispatch).expect("start");
    let sender = Sender::new(listener.wait_until_bound(TIMEOUT).expect("bound"));

    sender.bundle(vec![
        Message::new("/x", vec![Arg::Int(1)]),
        Message::new("/y", vec![Arg::Float(0.5)]),
        Message::new("/x", vec![Arg::Int(2)]),
    ]);

    let deadline = Instant::now() + TIMEOUT;
    while order.lock().len() < 3 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(order.lock().as_slice(), ["/x", "/y", "/x"]);
    assert_eq!(x.try_drain(), Some(2));
    assert_eq!(y.try_drain(), Some(0.5));
    listener.shutdown();
}

#[test]
fn malformed_traffic_never_reaches_mailboxes_or_kills_the_thread() {
    init_logger();
    let mut bridge = Bridge::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let seen = Rc::clone(&seen);
        bridge.subscribe_int("/ok", Scale::default(), move |v| seen.borrow_mut().push(v));
    }
    let sender = start(&mut bridge);

    sender.raw(b"");
    sender.raw(b"garbage!");
    sender.raw(&[0u8; 12]);
    sender.raw(b"/ok\0,q\0\0");
    sender.message("/ok", vec![Arg::Other(OtherArg::Str("text".into()))]);
    sender.message("/ok", vec![Arg::Int(7)]);

    assert!(tick_until(&mut bridge, || !seen.borrow().is_empty()));
    assert_eq!(*seen.borrow(), vec![7]);
    assert!(bridge.listener().is_listening());

    let stats = bridge.listener().stats();
    assert!(stats.decode_failures >= 3, "{stats:?}");
    assert_eq!(stats.unsupported_arguments, 1);
    bridge.shutdown();
}

#[test]
fn builder_installs_decoder_and_bounds_the_action_queue() {
    let decode = |datagram: &[u8], _port: u16| -> WireResult<Packet> {
        let value = datagram.len() as i32;
        let message = Message::new("/len", vec![Arg::Int(value)]);
        Ok(Packet::Message(message))
    };
    let mut bridge = Bridge::builder()
        .action_capacity(Some(1))
        .decoder(decode)
        .build();

    let queue = bridge.queue();
    assert_eq!(queue.enqueue(|| {}), EnqueueOutcome::Accepted);
    assert_eq!(queue.enqueue(|| {}), EnqueueOutcome::Dropped);
    assert_eq!(bridge.tick().actions, 1);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let key = {
        let seen = Rc::clone(&seen);
        let push = move |v: i32| seen.borrow_mut().push(v);
        bridge.subscribe_int("/len", Scale::default(), push)
    };
    let sub = bridge.subscribers_mut().get_mut(key).expect("subscribed");
    sub.set_transform(Scale::new(2));

    let config = ListenerConfig::default().with_port(0);
    assert_eq!(bridge.start(config).unwrap(), StartOutcome::Started);
    let addr = bridge.listener().wait_until_bound(TIMEOUT).expect("bound");
    Sender::new(addr).raw(b"not osc");

    assert!(tick_until(&mut bridge, || !seen.borrow().is_empty()));
    assert_eq!(*seen.borrow(), vec![14]);
    bridge.shutdown();
}

#[test]
fn observation_mode_bypasses_subscribers() {
    let mut bridge = Bridge::new();
    let hits = Rc::new(RefCell::new(0));
    {
        let hits = Rc::clone(&hits);
        bridge.subscribe_float("/obs", Remap::IDENTITY, move |_| *hits.borrow_mut() += 1);
    }
    let (outcome, observations) = bridge.observe(config()).expect("observe");
    assert_eq!(outcome, StartOutcome::Started);
    let sender = Sender::new(bridge.listener().wait_until_bound(TIMEOUT).expect("bound"));

    sender.bundle(vec![
        Message::new("/obs", vec![Arg::Float(0.5)]),
        Message::new("/name", vec![Arg::Other(OtherArg::Str("kick".into()))]),
        Message::new("/empty", vec![]),
    ]);

    let lines: Vec<String> = (0..3)
        .map(|_| {
            observations
                .recv_timeout(TIMEOUT)
                .expect("observation")
                .to_string()
        })
        .collect();
    let expected = [
        "addr: /obs val: 0.5",
        "addr: /name val: kick",
        "addr: /empty val: ",
    ];
    assert_eq!(lines, expected);

    bridge.tick();
    assert_eq!(*hits.borrow(), 0);
    bridge.shutdown();
}

#[test]
fn restart_with_new_config_moves_the_socket() {
    let mut bridge = Bridge::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let seen = Rc::clone(&seen);
        bridge.subscribe_int("/r", Scale::default(), move |v| seen.borrow_mut().push(v));
    }
    let _first = start(&mut bridge);
    let again = bridge.start(config()).unwrap();
    assert_eq!(again, StartOutcome::AlreadyRunning);

    assert!(bridge.stop());
    let second = start(&mut bridge);
    second.message("/r", vec![Arg::Int(5)]);
    assert!(tick_until(&mut bridge, || !seen.borrow().is_empty()));
    assert_eq!(*seen.borrow(), vec![5]);

    bridge.shutdown();
    assert!(!bridge.listener().is_listening());
}

#[test]
#[ignore]
fn slow_flood_coalesces_to_latest_value() {
    let mut bridge = Bridge::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let seen = Rc::clone(&seen);
        let push = move |v: i32| seen.borrow_mut().push(v);
        bridge.subscribe_int("/flood", Scale::default(), push);
    }
    let sender = start(&mut bridge);
    for value in 0..10_000 {
        sender.message("/flood", vec![Arg::Int(value)]);
    }
    sender.message("/done", vec![]);
    std::thread::sleep(Duration::from_millis(200));
    bridge.tick();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert!(seen[0] <= 9_999);
    bridge.shutdown();
}
