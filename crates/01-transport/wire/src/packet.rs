//! Decoded packet model.

use core::fmt;

/// A decoded datagram: one message or an ordered bundle of messages.
#[derive(Clone, Debug, PartialEq)]
pub enum Packet {
    Message(Message),
    Bundle(Bundle),
}

impl Packet {
    /// Iterates over every message in packet order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        let slice = match self {
            Packet::Message(msg) => core::slice::from_ref(msg),
            Packet::Bundle(bundle) => bundle.messages.as_slice(),
        };
        slice.iter()
    }
}

impl From<Message> for Packet {
    fn from(msg: Message) -> Self {
        Packet::Message(msg)
    }
}

impl From<Bundle> for Packet {
    fn from(bundle: Bundle) -> Self {
        Packet::Bundle(bundle)
    }
}

/// One address plus its ordered arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub address: String,
    pub args: Vec<Arg>,
}

impl Message {
    pub fn new(address: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }
}

/// Ordered group of messages sharing a time tag.
///
/// Nested bundles are flattened at decode time, so `messages` is already in
/// delivery order.
#[derive(Clone, Debug, PartialEq)]
pub struct Bundle {
    pub timetag: u64,
    pub messages: Vec<Message>,
}

impl Bundle {
    /// Time tag meaning "process immediately".
    pub const IMMEDIATE: u64 = 1;

    pub fn immediate(messages: Vec<Message>) -> Self {
        Self {
            timetag: Self::IMMEDIATE,
            messages,
        }
    }
}

/// Argument value, tagged once at decode time.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    /// `i` – 32-bit two's complement integer.
    Int(i32),
    /// `f` – IEEE 754 single precision.
    Float(f32),
    /// `d` – IEEE 754 double precision.
    Double(f64),
    /// Any other well-formed type; carried for observation only.
    Other(OtherArg),
}

impl Arg {
    /// Type tag character as it appears on the wire.
    pub fn tag(&self) -> char {
        match self {
            Arg::Int(_) => 'i',
            Arg::Float(_) => 'f',
            Arg::Double(_) => 'd',
            Arg::Other(other) => other.tag(),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(v) => write!(f, "{v}"),
            Arg::Float(v) => write!(f, "{v}"),
            Arg::Double(v) => write!(f, "{v}"),
            Arg::Other(other) => fmt::Display::fmt(other, f),
        }
    }
}

/// Argument types that decode cleanly but are not distributed to subscribers.
#[derive(Clone, Debug, PartialEq)]
pub enum OtherArg {
    Str(String),
    Symbol(String),
    Blob(Vec<u8>),
    Long(i64),
    Time(u64),
    Char(char),
    Color(u32),
    Midi([u8; 4]),
    Bool(bool),
    Nil,
    Impulse,
    /// `[` … `]` – nested argument list.
    Array(Vec<Arg>),
}

impl OtherArg {
    /// Leading type tag; an array also closes with `]`.
    pub fn tag(&self) -> char {
        match self {
            OtherArg::Str(_) => 's',
            OtherArg::Symbol(_) => 'S',
            OtherArg::Blob(_) => 'b',
            OtherArg::Long(_) => 'h',
            OtherArg::Time(_) => 't',
            OtherArg::Char(_) => 'c',
            OtherArg::Color(_) => 'r',
            OtherArg::Midi(_) => 'm',
            OtherArg::Bool(true) => 'T',
            OtherArg::Bool(false) => 'F',
            OtherArg::Nil => 'N',
            OtherArg::Impulse => 'I',
            OtherArg::Array(_) => '[',
        }
    }

    /// Human-readable type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            OtherArg::Str(_) => "string",
            OtherArg::Symbol(_) => "symbol",
            OtherArg::Blob(_) => "blob",
            OtherArg::Long(_) => "int64",
            OtherArg::Time(_) => "timetag",
            OtherArg::Char(_) => "char",
            OtherArg::Color(_) => "color",
            OtherArg::Midi(_) => "midi",
            OtherArg::Bool(_) => "bool",
            OtherArg::Nil => "nil",
            OtherArg::Impulse => "impulse",
            OtherArg::Array(_) => "array",
        }
    }
}

impl fmt::Display for OtherArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OtherArg::Str(s) | OtherArg::Symbol(s) => f.write_str(s),
            OtherArg::Blob(bytes) => write!(f, "<blob {} bytes>", bytes.len()),
            OtherArg::Long(v) => write!(f, "{v}"),
            OtherArg::Time(v) => write!(f, "{v:#018x}"),
            OtherArg::Char(c) => write!(f, "{c}"),
            OtherArg::Color(rgba) => write!(f, "#{rgba:08x}"),
            OtherArg::Midi(bytes) => write!(
                f,
                "{:02x} {:02x} {:02x} {:02x}",
                bytes[0], bytes[1], bytes[2], bytes[3]
            ),
            OtherArg::Bool(v) => write!(f, "{v}"),
            OtherArg::Nil => f.write_str("nil"),
            OtherArg::Impulse => f.write_str("impulse"),
            OtherArg::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    fmt::Display::fmt(item, f)?;
                }
                f.write_str("]")
            }
        }
    }
}
