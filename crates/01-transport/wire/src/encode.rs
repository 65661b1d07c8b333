//! OSC 1.0 encoder, the inverse of [`OscDecoder`](crate::OscDecoder).
//!
//! The receiver never encodes; this exists for senders, the monitor's `send`
//! command, and loopback tests.

use crate::decode::BUNDLE_TAG;
use crate::packet::{Arg, Bundle, Message, OtherArg, Packet};

/// Encodes a packet into a freshly allocated datagram.
pub fn encode(packet: &Packet) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    match packet {
        Packet::Message(msg) => encode_message_into(msg, &mut out),
        Packet::Bundle(bundle) => encode_bundle_into(bundle, &mut out),
    }
    out
}

/// Encodes a single message.
pub fn encode_message(msg: &Message) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    encode_message_into(msg, &mut out);
    out
}

fn encode_bundle_into(bundle: &Bundle, out: &mut Vec<u8>) {
    out.extend_from_slice(BUNDLE_TAG);
    out.extend_from_slice(&bundle.timetag.to_be_bytes());
    for msg in &bundle.messages {
        let size_at = out.len();
        out.extend_from_slice(&[0; 4]);
        encode_message_into(msg, out);
        let size = (out.len() - size_at - 4) as u32;
        out[size_at..size_at + 4].copy_from_slice(&size.to_be_bytes());
    }
}

fn encode_message_into(msg: &Message, out: &mut Vec<u8>) {
    write_str(&msg.address, out);

    let mut tags = String::with_capacity(msg.args.len() + 1);
    tags.push(',');
    push_tags(&msg.args, &mut tags);
    write_str(&tags, out);

    for arg in &msg.args {
        write_arg(arg, out);
    }
}

fn push_tags(args: &[Arg], tags: &mut String) {
    for arg in args {
        tags.push(arg.tag());
        if let Arg::Other(OtherArg::Array(items)) = arg {
            push_tags(items, tags);
            tags.push(']');
        }
    }
}

fn write_arg(arg: &Arg, out: &mut Vec<u8>) {
    match arg {
        Arg::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
        Arg::Float(v) => out.extend_from_slice(&v.to_bits().to_be_bytes()),
        Arg::Double(v) => out.extend_from_slice(&v.to_bits().to_be_bytes()),
        Arg::Other(other) => write_other(other, out),
    }
}

fn write_other(arg: &OtherArg, out: &mut Vec<u8>) {
    match arg {
        OtherArg::Str(s) | OtherArg::Symbol(s) => write_str(s, out),
        OtherArg::Blob(bytes) => {
            out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            out.extend_from_slice(bytes);
            pad(out);
        }
        OtherArg::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
        OtherArg::Time(v) => out.extend_from_slice(&v.to_be_bytes()),
        OtherArg::Char(c) => out.extend_from_slice(&(*c as u32).to_be_bytes()),
        OtherArg::Color(v) => out.extend_from_slice(&v.to_be_bytes()),
        OtherArg::Midi(bytes) => out.extend_from_slice(bytes),
        OtherArg::Bool(_) | OtherArg::Nil | OtherArg::Impulse => {}
        OtherArg::Array(items) => {
            for item in items {
                write_arg(item, out);
            }
        }
    }
}

fn write_str(s: &str, out: &mut Vec<u8>) {
    out.extend_from_slice(s.as_bytes());
    out.push(0);
    pad(out);
}

fn pad(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}
