//! OSC 1.0 datagram decoder.

use std::str::Chars;

use crate::error::{WireError, WireResult};
use crate::packet::{Arg, Bundle, Message, OtherArg, Packet};

/// Leading bytes of every bundle element.
pub const BUNDLE_TAG: &[u8; 8] = b"#bundle\0";

/// Default limit on nested bundle depth.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Limit on `[` nesting inside one type tag string.
const MAX_ARRAY_DEPTH: usize = 16;

/// Turns a raw datagram received on `port` into a [`Packet`].
///
/// Implementations run on the receive thread and must not block.
pub trait Decoder: Send + Sync {
    fn decode(&self, datagram: &[u8], port: u16) -> WireResult<Packet>;
}

impl<F> Decoder for F
where
    F: Fn(&[u8], u16) -> WireResult<Packet> + Send + Sync,
{
    fn decode(&self, datagram: &[u8], port: u16) -> WireResult<Packet> {
        self(datagram, port)
    }
}

/// Decoder for the OSC 1.0 binary encoding.
#[derive(Clone, Copy, Debug)]
pub struct OscDecoder {
    max_depth: usize,
}

impl OscDecoder {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limits how deeply bundles may nest before the datagram is rejected.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn decode_bundle(
        &self,
        bytes: &[u8],
        base: usize,
        depth: usize,
        out: &mut Vec<Message>,
    ) -> WireResult<u64> {
        if depth >= self.max_depth {
            return Err(WireError::NestingTooDeep(self.max_depth));
        }
        let mut reader = Reader::new(bytes, base);
        reader.skip(BUNDLE_TAG.len(), "bundle tag")?;
        let timetag = reader.u64("bundle time tag")?;
        while !reader.is_empty() {
            let offset = reader.offset();
            let size = reader.i32("bundle element size")?;
            if size < 0 || size % 4 != 0 {
                return Err(WireError::InvalidElementSize { size, offset });
            }
            let element_base = reader.offset();
            let element = reader.take(size as usize, "bundle element")?;
            if element.starts_with(BUNDLE_TAG) {
                self.decode_bundle(element, element_base, depth + 1, out)?;
            } else {
                out.push(decode_message(element, element_base)?);
            }
        }
        Ok(timetag)
    }
}

impl Default for OscDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for OscDecoder {
    fn decode(&self, datagram: &[u8], _port: u16) -> WireResult<Packet> {
        if datagram.is_empty() {
            return Err(WireError::Empty);
        }
        if datagram.len() % 4 != 0 {
            return Err(WireError::Misaligned {
                what: "datagram length",
                offset: datagram.len(),
            });
        }
        if datagram.starts_with(BUNDLE_TAG) {
            let mut messages = Vec::new();
            let timetag = self.decode_bundle(datagram, 0, 0, &mut messages)?;
            Ok(Packet::Bundle(Bundle { timetag, messages }))
        } else {
            decode_message(datagram, 0).map(Packet::Message)
        }
    }
}

fn decode_message(bytes: &[u8], base: usize) -> WireResult<Message> {
    let mut reader = Reader::new(bytes, base);
    let address = reader.string("address")?;
    if !address.starts_with('/') {
        return Err(WireError::InvalidAddress(address));
    }

    // Pre-1.0 senders may omit the type tag string entirely.
    if reader.is_empty() {
        return Ok(Message::new(address, Vec::new()));
    }

    let tags = reader.string("type tags")?;
    let Some(tags) = tags.strip_prefix(',') else {
        return Err(WireError::MissingTypeTags);
    };

    let mut tags = tags.chars();
    let args = decode_args(&mut tags, &mut reader, &address, 0)?;
    Ok(Message::new(address, args))
}

/// Reads arguments for `tags` until the tags run out or, inside an array,
/// until the closing `]`.
fn decode_args(
    tags: &mut Chars<'_>,
    reader: &mut Reader<'_>,
    address: &str,
    array_depth: usize,
) -> WireResult<Vec<Arg>> {
    let mut args = Vec::new();
    while let Some(tag) = tags.next() {
        let arg = match tag {
            'i' => Arg::Int(reader.i32("int32 argument")?),
            'f' => Arg::Float(f32::from_bits(reader.u32("float32 argument")?)),
            'd' => Arg::Double(f64::from_bits(reader.u64("float64 argument")?)),
            's' => Arg::Other(OtherArg::Str(reader.string("string argument")?)),
            'S' => Arg::Other(OtherArg::Symbol(reader.string("symbol argument")?)),
            'b' => Arg::Other(OtherArg::Blob(reader.blob()?)),
            'h' => Arg::Other(OtherArg::Long(reader.u64("int64 argument")? as i64)),
            't' => Arg::Other(OtherArg::Time(reader.u64("timetag argument")?)),
            'c' => {
                let raw = reader.u32("char argument")?;
                Arg::Other(OtherArg::Char(
                    char::from_u32(raw).unwrap_or(char::REPLACEMENT_CHARACTER),
                ))
            }
            'r' => Arg::Other(OtherArg::Color(reader.u32("color argument")?)),
            'm' => Arg::Other(OtherArg::Midi(reader.u32("midi argument")?.to_be_bytes())),
            'T' => Arg::Other(OtherArg::Bool(true)),
            'F' => Arg::Other(OtherArg::Bool(false)),
            'N' => Arg::Other(OtherArg::Nil),
            'I' => Arg::Other(OtherArg::Impulse),
            '[' => {
                if array_depth >= MAX_ARRAY_DEPTH {
                    return Err(WireError::NestingTooDeep(MAX_ARRAY_DEPTH));
                }
                let items = decode_args(tags, reader, address, array_depth + 1)?;
                Arg::Other(OtherArg::Array(items))
            }
            ']' if array_depth > 0 => return Ok(args),
            other => {
                return Err(WireError::UnknownTypeTag {
                    tag: other,
                    address: address.to_owned(),
                })
            }
        };
        args.push(arg);
    }

    if array_depth > 0 {
        return Err(WireError::UnterminatedArray {
            address: address.to_owned(),
        });
    }
    Ok(args)
}

/// Big-endian cursor over one packet element. `base` is the element's offset
/// within the datagram so errors report absolute positions.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], base: usize) -> Self {
        Self {
            bytes,
            pos: 0,
            base,
        }
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take(&mut self, len: usize, what: &'static str) -> WireResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(WireError::Truncated {
                what,
                offset: self.offset(),
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize, what: &'static str) -> WireResult<()> {
        self.take(len, what).map(|_| ())
    }

    fn u32(&mut self, what: &'static str) -> WireResult<u32> {
        let raw = self.take(4, what)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn i32(&mut self, what: &'static str) -> WireResult<i32> {
        self.u32(what).map(|v| v as i32)
    }

    fn u64(&mut self, what: &'static str) -> WireResult<u64> {
        let raw = self.take(8, what)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(raw);
        Ok(u64::from_be_bytes(buf))
    }

    fn string(&mut self, what: &'static str) -> WireResult<String> {
        let start = self.offset();
        let rest = &self.bytes[self.pos.min(self.bytes.len())..];
        let nul = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or(WireError::Truncated {
                what,
                offset: start,
            })?;
        let text = std::str::from_utf8(&rest[..nul])
            .map_err(|_| WireError::InvalidUtf8 { offset: start })?
            .to_owned();
        self.skip(padded_len(nul + 1), what)?;
        Ok(text)
    }

    fn blob(&mut self) -> WireResult<Vec<u8>> {
        let offset = self.offset();
        let size = self.i32("blob size")?;
        if size < 0 {
            return Err(WireError::InvalidElementSize { size, offset });
        }
        let size = size as usize;
        let data = self.take(padded_len(size), "blob data")?;
        Ok(data[..size].to_vec())
    }
}

/// Rounds `len` up to the next multiple of four.
pub(crate) fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}
