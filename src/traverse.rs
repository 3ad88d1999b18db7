//! Descriptor-driven traversal for size computation, serialization and
//! deserialization.
//!
//! Serialization and per-instance size estimation run the same
//! `write_message` walk, the latter against a `SizeCounter`, so the two can
//! never disagree on member order or padding.

use crate::descriptor::{MemberDescriptor, MemberKind, MessageDescriptor, PrimitiveKind};
use crate::error::{Error, Result};
use crate::size::SizeCounter;
use crate::stream::{alignment_padding, CdrRead, CdrWrite};
use crate::value::{DynamicMessage, Value};

/// Content bytes occupied by a message with no members.
const EMPTY_MESSAGE_SIZE: u64 = 1;

/// Static upper bound on the content size of `descriptor`, measured from the
/// start of the encapsulated content. Unbounded strings count as empty and
/// unbounded sequences as holding no elements.
pub(crate) fn max_content_size(descriptor: &MessageDescriptor) -> u64 {
    max_message_end(descriptor, 0)
}

fn max_message_end(descriptor: &MessageDescriptor, offset: u64) -> u64 {
    if descriptor.members().is_empty() {
        return offset.saturating_add(EMPTY_MESSAGE_SIZE);
    }
    descriptor
        .members()
        .iter()
        .fold(offset, |offset, member| max_kind_end(&member.kind, offset))
}

fn max_kind_end(kind: &MemberKind, offset: u64) -> u64 {
    match kind {
        MemberKind::Primitive(p) => aligned(offset, p.width()).saturating_add(p.width()),
        MemberKind::String { bound } => {
            let content = bound.map_or(1, |b| b as u64 + 1);
            aligned(offset, 4).saturating_add(4).saturating_add(content)
        }
        MemberKind::Message(descriptor) => max_message_end(descriptor, offset),
        MemberKind::Array { element, len } => max_repeated_end(element, offset, *len),
        MemberKind::Sequence { element, bound } => {
            let offset = aligned(offset, 4).saturating_add(4);
            max_repeated_end(element, offset, bound.unwrap_or(0))
        }
    }
}

/// End offset of `count` consecutive elements starting at `offset`.
///
/// An element's footprint depends only on its start offset modulo 8, so the
/// walk becomes periodic within eight steps and the rest is extrapolated.
fn max_repeated_end(element: &MemberKind, offset: u64, count: usize) -> u64 {
    let mut seen: [Option<(usize, u64)>; 8] = [None; 8];
    let mut offset = offset;
    let mut i = 0;
    while i < count {
        let slot = (offset % 8) as usize;
        if let Some((start, start_offset)) = seen[slot] {
            let period = i - start;
            let stride = offset - start_offset;
            let cycles = (count - i) / period;
            offset = offset.saturating_add(stride.saturating_mul(cycles as u64));
            i += period * cycles;
            break;
        }
        seen[slot] = Some((i, offset));
        offset = max_kind_end(element, offset);
        i += 1;
    }
    while i < count {
        offset = max_kind_end(element, offset);
        i += 1;
    }
    offset
}

/// Rejects layouts that cannot be described in IDL: fixed arrays of length
/// zero, at any depth.
pub(crate) fn validate(descriptor: &MessageDescriptor) -> Result<()> {
    descriptor
        .members()
        .iter()
        .try_for_each(|member| validate_kind(member, &member.kind))
}

fn validate_kind(member: &MemberDescriptor, kind: &MemberKind) -> Result<()> {
    match kind {
        MemberKind::Primitive(_) | MemberKind::String { .. } => Ok(()),
        MemberKind::Message(descriptor) => validate(descriptor),
        MemberKind::Array { len: 0, .. } => Err(Error::ZeroLengthArray {
            member: member.name.clone(),
        }),
        MemberKind::Array { element, .. } | MemberKind::Sequence { element, .. } => {
            validate_kind(member, element)
        }
    }
}

fn aligned(offset: u64, alignment: u64) -> u64 {
    offset.saturating_add(alignment_padding(offset, alignment))
}

/// Exact content size `message` serializes to.
pub(crate) fn content_size(descriptor: &MessageDescriptor, message: &DynamicMessage) -> Result<u64> {
    let mut counter = SizeCounter::new();
    write_message(descriptor, message, &mut counter)?;
    Ok(counter.total())
}

pub(crate) fn write_message(
    descriptor: &MessageDescriptor,
    message: &DynamicMessage,
    out: &mut dyn CdrWrite,
) -> Result<()> {
    if descriptor.members().is_empty() {
        return out.write_u8(0);
    }
    check_member_count(descriptor, message.len())?;
    for (member, value) in descriptor.members().iter().zip(message.values()) {
        write_value(member, &member.kind, value, out)?;
    }
    Ok(())
}

fn write_value(
    member: &MemberDescriptor,
    kind: &MemberKind,
    value: &Value,
    out: &mut dyn CdrWrite,
) -> Result<()> {
    match (kind, value) {
        (MemberKind::Primitive(p), value) => write_primitive(member, *p, value, out),
        (MemberKind::String { bound }, Value::String(s)) => {
            check_bound("string", s.len(), *bound)?;
            out.write_string(s)
        }
        (MemberKind::Message(descriptor), Value::Message(m)) => write_message(descriptor, m, out),
        (MemberKind::Array { element, len }, Value::Array(items)) => {
            if items.len() != *len {
                return Err(Error::ArrayLengthMismatch {
                    expected: *len,
                    found: items.len(),
                });
            }
            write_elements(member, element, items, out)
        }
        (MemberKind::Sequence { element, bound }, Value::Array(items)) => {
            check_bound("sequence", items.len(), *bound)?;
            out.write_len(items.len())?;
            write_elements(member, element, items, out)
        }
        (kind, value) => Err(mismatch(member, kind, value)),
    }
}

fn write_elements(
    member: &MemberDescriptor,
    element: &MemberKind,
    items: &[Value],
    out: &mut dyn CdrWrite,
) -> Result<()> {
    // octet payloads (images, point clouds) go out in one write
    if let MemberKind::Primitive(p @ (PrimitiveKind::Octet | PrimitiveKind::UInt8)) = element {
        let bytes = items
            .iter()
            .map(|item| match (p, item) {
                (PrimitiveKind::Octet, Value::Octet(v)) | (PrimitiveKind::UInt8, Value::UInt8(v)) => {
                    Ok(*v)
                }
                (_, other) => Err(mismatch(member, element, other)),
            })
            .collect::<Result<Vec<u8>>>()?;
        return out.write_raw(&bytes);
    }
    items
        .iter()
        .try_for_each(|item| write_value(member, element, item, out))
}

fn write_primitive(
    member: &MemberDescriptor,
    kind: PrimitiveKind,
    value: &Value,
    out: &mut dyn CdrWrite,
) -> Result<()> {
    match (kind, value) {
        (PrimitiveKind::Bool, Value::Bool(v)) => out.write_bool(*v),
        (PrimitiveKind::Octet, Value::Octet(v))
        | (PrimitiveKind::Char, Value::Char(v))
        | (PrimitiveKind::UInt8, Value::UInt8(v)) => out.write_u8(*v),
        (PrimitiveKind::Int8, Value::Int8(v)) => out.write_i8(*v),
        (PrimitiveKind::Int16, Value::Int16(v)) => out.write_i16(*v),
        (PrimitiveKind::UInt16, Value::UInt16(v)) => out.write_u16(*v),
        (PrimitiveKind::Int32, Value::Int32(v)) => out.write_i32(*v),
        (PrimitiveKind::UInt32, Value::UInt32(v)) => out.write_u32(*v),
        (PrimitiveKind::Int64, Value::Int64(v)) => out.write_i64(*v),
        (PrimitiveKind::UInt64, Value::UInt64(v)) => out.write_u64(*v),
        (PrimitiveKind::Float32, Value::Float32(v)) => out.write_f32(*v),
        (PrimitiveKind::Float64, Value::Float64(v)) => out.write_f64(*v),
        (kind, value) => Err(mismatch(member, &MemberKind::Primitive(kind), value)),
    }
}

/// Reads `descriptor`'s members into `message`. Members whose current value
/// has the wrong shape are reallocated; the contents of `message` are
/// unspecified when an error is returned.
pub(crate) fn read_message(
    descriptor: &MessageDescriptor,
    input: &mut dyn CdrRead,
    message: &mut DynamicMessage,
) -> Result<()> {
    if descriptor.members().is_empty() {
        input.read_u8()?;
        message.values_mut().clear();
        return Ok(());
    }
    if message.len() != descriptor.member_count() {
        *message = DynamicMessage::new(descriptor);
    }
    for (member, slot) in descriptor.members().iter().zip(message.values_mut()) {
        read_value(&member.kind, input, slot)?;
    }
    Ok(())
}

fn read_value(kind: &MemberKind, input: &mut dyn CdrRead, slot: &mut Value) -> Result<()> {
    match kind {
        MemberKind::Primitive(p) => *slot = read_primitive(*p, input)?,
        MemberKind::String { bound } => {
            let s = input.read_string()?;
            check_bound("string", s.len(), *bound)?;
            *slot = Value::String(s);
        }
        MemberKind::Message(descriptor) => {
            let mut nested = match std::mem::replace(slot, Value::Bool(false)) {
                Value::Message(m) => m,
                _ => DynamicMessage::new(descriptor),
            };
            read_message(descriptor, input, &mut nested)?;
            *slot = Value::Message(nested);
        }
        MemberKind::Array { element, len } => {
            *slot = Value::Array(read_elements(element, *len, input, take_items(slot))?);
        }
        MemberKind::Sequence { element, bound } => {
            // every element takes at least one byte, so the count can never
            // exceed what is left in the buffer
            let len = input.read_len(element.min_wire_size().max(1))?;
            check_bound("sequence", len, *bound)?;
            *slot = Value::Array(read_elements(element, len, input, take_items(slot))?);
        }
    }
    Ok(())
}

fn take_items(slot: &mut Value) -> Vec<Value> {
    match std::mem::replace(slot, Value::Array(Vec::new())) {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

fn read_elements(
    element: &MemberKind,
    len: usize,
    input: &mut dyn CdrRead,
    mut items: Vec<Value>,
) -> Result<Vec<Value>> {
    match element {
        MemberKind::Primitive(PrimitiveKind::Octet) => {
            Ok(input.read_raw(len)?.iter().map(|b| Value::Octet(*b)).collect())
        }
        MemberKind::Primitive(PrimitiveKind::UInt8) => {
            Ok(input.read_raw(len)?.iter().map(|b| Value::UInt8(*b)).collect())
        }
        _ => {
            items.resize_with(len, || Value::default_for(element));
            for item in items.iter_mut() {
                read_value(element, input, item)?;
            }
            Ok(items)
        }
    }
}

fn read_primitive(kind: PrimitiveKind, input: &mut dyn CdrRead) -> Result<Value> {
    Ok(match kind {
        PrimitiveKind::Bool => Value::Bool(input.read_bool()?),
        PrimitiveKind::Octet => Value::Octet(input.read_u8()?),
        PrimitiveKind::Char => Value::Char(input.read_u8()?),
        PrimitiveKind::Int8 => Value::Int8(input.read_i8()?),
        PrimitiveKind::UInt8 => Value::UInt8(input.read_u8()?),
        PrimitiveKind::Int16 => Value::Int16(input.read_i16()?),
        PrimitiveKind::UInt16 => Value::UInt16(input.read_u16()?),
        PrimitiveKind::Int32 => Value::Int32(input.read_i32()?),
        PrimitiveKind::UInt32 => Value::UInt32(input.read_u32()?),
        PrimitiveKind::Int64 => Value::Int64(input.read_i64()?),
        PrimitiveKind::UInt64 => Value::UInt64(input.read_u64()?),
        PrimitiveKind::Float32 => Value::Float32(input.read_f32()?),
        PrimitiveKind::Float64 => Value::Float64(input.read_f64()?),
    })
}

fn check_member_count(descriptor: &MessageDescriptor, found: usize) -> Result<()> {
    if found != descriptor.member_count() {
        return Err(Error::MemberCountMismatch {
            type_name: descriptor.full_name(),
            expected: descriptor.member_count(),
            found,
        });
    }
    Ok(())
}

fn check_bound(what: &'static str, len: usize, bound: Option<usize>) -> Result<()> {
    match bound {
        Some(bound) if len > bound => Err(Error::BoundExceeded { what, len, bound }),
        _ => Ok(()),
    }
}

fn mismatch(member: &MemberDescriptor, kind: &MemberKind, value: &Value) -> Error {
    Error::ValueMismatch {
        member: member.name.clone(),
        expected: kind.to_string(),
        found: value.kind_name(),
    }
}
