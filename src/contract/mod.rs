//! # Contract
//!
//! This module contains the Lottery contract itself and everything a client
//! needs to talk to a deployed instance: the `interface`/`bytecode` artifact
//! pair, argument marshaling and the deploy/send/call surface.

pub mod abi;
pub mod bytecode;
pub mod client;
pub mod lottery;
pub mod value;

/// Serialization into the crate's wire format.
///
/// The wire format is used for everything that crosses the client/chain
/// boundary: the bytecode artifact, call data and transaction digests.
pub trait Serialize {
    fn serialize(&self, out: &mut Vec<u8>);
}

pub trait Deserialize: Sized {
    type Error: core::fmt::Debug;

    /// Deserializes a value, consuming the read bytes from the front of `bytes`.
    fn deserialize(bytes: &mut &[u8]) -> Result<Self, Self::Error>;
}

/// Takes `n` bytes off the front of `bytes` or `None` if there aren't enough.
pub(crate) fn take<'a>(bytes: &mut &'a [u8], n: usize) -> Option<&'a [u8]> {
    if bytes.len() < n {
        return None;
    }
    let (head, tail) = bytes.split_at(n);
    *bytes = tail;
    Some(head)
}

pub(crate) fn read_u8(bytes: &mut &[u8]) -> Option<u8> {
    take(bytes, 1).map(|head| head[0])
}

pub(crate) fn read_u32(bytes: &mut &[u8]) -> Option<u32> {
    let head = take(bytes, 4)?;
    let mut buf = [0u8; 4];
    buf.copy_from_slice(head);
    Some(u32::from_be_bytes(buf))
}

pub(crate) fn read_u64(bytes: &mut &[u8]) -> Option<u64> {
    let head = take(bytes, 8)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(head);
    Some(u64::from_be_bytes(buf))
}

pub(crate) fn read_u256(bytes: &mut &[u8]) -> Option<alloy_primitives::U256> {
    let head = take(bytes, 32)?;
    let mut buf = [0u8; 32];
    buf.copy_from_slice(head);
    Some(alloy_primitives::U256::from_be_bytes(buf))
}

pub(crate) fn read_address(bytes: &mut &[u8]) -> Option<alloy_primitives::Address> {
    take(bytes, 20).map(alloy_primitives::Address::from_slice)
}

pub(crate) fn write_u256(value: alloy_primitives::U256, out: &mut Vec<u8>) {
    out.extend_from_slice(&value.to_be_bytes::<32>());
}
