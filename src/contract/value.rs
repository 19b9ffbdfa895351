//! Dynamically typed argument and return values.
//!
//! These are the values that travel between a client and the chain: method
//! arguments inside call data and decoded return values. The variants mirror
//! the parameter types the interface artifact can declare.

use alloy_primitives::{Address, U256};

use super::{read_address, read_u256, read_u32, read_u8, take, write_u256, Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value, used as the return of methods with no outputs.
    Unit,
    Address(Address),
    Uint(U256),
    String(String),
    AddressList(Vec<Address>),
}

impl Value {
    /// Type tag stored in the wire encoding.
    fn tag(&self) -> u8 {
        match self {
            Value::Unit => 0,
            Value::Address(_) => 1,
            Value::Uint(_) => 2,
            Value::String(_) => 3,
            Value::AddressList(_) => 4,
        }
    }
}

impl Serialize for Value {
    fn serialize(&self, out: &mut Vec<u8>) {
        out.push(self.tag());
        match self {
            Value::Unit => {}
            Value::Address(address) => out.extend_from_slice(address.as_slice()),
            Value::Uint(value) => write_u256(*value, out),
            Value::String(string) => {
                out.extend_from_slice(&(string.len() as u32).to_be_bytes());
                out.extend_from_slice(string.as_bytes());
            }
            Value::AddressList(addresses) => {
                out.extend_from_slice(&(addresses.len() as u32).to_be_bytes());
                for address in addresses {
                    out.extend_from_slice(address.as_slice());
                }
            }
        }
    }
}

impl Deserialize for Value {
    type Error = ValueDeserError;

    fn deserialize(bytes: &mut &[u8]) -> Result<Self, Self::Error> {
        let tag = read_u8(bytes).ok_or(ValueDeserError::UnexpectedEnd)?;
        match tag {
            0 => Ok(Value::Unit),
            1 => read_address(bytes)
                .map(Value::Address)
                .ok_or(ValueDeserError::UnexpectedEnd),
            2 => read_u256(bytes)
                .map(Value::Uint)
                .ok_or(ValueDeserError::UnexpectedEnd),
            3 => {
                let len = read_u32(bytes).ok_or(ValueDeserError::UnexpectedEnd)? as usize;
                let raw = take(bytes, len).ok_or(ValueDeserError::UnexpectedEnd)?;
                let string = core::str::from_utf8(raw).map_err(ValueDeserError::InvalidUtf8)?;
                Ok(Value::String(string.to_owned()))
            }
            4 => {
                let len = read_u32(bytes).ok_or(ValueDeserError::UnexpectedEnd)? as usize;
                // Length sanity check so garbage can't make us allocate wildly.
                if bytes.len() < len.saturating_mul(20) {
                    return Err(ValueDeserError::UnexpectedEnd);
                }
                let mut addresses = Vec::with_capacity(len);
                for _ in 0..len {
                    addresses.push(read_address(bytes).ok_or(ValueDeserError::UnexpectedEnd)?);
                }
                Ok(Value::AddressList(addresses))
            }
            tag => Err(ValueDeserError::UnknownTag(tag)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueDeserError {
    UnexpectedEnd,
    UnknownTag(u8),
    InvalidUtf8(core::str::Utf8Error),
}

/// A method invocation: the method name plus its arguments.
///
/// This is the payload of a transaction targeting a deployed contract, the
/// counterpart of ABI-encoded call data.
#[derive(Debug, Clone, PartialEq)]
pub struct CallData {
    pub method: String,
    pub args: Vec<Value>,
}

impl Serialize for CallData {
    fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.method.len() as u32).to_be_bytes());
        out.extend_from_slice(self.method.as_bytes());
        serialize_values(&self.args, out);
    }
}

impl Deserialize for CallData {
    type Error = ValueDeserError;

    fn deserialize(bytes: &mut &[u8]) -> Result<Self, Self::Error> {
        let len = read_u32(bytes).ok_or(ValueDeserError::UnexpectedEnd)? as usize;
        let raw = take(bytes, len).ok_or(ValueDeserError::UnexpectedEnd)?;
        let method = core::str::from_utf8(raw)
            .map_err(ValueDeserError::InvalidUtf8)?
            .to_owned();
        let args = deserialize_values(bytes)?;
        Ok(CallData { method, args })
    }
}

pub(crate) fn serialize_values(values: &[Value], out: &mut Vec<u8>) {
    out.extend_from_slice(&(values.len() as u32).to_be_bytes());
    for value in values {
        value.serialize(out);
    }
}

pub(crate) fn deserialize_values(bytes: &mut &[u8]) -> Result<Vec<Value>, ValueDeserError> {
    let count = read_u32(bytes).ok_or(ValueDeserError::UnexpectedEnd)? as usize;
    // Every value costs at least its tag byte.
    if bytes.len() < count {
        return Err(ValueDeserError::UnexpectedEnd);
    }
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(Value::deserialize(bytes)?);
    }
    Ok(values)
}

#[cfg(test)]
impl quickcheck::Arbitrary for Value {
    fn arbitrary(gen: &mut quickcheck::Gen) -> Self {
        use crate::test_macros::arbitrary;

        match gen.choose(&[0u8, 1, 2, 3, 4]).unwrap() {
            0 => Value::Unit,
            1 => Value::Address(arbitrary(gen)),
            2 => Value::Uint(arbitrary(gen)),
            3 => Value::String(String::arbitrary(gen)),
            _ => Value::AddressList(arbitrary(gen)),
        }
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for CallData {
    fn arbitrary(gen: &mut quickcheck::Gen) -> Self {
        CallData {
            method: String::arbitrary(gen),
            args: Vec::arbitrary(gen),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, U256};

    use super::super::{Deserialize, Serialize};
    use super::{CallData, Value, ValueDeserError};

    crate::test_macros::check_roundtrip!(value_roundtrip, Value);
    crate::test_macros::check_roundtrip!(call_data_roundtrip, CallData);

    #[test]
    fn rejects_unknown_tag() {
        let err = Value::deserialize(&mut &[9u8][..]).unwrap_err();
        assert_eq!(err, ValueDeserError::UnknownTag(9));
    }

    #[test]
    fn rejects_truncated_address_list() {
        let mut bytes = Vec::new();
        Value::AddressList(vec![Address::ZERO, Address::ZERO]).serialize(&mut bytes);
        bytes.truncate(bytes.len() - 1);
        let err = Value::deserialize(&mut &*bytes).unwrap_err();
        assert_eq!(err, ValueDeserError::UnexpectedEnd);
    }

    #[test]
    fn call_data_layout_is_stable() {
        let call = CallData {
            method: "bal".to_owned(),
            args: vec![Value::Uint(U256::from(1))],
        };
        let mut bytes = Vec::new();
        call.serialize(&mut bytes);
        let mut expected = vec![0, 0, 0, 3];
        expected.extend_from_slice(b"bal");
        expected.extend_from_slice(&[0, 0, 0, 1, 2]);
        expected.extend_from_slice(&U256::from(1).to_be_bytes::<32>());
        assert_eq!(bytes, expected);
    }
}
