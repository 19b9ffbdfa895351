//! The `bytecode` build artifact.
//!
//! The bytecode is what a deployment transaction carries: a versioned binary
//! description of the program to instantiate. At rest (on disk, in a compiler
//! output) it is hex-encoded; on the wire it is the raw bytes, optionally
//! followed by encoded constructor arguments.

use alloy_primitives::U256;

use super::{read_u256, read_u8, take, write_u256, Deserialize, Serialize};

const MAGIC: [u8; 4] = *b"LTRY";

/// A deployable program.
///
/// There is exactly one program kind today - the Lottery - but the format
/// carries a kind byte so the chain can reject bytecode it does not know how
/// to run instead of misinterpreting it.
#[derive(Debug, Clone, PartialEq)]
pub enum Program {
    Lottery {
        /// Minimum payment accepted by `enter`, in wei. Baked into the
        /// bytecode by the compile step, not chosen at deploy time.
        min_entry: U256,
    },
}

impl Program {
    const VERSION: u8 = 1;
    const KIND_LOTTERY: u8 = 1;
}

impl Serialize for Program {
    fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.push(Program::VERSION);
        match self {
            Program::Lottery { min_entry } => {
                out.push(Program::KIND_LOTTERY);
                write_u256(*min_entry, out);
            }
        }
    }
}

impl Deserialize for Program {
    type Error = DeserializationError;

    fn deserialize(bytes: &mut &[u8]) -> Result<Self, Self::Error> {
        let magic = take(bytes, 4).ok_or(DeserializationError::UnexpectedEnd)?;
        if magic != MAGIC {
            let mut found = [0u8; 4];
            found.copy_from_slice(magic);
            return Err(DeserializationError::BadMagic(found));
        }
        let version = read_u8(bytes).ok_or(DeserializationError::UnexpectedEnd)?;
        if version != Program::VERSION {
            return Err(DeserializationError::UnknownVersion(version));
        }
        match read_u8(bytes).ok_or(DeserializationError::UnexpectedEnd)? {
            kind if kind == Program::KIND_LOTTERY => {
                let min_entry = read_u256(bytes).ok_or(DeserializationError::UnexpectedEnd)?;
                Ok(Program::Lottery { min_entry })
            }
            kind => Err(DeserializationError::UnknownKind(kind)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeserializationError {
    UnexpectedEnd,
    BadMagic([u8; 4]),
    UnknownVersion(u8),
    UnknownKind(u8),
}

#[cfg(test)]
impl quickcheck::Arbitrary for Program {
    fn arbitrary(gen: &mut quickcheck::Gen) -> Self {
        Program::Lottery {
            min_entry: crate::test_macros::arbitrary(gen),
        }
    }
}
