//! Transactions, signatures and receipts.
//!
//! A transaction is signed over the keccak digest of its wire encoding. The
//! signature travels with the signer's public key, so the chain verifies it
//! directly and derives the sender address from the key instead of recovering
//! it.

use alloy_primitives::{keccak256, Address, B256, U256};
use secp256k1::ecdsa::Signature;
use secp256k1::{Keypair, Message, PublicKey, SECP256K1};

use crate::contract::{read_address, read_u256, read_u32, read_u64, read_u8, take, write_u256, Deserialize, Serialize};

/// An unsigned transaction.
///
/// `to == None` is a creation transaction: `data` carries the bytecode
/// followed by encoded constructor arguments. Otherwise `data` carries call
/// data for the target contract, or is empty for a plain transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub nonce: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub data: Vec<u8>,
}

impl Transaction {
    /// The digest that gets signed.
    pub fn digest(&self) -> B256 {
        let mut bytes = Vec::with_capacity(85 + self.data.len());
        self.serialize(&mut bytes);
        keccak256(&bytes)
    }
}

impl Serialize for Transaction {
    fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.nonce.to_be_bytes());
        match &self.to {
            None => out.push(0),
            Some(address) => {
                out.push(1);
                out.extend_from_slice(address.as_slice());
            }
        }
        write_u256(self.value, out);
        out.extend_from_slice(&self.gas_limit.to_be_bytes());
        write_u256(self.gas_price, out);
        out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.data);
    }
}

impl Deserialize for Transaction {
    type Error = TxDeserError;

    fn deserialize(bytes: &mut &[u8]) -> Result<Self, Self::Error> {
        let nonce = read_u64(bytes).ok_or(TxDeserError::UnexpectedEnd)?;
        let to = match read_u8(bytes).ok_or(TxDeserError::UnexpectedEnd)? {
            0 => None,
            1 => Some(read_address(bytes).ok_or(TxDeserError::UnexpectedEnd)?),
            tag => return Err(TxDeserError::InvalidToTag(tag)),
        };
        let value = read_u256(bytes).ok_or(TxDeserError::UnexpectedEnd)?;
        let gas_limit = read_u64(bytes).ok_or(TxDeserError::UnexpectedEnd)?;
        let gas_price = read_u256(bytes).ok_or(TxDeserError::UnexpectedEnd)?;
        let data_len = read_u32(bytes).ok_or(TxDeserError::UnexpectedEnd)? as usize;
        let data = take(bytes, data_len)
            .ok_or(TxDeserError::UnexpectedEnd)?
            .to_vec();
        Ok(Transaction {
            nonce,
            to,
            value,
            gas_limit,
            gas_price,
            data,
        })
    }
}

crate::test_macros::impl_arbitrary!(Transaction, nonce, to, value, gas_limit, gas_price, data);

#[derive(Debug, Clone, PartialEq)]
pub enum TxDeserError {
    UnexpectedEnd,
    InvalidToTag(u8),
}

/// A transaction plus the signature proving who submitted it.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub tx: Transaction,
    pub public_key: PublicKey,
    pub signature: Signature,
}

impl SignedTransaction {
    pub fn sign(tx: Transaction, key_pair: &Keypair) -> Self {
        let message = Message::from_digest(tx.digest().0);
        let signature = SECP256K1.sign_ecdsa(&message, &key_pair.secret_key());
        SignedTransaction {
            tx,
            public_key: key_pair.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> Result<(), SignatureError> {
        let message = Message::from_digest(self.tx.digest().0);
        SECP256K1
            .verify_ecdsa(&message, &self.signature, &self.public_key)
            .map_err(SignatureError)
    }

    /// Address of the account that signed this transaction.
    pub fn sender(&self) -> Address {
        address_of(&self.public_key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureError(pub secp256k1::Error);

/// Derives an account address from a public key: the last 20 bytes of the
/// keccak-256 of the uncompressed key.
pub fn address_of(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let digest = keccak256(&uncompressed[1..]);
    Address::from_slice(&digest[12..])
}

/// What happened to a mined transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub block: BlockInfo,
    pub gas_used: u64,
    /// Address of the created contract, for creation transactions.
    pub contract_address: Option<Address>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlockInfo {
    pub number: u64,
    pub timestamp: u64,
}
