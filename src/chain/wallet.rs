//! A deterministic wallet.
//!
//! The wallet derives a sequence of keypairs from a 64-byte seed (typically
//! the BIP-39 seed of a mnemonic, which is the caller's business - this crate
//! only sees the seed). Derivation is keccak over the seed, the account index
//! and a retry counter, repeated until the digest is a valid secp256k1 scalar.

use alloy_primitives::{keccak256, Address};
use secp256k1::{Keypair, SECP256K1};

use super::tx::{address_of, SignedTransaction, Transaction};

pub struct Wallet {
    keys: Vec<Keypair>,
    addresses: Vec<Address>,
}

impl Wallet {
    /// Derives `count` accounts from `seed`.
    pub fn from_seed(seed: &[u8; 64], count: usize) -> Self {
        let mut keys = Vec::with_capacity(count);
        let mut addresses = Vec::with_capacity(count);
        for index in 0..count {
            let key_pair = derive_key(seed, index as u32);
            addresses.push(address_of(&key_pair.public_key()));
            keys.push(key_pair);
        }
        Wallet { keys, addresses }
    }

    /// Account addresses in derivation order.
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn address(&self, index: usize) -> Address {
        self.addresses[index]
    }

    /// Signs `tx` with the key of `from`.
    ///
    /// Fails if `from` is not one of this wallet's accounts.
    pub fn sign(&self, from: Address, tx: Transaction) -> Result<SignedTransaction, UnknownAccount> {
        let index = self
            .addresses
            .iter()
            .position(|address| *address == from)
            .ok_or(UnknownAccount(from))?;
        Ok(SignedTransaction::sign(tx, &self.keys[index]))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnknownAccount(pub Address);

fn derive_key(seed: &[u8; 64], index: u32) -> Keypair {
    let mut attempt = 0u32;
    loop {
        let mut preimage = Vec::with_capacity(64 + 8);
        preimage.extend_from_slice(seed);
        preimage.extend_from_slice(&index.to_be_bytes());
        preimage.extend_from_slice(&attempt.to_be_bytes());
        let digest = keccak256(&preimage);
        if let Ok(key_pair) = Keypair::from_seckey_slice(SECP256K1, digest.as_slice()) {
            break key_pair;
        }
        attempt += 1;
    }
}
