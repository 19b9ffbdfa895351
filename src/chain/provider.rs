//! The seam between clients and a node.
//!
//! [`Provider`] is the thing that lists accounts, answers balance queries and
//! accepts transactions. The node simulator implements it with its own
//! unlocked accounts; [`WalletProvider`] wraps any node and signs locally
//! with a wallet instead, the way an HD-wallet provider fronts a remote node.

use alloy_primitives::{Address, U256};

use crate::contract::value::Value;

use super::tx::{BlockInfo, Receipt, SignatureError, SignedTransaction, Transaction};
use super::wallet::Wallet;
use super::ExecError;

/// A state-mutating submission, to be signed by the provider.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub from: Address,
    /// `None` deploys a contract.
    pub to: Option<Address>,
    pub value: U256,
    pub gas: u64,
    pub data: Vec<u8>,
}

/// A read-only invocation.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub to: Address,
    pub data: Vec<u8>,
}

pub trait Provider {
    /// Accounts this provider can sign for, in listing order.
    fn accounts(&self) -> Vec<Address>;

    fn balance(&self, address: Address) -> U256;

    /// Number of transactions already mined for `address`.
    fn nonce(&self, address: Address) -> u64;

    fn block(&self) -> BlockInfo;

    fn gas_price(&self) -> U256;

    /// Signs and submits a transaction, blocking until it is mined.
    fn send(&mut self, request: SendRequest) -> Result<Receipt, ProviderError>;

    /// Submits an externally signed transaction.
    fn send_raw(&mut self, tx: SignedTransaction) -> Result<Receipt, ProviderError>;

    /// Executes a read-only invocation against current state.
    fn call(&self, request: CallRequest) -> Result<Value, ProviderError>;
}

#[derive(Debug)]
#[non_exhaustive]
pub enum ProviderError {
    /// The provider holds no key for the requested `from` account.
    UnknownAccount(Address),
    InvalidSignature(SignatureError),
    /// The transaction was rejected by the chain.
    Execution(ExecError),
}

/// A provider that signs with a local [`Wallet`] and forwards everything else
/// to the node behind it.
pub struct WalletProvider<P> {
    node: P,
    wallet: Wallet,
}

impl<P: Provider> WalletProvider<P> {
    pub fn new(node: P, wallet: Wallet) -> Self {
        WalletProvider { node, wallet }
    }

    pub fn node(&self) -> &P {
        &self.node
    }
}

impl<P: Provider> Provider for WalletProvider<P> {
    fn accounts(&self) -> Vec<Address> {
        self.wallet.addresses().to_vec()
    }

    fn balance(&self, address: Address) -> U256 {
        self.node.balance(address)
    }

    fn nonce(&self, address: Address) -> u64 {
        self.node.nonce(address)
    }

    fn block(&self) -> BlockInfo {
        self.node.block()
    }

    fn gas_price(&self) -> U256 {
        self.node.gas_price()
    }

    fn send(&mut self, request: SendRequest) -> Result<Receipt, ProviderError> {
        let tx = Transaction {
            nonce: self.node.nonce(request.from),
            to: request.to,
            value: request.value,
            gas_limit: request.gas,
            gas_price: self.node.gas_price(),
            data: request.data,
        };
        let signed = self
            .wallet
            .sign(request.from, tx)
            .map_err(|error| ProviderError::UnknownAccount(error.0))?;
        self.node.send_raw(signed)
    }

    fn send_raw(&mut self, tx: SignedTransaction) -> Result<Receipt, ProviderError> {
        self.node.send_raw(tx)
    }

    fn call(&self, request: CallRequest) -> Result<Value, ProviderError> {
        self.node.call(request)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use crate::chain::wallet::Wallet;
    use crate::chain::{ether, NodeSim};

    use super::{Provider, ProviderError, SendRequest, WalletProvider};

    #[test]
    fn wallet_provider_lists_wallet_accounts() {
        let node = NodeSim::dev();
        let wallet = Wallet::from_seed(&[1u8; 64], 3);
        let addresses = wallet.addresses().to_vec();
        let provider = WalletProvider::new(node, wallet);
        assert_eq!(provider.accounts(), addresses);
    }

    #[test]
    fn wallet_provider_signs_and_submits() {
        let mut node = NodeSim::dev();
        let wallet = Wallet::from_seed(&[2u8; 64], 1);
        let sender = wallet.address(0);
        let recipient = node.unlocked_accounts()[0];
        node.fund(sender, ether(1));

        let mut provider = WalletProvider::new(node, wallet);
        let before = provider.balance(recipient);
        provider
            .send(SendRequest {
                from: sender,
                to: Some(recipient),
                value: U256::from(1_000),
                gas: 21_000,
                data: Vec::new(),
            })
            .unwrap();
        assert_eq!(provider.balance(recipient), before + U256::from(1_000));
        assert_eq!(provider.nonce(sender), 1);
    }

    #[test]
    fn wallet_provider_rejects_foreign_sender() {
        let node = NodeSim::dev();
        let stranger = node.unlocked_accounts()[0];
        let wallet = Wallet::from_seed(&[3u8; 64], 1);
        let mut provider = WalletProvider::new(node, wallet);

        let result = provider.send(SendRequest {
            from: stranger,
            to: None,
            value: U256::ZERO,
            gas: 21_000,
            data: Vec::new(),
        });
        match result {
            Err(ProviderError::UnknownAccount(address)) => assert_eq!(address, stranger),
            other => panic!("expected UnknownAccount, got {:?}", other.map(|r| r.gas_used)),
        }
    }
}
