//! The chain-client surface: deploying a contract and invoking its methods.
//!
//! [`ContractFactory`] is built from an `interface`/`bytecode` artifact pair
//! and submits the creation transaction; [`Contract`] is the handle to a
//! deployed instance. Both validate invocations against the interface before
//! anything reaches the chain, so a typo'd method name or a wrongly typed
//! argument fails locally instead of surfacing as an opaque revert.

use alloy_primitives::{hex, Address, U256};

use crate::chain::provider::{CallRequest, Provider, ProviderError, SendRequest};
use crate::chain::tx::Receipt;

use super::abi::{ArgsError, Entry, Interface};
use super::value::{serialize_values, CallData, Value};
use super::Serialize;

/// Builds deployment transactions from a compiled artifact pair.
#[derive(Debug, Clone)]
pub struct ContractFactory {
    interface: Interface,
    bytecode: Vec<u8>,
}

impl ContractFactory {
    /// Constructs a factory from the two artifacts as the compile step emits
    /// them: the interface as JSON, the bytecode hex-encoded.
    pub fn from_artifacts(interface_json: &str, bytecode_hex: &str) -> Result<Self, ArtifactError> {
        let interface = Interface::parse(interface_json).map_err(ArtifactError::InvalidInterface)?;
        let bytecode =
            hex::decode(bytecode_hex.trim()).map_err(ArtifactError::InvalidBytecodeHex)?;
        Ok(ContractFactory {
            interface,
            bytecode,
        })
    }

    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    /// Submits the creation transaction and waits for it to be mined.
    ///
    /// The constructor arguments are checked against the interface's
    /// constructor entry. Returns the handle to the deployed instance.
    pub fn deploy<P: Provider>(
        &self,
        provider: &mut P,
        opts: DeployOpts,
    ) -> Result<Contract, ClientError> {
        match self.interface.constructor() {
            Some(constructor) => constructor
                .check_args(&opts.args)
                .map_err(|error| ClientError::BadArgs {
                    method: "constructor".to_owned(),
                    error,
                })?,
            None if opts.args.is_empty() => {}
            None => {
                return Err(ClientError::BadArgs {
                    method: "constructor".to_owned(),
                    error: ArgsError::WrongCount {
                        expected: 0,
                        got: opts.args.len(),
                    },
                })
            }
        }

        let mut data = self.bytecode.clone();
        serialize_values(&opts.args, &mut data);

        let receipt = provider
            .send(SendRequest {
                from: opts.from,
                to: None,
                value: opts.value,
                gas: opts.gas,
                data,
            })
            .map_err(ClientError::Provider)?;
        let address = receipt
            .contract_address
            .ok_or(ClientError::MissingContractAddress)?;
        Ok(Contract {
            address,
            interface: self.interface.clone(),
        })
    }
}

/// Parameters of a deployment.
#[derive(Debug, Clone)]
pub struct DeployOpts {
    pub from: Address,
    /// Starting balance handed to the new contract account.
    pub value: U256,
    pub gas: u64,
    pub args: Vec<Value>,
}

impl DeployOpts {
    pub fn new(from: Address, gas: u64, args: Vec<Value>) -> Self {
        DeployOpts {
            from,
            value: U256::ZERO,
            gas,
            args,
        }
    }
}

/// Handle to a deployed contract instance.
#[derive(Debug, Clone)]
pub struct Contract {
    address: Address,
    interface: Interface,
}

impl Contract {
    /// Attaches to an already deployed instance.
    pub fn at(address: Address, interface: Interface) -> Self {
        Contract { address, interface }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Invokes a state-mutating method by submitting a transaction.
    pub fn send<P: Provider>(
        &self,
        provider: &mut P,
        opts: SendOpts,
        method: &str,
        args: &[Value],
    ) -> Result<Receipt, ClientError> {
        let entry = self.function(method)?;
        if !entry.payable && !opts.value.is_zero() {
            return Err(ClientError::NotPayable(method.to_owned()));
        }
        check_method_args(entry, method, args)?;

        provider
            .send(SendRequest {
                from: opts.from,
                to: Some(self.address),
                value: opts.value,
                gas: opts.gas,
                data: self.encode_call(method, args),
            })
            .map_err(ClientError::Provider)
    }

    /// Invokes a read-only method. No transaction is submitted and no state
    /// changes.
    pub fn call<P: Provider>(
        &self,
        provider: &P,
        method: &str,
        args: &[Value],
    ) -> Result<Value, ClientError> {
        let entry = self.function(method)?;
        if !entry.constant {
            return Err(ClientError::NotConstant(method.to_owned()));
        }
        check_method_args(entry, method, args)?;

        provider
            .call(CallRequest {
                to: self.address,
                data: self.encode_call(method, args),
            })
            .map_err(ClientError::Provider)
    }

    fn function(&self, method: &str) -> Result<&Entry, ClientError> {
        self.interface
            .function(method)
            .ok_or_else(|| ClientError::UnknownMethod(method.to_owned()))
    }

    fn encode_call(&self, method: &str, args: &[Value]) -> Vec<u8> {
        let call = CallData {
            method: method.to_owned(),
            args: args.to_vec(),
        };
        let mut data = Vec::new();
        call.serialize(&mut data);
        data
    }
}

fn check_method_args(entry: &Entry, method: &str, args: &[Value]) -> Result<(), ClientError> {
    entry.check_args(args).map_err(|error| ClientError::BadArgs {
        method: method.to_owned(),
        error,
    })
}

/// Options of a `send` invocation.
#[derive(Debug, Clone)]
pub struct SendOpts {
    pub from: Address,
    pub value: U256,
    pub gas: u64,
}

impl SendOpts {
    /// Default gas budget of a method transaction.
    pub const DEFAULT_GAS: u64 = 100_000;

    pub fn from(from: Address) -> Self {
        SendOpts {
            from,
            value: U256::ZERO,
            gas: SendOpts::DEFAULT_GAS,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

#[derive(Debug)]
pub enum ArtifactError {
    InvalidInterface(serde_json::Error),
    InvalidBytecodeHex(hex::FromHexError),
}

#[derive(Debug)]
pub enum ClientError {
    UnknownMethod(String),
    BadArgs { method: String, error: ArgsError },
    /// `value` was attached to a method the interface declares non-payable.
    NotPayable(String),
    /// `call` was used on a method that mutates state.
    NotConstant(String),
    /// The node mined the creation transaction but reported no address.
    MissingContractAddress,
    Provider(ProviderError),
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use crate::artifacts;
    use crate::chain::NodeSim;

    use super::super::value::Value;
    use super::{ClientError, ContractFactory, DeployOpts, SendOpts};

    fn factory() -> ContractFactory {
        ContractFactory::from_artifacts(
            artifacts::lottery_interface(),
            &artifacts::lottery_bytecode(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_malformed_artifacts() {
        assert!(ContractFactory::from_artifacts("not json", "00").is_err());
        assert!(ContractFactory::from_artifacts("[]", "0xzz").is_err());
    }

    #[test]
    fn send_validates_against_the_interface() {
        let mut node = NodeSim::dev();
        let manager = node.unlocked_accounts()[0];

        let contract = factory()
            .deploy(
                &mut node,
                DeployOpts::new(manager, 1_000_000, vec![Value::String("hi".to_owned())]),
            )
            .unwrap();

        match contract.send(&mut node, SendOpts::from(manager), "refund", &[]) {
            Err(ClientError::UnknownMethod(method)) => assert_eq!(method, "refund"),
            other => panic!("expected UnknownMethod, got {:?}", other),
        }

        let paid = SendOpts::from(manager).with_value(U256::from(1));
        match contract.send(&mut node, paid, "pickWinner", &[]) {
            Err(ClientError::NotPayable(method)) => assert_eq!(method, "pickWinner"),
            other => panic!("expected NotPayable, got {:?}", other),
        }

        match contract.call(&node, "pickWinner", &[]) {
            Err(ClientError::NotConstant(method)) => assert_eq!(method, "pickWinner"),
            other => panic!("expected NotConstant, got {:?}", other),
        }

        match contract.call(&node, "bal", &[Value::Uint(U256::ZERO)]) {
            Err(ClientError::BadArgs { method, .. }) => assert_eq!(method, "bal"),
            other => panic!("expected BadArgs, got {:?}", other),
        }
    }

    #[test]
    fn deploy_checks_constructor_args() {
        let mut node = NodeSim::dev();
        let from = node.unlocked_accounts()[0];
        let result = factory().deploy(&mut node, DeployOpts::new(from, 1_000_000, vec![]));
        match result {
            Err(ClientError::BadArgs { method, .. }) => assert_eq!(method, "constructor"),
            other => panic!("expected BadArgs, got {:?}", other.map(|c| c.address())),
        }
    }
}
