//! # Chain
//!
//! An in-process simulated chain: unlocked, pre-funded accounts, instant
//! mining of one transaction per block, gas accounting and contract execution,
//! all without any network. It plays the part an in-memory test node plays
//! for a contract test suite.

pub mod provider;
pub mod tx;
pub mod wallet;

use std::collections::HashMap;

use alloy_primitives::{keccak256, Address, U256};
use secp256k1::{Keypair, SECP256K1};
use slog::Logger;

use crate::contract::bytecode::{self, Program};
use crate::contract::lottery::{EnterError, Lottery, PickWinnerError};
use crate::contract::value::{self, CallData, Value, ValueDeserError};
use crate::contract::Deserialize;

use provider::{CallRequest, Provider, ProviderError, SendRequest};
use tx::{address_of, BlockInfo, Receipt, SignedTransaction};

/// Fixed gas price of the simulator: 20 gwei.
pub const GAS_PRICE: u64 = 20_000_000_000;

/// Base cost of any transaction.
const TX_GAS: u64 = 21_000;
/// Additional deployment cost per byte of transaction data.
const CREATE_GAS_PER_BYTE: u64 = 200;
/// Additional cost of a contract method invocation.
const METHOD_GAS: u64 = 10_000;

const GENESIS_TIMESTAMP: u64 = 1_438_269_973;
const BLOCK_INTERVAL: u64 = 15;

/// `amount` whole ether in wei.
pub fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18u64))
}

/// The node simulator.
///
/// Transactions are executed strictly one at a time and each successful or
/// reverted execution is mined into its own block, so a client never observes
/// partial state.
pub struct NodeSim {
    logger: Logger,
    unlocked: Vec<Address>,
    keys: HashMap<Address, Keypair>,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    contracts: HashMap<Address, Instance>,
    block_number: u64,
}

/// A deployed contract: its program state plus the name passed to the
/// constructor.
#[derive(Debug, Clone)]
struct Instance {
    name: Option<String>,
    state: Lottery,
}

impl NodeSim {
    /// An empty chain: no accounts, no contracts, block 0.
    pub fn new() -> Self {
        NodeSim::with_logger(Logger::root(slog::Discard, slog::o!()))
    }

    pub fn with_logger(logger: Logger) -> Self {
        NodeSim {
            logger,
            unlocked: Vec::new(),
            keys: HashMap::new(),
            balances: HashMap::new(),
            nonces: HashMap::new(),
            contracts: HashMap::new(),
            block_number: 0,
        }
    }

    /// A development chain with ten unlocked accounts holding 100 ether each.
    pub fn dev() -> Self {
        let mut node = NodeSim::new();
        for _ in 0..10 {
            node.create_account(ether(100));
        }
        node
    }

    /// Creates a fresh unlocked account with the given starting balance.
    pub fn create_account(&mut self, balance: U256) -> Address {
        let key_pair = Keypair::new(SECP256K1, &mut secp256k1::rand::thread_rng());
        let address = address_of(&key_pair.public_key());
        self.unlocked.push(address);
        self.keys.insert(address, key_pair);
        self.balances.insert(address, balance);
        address
    }

    /// Credits `address` out of thin air, genesis-style. Used to pre-fund
    /// wallet accounts the node holds no key for.
    pub fn fund(&mut self, address: Address, amount: U256) {
        self.credit(address, amount);
    }

    pub fn unlocked_accounts(&self) -> &[Address] {
        &self.unlocked
    }

    /// The name a contract was constructed with, if any.
    pub fn contract_name(&self, address: Address) -> Option<&str> {
        self.contracts
            .get(&address)?
            .name
            .as_ref()
            .map(|name| name.as_str())
    }

    fn nonce_of(&self, address: Address) -> u64 {
        self.nonces.get(&address).copied().unwrap_or(0)
    }

    fn balance_of(&self, address: Address) -> U256 {
        self.balances.get(&address).copied().unwrap_or(U256::ZERO)
    }

    fn credit(&mut self, address: Address, amount: U256) {
        let balance = self.balances.entry(address).or_insert(U256::ZERO);
        *balance = balance.saturating_add(amount);
    }

    fn debit(&mut self, address: Address, amount: U256) {
        let balance = self.balances.entry(address).or_insert(U256::ZERO);
        *balance = balance
            .checked_sub(amount)
            .expect("affordability was checked before execution");
    }

    fn timestamp_of(&self, block_number: u64) -> u64 {
        GENESIS_TIMESTAMP + block_number * BLOCK_INTERVAL
    }

    /// Mines the next block and returns its info. One transaction per block.
    fn mine(&mut self) -> BlockInfo {
        self.block_number += 1;
        BlockInfo {
            number: self.block_number,
            timestamp: self.timestamp_of(self.block_number),
        }
    }

    /// Charges gas and bumps the nonce of a transaction that reached
    /// execution, whether it succeeded or reverted.
    fn finish(&mut self, sender: Address, gas_price: U256, gas_used: u64) -> BlockInfo {
        self.debit(sender, gas_price * U256::from(gas_used));
        *self.nonces.entry(sender).or_insert(0) += 1;
        self.mine()
    }

    fn execute(&mut self, signed: &SignedTransaction) -> Result<Receipt, ExecError> {
        let sender = signed.sender();
        let tx = &signed.tx;

        let expected = self.nonce_of(sender);
        if tx.nonce != expected {
            return Err(ExecError::BadNonce {
                expected,
                got: tx.nonce,
            });
        }

        // Affordability at the gas limit; actual charge uses gas consumed.
        let max_cost = tx
            .value
            .saturating_add(tx.gas_price.saturating_mul(U256::from(tx.gas_limit)));
        let available = self.balance_of(sender);
        if available < max_cost {
            return Err(ExecError::InsufficientFunds {
                account: sender,
                required: max_cost,
                available,
            });
        }

        let gas_used = match tx.to {
            None => TX_GAS + tx.data.len() as u64 * CREATE_GAS_PER_BYTE,
            Some(_) if tx.data.is_empty() => TX_GAS,
            Some(_) => TX_GAS + METHOD_GAS,
        };
        if gas_used > tx.gas_limit {
            self.finish(sender, tx.gas_price, tx.gas_limit);
            return Err(ExecError::OutOfGas {
                limit: tx.gas_limit,
                required: gas_used,
            });
        }

        let outcome = match tx.to {
            None => self.exec_create(sender, tx.nonce, tx.value, &tx.data),
            Some(to) => self.exec_call(sender, to, tx.value, &tx.data),
        };
        match outcome {
            Ok(contract_address) => {
                let block = self.finish(sender, tx.gas_price, gas_used);
                slog::debug!(self.logger, "transaction mined";
                    "from" => %sender,
                    "block" => block.number,
                    "gas_used" => gas_used
                );
                Ok(Receipt {
                    block,
                    gas_used,
                    contract_address,
                })
            }
            Err(error) => {
                self.finish(sender, tx.gas_price, gas_used);
                slog::debug!(self.logger, "transaction rejected";
                    "from" => %sender,
                    "reason" => ?error
                );
                Err(error)
            }
        }
    }

    /// Runs a creation transaction. Returns the new contract's address.
    ///
    /// Anything mutated here must only be mutated after the last fallible
    /// step, so a rejected deployment leaves no trace.
    fn exec_create(
        &mut self,
        sender: Address,
        nonce: u64,
        value: U256,
        data: &[u8],
    ) -> Result<Option<Address>, ExecError> {
        let mut rest = data;
        let program = Program::deserialize(&mut rest).map_err(ExecError::InvalidProgram)?;
        let args = value::deserialize_values(&mut rest).map_err(ExecError::InvalidCallData)?;
        if !rest.is_empty() {
            return Err(ExecError::TrailingData(rest.len()));
        }
        let name = match &args[..] {
            [] => None,
            [Value::String(name)] => Some(name.clone()),
            _ => return Err(ExecError::BadConstructorArgs),
        };

        let address = contract_address(sender, nonce);
        let instance = match program {
            Program::Lottery { min_entry } => Instance {
                name,
                state: Lottery::new(sender, min_entry),
            },
        };
        slog::debug!(self.logger, "deploying contract";
            "address" => %address,
            "manager" => %sender,
            "name" => instance.name.clone().unwrap_or_default()
        );
        self.contracts.insert(address, instance);
        self.debit(sender, value);
        self.credit(address, value);
        Ok(Some(address))
    }

    /// Runs a transaction targeting an existing account.
    ///
    /// The state machine only mutates itself on success, which is what makes
    /// reverts atomic without any snapshotting here.
    fn exec_call(
        &mut self,
        sender: Address,
        to: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Option<Address>, ExecError> {
        if !self.contracts.contains_key(&to) {
            if !data.is_empty() {
                return Err(ExecError::NotAContract(to));
            }
            // Plain value transfer between accounts.
            self.debit(sender, value);
            self.credit(to, value);
            return Ok(None);
        }

        let call = decode_call(data)?;
        match call.method.as_str() {
            "enter" => {
                require_no_args(&call)?;
                let instance = self
                    .contracts
                    .get_mut(&to)
                    .expect("presence checked above");
                instance
                    .state
                    .enter(sender, value)
                    .map_err(|error| ExecError::Reverted(error.into()))?;
                self.debit(sender, value);
                self.credit(to, value);
            }
            "pickWinner" => {
                require_no_args(&call)?;
                require_no_value(&call, value)?;
                let seed = {
                    let instance = &self.contracts[&to];
                    let number = self.block_number + 1;
                    block_seed(number, self.timestamp_of(number), instance.state.players())
                };
                let winner = self
                    .contracts
                    .get_mut(&to)
                    .expect("presence checked above")
                    .state
                    .pick_winner(sender, seed)
                    .map_err(|error| ExecError::Reverted(error.into()))?;
                let pot = self.balance_of(to);
                self.debit(to, pot);
                self.credit(winner, pot);
                slog::debug!(self.logger, "winner picked";
                    "contract" => %to,
                    "winner" => %winner
                );
            }
            // Read-only methods invoked through a transaction execute and
            // discard their result.
            "getPlayers" | "bal" => {
                require_no_args(&call)?;
                require_no_value(&call, value)?;
            }
            _ => return Err(ExecError::UnknownMethod(call.method)),
        }
        Ok(None)
    }
}

impl Default for NodeSim {
    fn default() -> Self {
        NodeSim::new()
    }
}

impl Provider for NodeSim {
    fn accounts(&self) -> Vec<Address> {
        self.unlocked.clone()
    }

    fn balance(&self, address: Address) -> U256 {
        self.balance_of(address)
    }

    fn nonce(&self, address: Address) -> u64 {
        self.nonce_of(address)
    }

    fn block(&self) -> BlockInfo {
        BlockInfo {
            number: self.block_number,
            timestamp: self.timestamp_of(self.block_number),
        }
    }

    fn gas_price(&self) -> U256 {
        U256::from(GAS_PRICE)
    }

    fn send(&mut self, request: SendRequest) -> Result<Receipt, ProviderError> {
        let key_pair = self
            .keys
            .get(&request.from)
            .copied()
            .ok_or(ProviderError::UnknownAccount(request.from))?;
        let tx = tx::Transaction {
            nonce: self.nonce_of(request.from),
            to: request.to,
            value: request.value,
            gas_limit: request.gas,
            gas_price: self.gas_price(),
            data: request.data,
        };
        self.send_raw(SignedTransaction::sign(tx, &key_pair))
    }

    fn send_raw(&mut self, signed: SignedTransaction) -> Result<Receipt, ProviderError> {
        signed.verify().map_err(ProviderError::InvalidSignature)?;
        self.execute(&signed).map_err(ProviderError::Execution)
    }

    fn call(&self, request: CallRequest) -> Result<Value, ProviderError> {
        let instance = self
            .contracts
            .get(&request.to)
            .ok_or(ProviderError::Execution(ExecError::NotAContract(
                request.to,
            )))?;
        let call = decode_call(&request.data).map_err(ProviderError::Execution)?;
        match call.method.as_str() {
            "getPlayers" => {
                require_no_args(&call).map_err(ProviderError::Execution)?;
                Ok(Value::AddressList(instance.state.players().to_vec()))
            }
            "bal" => {
                require_no_args(&call).map_err(ProviderError::Execution)?;
                Ok(Value::Uint(self.balance_of(request.to)))
            }
            "enter" | "pickWinner" => Err(ProviderError::Execution(ExecError::NotReadOnly(
                call.method,
            ))),
            _ => Err(ProviderError::Execution(ExecError::UnknownMethod(
                call.method,
            ))),
        }
    }
}

/// Address of a contract created by `sender` at `nonce`.
fn contract_address(sender: Address, nonce: u64) -> Address {
    let mut preimage = Vec::with_capacity(28);
    preimage.extend_from_slice(sender.as_slice());
    preimage.extend_from_slice(&nonce.to_be_bytes());
    let digest = keccak256(&preimage);
    Address::from_slice(&digest[12..])
}

/// The pseudo-random seed of a winner selection: a digest of the block being
/// mined and the current players.
fn block_seed(block_number: u64, timestamp: u64, players: &[Address]) -> alloy_primitives::B256 {
    let mut preimage = Vec::with_capacity(16 + players.len() * 20);
    preimage.extend_from_slice(&block_number.to_be_bytes());
    preimage.extend_from_slice(&timestamp.to_be_bytes());
    for player in players {
        preimage.extend_from_slice(player.as_slice());
    }
    keccak256(&preimage)
}

fn decode_call(data: &[u8]) -> Result<CallData, ExecError> {
    let mut rest = data;
    let call = CallData::deserialize(&mut rest).map_err(ExecError::InvalidCallData)?;
    if !rest.is_empty() {
        return Err(ExecError::TrailingData(rest.len()));
    }
    Ok(call)
}

fn require_no_args(call: &CallData) -> Result<(), ExecError> {
    if call.args.is_empty() {
        Ok(())
    } else {
        Err(ExecError::BadMethodArgs(call.method.clone()))
    }
}

fn require_no_value(call: &CallData, value: U256) -> Result<(), ExecError> {
    if value.is_zero() {
        Ok(())
    } else {
        Err(ExecError::Reverted(RevertError::NotPayable(
            call.method.clone(),
        )))
    }
}

/// Why the chain rejected a transaction.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ExecError {
    BadNonce { expected: u64, got: u64 },
    InsufficientFunds {
        account: Address,
        required: U256,
        available: U256,
    },
    OutOfGas { limit: u64, required: u64 },
    InvalidProgram(bytecode::DeserializationError),
    InvalidCallData(ValueDeserError),
    /// Well-formed payload followed by garbage.
    TrailingData(usize),
    BadConstructorArgs,
    /// Call data sent to an account with no contract behind it.
    NotAContract(Address),
    UnknownMethod(String),
    BadMethodArgs(String),
    /// A state-mutating method was invoked through a read-only call.
    NotReadOnly(String),
    /// The contract itself refused the operation.
    Reverted(RevertError),
}

/// Contract-level rejection, the analog of a revert.
#[derive(Debug, Clone, PartialEq)]
pub enum RevertError {
    BelowMinimum { value: U256, min_entry: U256 },
    NotManager(Address),
    NoPlayers,
    NotPayable(String),
}

impl From<EnterError> for RevertError {
    fn from(error: EnterError) -> Self {
        match error {
            EnterError::BelowMinimum { value, min_entry } => {
                RevertError::BelowMinimum { value, min_entry }
            }
        }
    }
}

impl From<PickWinnerError> for RevertError {
    fn from(error: PickWinnerError) -> Self {
        match error {
            PickWinnerError::NotManager(caller) => RevertError::NotManager(caller),
            PickWinnerError::NoPlayers => RevertError::NoPlayers,
        }
    }
}
