//! Build artifacts of the lottery contract.
//!
//! A real contract toolchain emits these from source; here they are generated
//! at run time so the deployer and the tests always agree with the program
//! the chain actually understands. The pair consists of a JSON interface
//! describing the callable surface and a hex-encoded program blob.

use alloy_primitives::U256;

use crate::contract::bytecode::Program;
use crate::contract::Serialize;

/// The smallest accepted entry payment: 0.02 ether in wei.
pub const MIN_ENTRY_WEI: u64 = 20_000_000_000_000_000;

/// The JSON interface of the lottery contract.
pub fn lottery_interface() -> &'static str {
    r#"[
  {
    "type": "constructor",
    "name": "",
    "inputs": [{ "name": "name", "type": "string" }],
    "outputs": [],
    "constant": false,
    "payable": false
  },
  {
    "type": "function",
    "name": "enter",
    "inputs": [],
    "outputs": [],
    "constant": false,
    "payable": true
  },
  {
    "type": "function",
    "name": "getPlayers",
    "inputs": [],
    "outputs": [{ "name": "", "type": "address[]" }],
    "constant": true,
    "payable": false
  },
  {
    "type": "function",
    "name": "pickWinner",
    "inputs": [],
    "outputs": [],
    "constant": false,
    "payable": false
  },
  {
    "type": "function",
    "name": "bal",
    "inputs": [],
    "outputs": [{ "name": "", "type": "uint256" }],
    "constant": true,
    "payable": false
  }
]"#
}

/// The hex-encoded lottery program with the standard minimum entry.
pub fn lottery_bytecode() -> String {
    let mut bytes = Vec::new();
    Program::Lottery {
        min_entry: U256::from(MIN_ENTRY_WEI),
    }
    .serialize(&mut bytes);
    alloy_primitives::hex::encode(bytes)
}
