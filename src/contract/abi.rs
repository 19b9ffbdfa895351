//! The `interface` build artifact.
//!
//! The interface is the JSON description of a compiled contract's surface, the
//! way a compiler toolchain emits it: an array of entries describing the
//! constructor and the callable functions with their typed parameters. The
//! client uses it to validate a method invocation before it ever reaches the
//! chain.

use serde::{Deserialize, Serialize};

use super::value::Value;

/// A parsed interface artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Interface {
    entries: Vec<Entry>,
}

impl Interface {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("interface serialization doesn't fail")
    }

    /// Looks up a function entry by name.
    pub fn function(&self, name: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|entry| entry.kind == EntryKind::Function && entry.name == name)
    }

    /// The constructor entry, if the contract declares one.
    pub fn constructor(&self) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|entry| entry.kind == EntryKind::Constructor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<Param>,
    #[serde(default)]
    pub outputs: Vec<Param>,
    /// Read-only methods are invoked through `call`, everything else through
    /// a transaction.
    #[serde(default)]
    pub constant: bool,
    #[serde(default)]
    pub payable: bool,
}

impl Entry {
    /// Checks `args` against the declared inputs.
    pub fn check_args(&self, args: &[Value]) -> Result<(), ArgsError> {
        if args.len() != self.inputs.len() {
            return Err(ArgsError::WrongCount {
                expected: self.inputs.len(),
                got: args.len(),
            });
        }
        for (index, (param, value)) in self.inputs.iter().zip(args).enumerate() {
            if !param.kind.matches(value) {
                return Err(ArgsError::TypeMismatch {
                    index,
                    expected: param.kind,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Function,
    Constructor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamType,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ParamType {
    #[serde(rename = "address")]
    Address,
    #[serde(rename = "uint256")]
    Uint256,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "address[]")]
    AddressList,
}

impl ParamType {
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (ParamType::Address, Value::Address(_)) => true,
            (ParamType::Uint256, Value::Uint(_)) => true,
            (ParamType::String, Value::String(_)) => true,
            (ParamType::AddressList, Value::AddressList(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgsError {
    WrongCount { expected: usize, got: usize },
    TypeMismatch { index: usize, expected: ParamType },
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use super::super::value::Value;
    use super::{ArgsError, Interface, ParamType};

    #[test]
    fn parses_the_lottery_interface() {
        let interface = Interface::parse(crate::artifacts::lottery_interface()).unwrap();

        let enter = interface.function("enter").unwrap();
        assert!(enter.payable);
        assert!(!enter.constant);
        assert!(enter.inputs.is_empty());

        let get_players = interface.function("getPlayers").unwrap();
        assert!(get_players.constant);
        assert_eq!(get_players.outputs[0].kind, ParamType::AddressList);

        let bal = interface.function("bal").unwrap();
        assert!(bal.constant);
        assert_eq!(bal.outputs[0].kind, ParamType::Uint256);

        assert!(!interface.function("pickWinner").unwrap().constant);
        assert_eq!(interface.constructor().unwrap().inputs.len(), 1);
        assert!(interface.function("refund").is_none());
    }

    #[test]
    fn json_survives_a_roundtrip() {
        let interface = Interface::parse(crate::artifacts::lottery_interface()).unwrap();
        let reparsed = Interface::parse(&interface.to_json()).unwrap();
        assert_eq!(interface, reparsed);
    }

    #[test]
    fn check_args_enforces_arity_and_types() {
        let interface = Interface::parse(crate::artifacts::lottery_interface()).unwrap();
        let constructor = interface.constructor().unwrap();

        constructor
            .check_args(&[Value::String("hello".to_owned())])
            .unwrap();
        assert_eq!(
            constructor.check_args(&[]),
            Err(ArgsError::WrongCount {
                expected: 1,
                got: 0
            })
        );
        assert_eq!(
            constructor.check_args(&[Value::Uint(U256::from(1))]),
            Err(ArgsError::TypeMismatch {
                index: 0,
                expected: ParamType::String
            })
        );
    }
}
