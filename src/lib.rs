//! The lottery smart contract and its simulated chain.
//!
//! This crate contains the lottery contract as a plain state machine, the build
//! artifacts describing it, a typed client for deploying and invoking it, and a
//! node simulator that executes signed transactions against it in-process.
//!
//! [`contract::client::ContractFactory::deploy`] is the entry point for
//! deployments. The contract refuses invalid operations up front so a reverted
//! transaction never leaves partial state behind.

mod test_macros;
pub mod artifacts;
pub mod chain;
pub mod contract;
