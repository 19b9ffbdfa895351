use std::io::Write;

use lottery_core::artifacts;
use lottery_core::chain::provider::{Provider, WalletProvider};
use lottery_core::chain::wallet::Wallet;
use lottery_core::chain::{ether, NodeSim};
use lottery_core::contract::client::{ContractFactory, DeployOpts};
use lottery_core::contract::value::Value;

/// The number of accounts derived from the wallet seed.
const ACCOUNT_COUNT: usize = 10;

/// Gas limit of the deployment transaction.
const DEPLOY_GAS: u64 = 1_000_000;

/// The name baked into every deployed instance.
const CONTRACT_NAME: &str = "bockchaining man!";

fn artifacts_write(mut args: std::env::ArgsOs) {
    let interface_path = args.next().expect("missing interface path");
    let bytecode_path = args.next().expect("missing bytecode path");

    write_non_existing(&interface_path, artifacts::lottery_interface().as_bytes());
    write_non_existing(&bytecode_path, artifacts::lottery_bytecode().as_bytes());
}

fn deploy(mut args: std::env::ArgsOs) {
    let interface_path = args.next().expect("missing interface path");
    let bytecode_path = args.next().expect("missing bytecode path");
    let mnemonic = match args.next() {
        Some(seed) => {
            seed.into_string().expect("seed is not UTF-8").parse().expect("invalid seed")
        },
        None => {
            let entropy = secp256k1::rand::random::<[u8; 16]>();
            bip39::Mnemonic::from_entropy(&entropy).expect("correct entropy length")
        },
    };

    let interface_json = std::fs::read_to_string(&interface_path)
        .unwrap_or_else(|error| panic!("failed to read {:?}: {:?}", interface_path, error));
    let bytecode_hex = std::fs::read_to_string(&bytecode_path)
        .unwrap_or_else(|error| panic!("failed to read {:?}: {:?}", bytecode_path, error));
    let factory = ContractFactory::from_artifacts(&interface_json, bytecode_hex.trim())
        .unwrap_or_else(|error| panic!("invalid artifacts: {:?}", error));

    let seed = mnemonic.to_seed("");
    let wallet = Wallet::from_seed(&seed, ACCOUNT_COUNT);

    let mut node = NodeSim::new();
    for address in wallet.addresses() {
        node.fund(*address, ether(100));
    }
    let mut provider = WalletProvider::new(node, wallet);

    let deployer = provider.accounts()[0];
    println!("seed: {}", mnemonic);
    println!("Attempting to deploy from account {}", deployer);

    let contract = factory
        .deploy(
            &mut provider,
            DeployOpts::new(
                deployer,
                DEPLOY_GAS,
                vec![Value::String(CONTRACT_NAME.to_owned())],
            ),
        )
        .unwrap_or_else(|error| panic!("deployment failed: {:?}", error));

    println!("contract deployed to {}", contract.address());
}

fn write_non_existing(path: &std::ffi::OsStr, data: &[u8]) {
    let mut file = std::fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(path)
        .unwrap_or_else(|error| panic!("failed to open {:?}: {:?}", path, error));
    file.write_all(data).expect("failed to write");
}

fn main() {
    let mut args = std::env::args_os();
    let _program_name = args.next().expect("missing program name");
    let command = args.next()
        .expect("missing subcommand (artifacts, deploy)")
        .into_string()
        .expect("unrecognized command");

    match &*command {
        "artifacts" => artifacts_write(args),
        "deploy" => deploy(args),
        _ => panic!("unknown command \"{}\"", command),
    }
}
