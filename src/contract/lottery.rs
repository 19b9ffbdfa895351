//! The Lottery state machine.
//!
//! This is the pure logic of the contract with no chain attached: who entered,
//! who manages the instance and who wins. Moving funds is the job of the chain
//! executing it - the state machine only decides whether an operation is
//! allowed and who the winner is.
//!
//! Every operation either succeeds or returns an error without touching the
//! state. The chain relies on this to keep reverted transactions atomic.

use alloy_primitives::{Address, B256, U256};
use std::convert::TryFrom;

/// State of one deployed Lottery instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Lottery {
    manager: Address,
    min_entry: U256,
    players: Vec<Address>,
}

impl Lottery {
    /// Constructs a fresh instance with no players.
    ///
    /// `manager` is the address deploying the contract. It is set once here
    /// and never changes afterwards.
    pub fn new(manager: Address, min_entry: U256) -> Self {
        Lottery {
            manager,
            min_entry,
            players: Vec::new(),
        }
    }

    pub fn manager(&self) -> Address {
        self.manager
    }

    pub fn min_entry(&self) -> U256 {
        self.min_entry
    }

    /// Current players in insertion order. Duplicates are allowed - an address
    /// entering twice holds two tickets.
    pub fn players(&self) -> &[Address] {
        &self.players
    }

    /// Registers `player` with a payment of `value` wei.
    ///
    /// The payment must be at least [`min_entry`](Self::min_entry), otherwise
    /// the call fails and the player list stays untouched.
    pub fn enter(&mut self, player: Address, value: U256) -> Result<(), EnterError> {
        if value < self.min_entry {
            return Err(EnterError::BelowMinimum {
                value,
                min_entry: self.min_entry,
            });
        }
        self.players.push(player);
        Ok(())
    }

    /// Picks a winner from the current players and clears the player list.
    ///
    /// Only the manager may call this and there must be at least one player.
    /// `seed` is the block-data digest supplied by the chain; the winner index
    /// is the seed reduced modulo the player count.
    ///
    /// Returns the winning address. Paying the pot out to it is up to the
    /// caller.
    pub fn pick_winner(&mut self, caller: Address, seed: B256) -> Result<Address, PickWinnerError> {
        if caller != self.manager {
            return Err(PickWinnerError::NotManager(caller));
        }
        if self.players.is_empty() {
            return Err(PickWinnerError::NoPlayers);
        }
        let index = U256::from_be_bytes(seed.0) % U256::from(self.players.len());
        let index = usize::try_from(index).expect("index is below players.len()");
        let winner = self.players[index];
        self.players.clear();
        Ok(winner)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnterError {
    /// The payment was below the configured minimum.
    BelowMinimum { value: U256, min_entry: U256 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickWinnerError {
    /// Somebody other than the manager tried to pick the winner.
    NotManager(Address),
    /// There is nobody to win the pot.
    NoPlayers,
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{keccak256, Address, U256};

    use super::{EnterError, Lottery, PickWinnerError};

    const MANAGER: Address = Address::new(hex_lit::hex!("1111111111111111111111111111111111111111"));
    const PLAYER_1: Address = Address::new(hex_lit::hex!("2222222222222222222222222222222222222222"));
    const PLAYER_2: Address = Address::new(hex_lit::hex!("3333333333333333333333333333333333333333"));

    fn min_entry() -> U256 {
        // 0.02 ether
        U256::from(20_000_000_000_000_000u64)
    }

    fn lottery() -> Lottery {
        Lottery::new(MANAGER, min_entry())
    }

    #[test]
    fn initial_conditions() {
        let lottery = lottery();
        assert_eq!(lottery.manager(), MANAGER);
        assert_eq!(lottery.min_entry(), min_entry());
        assert!(lottery.players().is_empty());
    }

    #[test]
    fn enter_appends_in_order() {
        let mut lottery = lottery();
        lottery.enter(PLAYER_1, min_entry()).unwrap();
        lottery.enter(PLAYER_2, min_entry()).unwrap();
        assert_eq!(lottery.players(), &[PLAYER_1, PLAYER_2]);
    }

    #[test]
    fn enter_allows_duplicates() {
        let mut lottery = lottery();
        lottery.enter(PLAYER_1, min_entry()).unwrap();
        lottery.enter(PLAYER_1, min_entry()).unwrap();
        assert_eq!(lottery.players(), &[PLAYER_1, PLAYER_1]);
    }

    #[test]
    fn enter_below_minimum_fails_without_state_change() {
        let mut lottery = lottery();
        let low = min_entry() - U256::from(1);
        let err = lottery.enter(PLAYER_1, low).unwrap_err();
        assert_eq!(
            err,
            EnterError::BelowMinimum {
                value: low,
                min_entry: min_entry()
            }
        );
        assert!(lottery.players().is_empty());
    }

    #[test]
    fn pick_winner_requires_manager() {
        let mut lottery = lottery();
        lottery.enter(PLAYER_1, min_entry()).unwrap();
        let err = lottery.pick_winner(PLAYER_1, keccak256(b"seed")).unwrap_err();
        assert_eq!(err, PickWinnerError::NotManager(PLAYER_1));
        // the failed call must not have touched the players
        assert_eq!(lottery.players(), &[PLAYER_1]);
    }

    #[test]
    fn pick_winner_requires_players() {
        let mut lottery = lottery();
        let err = lottery.pick_winner(MANAGER, keccak256(b"seed")).unwrap_err();
        assert_eq!(err, PickWinnerError::NoPlayers);
    }

    #[test]
    fn pick_winner_clears_players() {
        let mut lottery = lottery();
        lottery.enter(PLAYER_1, min_entry()).unwrap();
        lottery.enter(PLAYER_2, min_entry()).unwrap();
        let winner = lottery.pick_winner(MANAGER, keccak256(b"seed")).unwrap();
        assert!(winner == PLAYER_1 || winner == PLAYER_2);
        assert!(lottery.players().is_empty());
    }

    #[test]
    fn sole_player_always_wins() {
        for nonce in 0u8..16 {
            let mut lottery = lottery();
            lottery.enter(PLAYER_2, min_entry()).unwrap();
            let winner = lottery.pick_winner(MANAGER, keccak256(&[nonce])).unwrap();
            assert_eq!(winner, PLAYER_2);
        }
    }

    #[test]
    fn same_seed_same_winner() {
        let mut first = lottery();
        let mut second = lottery();
        for lottery in [&mut first, &mut second].iter_mut() {
            lottery.enter(PLAYER_1, min_entry()).unwrap();
            lottery.enter(PLAYER_2, min_entry()).unwrap();
            lottery.enter(MANAGER, min_entry()).unwrap();
        }
        let seed = keccak256(b"block data");
        assert_eq!(
            first.pick_winner(MANAGER, seed).unwrap(),
            second.pick_winner(MANAGER, seed).unwrap()
        );
    }

    quickcheck::quickcheck! {
        fn winner_is_always_a_player(seed_bytes: Vec<u8>, extra_players: u8) -> bool {
            let mut lottery = Lottery::new(MANAGER, min_entry());
            lottery.enter(PLAYER_1, min_entry()).unwrap();
            for index in 0..(extra_players % 8) {
                let mut addr = [0x40u8; 20];
                addr[19] = index;
                lottery.enter(Address::new(addr), min_entry()).unwrap();
            }
            let players = lottery.players().to_vec();
            let winner = lottery.pick_winner(MANAGER, keccak256(&seed_bytes)).unwrap();
            players.contains(&winner) && lottery.players().is_empty()
        }
    }
}
