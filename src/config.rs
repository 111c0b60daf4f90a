//! Table configuration: boundary validation for the values a table is
//! created or updated with (§3, §4.10).

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Cash tables let players top up between hands; tournament tables do not
/// (§4.10's `CannotTopUpInTournament`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameType {
    Cash,
    Tournament,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub game_type: GameType,
    pub small_blind: u64,
    pub big_blind: u64,
    pub max_players: usize,
    pub min_buy_in: u64,
    pub max_buy_in: u64,
    pub starting_chips: u64,
    pub action_timeout_secs: u64,
}

impl TableConfig {
    /// Validates internal consistency; called at table creation and on any
    /// `UpdateBlinds`-style mutation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.small_blind == 0 || self.small_blind >= self.big_blind {
            return Err(ValidationError::InvalidBlinds {
                small_blind: self.small_blind,
                big_blind: self.big_blind,
            });
        }
        if self.max_players == 0 || self.max_players > 10 {
            return Err(ValidationError::InvalidConfig {
                reason: format!("max_players must be between 1 and 10, got {}", self.max_players),
            });
        }
        if self.min_buy_in == 0 || self.min_buy_in > self.max_buy_in {
            return Err(ValidationError::InvalidConfig {
                reason: format!(
                    "min_buy_in ({}) must be nonzero and no greater than max_buy_in ({})",
                    self.min_buy_in, self.max_buy_in
                ),
            });
        }
        if self.min_buy_in < self.big_blind * 2 {
            return Err(ValidationError::InvalidConfig {
                reason: format!(
                    "min_buy_in ({}) must cover at least two big blinds ({})",
                    self.min_buy_in,
                    self.big_blind * 2
                ),
            });
        }
        Ok(())
    }

    /// Validates a buy-in (or top-up) amount against the configured range.
    pub fn validate_buy_in(&self, amount: u64) -> Result<(), ValidationError> {
        if amount < self.min_buy_in || amount > self.max_buy_in {
            return Err(ValidationError::BuyInOutOfRange {
                amount,
                min: self.min_buy_in,
                max: self.max_buy_in,
            });
        }
        Ok(())
    }
}
