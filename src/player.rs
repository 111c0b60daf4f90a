use serde::{Deserialize, Serialize};

use crate::card::Card;

/// A player's standing within the current hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    Active,
    Folded,
    AllIn,
    SittingOut,
}

/// The five things a player may do on their turn. `Raise`'s amount is
/// always the new *total* bet, never the increment (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Fold,
    Check,
    Call,
    Raise(u64),
    AllIn,
}

/// A seated player and everything the engine tracks about them for the
/// hand in progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub seat: usize,
    pub chips: u64,
    pub status: PlayerStatus,
    /// Chips put in during the *current* betting round only; reset to 0
    /// when a round advances.
    pub round_bet: u64,
    /// Chips put in across the whole hand; feeds the pot calculator.
    pub total_invested: u64,
    pub hole_cards: Option<(Card, Card)>,
    pub has_acted_this_round: bool,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    pub last_action: Option<Action>,
    /// Set by `RemovePlayer` when it fires mid-hand (§4.10): the seat stays
    /// occupied (and folded, for pot-eligibility purposes) until the next
    /// `start_hand` reset step vacates it.
    pub marked_for_removal: bool,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, seat: usize, chips: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            seat,
            chips,
            status: PlayerStatus::Active,
            round_bet: 0,
            total_invested: 0,
            hole_cards: None,
            has_acted_this_round: false,
            is_dealer: false,
            is_small_blind: false,
            is_big_blind: false,
            last_action: None,
            marked_for_removal: false,
        }
    }

    pub fn is_sitting_out(&self) -> bool {
        matches!(self.status, PlayerStatus::SittingOut)
    }

    pub fn is_folded(&self) -> bool {
        matches!(self.status, PlayerStatus::Folded)
    }

    pub fn is_all_in(&self) -> bool {
        matches!(self.status, PlayerStatus::AllIn)
    }

    /// Can this player take an action in the current round? False for
    /// folded, all-in, and sitting-out players.
    pub fn can_act(&self) -> bool {
        matches!(self.status, PlayerStatus::Active)
    }

    /// Resets per-hand state in preparation for `start_hand`. Players with
    /// no chips left are not reactivated (they are removed before this
    /// point in the start-hand sequence, but this guards double-calls).
    pub fn reset_for_new_hand(&mut self) {
        self.round_bet = 0;
        self.total_invested = 0;
        self.hole_cards = None;
        self.has_acted_this_round = false;
        self.is_dealer = false;
        self.is_small_blind = false;
        self.is_big_blind = false;
        self.last_action = None;
        if self.chips > 0 && !self.is_sitting_out() {
            self.status = PlayerStatus::Active;
        }
    }

    /// Resets only the per-round betting fields; used when a betting round
    /// advances (all-in players keep `has_acted_this_round = true`, §4.9).
    pub fn reset_for_new_round(&mut self) {
        self.round_bet = 0;
        if !self.is_all_in() {
            self.has_acted_this_round = false;
        }
    }
}

/// A table's fixed-size seat array. `None` marks an empty seat.
pub type Seats = Vec<Option<Player>>;
