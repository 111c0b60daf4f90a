//! The state of a single hand in progress (§4.2).

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::card::{Card, Deck};
use crate::pot::PotPartition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BettingRound {
    Preflop,
    Flop,
    Turn,
    River,
}

impl BettingRound {
    /// The round that follows this one, or `None` after the river (the
    /// hand moves to showdown instead).
    pub fn next(self) -> Option<Self> {
        match self {
            BettingRound::Preflop => Some(BettingRound::Flop),
            BettingRound::Flop => Some(BettingRound::Turn),
            BettingRound::Turn => Some(BettingRound::River),
            BettingRound::River => None,
        }
    }

    /// How many community cards are visible once this round is reached.
    pub fn community_card_count(self) -> usize {
        match self {
            BettingRound::Preflop => 0,
            BettingRound::Flop => 3,
            BettingRound::Turn => 4,
            BettingRound::River => 5,
        }
    }
}

/// Everything that exists only for the duration of one hand, reset by the
/// next `start_hand` call.
#[derive(Debug, Clone)]
pub struct CurrentHand {
    pub hand_number: u64,
    pub dealer_seat: usize,
    pub small_blind_seat: usize,
    pub big_blind_seat: usize,
    pub round: BettingRound,
    pub community_cards: Vec<Card>,
    pub pot: PotPartition,
    pub current_bet: u64,
    pub min_raise: u64,
    pub current_position: usize,
    pub action_deadline: Option<Instant>,
    /// Monotonic counter bumped every time a new deadline is armed; lets a
    /// stale timer thread recognize it has been superseded (§5).
    pub timer_generation: u64,
    pub last_action_player_id: Option<String>,
    pub last_action_time: Option<Instant>,
    /// Strictly monotonic within the hand (§5, §8).
    pub action_sequence: u64,
    pub deck: Deck,
    /// True the first time `process_action` is invoked through the public
    /// API path for this hand, as opposed to the timeout callback (§4.9).
    pub had_voluntary_action: bool,
}

impl CurrentHand {
    pub fn new(hand_number: u64, dealer_seat: usize, small_blind_seat: usize, big_blind_seat: usize, deck: Deck) -> Self {
        Self {
            hand_number,
            dealer_seat,
            small_blind_seat,
            big_blind_seat,
            round: BettingRound::Preflop,
            community_cards: Vec::new(),
            pot: PotPartition::default(),
            current_bet: 0,
            min_raise: 0,
            current_position: 0,
            action_deadline: None,
            timer_generation: 0,
            last_action_player_id: None,
            last_action_time: None,
            action_sequence: 0,
            deck,
            had_voluntary_action: false,
        }
    }

    pub fn arm_deadline(&mut self, deadline: Instant) -> u64 {
        self.action_deadline = Some(deadline);
        self.timer_generation += 1;
        self.timer_generation
    }
}
