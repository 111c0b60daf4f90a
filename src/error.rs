use thiserror::Error;

use crate::card::Suit;

/// Everything that can go wrong talking to the engine.
///
/// Variants are grouped the way the design doc groups them (§7): each group
/// is its own nested enum so callers can match on the outer kind without
/// string comparison, then drill into specifics if they care to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Turn(#[from] TurnError),
    #[error(transparent)]
    Betting(#[from] BettingError),
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error("not enough players to start a hand: {eligible} eligible, need at least 2")]
    NotEnoughPlayers { eligible: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("seat {seat} is out of range for a table with {max_players} seats")]
    SeatOutOfRange { seat: usize, max_players: usize },
    #[error("seat {seat} is already occupied")]
    SeatOccupied { seat: usize },
    #[error("invalid amount: {amount}")]
    InvalidAmount { amount: i64 },
    #[error("invalid blinds: small blind {small_blind} must be less than big blind {big_blind}")]
    InvalidBlinds { small_blind: u64, big_blind: u64 },
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },
    #[error("buy-in {amount} is outside the allowed range [{min}, {max}]")]
    BuyInOutOfRange { amount: u64, min: u64, max: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("no table with id {0}")]
    Table(String),
    #[error("no player with id {0}")]
    Player(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("game is not in progress")]
    NotInProgress,
    #[error("hand has not been started")]
    HandNotStarted,
    #[error("table is already playing a hand")]
    AlreadyPlaying,
    #[error("table is already paused")]
    AlreadyPaused,
    #[error("cannot top up chips in a tournament table")]
    CannotTopUpInTournament,
    #[error("cannot cancel a hand that has already started")]
    CannotCancelStarted,
    #[error("table is paused, actions are rejected")]
    ActionDuringPause,
    #[error("table has been abandoned")]
    TableAbandoned,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    #[error("it is not player {player}'s turn, seat {expected_seat} is to act")]
    NotYourTurn { player: String, expected_seat: usize },
    #[error("player {0} has already acted this round")]
    AlreadyActed(String),
    #[error("player {player} acted too quickly after their previous action ({elapsed_ms}ms < 100ms)")]
    TooFast { player: String, elapsed_ms: u64 },
    #[error("player {0} has folded")]
    PlayerFolded(String),
    #[error("player {0} is all-in")]
    PlayerAllIn(String),
    #[error("player {0} is sitting out")]
    PlayerSittingOut(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BettingError {
    #[error("cannot check, {to_call} chips are owed to match the current bet")]
    IllegalCheck { to_call: u64 },
    #[error("raise to {amount} is below the minimum total bet of {min_total_bet}")]
    RaiseBelowMinimum { amount: u64, min_total_bet: u64 },
    #[error("amount {0} cannot be negative")]
    NegativeAmount(i64),
    #[error("player {0} has no chips left to go all-in with")]
    NoChipsToAllIn(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckError {
    #[error("deck exhausted: requested {requested} card(s), only {remaining} left")]
    Exhausted { requested: usize, remaining: usize },
}

/// A defensive assertion for hand-evaluator inputs: never produced by engine
/// callers acting through the public API, only by a programming bug.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    #[error("hand evaluation requires 5 to 7 cards, got {0}")]
    WrongCardCount(usize),
    #[error("duplicate card {rank:?} of {suit:?} in evaluator input")]
    DuplicateCard { rank: crate::card::Rank, suit: Suit },
}
