//! Turn validator (C8): rejects an actor unless every guard in §4.8 holds.
//! Stateless given the facts the hand state machine already tracks.

use std::time::{Duration, Instant};

use crate::error::TurnError;
use crate::player::Player;

/// Minimum interval between two accepted actions from the same player id
/// (§5's rapid-fire guard).
pub const RAPID_FIRE_GUARD: Duration = Duration::from_millis(100);

/// Everything the turn validator needs to know about the round in
/// progress, independent of how the caller stores it.
pub struct TurnContext<'a> {
    pub current_position: usize,
    pub last_action_player_id: Option<&'a str>,
    pub last_action_time: Option<Instant>,
    pub now: Instant,
}

/// Validates that `player` (seated at `player.seat`) may act right now.
pub fn validate_turn(player: &Player, ctx: &TurnContext) -> Result<(), TurnError> {
    if player.seat != ctx.current_position {
        return Err(TurnError::NotYourTurn {
            player: player.id.clone(),
            expected_seat: ctx.current_position,
        });
    }
    if player.has_acted_this_round {
        return Err(TurnError::AlreadyActed(player.id.clone()));
    }
    if ctx.last_action_player_id == Some(player.id.as_str()) {
        if let Some(last) = ctx.last_action_time {
            let elapsed = ctx.now.saturating_duration_since(last);
            if elapsed < RAPID_FIRE_GUARD {
                return Err(TurnError::TooFast {
                    player: player.id.clone(),
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }
        }
    }
    if player.is_folded() {
        return Err(TurnError::PlayerFolded(player.id.clone()));
    }
    if player.is_all_in() {
        return Err(TurnError::PlayerAllIn(player.id.clone()));
    }
    if player.is_sitting_out() {
        return Err(TurnError::PlayerSittingOut(player.id.clone()));
    }
    Ok(())
}
