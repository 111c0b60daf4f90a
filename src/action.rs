//! Action processor (C5): applies an already-validated action to a player,
//! and for raises/all-ins, reports how the round's betting state should
//! change. The caller (the hand state machine) owns applying that part —
//! this module never sees other seats.

use crate::betting;
use crate::error::{BettingError, EngineError};
use crate::player::{Action, Player, PlayerStatus};

/// What processing an action implies for the shared round state. `None`
/// for `current_bet`/`min_raise` means "unchanged".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundUpdate {
    pub new_current_bet: Option<u64>,
    pub new_min_raise: Option<u64>,
    /// True when every other can-act player's `has_acted_this_round` must
    /// be cleared (a full raise, §4.5).
    pub reopens_action: bool,
}

/// Applies `action` to `player` given the round's current betting state.
/// Assumes the caller has already run this past [`crate::betting`] and
/// [`crate::turn`] — this function only re-derives the cheap invariants
/// (e.g. a Call degenerating because nothing is owed) rather than
/// re-validating from scratch.
pub fn apply_action(
    player: &mut Player,
    action: Action,
    current_bet: u64,
    min_raise: u64,
) -> Result<RoundUpdate, EngineError> {
    match action {
        Action::Fold => {
            player.status = PlayerStatus::Folded;
            player.last_action = Some(action);
            Ok(RoundUpdate::default())
        }
        Action::Check => {
            betting::validate_check(player, current_bet).map_err(BettingError::from)?;
            player.last_action = Some(action);
            Ok(RoundUpdate::default())
        }
        Action::Call => {
            let to_call = current_bet.saturating_sub(player.round_bet);
            let pay = to_call.min(player.chips);
            player.chips -= pay;
            player.round_bet += pay;
            player.total_invested += pay;
            if player.chips == 0 {
                player.status = PlayerStatus::AllIn;
            }
            player.last_action = Some(action);
            Ok(RoundUpdate::default())
        }
        Action::Raise(amount) => {
            betting::validate_raise(player, amount, current_bet, min_raise)
                .map_err(BettingError::from)?;
            let pay = amount - player.round_bet;
            player.chips -= pay;
            player.round_bet += pay;
            player.total_invested += pay;
            if player.chips == 0 {
                player.status = PlayerStatus::AllIn;
            }
            player.last_action = Some(action);
            let new_min_raise = amount - current_bet;
            Ok(RoundUpdate {
                new_current_bet: Some(amount),
                new_min_raise: Some(new_min_raise),
                reopens_action: true,
            })
        }
        Action::AllIn => {
            betting::validate_all_in(player).map_err(BettingError::from)?;
            let pay = player.chips;
            player.chips = 0;
            player.round_bet += pay;
            player.total_invested += pay;
            player.status = PlayerStatus::AllIn;
            player.last_action = Some(action);

            let new_bet = player.round_bet;
            if betting::is_full_raise(new_bet, current_bet, min_raise) {
                let new_min_raise = new_bet - current_bet;
                Ok(RoundUpdate {
                    new_current_bet: Some(new_bet),
                    new_min_raise: Some(new_min_raise),
                    reopens_action: true,
                })
            } else if new_bet > current_bet {
                // Partial raise: bumps the high-water mark everyone must
                // match, but does not grow min_raise or reopen action for
                // players who already acted at the current level (§4.5).
                Ok(RoundUpdate {
                    new_current_bet: Some(new_bet),
                    new_min_raise: None,
                    reopens_action: false,
                })
            } else {
                Ok(RoundUpdate::default())
            }
        }
    }
}
