//! Betting validator (C4): stateless legality checks given the round's
//! `(current_bet, min_raise)`. Never mutates anything; [`crate::action`]
//! applies what this module approves.

use crate::error::BettingError;
use crate::player::Player;

/// The total bet a raise must reach to count as a *full* raise and reopen
/// the round (§4.4, §4.5).
pub fn min_total_bet(current_bet: u64, min_raise: u64) -> u64 {
    current_bet + min_raise
}

pub fn is_full_raise(new_total_bet: u64, current_bet: u64, min_raise: u64) -> bool {
    new_total_bet >= min_total_bet(current_bet, min_raise)
}

pub fn validate_check(player: &Player, current_bet: u64) -> Result<(), BettingError> {
    if player.round_bet < current_bet {
        return Err(BettingError::IllegalCheck {
            to_call: current_bet - player.round_bet,
        });
    }
    Ok(())
}

/// `amount` is the new *total* round bet, not an increment.
pub fn validate_raise(
    player: &Player,
    amount: u64,
    current_bet: u64,
    min_raise: u64,
) -> Result<(), BettingError> {
    let floor = min_total_bet(current_bet, min_raise);
    if amount < floor {
        return Err(BettingError::RaiseBelowMinimum {
            amount,
            min_total_bet: floor,
        });
    }
    let max_possible = player.round_bet + player.chips;
    if amount > max_possible {
        return Err(BettingError::RaiseBelowMinimum {
            amount,
            min_total_bet: floor,
        });
    }
    Ok(())
}

pub fn validate_all_in(player: &Player) -> Result<(), BettingError> {
    if player.chips == 0 {
        return Err(BettingError::NoChipsToAllIn(player.id.clone()));
    }
    Ok(())
}

pub fn validate_call(player: &Player, current_bet: u64) -> Result<(), BettingError> {
    // Calling with nothing to call is legal (it's a no-op Check in
    // practice); the action processor's Call branch already degenerates to
    // a zero-chip transfer, so this is permissive by design.
    let _ = (player, current_bet);
    Ok(())
}
