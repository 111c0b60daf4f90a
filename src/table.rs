//! Table (C10): seating, buy-in/top-up rules, and the concurrency wrapper
//! around [`Game`] — the per-table mutex plus the detached timer thread
//! that re-enters the engine when a player's action clock expires (§5).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use tracing::{info, warn};

use crate::card::{RandShuffler, Shuffler};
use crate::config::{GameType, TableConfig};
use crate::error::{EngineError, NotFoundError, StateError, ValidationError};
use crate::event::{EventData, EventSender};
use crate::game::{Game, GameStatus, StepOutcome};
use crate::player::{Action, Player};

/// A seated table: owns its [`Game`] behind a mutex so many threads (API
/// callers, the action timer) can mutate it safely, and behind an `Arc` so
/// the timer thread can re-enter the same table after it detaches.
pub struct Table {
    inner: Arc<Mutex<Game>>,
    shuffler: Arc<dyn Shuffler>,
    events: EventSender,
    /// Bumped whenever a new deadline is armed; a firing timer thread
    /// compares its own generation against this before acting, so a
    /// stopped-then-fired timer is a safe no-op (§5).
    timer_generation: Arc<AtomicU64>,
}

impl Table {
    pub fn new(table_id: impl Into<String>, config: TableConfig, max_players: usize, events: EventSender) -> Self {
        let seats = vec![None; max_players];
        Self {
            inner: Arc::new(Mutex::new(Game::new(table_id, config, seats))),
            shuffler: Arc::new(RandShuffler),
            events,
            timer_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Test/tool seam: inject a deterministic shuffle source.
    pub fn with_shuffler(mut self, shuffler: Arc<dyn Shuffler>) -> Self {
        self.shuffler = shuffler;
        self
    }

    fn table_id(&self) -> String {
        self.inner.lock().expect("table mutex poisoned").table_id.clone()
    }

    pub fn add_player(&self, player_id: impl Into<String>, name: impl Into<String>, seat: usize, buy_in: u64) -> Result<(), EngineError> {
        let mut game = self.inner.lock().expect("table mutex poisoned");
        if seat >= game.seats.len() {
            return Err(ValidationError::SeatOutOfRange { seat, max_players: game.seats.len() }.into());
        }
        if game.seats[seat].is_some() {
            return Err(ValidationError::SeatOccupied { seat }.into());
        }
        match game.config.game_type {
            GameType::Cash => game.config.validate_buy_in(buy_in)?,
            GameType::Tournament => {
                if buy_in != game.config.starting_chips {
                    return Err(ValidationError::BuyInOutOfRange {
                        amount: buy_in,
                        min: game.config.starting_chips,
                        max: game.config.starting_chips,
                    }
                    .into());
                }
            }
        }
        let player_id = player_id.into();
        game.seats[seat] = Some(Player::new(player_id.clone(), name, seat, buy_in));
        info!(table_id = %game.table_id, player_id, seat, buy_in, "player seated");
        Ok(())
    }

    /// Mid-hand removal marks the seat for vacancy at the next hand reset
    /// rather than clearing it immediately, preserving pot eligibility for
    /// the hand in progress (§4.10).
    pub fn remove_player(&self, player_id: &str) -> Result<(), EngineError> {
        let mut game = self.inner.lock().expect("table mutex poisoned");
        let in_hand = game.status == GameStatus::Playing || game.status == GameStatus::Paused;
        let player = find_seat_mut(&mut game.seats, player_id).ok_or_else(|| NotFoundError::Player(player_id.to_string()))?;
        if in_hand {
            player.marked_for_removal = true;
            player.status = crate::player::PlayerStatus::Folded;
        } else {
            let seat = player.seat;
            game.seats[seat] = None;
        }
        Ok(())
    }

    pub fn sit_out(&self, player_id: &str) -> Result<(), EngineError> {
        let mut game = self.inner.lock().expect("table mutex poisoned");
        let player = find_seat_mut(&mut game.seats, player_id).ok_or_else(|| NotFoundError::Player(player_id.to_string()))?;
        player.status = crate::player::PlayerStatus::SittingOut;
        Ok(())
    }

    pub fn sit_in(&self, player_id: &str) -> Result<(), EngineError> {
        let mut game = self.inner.lock().expect("table mutex poisoned");
        let player = find_seat_mut(&mut game.seats, player_id).ok_or_else(|| NotFoundError::Player(player_id.to_string()))?;
        if player.chips > 0 {
            player.status = crate::player::PlayerStatus::Active;
        }
        Ok(())
    }

    /// Top-up between hands; cash tables only (§4.10).
    pub fn add_chips(&self, player_id: &str, amount: u64) -> Result<(), EngineError> {
        let mut game = self.inner.lock().expect("table mutex poisoned");
        if game.config.game_type == GameType::Tournament {
            return Err(StateError::CannotTopUpInTournament.into());
        }
        let max_buy_in = game.config.max_buy_in;
        let player = find_seat_mut(&mut game.seats, player_id).ok_or_else(|| NotFoundError::Player(player_id.to_string()))?;
        let new_total = player.chips + amount;
        if new_total > max_buy_in {
            return Err(ValidationError::BuyInOutOfRange { amount: new_total, min: 0, max: max_buy_in }.into());
        }
        player.chips = new_total;
        Ok(())
    }

    pub fn start_hand(&self) -> Result<(), EngineError> {
        let mut game = self.inner.lock().expect("table mutex poisoned");
        let outcome = game.start_hand(self.shuffler.as_ref())?;
        self.publish(&game.table_id, outcome);
        Ok(())
    }

    pub fn process_action(&self, player_id: &str, action: Action) -> Result<(), EngineError> {
        self.process_action_at(player_id, action, Instant::now(), true)
    }

    fn process_action_at(&self, player_id: &str, action: Action, now: Instant, voluntary: bool) -> Result<(), EngineError> {
        let mut game = self.inner.lock().expect("table mutex poisoned");
        let outcome = game.process_action(player_id, action, now, voluntary)?;
        self.publish(&game.table_id, outcome);
        Ok(())
    }

    pub fn pause(&self) -> Result<(), EngineError> {
        let mut game = self.inner.lock().expect("table mutex poisoned");
        game.pause()?;
        self.timer_generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn resume(&self) -> Result<(), EngineError> {
        let mut game = self.inner.lock().expect("table mutex poisoned");
        game.resume()?;
        let deadline = game.current_hand.as_ref().and_then(|h| h.action_deadline);
        drop(game);
        if let Some(deadline) = deadline {
            self.arm_timer(deadline);
        }
        Ok(())
    }

    pub fn update_blinds(&self, small_blind: u64, big_blind: u64) -> Result<(), EngineError> {
        self.inner.lock().expect("table mutex poisoned").update_blinds(small_blind, big_blind)
    }

    /// Called by the timer thread when its deadline fires. A no-op if the
    /// timer was superseded (generation mismatch) or the expected actor has
    /// already moved on — Process-action's own turn validation covers the
    /// latter (§5's "stop race is acceptable").
    fn handle_timeout(&self, generation: u64, player_id: String) {
        if self.timer_generation.load(Ordering::SeqCst) != generation {
            return;
        }
        warn!(table_id = %self.table_id(), player_id, "action timed out, submitting synthesized fold");
        let _ = self.process_action_at(&player_id, Action::Fold, Instant::now(), false);
    }

    fn arm_timer(&self, deadline: Instant) {
        let generation = self.timer_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let table = self.clone_handle();
        let player_id = {
            let game = self.inner.lock().expect("table mutex poisoned");
            game.current_hand
                .as_ref()
                .and_then(|h| game.seats[h.current_position].as_ref().map(|p| p.id.clone()))
        };
        let Some(player_id) = player_id else { return };
        thread::spawn(move || {
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            }
            table.handle_timeout(generation, player_id);
        });
    }

    fn clone_handle(&self) -> Table {
        Table {
            inner: Arc::clone(&self.inner),
            shuffler: Arc::clone(&self.shuffler),
            events: self.events.clone(),
            timer_generation: Arc::clone(&self.timer_generation),
        }
    }

    fn publish(&self, table_id: &str, outcome: StepOutcome) {
        for event in outcome.events {
            self.events.send(table_id.to_string(), event);
        }
        if let Some(deadline) = outcome.next_deadline {
            self.arm_timer(deadline);
        }
    }
}

fn find_seat_mut<'a>(seats: &'a mut crate::player::Seats, player_id: &str) -> Option<&'a mut Player> {
    seats.iter_mut().flatten().find(|p| p.id == player_id)
}
