//! Hand state machine (C9): owns one table's seats and current hand, and
//! drives the lifecycle Waiting -> Playing -> HandComplete -> Playing |
//! Waiting | Completed (§4.9). Every public method takes `&mut self` and
//! corresponds to one externally triggered operation; the caller (see
//! `crate::table`) is responsible for serialising access through its mutex
//! and for turning `next_deadline` into an actual timer thread.

use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, info, warn};

use crate::action;
use crate::card::{Deck, Shuffler};
use crate::config::TableConfig;
use crate::error::{EngineError, NotFoundError, StateError};
use crate::event::EventData;
use crate::hand::{BettingRound, CurrentHand};
use crate::payout;
use crate::player::{Action, Player, PlayerStatus, Seats};
use crate::position;
use crate::pot;
use crate::turn::{self, TurnContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Waiting,
    Playing,
    Paused,
    HandComplete,
    Completed,
}

/// Consecutive all-timeout hands that abandon a table (§4.9).
pub const ABANDONMENT_THRESHOLD: u32 = 2;

/// One table's seats, configuration, and in-progress hand.
pub struct Game {
    pub table_id: String,
    pub seats: Seats,
    pub config: TableConfig,
    pub status: GameStatus,
    pub current_hand: Option<CurrentHand>,
    pub hand_number: u64,
    pub consecutive_all_timeout_hands: u32,
    previous_dealer_seat: Option<usize>,
}

/// What one call into the state machine produced: events to publish, and
/// (when a new action deadline was armed) the instant it fires at.
#[derive(Debug, Default)]
pub struct StepOutcome {
    pub events: Vec<EventData>,
    pub next_deadline: Option<Instant>,
}

impl Game {
    pub fn new(table_id: impl Into<String>, config: TableConfig, seats: Seats) -> Self {
        Self {
            table_id: table_id.into(),
            seats,
            config,
            status: GameStatus::Waiting,
            current_hand: None,
            hand_number: 0,
            consecutive_all_timeout_hands: 0,
            previous_dealer_seat: None,
        }
    }

    pub fn eligible_to_play(&self) -> usize {
        self.seats
            .iter()
            .filter_map(|s| s.as_ref())
            .filter(|p| !p.is_sitting_out() && p.chips > 0)
            .count()
    }

    /// Starts a new hand: bust/removal sweep, dealer rotation, blinds,
    /// hole cards, and the first action deadline.
    pub fn start_hand(&mut self, shuffler: &dyn Shuffler) -> Result<StepOutcome, EngineError> {
        if self.status == GameStatus::Playing {
            return Err(StateError::AlreadyPlaying.into());
        }

        let mut events = self.sweep_seats();

        let eligible = self.eligible_to_play();
        if eligible < 2 {
            self.status = GameStatus::Waiting;
            return Err(EngineError::NotEnoughPlayers { eligible });
        }

        let dealer_seat = self.choose_dealer();
        for seat in self.seats.iter_mut().flatten() {
            seat.reset_for_new_hand();
        }

        let (sb_seat, bb_seat) = position::calculate_blind_positions(&self.seats, dealer_seat, eligible);
        if let Some(p) = self.seats[dealer_seat].as_mut() {
            p.is_dealer = true;
        }
        if let Some(p) = self.seats[sb_seat].as_mut() {
            p.is_small_blind = true;
        }
        if let Some(p) = self.seats[bb_seat].as_mut() {
            p.is_big_blind = true;
        }

        let small_blind = self.config.small_blind;
        let big_blind = self.config.big_blind;
        post_blind(self.seats[sb_seat].as_mut().expect("sb seat occupied"), small_blind);
        // The SB is treated as having already acted, except heads-up, where
        // the SB is the dealer and acts first preflop (§4.3, §4.9).
        if eligible > 2 {
            self.seats[sb_seat].as_mut().unwrap().has_acted_this_round = true;
        }
        post_blind(self.seats[bb_seat].as_mut().expect("bb seat occupied"), big_blind);

        let mut deck = Deck::new(shuffler);
        for seat in self.seats.iter_mut().flatten() {
            if matches!(seat.status, PlayerStatus::Active) {
                let a = deck.deal()?;
                let b = deck.deal()?;
                seat.hole_cards = Some((a, b));
            }
        }

        self.hand_number += 1;
        self.previous_dealer_seat = Some(dealer_seat);
        let mut hand = CurrentHand::new(self.hand_number, dealer_seat, sb_seat, bb_seat, deck);
        hand.current_bet = big_blind;
        hand.min_raise = big_blind;
        hand.current_position = position::find_next_active(&self.seats, bb_seat);

        self.status = GameStatus::Playing;
        events.push(EventData::HandStart {
            hand_number: hand.hand_number,
            dealer_seat,
        });
        info!(table_id = %self.table_id, hand_number = hand.hand_number, dealer_seat, "hand started");

        let actor_id = self.seats[hand.current_position].as_ref().map(|p| p.id.clone());
        let deadline = arm_deadline(&mut hand, &self.config, Instant::now());
        self.current_hand = Some(hand);

        if let (Some(deadline), Some(actor_id)) = (deadline, actor_id) {
            events.push(EventData::ActionRequired {
                player_id: actor_id,
                deadline: SystemTime::now() + self.timeout_duration(),
            });
            return Ok(StepOutcome { events, next_deadline: Some(deadline) });
        }
        Ok(StepOutcome { events, next_deadline: None })
    }

    /// Validates and applies one player's action, then advances the round
    /// or completes the hand as needed. `voluntary` distinguishes a call
    /// through the public API from the timeout callback's synthesized fold
    /// (§4.9's abandonment-tracking resolution).
    pub fn process_action(
        &mut self,
        player_id: &str,
        action_kind: Action,
        now: Instant,
        voluntary: bool,
    ) -> Result<StepOutcome, EngineError> {
        match self.status {
            GameStatus::Paused => return Err(StateError::ActionDuringPause.into()),
            GameStatus::Playing => {}
            _ => return Err(StateError::NotInProgress.into()),
        }
        if self.current_hand.is_none() {
            return Err(StateError::HandNotStarted.into());
        }

        let seat_idx = self
            .seats
            .iter()
            .position(|s| s.as_ref().is_some_and(|p| p.id == player_id))
            .ok_or_else(|| NotFoundError::Player(player_id.to_string()))?;

        {
            let hand = self.current_hand.as_ref().unwrap();
            let ctx = TurnContext {
                current_position: hand.current_position,
                last_action_player_id: hand.last_action_player_id.as_deref(),
                last_action_time: hand.last_action_time,
                now,
            };
            let player = self.seats[seat_idx].as_ref().unwrap();
            turn::validate_turn(player, &ctx)?;
        }

        let (current_bet, min_raise) = {
            let hand = self.current_hand.as_ref().unwrap();
            (hand.current_bet, hand.min_raise)
        };
        let update = {
            let player = self.seats[seat_idx].as_mut().unwrap();
            action::apply_action(player, action_kind, current_bet, min_raise)?
        };

        if update.reopens_action {
            for (i, seat) in self.seats.iter_mut().enumerate() {
                if i == seat_idx {
                    continue;
                }
                if let Some(p) = seat {
                    if p.can_act() {
                        p.has_acted_this_round = false;
                    }
                }
            }
        }

        {
            let hand = self.current_hand.as_mut().unwrap();
            if let Some(cb) = update.new_current_bet {
                hand.current_bet = cb;
            }
            if let Some(mr) = update.new_min_raise {
                hand.min_raise = mr;
            }
            hand.last_action_player_id = Some(player_id.to_string());
            hand.last_action_time = Some(now);
            hand.action_sequence += 1;
            if voluntary {
                hand.had_voluntary_action = true;
            }
        }
        self.seats[seat_idx].as_mut().unwrap().has_acted_this_round = true;

        debug!(table_id = %self.table_id, player_id, ?action_kind, "action processed");
        let mut events = vec![EventData::PlayerAction {
            player_id: player_id.to_string(),
            action: action_kind,
        }];

        let current_bet_after = self.current_hand.as_ref().unwrap().current_bet;
        if is_round_complete(&self.seats, current_bet_after) {
            events.extend(self.advance_round(now)?);
            let next_deadline = self.current_hand.as_ref().and_then(|h| h.action_deadline);
            return Ok(StepOutcome { events, next_deadline });
        }

        let next_actor;
        {
            let hand = self.current_hand.as_mut().unwrap();
            hand.current_position = position::find_next_active(&self.seats, seat_idx);
            next_actor = hand.current_position;
        }
        let actor_id = self.seats[next_actor].as_ref().map(|p| p.id.clone());
        let deadline = arm_deadline(self.current_hand.as_mut().unwrap(), &self.config, now);
        if let (Some(deadline), Some(actor_id)) = (deadline, actor_id) {
            events.push(EventData::ActionRequired {
                player_id: actor_id,
                deadline: SystemTime::now() + self.timeout_duration(),
            });
            return Ok(StepOutcome { events, next_deadline: Some(deadline) });
        }
        Ok(StepOutcome { events, next_deadline: None })
    }

    pub fn pause(&mut self) -> Result<(), EngineError> {
        match self.status {
            GameStatus::Playing => {
                self.status = GameStatus::Paused;
                Ok(())
            }
            GameStatus::Paused => Err(StateError::AlreadyPaused.into()),
            _ => Err(StateError::NotInProgress.into()),
        }
    }

    pub fn resume(&mut self) -> Result<(), EngineError> {
        match self.status {
            GameStatus::Paused => {
                self.status = GameStatus::Playing;
                Ok(())
            }
            _ => Err(StateError::NotInProgress.into()),
        }
    }

    /// Mutates only the blind configuration; takes effect on the next hand.
    pub fn update_blinds(&mut self, small_blind: u64, big_blind: u64) -> Result<(), EngineError> {
        let mut config = self.config.clone();
        config.small_blind = small_blind;
        config.big_blind = big_blind;
        config.validate()?;
        self.config = config;
        Ok(())
    }

    fn sweep_seats(&mut self) -> Vec<EventData> {
        let mut events = Vec::new();
        for seat in self.seats.iter_mut() {
            let vacate = match seat {
                Some(p) if p.marked_for_removal => true,
                Some(p) if p.chips == 0 => {
                    events.push(EventData::PlayerBusted { player_id: p.id.clone() });
                    true
                }
                _ => false,
            };
            if vacate {
                *seat = None;
            }
        }
        events
    }

    fn choose_dealer(&self) -> usize {
        match self.previous_dealer_seat {
            Some(prev) if prev < self.seats.len() && self.seats[prev].is_some() => {
                position::find_next_with_chips(&self.seats, prev)
            }
            _ => position::find_first_with_chips(&self.seats),
        }
    }

    fn count_non_folded(&self) -> usize {
        self.seats.iter().filter_map(|s| s.as_ref()).filter(|p| !p.is_folded()).count()
    }

    fn count_can_act(&self) -> usize {
        self.seats.iter().filter_map(|s| s.as_ref()).filter(|p| p.can_act()).count()
    }

    fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.config.action_timeout_secs)
    }

    fn deal_for_round(&mut self, round: BettingRound) -> Result<(), EngineError> {
        let n = match round {
            BettingRound::Preflop => 0,
            BettingRound::Flop => 3,
            BettingRound::Turn => 1,
            BettingRound::River => 1,
        };
        if n == 0 {
            return Ok(());
        }
        let hand = self.current_hand.as_mut().expect("deal_for_round requires a current hand");
        let cards = hand.deck.deal_multiple(n)?;
        hand.community_cards.extend(cards);
        Ok(())
    }

    fn deal_remaining_streets(&mut self) -> Result<(), EngineError> {
        loop {
            let current_round = self.current_hand.as_ref().unwrap().round;
            match current_round.next() {
                Some(next) => {
                    self.deal_for_round(next)?;
                    self.current_hand.as_mut().unwrap().round = next;
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Recomputes the pot, resets per-round betting state, and either deals
    /// the next street, runs out the board when nobody else can act, or
    /// completes the hand (§4.9's "advance to next round").
    fn advance_round(&mut self, now: Instant) -> Result<Vec<EventData>, EngineError> {
        let mut events = Vec::new();

        {
            let players: Vec<&Player> = self.seats.iter().filter_map(|s| s.as_ref()).collect();
            let partition = pot::calculate_pots(&players);
            let hand = self.current_hand.as_mut().expect("advance_round requires a current hand");
            hand.pot = partition;
        }
        for seat in self.seats.iter_mut().flatten() {
            if !seat.is_folded() {
                seat.reset_for_new_round();
            }
        }
        let big_blind = self.config.big_blind;
        {
            let hand = self.current_hand.as_mut().unwrap();
            hand.current_bet = 0;
            hand.min_raise = big_blind;
        }

        if self.count_non_folded() <= 1 {
            events.extend(self.complete_hand()?);
            return Ok(events);
        }

        let can_act = self.count_can_act();
        let at_river = matches!(self.current_hand.as_ref().unwrap().round, BettingRound::River);

        if can_act <= 1 || at_river {
            self.deal_remaining_streets()?;
            events.push(EventData::RoundAdvanced {
                community_card_count: self.current_hand.as_ref().unwrap().community_cards.len(),
            });
            events.extend(self.complete_hand()?);
            return Ok(events);
        }

        let next_round = self.current_hand.as_ref().unwrap().round.next().expect("river handled above");
        self.deal_for_round(next_round)?;

        let actor_id;
        {
            let hand = self.current_hand.as_mut().unwrap();
            hand.round = next_round;
            let dealer_seat = hand.dealer_seat;
            hand.current_position = position::find_next_active(&self.seats, dealer_seat);
            actor_id = self.seats[hand.current_position].as_ref().map(|p| p.id.clone());
        }
        events.push(EventData::RoundAdvanced {
            community_card_count: self.current_hand.as_ref().unwrap().community_cards.len(),
        });

        let deadline = arm_deadline(self.current_hand.as_mut().unwrap(), &self.config, now);
        if let (Some(_), Some(actor_id)) = (deadline, actor_id) {
            events.push(EventData::ActionRequired {
                player_id: actor_id,
                deadline: SystemTime::now() + self.timeout_duration(),
            });
        }
        Ok(events)
    }

    /// Showdown: compute the pot one last time, pay winners, and update the
    /// abandonment counter.
    fn complete_hand(&mut self) -> Result<Vec<EventData>, EngineError> {
        let mut hand = self.current_hand.take().expect("complete_hand requires a current hand");
        let players: Vec<&Player> = self.seats.iter().filter_map(|s| s.as_ref()).collect();
        hand.pot = pot::calculate_pots(&players);
        let winners = payout::distribute(&hand.pot, &players, &hand.community_cards, hand.dealer_seat, self.seats.len());
        drop(players);

        for winner in &winners {
            if let Some(p) = self.seats.iter_mut().flatten().find(|p| p.id == winner.player_id) {
                p.chips += winner.amount;
            }
        }

        self.status = GameStatus::HandComplete;
        info!(table_id = %self.table_id, hand_number = hand.hand_number, "hand complete");
        let had_voluntary_action = hand.had_voluntary_action;
        let mut events = vec![EventData::HandComplete { winners }];

        if had_voluntary_action {
            self.consecutive_all_timeout_hands = 0;
        } else {
            self.consecutive_all_timeout_hands += 1;
        }

        if self.consecutive_all_timeout_hands >= ABANDONMENT_THRESHOLD {
            self.status = GameStatus::Completed;
            warn!(table_id = %self.table_id, "table abandoned after consecutive all-timeout hands");
            events.push(EventData::GameAbandoned {
                consecutive_timeout_hands: self.consecutive_all_timeout_hands,
            });
        } else {
            self.current_hand = Some(hand);
        }

        Ok(events)
    }
}

fn post_blind(player: &mut Player, amount: u64) {
    let posted = amount.min(player.chips);
    player.chips -= posted;
    player.round_bet += posted;
    player.total_invested += posted;
    if player.chips == 0 {
        player.status = PlayerStatus::AllIn;
    }
}

/// True once every non-folded, non-all-in player has acted at the current
/// bet, or at most one non-folded player remains (§4.9).
fn is_round_complete(seats: &Seats, current_bet: u64) -> bool {
    let non_folded: Vec<&Player> = seats.iter().filter_map(|s| s.as_ref()).filter(|p| !p.is_folded()).collect();
    if non_folded.len() <= 1 {
        return true;
    }
    non_folded
        .iter()
        .all(|p| p.is_all_in() || (p.has_acted_this_round && p.round_bet == current_bet))
}

fn arm_deadline(hand: &mut CurrentHand, config: &TableConfig, now: Instant) -> Option<Instant> {
    if config.action_timeout_secs == 0 {
        hand.action_deadline = None;
        return None;
    }
    let deadline = now + Duration::from_secs(config.action_timeout_secs);
    hand.arm_deadline(deadline);
    Some(deadline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameType;

    struct NoShuffle;
    impl Shuffler for NoShuffle {
        fn shuffle(&self, _cards: &mut [crate::card::Card]) {}
    }

    fn config() -> TableConfig {
        TableConfig {
            game_type: GameType::Cash,
            small_blind: 10,
            big_blind: 20,
            max_players: 6,
            min_buy_in: 40,
            max_buy_in: 2000,
            starting_chips: 1000,
            action_timeout_secs: 30,
        }
    }

    fn seats(n: usize) -> Seats {
        (0..n)
            .map(|i| Some(Player::new(format!("p{i}"), format!("P{i}"), i, 1000)))
            .collect()
    }

    fn game(n: usize) -> Game {
        Game::new("t1", config(), seats(n))
    }

    #[test]
    fn start_hand_requires_at_least_two_eligible_players() {
        let mut g = game(1);
        let err = g.start_hand(&NoShuffle).unwrap_err();
        assert!(matches!(err, EngineError::NotEnoughPlayers { eligible: 1 }));
        assert_eq!(g.status, GameStatus::Waiting);
    }

    #[test]
    fn start_hand_sets_heads_up_blinds_and_current_position() {
        let mut g = game(2);
        g.start_hand(&NoShuffle).unwrap();
        let hand = g.current_hand.as_ref().unwrap();
        // heads-up: dealer posts SB and acts first preflop (S4).
        assert_eq!(hand.dealer_seat, hand.small_blind_seat);
        assert_eq!(hand.current_position, hand.small_blind_seat);
        assert_eq!(hand.current_bet, 20);
        assert_eq!(hand.min_raise, 20);
        assert_eq!(g.seats[hand.small_blind_seat].as_ref().unwrap().round_bet, 10);
        assert_eq!(g.seats[hand.big_blind_seat].as_ref().unwrap().round_bet, 20);
        assert_eq!(g.status, GameStatus::Playing);
    }

    #[test]
    fn start_hand_skips_busted_and_sitting_out_seats() {
        let mut g = game(4);
        g.seats[1].as_mut().unwrap().chips = 0;
        g.seats[2].as_mut().unwrap().status = PlayerStatus::SittingOut;
        g.start_hand(&NoShuffle).unwrap();
        assert!(g.seats[1].is_none(), "busted player must be removed and not dealt in");
        assert!(g.seats[2].as_ref().unwrap().hole_cards.is_none());
    }

    #[test]
    fn pause_then_resume_round_trips() {
        let mut g = game(3);
        g.start_hand(&NoShuffle).unwrap();
        g.pause().unwrap();
        assert_eq!(g.status, GameStatus::Paused);
        assert!(matches!(g.pause(), Err(EngineError::State(StateError::AlreadyPaused))));
        g.resume().unwrap();
        assert_eq!(g.status, GameStatus::Playing);
    }

    #[test]
    fn process_action_rejected_while_paused() {
        let mut g = game(3);
        g.start_hand(&NoShuffle).unwrap();
        g.pause().unwrap();
        let hand = g.current_hand.as_ref().unwrap();
        let actor = g.seats[hand.current_position].as_ref().unwrap().id.clone();
        let err = g.process_action(&actor, Action::Fold, Instant::now(), true).unwrap_err();
        assert!(matches!(err, EngineError::State(StateError::ActionDuringPause)));
    }

    #[test]
    fn update_blinds_rejects_invalid_configuration() {
        let mut g = game(3);
        assert!(g.update_blinds(20, 10).is_err());
        assert_eq!(g.config.small_blind, 10, "rejected update must not mutate config");
        g.update_blinds(25, 50).unwrap();
        assert_eq!(g.config.small_blind, 25);
        assert_eq!(g.config.big_blind, 50);
    }

    #[test]
    fn full_raise_reopens_action_for_other_active_players() {
        let mut g = game(3);
        g.start_hand(&NoShuffle).unwrap();
        let first_actor = g.current_hand.as_ref().unwrap().current_position;
        let first_id = g.seats[first_actor].as_ref().unwrap().id.clone();
        g.process_action(&first_id, Action::Raise(100), Instant::now(), true).unwrap();

        let hand = g.current_hand.as_ref().unwrap();
        assert_eq!(hand.current_bet, 100);
        // every other can-act player must have had its flag cleared
        for (i, seat) in g.seats.iter().enumerate() {
            if i == first_actor {
                continue;
            }
            if let Some(p) = seat {
                if p.can_act() {
                    assert!(!p.has_acted_this_round, "full raise must reopen action");
                }
            }
        }
    }

    #[test]
    fn round_completes_and_deals_flop_once_action_settles() {
        let mut g = game(2);
        g.start_hand(&NoShuffle).unwrap();
        // heads-up preflop: SB/dealer acts first.
        let sb_id = {
            let hand = g.current_hand.as_ref().unwrap();
            g.seats[hand.current_position].as_ref().unwrap().id.clone()
        };
        g.process_action(&sb_id, Action::Call, Instant::now(), true).unwrap();
        let bb_id = {
            let hand = g.current_hand.as_ref().unwrap();
            g.seats[hand.current_position].as_ref().unwrap().id.clone()
        };
        g.process_action(&bb_id, Action::Check, Instant::now(), true).unwrap();

        let hand = g.current_hand.as_ref().unwrap();
        assert_eq!(hand.round, BettingRound::Flop);
        assert_eq!(hand.community_cards.len(), 3);
        assert_eq!(hand.current_bet, 0);
    }

    #[test]
    fn uncontested_pot_completes_hand_on_fold() {
        let mut g = game(2);
        g.start_hand(&NoShuffle).unwrap();
        let actor_id = {
            let hand = g.current_hand.as_ref().unwrap();
            g.seats[hand.current_position].as_ref().unwrap().id.clone()
        };
        let before: u64 = g.seats.iter().flatten().map(|p| p.chips + p.round_bet).sum();
        g.process_action(&actor_id, Action::Fold, Instant::now(), true).unwrap();
        assert_eq!(g.status, GameStatus::HandComplete);
        let after: u64 = g.seats.iter().flatten().map(|p| p.chips).sum();
        assert_eq!(before, after, "chip conservation across the hand");
    }

    #[test]
    fn abandonment_fires_after_two_consecutive_all_timeout_hands() {
        let mut g = game(2);
        for _ in 0..2 {
            g.start_hand(&NoShuffle).unwrap();
            let actor_id = {
                let hand = g.current_hand.as_ref().unwrap();
                g.seats[hand.current_position].as_ref().unwrap().id.clone()
            };
            // voluntary=false: simulates every action in the hand coming
            // from the timeout callback.
            g.process_action(&actor_id, Action::Fold, Instant::now(), false).unwrap();
        }
        assert_eq!(g.status, GameStatus::Completed);
        assert!(g.current_hand.is_none());
    }

    #[test]
    fn voluntary_action_resets_the_abandonment_counter() {
        let mut g = game(2);
        g.start_hand(&NoShuffle).unwrap();
        let actor_id = {
            let hand = g.current_hand.as_ref().unwrap();
            g.seats[hand.current_position].as_ref().unwrap().id.clone()
        };
        g.process_action(&actor_id, Action::Fold, Instant::now(), false).unwrap();
        assert_eq!(g.consecutive_all_timeout_hands, 1);

        g.start_hand(&NoShuffle).unwrap();
        let actor_id = {
            let hand = g.current_hand.as_ref().unwrap();
            g.seats[hand.current_position].as_ref().unwrap().id.clone()
        };
        g.process_action(&actor_id, Action::Fold, Instant::now(), true).unwrap();
        assert_eq!(g.consecutive_all_timeout_hands, 0);
        assert_eq!(g.status, GameStatus::HandComplete);
    }
}
