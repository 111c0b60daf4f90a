//! 7-card hand evaluator (C2): maps any 5-to-7 card hand to a total-order
//! score, picking the best 5-card sub-hand along the way.

use std::cmp::Ordering;
use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::card::{Card, Rank, Suit};
use crate::error::EvalError;

/// Poker hand categories, low to high. Derives `Ord` directly off variant
/// declaration order, so `RankClass::Flush > RankClass::Straight` etc. fall
/// out for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RankClass {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl RankClass {
    pub fn name(self) -> &'static str {
        match self {
            RankClass::HighCard => "High Card",
            RankClass::OnePair => "One Pair",
            RankClass::TwoPair => "Two Pair",
            RankClass::ThreeOfAKind => "Three of a Kind",
            RankClass::Straight => "Straight",
            RankClass::Flush => "Flush",
            RankClass::FullHouse => "Full House",
            RankClass::FourOfAKind => "Four of a Kind",
            RankClass::StraightFlush => "Straight Flush",
            RankClass::RoyalFlush => "Royal Flush",
        }
    }

    fn base(self) -> u32 {
        // HighCard=1 .. RoyalFlush=10, scaled so kicker packing (always
        // < 1_000_000) never spills into the next class's range.
        let idx = match self {
            RankClass::HighCard => 1,
            RankClass::OnePair => 2,
            RankClass::TwoPair => 3,
            RankClass::ThreeOfAKind => 4,
            RankClass::Straight => 5,
            RankClass::Flush => 6,
            RankClass::FullHouse => 7,
            RankClass::FourOfAKind => 8,
            RankClass::StraightFlush => 9,
            RankClass::RoyalFlush => 10,
        };
        idx * 1_000_000
    }
}

/// Result of evaluating a hand: its category, a total-order score, and the
/// five cards that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandEvaluation {
    pub rank_class: RankClass,
    pub score: u32,
    pub best_five: [Card; 5],
}

impl PartialOrd for HandEvaluation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandEvaluation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.cmp(&other.score)
    }
}

/// Packs up to 5 kicker ranks (most significant first) into the lower
/// digits of the score, radix-15 so no combination of kickers can overflow
/// into the class base above it (max packed value is well under 1_000_000).
fn pack_kickers(kickers: &[u8]) -> u32 {
    let mut packed: u32 = 0;
    for i in 0..5 {
        let k = kickers.get(i).copied().unwrap_or(0) as u32;
        packed = packed * 15 + k;
    }
    packed
}

/// Evaluates a 7-card hand (2 hole + 0..=5 community cards accepted, but the
/// public contract is always called with a full 7). Pure; no shared state.
pub fn evaluate(hole: [Card; 2], community: &[Card]) -> HandEvaluation {
    let mut all = Vec::with_capacity(2 + community.len());
    all.push(hole[0]);
    all.push(hole[1]);
    all.extend_from_slice(community);
    evaluate_cards(&all).expect("evaluate() is always called with 5..=7 cards")
}

/// Evaluates an arbitrary 5..=7 card set, searching all 5-card sub-hands
/// when more than 5 are given. Exposed for callers that already have a flat
/// card list (tests, the payout distributor).
pub fn evaluate_cards(cards: &[Card]) -> Result<HandEvaluation, EvalError> {
    if !(5..=7).contains(&cards.len()) {
        return Err(EvalError::WrongCardCount(cards.len()));
    }
    let mut seen = std::collections::HashSet::new();
    for c in cards {
        if !seen.insert((c.rank, c.suit)) {
            return Err(EvalError::DuplicateCard {
                rank: c.rank,
                suit: c.suit,
            });
        }
    }

    if cards.len() == 5 {
        let five: [Card; 5] = cards.try_into().unwrap();
        return Ok(evaluate_five(five));
    }

    let mut best: Option<HandEvaluation> = None;
    for combo in cards.iter().combinations(5) {
        let five: [Card; 5] = [*combo[0], *combo[1], *combo[2], *combo[3], *combo[4]];
        let eval = evaluate_five(five);
        if best.as_ref().is_none_or(|b| eval.score > b.score) {
            best = Some(eval);
        }
    }
    Ok(best.expect("at least one 5-card combination exists"))
}

fn evaluate_five(cards: [Card; 5]) -> HandEvaluation {
    let mut rank_counts: HashMap<Rank, u8> = HashMap::new();
    for c in &cards {
        *rank_counts.entry(c.rank).or_insert(0) += 1;
    }
    let mut suit_counts: HashMap<Suit, u8> = HashMap::new();
    for c in &cards {
        *suit_counts.entry(c.suit).or_insert(0) += 1;
    }

    let is_flush = suit_counts.values().any(|&n| n == 5);
    let (is_straight, straight_high) = check_straight(&cards);

    if is_flush && is_straight {
        let rank_class = if straight_high == Rank::Ace {
            RankClass::RoyalFlush
        } else {
            RankClass::StraightFlush
        };
        return finish(rank_class, &[straight_high.value()], cards);
    }

    if let Some((&quad, _)) = rank_counts.iter().find(|&(_, &n)| n == 4) {
        let kicker = rank_counts
            .iter()
            .filter(|&(&r, _)| r != quad)
            .map(|(&r, _)| r.value())
            .max()
            .unwrap();
        return finish(RankClass::FourOfAKind, &[quad.value(), kicker], cards);
    }

    if let Some((&trips, _)) = rank_counts
        .iter()
        .filter(|&(_, &n)| n == 3)
        .max_by_key(|&(&r, _)| r)
    {
        if let Some((&pair, _)) = rank_counts
            .iter()
            .filter(|&(&r, &n)| r != trips && n >= 2)
            .max_by_key(|&(&r, _)| r)
        {
            return finish(RankClass::FullHouse, &[trips.value(), pair.value()], cards);
        }
    }

    if is_flush {
        let kickers = descending_values(&cards);
        return finish(RankClass::Flush, &kickers, cards);
    }

    if is_straight {
        return finish(RankClass::Straight, &[straight_high.value()], cards);
    }

    if let Some((&trips, _)) = rank_counts
        .iter()
        .filter(|&(_, &n)| n == 3)
        .max_by_key(|&(&r, _)| r)
    {
        let mut kickers: Vec<u8> = rank_counts
            .iter()
            .filter(|&(&r, _)| r != trips)
            .map(|(&r, _)| r.value())
            .collect();
        kickers.sort_unstable_by(|a, b| b.cmp(a));
        kickers.truncate(2);
        let mut packed = vec![trips.value()];
        packed.extend(kickers);
        return finish(RankClass::ThreeOfAKind, &packed, cards);
    }

    let mut pairs: Vec<Rank> = rank_counts
        .iter()
        .filter(|&(_, &n)| n == 2)
        .map(|(&r, _)| r)
        .collect();
    pairs.sort_unstable_by(|a, b| b.cmp(a));

    if pairs.len() >= 2 {
        let high_pair = pairs[0];
        let low_pair = pairs[1];
        let kicker = rank_counts
            .iter()
            .filter(|&(&r, _)| r != high_pair && r != low_pair)
            .map(|(&r, _)| r.value())
            .max()
            .unwrap();
        return finish(
            RankClass::TwoPair,
            &[high_pair.value(), low_pair.value(), kicker],
            cards,
        );
    }

    if let Some(pair) = pairs.first().copied() {
        let mut kickers: Vec<u8> = rank_counts
            .iter()
            .filter(|&(&r, _)| r != pair)
            .map(|(&r, _)| r.value())
            .collect();
        kickers.sort_unstable_by(|a, b| b.cmp(a));
        kickers.truncate(3);
        let mut packed = vec![pair.value()];
        packed.extend(kickers);
        return finish(RankClass::OnePair, &packed, cards);
    }

    let kickers = descending_values(&cards);
    finish(RankClass::HighCard, &kickers, cards)
}

fn descending_values(cards: &[Card; 5]) -> Vec<u8> {
    let mut values: Vec<u8> = cards.iter().map(|c| c.rank.value()).collect();
    values.sort_unstable_by(|a, b| b.cmp(a));
    values
}

fn finish(rank_class: RankClass, kickers: &[u8], best_five: [Card; 5]) -> HandEvaluation {
    HandEvaluation {
        rank_class,
        score: rank_class.base() + pack_kickers(kickers),
        best_five,
    }
}

/// Straight detection with the wheel (A-2-3-4-5) special case: if the value
/// set contains {14,5,4,3,2} and no higher straight exists, the ace counts
/// low and the straight's top card is the 5.
fn check_straight(cards: &[Card; 5]) -> (bool, Rank) {
    let mut values: Vec<u8> = cards.iter().map(|c| c.rank.value()).collect();
    values.sort_unstable();
    values.dedup();

    if values.len() < 5 {
        return (false, Rank::Two);
    }

    let mut best_high: Option<u8> = None;
    for window in values.windows(5) {
        if window[4] - window[0] == 4 {
            best_high = Some(window[4]);
        }
    }
    if let Some(high) = best_high {
        return (true, Rank::from_value(high));
    }

    // Wheel: A counts as 1 alongside {2,3,4,5}.
    if values.contains(&14) && [2u8, 3, 4, 5].iter().all(|v| values.contains(v)) {
        return (true, Rank::Five);
    }

    (false, Rank::Two)
}
