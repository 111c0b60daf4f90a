use std::fmt;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::DeckError;

/// Card suit. Ordering is arbitrary; suits never break ties in hand ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let c = match self {
            Suit::Spades => '♠',
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
        };
        write!(f, "{c}")
    }
}

/// Card rank. Numeric value via [`Rank::value`] is 2..=14, with Ace high;
/// the wheel (A-2-3-4-5) is a straight-detection special case, not modeled
/// here as a separate low-ace value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub fn value(self) -> u8 {
        match self {
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten => 10,
            Rank::Jack => 11,
            Rank::Queen => 12,
            Rank::King => 13,
            Rank::Ace => 14,
        }
    }

    pub fn from_value(value: u8) -> Self {
        match value {
            2 => Rank::Two,
            3 => Rank::Three,
            4 => Rank::Four,
            5 => Rank::Five,
            6 => Rank::Six,
            7 => Rank::Seven,
            8 => Rank::Eight,
            9 => Rank::Nine,
            10 => Rank::Ten,
            11 => Rank::Jack,
            12 => Rank::Queen,
            13 => Rank::King,
            14 => Rank::Ace,
            _ => panic!("invalid rank value: {value}"),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        };
        write!(f, "{s}")
    }
}

/// A single playing card. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// Pluggable shuffle seam (§4.1): production uses [`RandShuffler`], tests can
/// inject a fixed permutation to pin down a hand deterministically.
pub trait Shuffler: Send + Sync {
    fn shuffle(&self, cards: &mut [Card]);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandShuffler;

impl Shuffler for RandShuffler {
    fn shuffle(&self, cards: &mut [Card]) {
        let mut rng = rand::rng();
        cards.shuffle(&mut rng);
    }
}

/// An ordered 52-card sequence with a consumption cursor. Created fresh per
/// hand; `deal`/`deal_multiple` consume from the front.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
    cursor: usize,
}

impl Deck {
    /// Builds a freshly shuffled 52-card deck using `shuffler`.
    pub fn new(shuffler: &dyn Shuffler) -> Self {
        let mut cards = Vec::with_capacity(52);
        for &suit in &Suit::ALL {
            for &rank in &Rank::ALL {
                cards.push(Card::new(rank, suit));
            }
        }
        shuffler.shuffle(&mut cards);
        Self { cards, cursor: 0 }
    }

    /// Builds a deck from an explicit, already-ordered card sequence; used
    /// by tests that want full control over the deal.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards, cursor: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.cursor
    }

    /// Deals exactly one card, or fails with [`DeckError::Exhausted`].
    pub fn deal(&mut self) -> Result<Card, DeckError> {
        if self.cursor >= self.cards.len() {
            return Err(DeckError::Exhausted {
                requested: 1,
                remaining: 0,
            });
        }
        let card = self.cards[self.cursor];
        self.cursor += 1;
        Ok(card)
    }

    /// Deals `n` cards atomically: either all `n` are returned, or none are
    /// consumed and an error is returned.
    pub fn deal_multiple(&mut self, n: usize) -> Result<Vec<Card>, DeckError> {
        if self.remaining() < n {
            return Err(DeckError::Exhausted {
                requested: n,
                remaining: self.remaining(),
            });
        }
        let dealt = self.cards[self.cursor..self.cursor + n].to_vec();
        self.cursor += n;
        Ok(dealt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct NoShuffle;
    impl Shuffler for NoShuffle {
        fn shuffle(&self, _cards: &mut [Card]) {}
    }

    #[test]
    fn new_deck_has_52_unique_cards() {
        let deck = Deck::new(&NoShuffle);
        assert_eq!(deck.remaining(), 52);
        let unique: HashSet<(Rank, Suit)> = deck.cards.iter().map(|c| (c.rank, c.suit)).collect();
        assert_eq!(unique.len(), 52);
    }

    #[test]
    fn deal_consumes_one_card() {
        let mut deck = Deck::new(&NoShuffle);
        let first = deck.cards[0];
        let dealt = deck.deal().unwrap();
        assert_eq!(dealt, first);
        assert_eq!(deck.remaining(), 51);
    }

    #[test]
    fn deal_multiple_is_atomic_on_exhaustion() {
        let mut deck = Deck::from_cards(vec![Card::new(Rank::Two, Suit::Spades)]);
        let err = deck.deal_multiple(5).unwrap_err();
        assert_eq!(
            err,
            DeckError::Exhausted {
                requested: 5,
                remaining: 1
            }
        );
        assert_eq!(deck.remaining(), 1, "failed deal must not consume cards");
    }

    #[test]
    fn deal_past_exhaustion_fails() {
        let mut deck = Deck::from_cards(vec![]);
        assert!(deck.deal().is_err());
    }
}
