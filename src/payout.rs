//! Payout distributor (C7): for each pot layer, finds the best eligible
//! hand(s) and splits the layer, including the odd-chip rule.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::eval::{self, HandEvaluation};
use crate::player::Player;
use crate::pot::PotPartition;

/// One player's share of the payout, aggregated across every pot layer
/// they won a piece of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub player_id: String,
    pub amount: u64,
    pub hand_rank_name: String,
    pub best_five: Vec<Card>,
}

const DEFAULT_WIN_LABEL: &str = "Winner by default";

/// Distributes `pots` among `players` given the final `community` cards.
/// `dealer_seat` anchors the odd-chip rule: remainder chips go one at a
/// time to tied winners starting from the seat immediately left of the
/// dealer button.
pub fn distribute(
    pots: &PotPartition,
    players: &[&Player],
    community: &[Card],
    dealer_seat: usize,
    table_len: usize,
) -> Vec<Winner> {
    let non_folded: Vec<&&Player> = players.iter().filter(|p| !p.is_folded()).collect();

    if non_folded.len() == 1 {
        let winner = non_folded[0];
        return vec![Winner {
            player_id: winner.id.clone(),
            amount: pots.total(),
            hand_rank_name: DEFAULT_WIN_LABEL.to_string(),
            best_five: Vec::new(),
        }];
    }

    let evaluations: HashMap<&str, HandEvaluation> = non_folded
        .iter()
        .filter_map(|p| {
            p.hole_cards
                .map(|(a, b)| (p.id.as_str(), eval::evaluate([a, b], community)))
        })
        .collect();

    let mut winnings: HashMap<String, (u64, &HandEvaluation)> = HashMap::new();

    for layer in pots.layers() {
        if layer.amount == 0 || layer.eligible_player_ids.is_empty() {
            continue;
        }
        let mut best_score: Option<u32> = None;
        let mut tied: Vec<&str> = Vec::new();
        for id in &layer.eligible_player_ids {
            let Some(eval) = evaluations.get(id.as_str()) else {
                continue;
            };
            match best_score {
                None => {
                    best_score = Some(eval.score);
                    tied = vec![id.as_str()];
                }
                Some(best) if eval.score > best => {
                    best_score = Some(eval.score);
                    tied = vec![id.as_str()];
                }
                Some(best) if eval.score == best => {
                    tied.push(id.as_str());
                }
                _ => {}
            }
        }
        if tied.is_empty() {
            continue;
        }

        let share = layer.amount / tied.len() as u64;
        let remainder = layer.amount % tied.len() as u64;

        // Odd-chip rule: order tied winners by seat distance clockwise from
        // the dealer, and hand out the remainder one chip at a time
        // starting from the seat nearest left of the button.
        let mut ordered = tied.clone();
        ordered.sort_by_key(|id| seat_distance_from_dealer(players, id, dealer_seat, table_len));

        for (i, id) in ordered.iter().enumerate() {
            let amount = share + if (i as u64) < remainder { 1 } else { 0 };
            let eval = evaluations.get(*id).unwrap();
            let entry = winnings
                .entry((*id).to_string())
                .or_insert_with(|| (0, eval));
            entry.0 += amount;
        }
    }

    winnings
        .into_iter()
        .map(|(player_id, (amount, eval))| Winner {
            player_id,
            amount,
            hand_rank_name: eval.rank_class.name().to_string(),
            best_five: eval.best_five.to_vec(),
        })
        .collect()
}

/// Distance of `id`'s seat from the dealer, counted clockwise starting at
/// the seat immediately left of the button (that seat is distance 0; the
/// dealer's own seat is always the largest distance, table_len - 1).
fn seat_distance_from_dealer(players: &[&Player], id: &str, dealer_seat: usize, table_len: usize) -> usize {
    let seat = players
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.seat)
        .unwrap_or(0);
    if table_len == 0 {
        return 0;
    }
    (seat + table_len - dealer_seat - 1) % table_len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank::*, Suit::*};
    use crate::player::PlayerStatus;
    use crate::pot::{PotLayer, PotPartition};

    fn c(rank: crate::card::Rank, suit: crate::card::Suit) -> Card {
        Card::new(rank, suit)
    }

    fn player_with_hand(id: &str, seat: usize, hole: (Card, Card), status: PlayerStatus) -> Player {
        let mut p = Player::new(id, id, seat, 0);
        p.hole_cards = Some(hole);
        p.status = status;
        p
    }

    #[test]
    fn sole_survivor_wins_everything_by_default() {
        let winner = player_with_hand("p1", 0, (c(Two, Hearts), c(Three, Hearts)), PlayerStatus::Active);
        let folded = player_with_hand("p2", 1, (c(Ace, Spades), c(Ace, Diamonds)), PlayerStatus::Folded);
        let players = vec![&winner, &folded];
        let pots = PotPartition {
            main: PotLayer {
                amount: 100,
                eligible_player_ids: vec!["p1".into()],
            },
            side: vec![],
        };
        let winners = distribute(&pots, &players, &[], 0, 2);
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].amount, 100);
        assert_eq!(winners[0].hand_rank_name, DEFAULT_WIN_LABEL);
    }

    #[test]
    fn scenario_s1_three_way_simple_pot() {
        let community = vec![c(Ace, Spades), c(King, Diamonds), c(Queen, Hearts), c(Seven, Clubs), c(Two, Spades)];
        let p1 = player_with_hand("p1", 0, (c(Ace, Hearts), c(Ace, Diamonds)), PlayerStatus::Active);
        let p2 = player_with_hand("p2", 1, (c(King, Spades), c(King, Hearts)), PlayerStatus::Active);
        let p3 = player_with_hand("p3", 2, (c(Queen, Clubs), c(Jack, Clubs)), PlayerStatus::Active);
        let players = vec![&p1, &p2, &p3];
        let pots = PotPartition {
            main: PotLayer {
                amount: 60,
                eligible_player_ids: vec!["p1".into(), "p2".into(), "p3".into()],
            },
            side: vec![],
        };
        let winners = distribute(&pots, &players, &community, 0, 3);
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].player_id, "p1");
        assert_eq!(winners[0].amount, 60);
        assert_eq!(winners[0].hand_rank_name, "Three of a Kind");
    }

    #[test]
    fn odd_chip_goes_to_tied_player_left_of_dealer() {
        // Two players tie on the same board with the same hole-card rank;
        // pot of 101 chips must hand the extra chip to whoever sits closer
        // to the left of the dealer button.
        let community = vec![c(Two, Clubs), c(Seven, Diamonds), c(Nine, Hearts), c(Jack, Spades), c(King, Clubs)];
        let p0 = player_with_hand("dealer", 0, (c(Three, Hearts), c(Four, Hearts)), PlayerStatus::Active);
        let p1 = player_with_hand("left_of_dealer", 1, (c(Three, Spades), c(Four, Spades)), PlayerStatus::Active);
        let p2 = player_with_hand("two_left", 2, (c(Three, Clubs), c(Four, Clubs)), PlayerStatus::Active);
        let players = vec![&p0, &p1, &p2];
        let pots = PotPartition {
            main: PotLayer {
                amount: 101,
                eligible_player_ids: vec!["dealer".into(), "left_of_dealer".into(), "two_left".into()],
            },
            side: vec![],
        };
        let winners = distribute(&pots, &players, &community, 0, 3);
        assert_eq!(winners.len(), 3);
        let left = winners.iter().find(|w| w.player_id == "left_of_dealer").unwrap();
        assert_eq!(left.amount, 34, "closest seat left of the button absorbs the odd chip");
        let two_left = winners.iter().find(|w| w.player_id == "two_left").unwrap();
        assert_eq!(two_left.amount, 34, "second tied seat also absorbs a remainder chip");
        let dealer = winners.iter().find(|w| w.player_id == "dealer").unwrap();
        assert_eq!(dealer.amount, 33, "dealer's own seat is served remainder chips last");
        let total: u64 = winners.iter().map(|w| w.amount).sum();
        assert_eq!(total, 101);
    }

    #[test]
    fn scenario_s2_side_pots_distribute_independently() {
        let community = vec![c(King, Hearts), c(King, Diamonds), c(Nine, Hearts), c(Nine, Diamonds), c(Seven, Clubs)];
        // p1 rivers quad kings but is all-in and only eligible for the main pot.
        let p1 = player_with_hand("p1", 0, (c(King, Clubs), c(King, Spades)), PlayerStatus::AllIn);
        let p2 = player_with_hand("p2", 1, (c(Two, Hearts), c(Three, Clubs)), PlayerStatus::Active);
        let p3 = player_with_hand("p3", 2, (c(Jack, Hearts), c(Jack, Clubs)), PlayerStatus::Active);
        // p4 rivers quad nines, the best hand eligible for either side pot.
        let p4 = player_with_hand("p4", 3, (c(Nine, Spades), c(Nine, Clubs)), PlayerStatus::Active);
        let players = vec![&p1, &p2, &p3, &p4];
        let pots = PotPartition {
            main: PotLayer {
                amount: 200,
                eligible_player_ids: vec!["p1".into(), "p2".into(), "p3".into(), "p4".into()],
            },
            side: vec![
                PotLayer {
                    amount: 150,
                    eligible_player_ids: vec!["p2".into(), "p3".into(), "p4".into()],
                },
                PotLayer {
                    amount: 200,
                    eligible_player_ids: vec!["p3".into(), "p4".into()],
                },
            ],
        };
        let winners = distribute(&pots, &players, &community, 0, 4);
        let p1_winnings = winners.iter().find(|w| w.player_id == "p1").unwrap();
        assert_eq!(p1_winnings.amount, 200, "p1 only wins the main pot");
        let p4_winnings = winners.iter().find(|w| w.player_id == "p4").unwrap();
        assert_eq!(p4_winnings.amount, 350, "p4 has quad nines, wins both side pots");
        assert!(winners.iter().all(|w| w.player_id != "p2"));
    }
}
