//! Pot calculator (C6): partitions per-player total contributions into a
//! main pot plus ordered side pots, each with its own eligibility set.

use serde::{Deserialize, Serialize};

use crate::player::Player;

/// One layer of the pot partition: an amount and the player ids allowed to
/// win it. Folded contributors are excluded from eligibility but their
/// chips still count toward `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotLayer {
    pub amount: u64,
    pub eligible_player_ids: Vec<String>,
}

/// The full partition for a hand: main pot first, side pots in ascending
/// bet-level order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PotPartition {
    pub main: PotLayer,
    pub side: Vec<PotLayer>,
}

impl Default for PotLayer {
    fn default() -> Self {
        PotLayer {
            amount: 0,
            eligible_player_ids: Vec::new(),
        }
    }
}

impl PotPartition {
    pub fn total(&self) -> u64 {
        self.main.amount + self.side.iter().map(|p| p.amount).sum::<u64>()
    }

    /// All layers in payout order (main first, then sides ascending).
    pub fn layers(&self) -> impl Iterator<Item = &PotLayer> {
        std::iter::once(&self.main).chain(self.side.iter())
    }
}

/// Builds the pot partition from every seated player's `total_invested`
/// (§4.6). Order-independent: callers may pass players in any order.
pub fn calculate_pots(players: &[&Player]) -> PotPartition {
    let mut contributors: Vec<&Player> = players.iter().copied().filter(|p| p.total_invested > 0).collect();
    contributors.sort_by_key(|p| p.total_invested);

    let mut layers: Vec<PotLayer> = Vec::new();
    let mut previous_level: u64 = 0;

    let mut levels: Vec<u64> = contributors.iter().map(|p| p.total_invested).collect();
    levels.sort_unstable();
    levels.dedup();

    for level in levels {
        let contributors_at_or_above: Vec<&&Player> = contributors
            .iter()
            .filter(|p| p.total_invested >= level)
            .collect();
        let layer_amount = (level - previous_level) * contributors_at_or_above.len() as u64;
        if layer_amount == 0 {
            previous_level = level;
            continue;
        }
        let eligible_player_ids: Vec<String> = contributors_at_or_above
            .iter()
            .filter(|p| !p.is_folded())
            .map(|p| p.id.clone())
            .collect();
        layers.push(PotLayer {
            amount: layer_amount,
            eligible_player_ids,
        });
        previous_level = level;
    }

    if layers.is_empty() {
        return PotPartition::default();
    }

    let mut layers = layers.into_iter();
    let main = layers.next().unwrap();
    let side: Vec<PotLayer> = layers.collect();
    PotPartition { main, side }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerStatus;

    fn contributor(id: &str, total_invested: u64, status: PlayerStatus) -> Player {
        let mut p = Player::new(id, id, 0, 0);
        p.total_invested = total_invested;
        p.status = status;
        p
    }

    #[test]
    fn equal_bets_collapse_to_main_pot_only() {
        let players = vec![
            contributor("p1", 20, PlayerStatus::Active),
            contributor("p2", 20, PlayerStatus::Active),
            contributor("p3", 20, PlayerStatus::Active),
        ];
        let refs: Vec<&Player> = players.iter().collect();
        let pots = calculate_pots(&refs);
        assert_eq!(pots.main.amount, 60);
        assert!(pots.side.is_empty(), "equal bets must yield no side pots");
        assert_eq!(pots.total(), 60);
    }

    #[test]
    fn scenario_s2_side_pots() {
        // P1=50 (all-in), P2=100, P3=200, P4=200, all active/non-folded.
        let players = vec![
            contributor("p1", 50, PlayerStatus::AllIn),
            contributor("p2", 100, PlayerStatus::Active),
            contributor("p3", 200, PlayerStatus::Active),
            contributor("p4", 200, PlayerStatus::Active),
        ];
        let refs: Vec<&Player> = players.iter().collect();
        let pots = calculate_pots(&refs);

        assert_eq!(pots.main.amount, 200);
        assert_eq!(sorted(&pots.main.eligible_player_ids), vec!["p1", "p2", "p3", "p4"]);

        assert_eq!(pots.side.len(), 2);
        assert_eq!(pots.side[0].amount, 150);
        assert_eq!(sorted(&pots.side[0].eligible_player_ids), vec!["p2", "p3", "p4"]);
        assert_eq!(pots.side[1].amount, 200);
        assert_eq!(sorted(&pots.side[1].eligible_player_ids), vec!["p3", "p4"]);

        assert_eq!(pots.total(), 550);
    }

    #[test]
    fn scenario_s3_folded_contributor_excluded_from_eligibility() {
        let players = vec![
            contributor("p1", 50, PlayerStatus::Folded),
            contributor("p2", 100, PlayerStatus::Active),
            contributor("p3", 100, PlayerStatus::Active),
        ];
        let refs: Vec<&Player> = players.iter().collect();
        let pots = calculate_pots(&refs);

        assert_eq!(pots.main.amount, 150);
        assert_eq!(sorted(&pots.main.eligible_player_ids), vec!["p2", "p3"]);
        assert_eq!(pots.side.len(), 1);
        assert_eq!(pots.side[0].amount, 100);
        assert_eq!(sorted(&pots.side[0].eligible_player_ids), vec!["p2", "p3"]);
        assert_eq!(pots.total(), 250);
    }

    #[test]
    fn total_equals_sum_of_all_contributions_including_folded() {
        let players = vec![
            contributor("p1", 30, PlayerStatus::Folded),
            contributor("p2", 75, PlayerStatus::Active),
            contributor("p3", 75, PlayerStatus::AllIn),
        ];
        let refs: Vec<&Player> = players.iter().collect();
        let pots = calculate_pots(&refs);
        let expected: u64 = players.iter().map(|p| p.total_invested).sum();
        assert_eq!(pots.total(), expected);
    }

    #[test]
    fn order_independence() {
        let a = vec![
            contributor("p1", 50, PlayerStatus::Active),
            contributor("p2", 100, PlayerStatus::Active),
            contributor("p3", 200, PlayerStatus::Active),
        ];
        let mut b = a.clone();
        b.reverse();

        let refs_a: Vec<&Player> = a.iter().collect();
        let refs_b: Vec<&Player> = b.iter().collect();
        assert_eq!(calculate_pots(&refs_a), calculate_pots(&refs_b));
    }

    fn sorted(v: &[String]) -> Vec<String> {
        let mut v = v.to_vec();
        v.sort();
        v
    }
}
