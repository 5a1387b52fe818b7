//! # Winner Resolver
//!
//! Total order over a candidate set. The first element of the ordered set is
//! the computed winner for the month.
//!
//! ## Ordering
//!
//! 1. Votes, descending.
//! 2. Credit score, descending.
//! 3. Address, ascending, case-insensitive.
//!
//! Addresses are unique within a candidate set, so step 3 always decides.
//! Two entries with the same address compare `Equal`; the sort is stable and
//! keeps their input order.

use std::cmp::Ordering;

use crate::address::Address;
use crate::candidate::Candidate;

/// Ordered candidate set and its top entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Every input candidate, sorted by [`compare_candidates`].
    pub ordered: Vec<Candidate>,
    /// Address of `ordered[0]`, or `None` for an empty set.
    pub winner: Option<Address>,
}

/// Comparator for the resolution order. `Less` means `a` ranks above `b`.
pub fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.votes
        .cmp(&a.votes)
        .then_with(|| b.credit_score.cmp(&a.credit_score))
        .then_with(|| a.address.cmp(&b.address))
}

/// Sort `candidates` into resolution order and surface the winner.
pub fn resolve(mut candidates: Vec<Candidate>) -> Resolution {
    candidates.sort_by(compare_candidates);
    let winner = candidates.first().map(|c| c.address.clone());
    Resolution {
        ordered: candidates,
        winner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    fn addr(fill: char) -> Address {
        Address::parse(&format!("0x{}", fill.to_string().repeat(40))).unwrap()
    }

    fn cand(fill: char, votes: u64, score: u64) -> Candidate {
        Candidate::new(addr(fill), votes, score)
    }

    fn order(res: &Resolution) -> Vec<Address> {
        res.ordered.iter().map(|c| c.address.clone()).collect()
    }

    #[test]
    fn empty_input_has_no_winner() {
        let res = resolve(Vec::new());
        assert!(res.ordered.is_empty());
        assert_eq!(res.winner, None);
    }

    #[test]
    fn votes_rank_first() {
        let res = resolve(vec![cand('a', 50, 900), cand('b', 100, 1)]);
        assert_eq!(res.winner, Some(addr('b')));
    }

    #[test]
    fn credit_score_breaks_vote_tie() {
        let res = resolve(vec![cand('b', 10, 300), cand('a', 10, 500)]);
        assert_eq!(res.winner, Some(addr('a')));
        assert_eq!(order(&res), vec![addr('a'), addr('b')]);
    }

    #[test]
    fn address_breaks_full_tie() {
        let res = resolve(vec![cand('b', 10, 500), cand('a', 10, 500)]);
        assert_eq!(order(&res), vec![addr('a'), addr('b')]);
    }

    #[test]
    fn address_tie_break_is_case_insensitive() {
        let upper = Candidate::new(
            Address::parse("0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB").unwrap(),
            10u64,
            500u64,
        );
        let lower = Candidate::new(
            Address::parse("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap(),
            10u64,
            500u64,
        );
        let res = resolve(vec![upper, lower]);
        assert_eq!(
            res.winner.unwrap().as_str(),
            "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        );
    }

    #[test]
    fn three_candidate_scenario() {
        let res = resolve(vec![cand('a', 5, 300), cand('b', 5, 700), cand('c', 10, 100)]);
        assert_eq!(order(&res), vec![addr('c'), addr('b'), addr('a')]);
        assert_eq!(res.winner, Some(addr('c')));
    }

    #[test]
    fn compares_values_wider_than_u128() {
        let big = Candidate {
            address: addr('b'),
            votes: U256::from(u128::MAX) + U256::one(),
            credit_score: U256::zero(),
        };
        let small = Candidate {
            address: addr('a'),
            votes: U256::from(u128::MAX),
            credit_score: U256::MAX,
        };
        assert_eq!(resolve(vec![small, big]).winner, Some(addr('b')));
    }

    #[test]
    fn duplicate_addresses_keep_input_order() {
        let first = Candidate::new(
            Address::parse("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").unwrap(),
            1u64,
            1u64,
        );
        let second = Candidate::new(addr('a'), 1u64, 1u64);
        assert_eq!(compare_candidates(&first, &second), Ordering::Equal);
        let res = resolve(vec![first.clone(), second]);
        assert_eq!(res.ordered[0].address.as_str(), first.address.as_str());
    }

    #[test]
    fn zero_votes_are_valid() {
        let res = resolve(vec![cand('a', 0, 0), cand('b', 0, 1)]);
        assert_eq!(res.winner, Some(addr('b')));
    }
}
