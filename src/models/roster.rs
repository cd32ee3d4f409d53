// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Roster derivations: food-status grouping and missed-meal ranking.

use super::User;

/// Users partitioned by food status. Input order is kept within each group.
#[derive(Debug, Default)]
pub struct FoodStatusGroups<'a> {
    pub away: Vec<&'a User>,
    pub eaten: Vec<&'a User>,
    pub not_eaten: Vec<&'a User>,
}

impl<'a> FoodStatusGroups<'a> {
    /// Partition users; away takes precedence over eaten status.
    pub fn from_users(users: &'a [User]) -> Self {
        let mut groups = Self::default();
        for user in users {
            if user.is_away {
                groups.away.push(user);
            } else if user.has_eaten {
                groups.eaten.push(user);
            } else {
                groups.not_eaten.push(user);
            }
        }
        groups
    }
}

/// Entry in the missed-meals ranking.
#[derive(Debug, Clone, Copy)]
pub struct RankedUser<'a> {
    /// 1-based position
    pub rank: usize,
    pub user: &'a User,
}

/// Rank present housemates by missed meals, most first.
///
/// Away users are excluded. Ties keep their roster order.
pub fn rank_by_missed_meals(users: &[User]) -> Vec<RankedUser<'_>> {
    let mut present: Vec<&User> = users.iter().filter(|u| !u.is_away).collect();
    // sort_by is stable
    present.sort_by(|a, b| b.missed_meals_count.cmp(&a.missed_meals_count));
    present
        .into_iter()
        .enumerate()
        .map(|(i, user)| RankedUser { rank: i + 1, user })
        .collect()
}
