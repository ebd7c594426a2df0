use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    money::Money,
    schemas::{Expense, Member, MemberId, Trip},
};

/// What to do with amounts that reference someone no longer on the roster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartedMembers {
    /// Keep counting them, reported as extra balances after the roster.
    #[default]
    Include,
    /// Drop their amounts entirely.
    Exclude,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Balance {
    pub member_id: MemberId,
    pub paid: Money,
    pub owed: Money,
    /// `paid - owed`: positive when the group owes this member.
    pub net: Money,
    pub in_roster: bool,
}

impl Balance {
    fn empty(member_id: MemberId, in_roster: bool) -> Self {
        Self {
            member_id,
            paid: Money::ZERO,
            owed: Money::ZERO,
            net: Money::ZERO,
            in_roster,
        }
    }
}

/// Folds `expenses` into one balance per member.
///
/// Roster members come first and in roster order, including members absent
/// from every expense. Ids outside the roster follow in the order they are
/// first met, unless `departed` excludes them.
pub fn reconcile(
    roster: &[Member],
    expenses: &[Expense],
    departed: DepartedMembers,
) -> Vec<Balance> {
    let mut ledger = Ledger::new(roster, departed);
    for expense in expenses {
        if let Some(balance) = ledger.entry(&expense.payer_id) {
            balance.paid += expense.amount;
        }
        for share in &expense.shares {
            if let Some(balance) = ledger.entry(&share.member_id) {
                balance.owed += share.share_amount;
            }
        }
    }

    let mut balances = ledger.balances;
    for balance in &mut balances {
        balance.net = balance.paid - balance.owed;
    }
    balances
}

struct Ledger {
    balances: Vec<Balance>,
    index: HashMap<MemberId, usize>,
    departed: DepartedMembers,
}

impl Ledger {
    fn new(roster: &[Member], departed: DepartedMembers) -> Self {
        let mut ledger = Self {
            balances: Vec::with_capacity(roster.len()),
            index: HashMap::with_capacity(roster.len()),
            departed,
        };
        for member in roster {
            ledger.push(&member.id, true);
        }
        ledger
    }

    fn push(&mut self, member_id: &MemberId, in_roster: bool) -> usize {
        if let Some(&i) = self.index.get(member_id) {
            return i;
        }
        self.balances.push(Balance::empty(member_id.clone(), in_roster));
        let i = self.balances.len() - 1;
        self.index.insert(member_id.clone(), i);
        i
    }

    fn entry(&mut self, member_id: &MemberId) -> Option<&mut Balance> {
        let i = match self.index.get(member_id) {
            Some(&i) => i,
            None if self.departed == DepartedMembers::Include => self.push(member_id, false),
            None => return None,
        };
        self.balances.get_mut(i)
    }
}

pub fn compute_balance_from_trip(trip: &Trip, departed: DepartedMembers) -> Vec<Balance> {
    reconcile(&trip.members, &trip.expenses, departed)
}

/// Sum of every net balance. Zero whenever departed members are included.
pub fn total_net(balances: &[Balance]) -> Money {
    balances.iter().map(|b| b.net).sum()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::schemas::{Category, Share, SplitPolicy};

    fn roster() -> Vec<Member> {
        vec![
            Member::new("a", "Alice"),
            Member::new("b", "Bob"),
            Member::new("c", "Carol"),
        ]
    }

    fn expense(payer: &str, amount: i64, shares: &[(&str, i64)]) -> Expense {
        Expense {
            id: format!("{payer}-{amount}"),
            description: "dinner".to_string(),
            amount: Money::from_cents(amount),
            category: Category::Food,
            payer_id: payer.to_string(),
            split_policy: SplitPolicy::Custom,
            shares: shares
                .iter()
                .map(|(id, cents)| Share {
                    member_id: id.to_string(),
                    share_amount: Money::from_cents(*cents),
                })
                .collect(),
            created_at: Utc::now(),
        }
    }

    fn nets(balances: &[Balance]) -> Vec<(&str, i64)> {
        balances
            .iter()
            .map(|b| (b.member_id.as_str(), b.net.cents()))
            .collect()
    }

    #[test]
    fn idle_members_have_zero_balance() {
        let balances = reconcile(&roster(), &[], DepartedMembers::Include);
        assert_eq!(nets(&balances), vec![("a", 0), ("b", 0), ("c", 0)]);
        assert!(balances.iter().all(|b| b.in_roster));
    }

    #[test]
    fn paid_and_owed_are_folded() {
        let expenses = vec![
            expense("a", 9000, &[("a", 3000), ("b", 3000), ("c", 3000)]),
            expense("b", 10_000, &[("a", 5000), ("b", 3000), ("c", 2000)]),
        ];
        let balances = reconcile(&roster(), &expenses, DepartedMembers::Include);
        assert_eq!(nets(&balances), vec![("a", 1000), ("b", 4000), ("c", -5000)]);
        assert_eq!(balances[1].paid.cents(), 10_000);
        assert_eq!(balances[1].owed.cents(), 6000);
        assert_eq!(total_net(&balances), Money::ZERO);
    }

    #[test]
    fn departed_payer_is_kept_by_default() {
        let expenses = vec![expense("d", 4000, &[("a", 2000), ("d", 2000)])];
        let balances = reconcile(&roster(), &expenses, DepartedMembers::Include);
        assert_eq!(
            nets(&balances),
            vec![("a", -2000), ("b", 0), ("c", 0), ("d", 2000)]
        );
        assert!(!balances[3].in_roster);
        assert_eq!(total_net(&balances), Money::ZERO);
    }

    #[test]
    fn departed_payer_can_be_excluded() {
        let expenses = vec![expense("d", 4000, &[("a", 2000), ("d", 2000)])];
        let balances = reconcile(&roster(), &expenses, DepartedMembers::Exclude);
        assert_eq!(nets(&balances), vec![("a", -2000), ("b", 0), ("c", 0)]);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let expenses = vec![
            expense("c", 1001, &[("a", 333), ("b", 334), ("c", 334)]),
            expense("e", 500, &[("e", 250), ("b", 250)]),
        ];
        let first = reconcile(&roster(), &expenses, DepartedMembers::Include);
        let second = reconcile(&roster(), &expenses, DepartedMembers::Include);
        assert_eq!(first, second);
    }
}
