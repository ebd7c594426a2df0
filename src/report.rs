//! Expense report for a trip: totals per category, one line per person and
//! the payments that would settle the trip.

use serde::{Deserialize, Serialize};

use crate::{
    balance::{compute_balance_from_trip, DepartedMembers},
    exchange::{settle, Exchange},
    money::Money,
    schemas::{Category, MemberId, Trip},
};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub label: String,
    pub total: Money,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PersonSummary {
    pub member_id: MemberId,
    pub name: String,
    pub paid: Money,
    pub owed: Money,
    pub net: Money,
    pub in_roster: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExpenseReport {
    pub trip_id: String,
    pub trip_name: String,
    pub total: Money,
    pub expense_count: usize,
    /// Only categories with at least one expense, in [`Category::ALL`] order.
    pub by_category: Vec<CategoryTotal>,
    pub people: Vec<PersonSummary>,
    pub exchanges: Vec<Exchange>,
}

impl ExpenseReport {
    pub fn from_trip(trip: &Trip) -> Self {
        let by_category = Category::ALL
            .iter()
            .filter_map(|&category| {
                let (total, count) = trip
                    .expenses
                    .iter()
                    .filter(|e| e.category == category)
                    .fold((Money::ZERO, 0), |(total, count), e| (total + e.amount, count + 1));
                (count > 0).then(|| CategoryTotal {
                    category,
                    label: category.label().to_string(),
                    total,
                    count,
                })
            })
            .collect();

        let balances = compute_balance_from_trip(trip, DepartedMembers::Include);
        let exchanges = settle(&trip.expenses, &balances);
        let people = balances
            .into_iter()
            .map(|b| PersonSummary {
                name: trip
                    .find_member(&b.member_id)
                    .map_or_else(|| b.member_id.clone(), |m| m.display_name.clone()),
                member_id: b.member_id,
                paid: b.paid,
                owed: b.owed,
                net: b.net,
                in_roster: b.in_roster,
            })
            .collect();

        Self {
            trip_id: trip.id.clone(),
            trip_name: trip.name.clone(),
            total: trip.expenses.iter().map(|e| e.amount).sum(),
            expense_count: trip.expenses.len(),
            by_category,
            people,
            exchanges,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::schemas::{Expense, Member, Share, SplitPolicy};

    fn expense(payer: &str, category: Category, cents: i64, with: &str) -> Expense {
        Expense {
            id: format!("{payer}-{cents}"),
            description: category.label().to_string(),
            amount: Money::from_cents(cents),
            category,
            payer_id: payer.to_string(),
            split_policy: SplitPolicy::Equal,
            shares: vec![Share {
                member_id: with.to_string(),
                share_amount: Money::from_cents(cents),
            }],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn report_sums_categories_and_names_people() {
        let mut trip = Trip::new(
            "t1",
            "Kyoto",
            vec![Member::new("a", "Alice"), Member::new("b", "Bob")],
        );
        trip.former_members.push(Member::new("z", "Zoe"));
        trip.expenses = vec![
            expense("a", Category::Food, 1200, "b"),
            expense("b", Category::Food, 800, "a"),
            expense("z", Category::Transport, 500, "a"),
        ];

        let report = ExpenseReport::from_trip(&trip);

        assert_eq!(report.total.cents(), 2500);
        assert_eq!(report.expense_count, 3);
        assert_eq!(
            report
                .by_category
                .iter()
                .map(|c| (c.category, c.total.cents(), c.count))
                .collect::<Vec<_>>(),
            vec![(Category::Food, 2000, 2), (Category::Transport, 500, 1)]
        );
        let category_sum: Money = report.by_category.iter().map(|c| c.total).sum();
        assert_eq!(category_sum, report.total);

        let names: Vec<&str> = report.people.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Zoe"]);
        assert!(!report.people[2].in_roster);
        let net: Money = report.people.iter().map(|p| p.net).sum();
        assert_eq!(net, Money::ZERO);
    }

    #[test]
    fn empty_trip_reports_zero() {
        let trip = Trip::new("t1", "Oslo", vec![Member::new("a", "Alice")]);
        let report = ExpenseReport::from_trip(&trip);
        assert_eq!(report.total, Money::ZERO);
        assert!(report.by_category.is_empty());
        assert!(report.exchanges.is_empty());
        assert_eq!(report.people.len(), 1);
    }
}
