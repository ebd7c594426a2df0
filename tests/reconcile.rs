use tripmate::{
    calculate_shares, reconcile, settle, split::CustomAmount, split::PercentageShare,
    total_net, Balance, DepartedMembers, EnteredAmount, Expense, ExpenseReport, Member, Money,
    NewExpense, Percentage, SplitInput, Trip, ValidationError,
};

fn roster() -> Vec<Member> {
    vec![
        Member::new("A", "Ana"),
        Member::new("B", "Ben"),
        Member::new("C", "Cleo"),
    ]
}

fn money(major: f64) -> Money {
    Money::from_major(major).unwrap()
}

fn record(payer: &str, amount: f64, split: SplitInput, roster: &[Member]) -> Expense {
    NewExpense {
        description: format!("paid by {payer}"),
        amount: money(amount),
        category: Default::default(),
        paid_by: payer.to_string(),
        split,
    }
    .record(roster)
    .unwrap()
}

fn equal(members: &[&str]) -> SplitInput {
    SplitInput::Equal {
        members: members.iter().map(|m| m.to_string()).collect(),
    }
}

fn percentages(values: &[(&str, f64)]) -> SplitInput {
    SplitInput::Percentage {
        percentages: values
            .iter()
            .map(|(id, pct)| PercentageShare {
                member_id: id.to_string(),
                percentage: Percentage::from_percent(*pct).unwrap(),
            })
            .collect(),
    }
}

fn custom(values: &[(&str, f64)]) -> SplitInput {
    SplitInput::Custom {
        amounts: values
            .iter()
            .map(|(id, amount)| CustomAmount {
                member_id: id.to_string(),
                amount: EnteredAmount::from_major(*amount).unwrap(),
            })
            .collect(),
    }
}

fn nets(balances: &[Balance]) -> Vec<(&str, Money)> {
    balances
        .iter()
        .map(|b| (b.member_id.as_str(), b.net))
        .collect()
}

#[test]
fn equal_then_percentage_scenario() {
    let roster = roster();
    let dinner = record("A", 90.0, equal(&["A", "B", "C"]), &roster);
    assert!(dinner.shares.iter().all(|s| s.share_amount == money(30.0)));

    let balances = reconcile(&roster, &[dinner.clone()], DepartedMembers::Include);
    assert_eq!(
        nets(&balances),
        vec![("A", money(60.0)), ("B", money(-30.0)), ("C", money(-30.0))]
    );
    assert_eq!(total_net(&balances), Money::ZERO);

    let hotel = record(
        "B",
        100.0,
        percentages(&[("A", 50.0), ("B", 30.0), ("C", 20.0)]),
        &roster,
    );
    let shares: Vec<Money> = hotel.shares.iter().map(|s| s.share_amount).collect();
    assert_eq!(shares, vec![money(50.0), money(30.0), money(20.0)]);

    let balances = reconcile(&roster, &[dinner, hotel], DepartedMembers::Include);
    assert_eq!(
        nets(&balances),
        vec![("A", money(10.0)), ("B", money(40.0)), ("C", money(-50.0))]
    );
    assert_eq!(total_net(&balances), Money::ZERO);
}

#[test]
fn custom_split_short_of_total_is_rejected() {
    let split = custom(&[("A", 20.0), ("B", 20.0), ("C", 5.0)]);
    let err = calculate_shares(money(50.0), &split, &roster()).unwrap_err();
    assert!(matches!(err, ValidationError::SplitMismatch(_)));
}

#[test]
fn percentages_must_total_exactly_one_hundred() {
    let roster = roster();
    for (total, accepted) in [(99.99, false), (100.0, true), (100.01, false)] {
        let split = percentages(&[("A", 40.0), ("B", 40.0), ("C", total - 80.0)]);
        let result = calculate_shares(money(123.45), &split, &roster);
        assert_eq!(result.is_ok(), accepted, "total {total}");
        if let Err(err) = result {
            assert!(matches!(err, ValidationError::SplitMismatch(_)));
        }
    }
}

#[test]
fn thirds_typed_to_three_decimals_are_accepted() {
    let roster = roster();
    let thirds = [("A", 33.333), ("B", 33.333), ("C", 33.334)];
    for split in [percentages(&thirds), custom(&thirds)] {
        let expense = record("A", 100.0, split, &roster);
        let shares: Vec<Money> = expense.shares.iter().map(|s| s.share_amount).collect();
        assert_eq!(shares, vec![money(33.33), money(33.33), money(33.34)]);
    }

    for total in [99.99, 100.01] {
        let near = [("A", 33.333), ("B", 33.333), ("C", total - 66.666)];
        for split in [percentages(&near), custom(&near)] {
            let err = calculate_shares(money(100.0), &split, &roster).unwrap_err();
            assert!(matches!(err, ValidationError::SplitMismatch(_)), "total {total}");
        }
    }
}

#[test]
fn uneven_amounts_never_drift() {
    let roster = roster();
    let mut expenses = Vec::new();
    for (i, cents) in [1, 2, 10, 100, 9_999, 10_001, 33_333].into_iter().enumerate() {
        let payer = &roster[i % roster.len()].id;
        let amount = Money::from_cents(cents);
        for split in [
            equal(&["A", "B", "C"]),
            equal(&["B", "C"]),
            percentages(&[("A", 33.33), ("B", 33.33), ("C", 33.34)]),
            percentages(&[("C", 12.5), ("A", 87.5)]),
        ] {
            let expense = record(payer, amount.to_major(), split, &roster);
            let sum: Money = expense.shares.iter().map(|s| s.share_amount).sum();
            assert_eq!(sum, amount);
            expenses.push(expense);
        }
    }

    let first = reconcile(&roster, &expenses, DepartedMembers::Include);
    let second = reconcile(&roster, &expenses, DepartedMembers::Include);
    assert_eq!(first, second);
    assert_eq!(total_net(&first), Money::ZERO);

    let exchanges = settle(&expenses, &first);
    let moved: Money = exchanges.iter().map(|e| e.amount).sum();
    let owed: Money = first.iter().filter(|b| b.net.is_negative()).map(|b| -b.net).sum();
    assert_eq!(moved, owed);
}

#[test]
fn departed_member_keeps_history() {
    let mut trip = Trip::new("lisbon", "Lisbon", roster());
    trip.expenses
        .push(record("C", 60.0, equal(&["A", "B", "C"]), &trip.members));

    let cleo = trip.members.remove(2);
    trip.former_members.push(cleo);

    let balances = reconcile(&trip.members, &trip.expenses, DepartedMembers::Include);
    assert_eq!(
        nets(&balances),
        vec![("A", money(-20.0)), ("B", money(-20.0)), ("C", money(40.0))]
    );
    assert!(!balances[2].in_roster);

    let active = reconcile(&trip.members, &trip.expenses, DepartedMembers::Exclude);
    assert_eq!(nets(&active), vec![("A", money(-20.0)), ("B", money(-20.0))]);

    let report = ExpenseReport::from_trip(&trip);
    assert_eq!(report.people[2].name, "Cleo");
    assert_eq!(report.exchanges.len(), 2);

    // She can no longer be picked for new expenses.
    let err = calculate_shares(money(10.0), &equal(&["A", "C"]), &trip.members).unwrap_err();
    assert_eq!(err, ValidationError::UnknownMember("C".to_string()));
}
