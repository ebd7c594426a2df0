use std::collections::BTreeMap;
use std::mem::swap;

use serde::{Deserialize, Serialize};

use crate::balance::{compute_balance_from_trip, Balance, DepartedMembers};
use crate::money::Money;
use crate::schemas::{Expense, MemberId, Trip};

#[derive(Clone, Debug, PartialEq, Eq)]
struct PersonalBalance {
    id: MemberId,
    amount: Money,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
struct MemberPair {
    member1: MemberId,
    member2: MemberId,
}

/// A payment from `payer` to `receiver` that settles part of the trip.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Exchange {
    pub payer: MemberId,
    pub receiver: MemberId,
    pub amount: Money,
}

// The exchanges that will be made if no simplification happens
fn get_naive_exchanges(expenses: &[Expense]) -> Vec<Exchange> {
    let mut balances_between_people: BTreeMap<MemberPair, Money> = BTreeMap::new();

    for expense in expenses {
        for share in &expense.shares {
            if share.member_id == expense.payer_id || share.share_amount.is_zero() {
                continue;
            }
            let mut pair = MemberPair {
                member1: expense.payer_id.clone(),
                member2: share.member_id.clone(),
            };
            let mut amount = share.share_amount;

            // Alphabetical order keeps every debt between the same two
            // members in one direction
            if pair.member1 > pair.member2 {
                swap(&mut pair.member1, &mut pair.member2);
                amount = -amount;
            }

            *balances_between_people.entry(pair).or_default() += amount;
        }
    }

    // A positive balance means member2 owes member1
    balances_between_people
        .into_iter()
        .filter(|(_, balance)| !balance.is_zero())
        .map(|(pair, balance)| {
            let mut payer = pair.member2;
            let mut receiver = pair.member1;
            if balance.is_negative() {
                swap(&mut payer, &mut receiver);
            }
            Exchange {
                payer,
                receiver,
                amount: balance.abs(),
            }
        })
        .collect()
}

// Largest debtor pays largest creditor until everybody is square
fn get_simplified_exchanges(
    mut payers: Vec<PersonalBalance>,
    mut receivers: Vec<PersonalBalance>,
) -> Vec<Exchange> {
    let order = |a: &PersonalBalance, b: &PersonalBalance| {
        a.amount.cmp(&b.amount).then_with(|| b.id.cmp(&a.id))
    };
    payers.sort_by(order);
    receivers.sort_by(order);

    let mut exchanges = Vec::new();

    loop {
        let (Some(payer), Some(receiver)) = (payers.last_mut(), receivers.last_mut()) else {
            break;
        };
        let amount = payer.amount.min(receiver.amount);
        exchanges.push(Exchange {
            payer: payer.id.clone(),
            receiver: receiver.id.clone(),
            amount,
        });
        payer.amount -= amount;
        receiver.amount -= amount;
        if payer.amount.is_zero() {
            payers.pop();
        }
        if receiver.amount.is_zero() {
            receivers.pop();
        }
    }
    exchanges
}

/// Payments that bring every balance back to zero.
///
/// `balances` must include departed members so that they sum to zero.
pub fn settle(expenses: &[Expense], balances: &[Balance]) -> Vec<Exchange> {
    // Divide people into payers and receivers
    let mut payers = Vec::new();
    let mut receivers = Vec::new();

    for balance in balances {
        let person = PersonalBalance {
            id: balance.member_id.clone(),
            amount: balance.net.abs(),
        };
        if balance.net.is_negative() {
            payers.push(person);
        } else if balance.net.is_positive() {
            receivers.push(person);
        }
    }

    let naive_exchanges = get_naive_exchanges(expenses);
    let simplified_exchanges = get_simplified_exchanges(payers, receivers);

    // We ensure the simplification didn't accidentally end up being
    // more complicated than the naive exchanges
    if simplified_exchanges.len() <= naive_exchanges.len() {
        simplified_exchanges
    } else {
        naive_exchanges
    }
}

pub fn get_exchanges_from_trip(trip: &Trip) -> Vec<Exchange> {
    let balances = compute_balance_from_trip(trip, DepartedMembers::Include);
    settle(&trip.expenses, &balances)
}
