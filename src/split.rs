//! Split policy calculator.
//!
//! Turns an expense total plus the members selected on the expense form into
//! the list of [`Share`]s that gets persisted with the expense. Whatever the
//! policy, the returned shares always add up to the total to the cent.
//!
//! Custom amounts and percentages are checked against the total before any
//! rounding, with half a cent (or half a hundredth of a percent) of slack.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::ValidationError,
    money::{EnteredAmount, Money, Percentage},
    schemas::{Category, Expense, Member, MemberId, Share, SplitPolicy},
};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomAmount {
    pub member_id: MemberId,
    pub amount: EnteredAmount,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PercentageShare {
    pub member_id: MemberId,
    pub percentage: Percentage,
}

/// How the members selected on an expense divide its cost.
///
/// The last listed member absorbs the rounding remainder.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "split_type", rename_all = "snake_case")]
pub enum SplitInput {
    /// Borne entirely by the payer; resolved by [`NewExpense::record`].
    Individual,
    Equal { members: Vec<MemberId> },
    Custom { amounts: Vec<CustomAmount> },
    Percentage { percentages: Vec<PercentageShare> },
}

impl SplitInput {
    /// An expense borne entirely by whoever paid it.
    pub fn individual(payer: impl Into<MemberId>) -> Self {
        Self::Equal {
            members: vec![payer.into()],
        }
    }

    /// Replaces `Individual` with an equal split over `payer` alone.
    pub fn for_payer(self, payer: &str) -> Self {
        match self {
            Self::Individual => Self::individual(payer),
            split => split,
        }
    }

    pub fn policy(&self) -> SplitPolicy {
        match self {
            Self::Individual | Self::Equal { .. } => SplitPolicy::Equal,
            Self::Custom { .. } => SplitPolicy::Custom,
            Self::Percentage { .. } => SplitPolicy::Percentage,
        }
    }

    fn member_ids(&self) -> Vec<&str> {
        match self {
            Self::Individual => vec![],
            Self::Equal { members } => members.iter().map(String::as_str).collect(),
            Self::Custom { amounts } => amounts.iter().map(|a| a.member_id.as_str()).collect(),
            Self::Percentage { percentages } => percentages
                .iter()
                .map(|p| p.member_id.as_str())
                .collect(),
        }
    }
}

/// An expense as entered on the form, before its shares are computed.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewExpense {
    pub description: String,
    pub amount: Money,
    #[serde(default)]
    pub category: Category,
    pub paid_by: MemberId,
    pub split: SplitInput,
}

impl NewExpense {
    /// Validates the request against `roster` and computes its shares.
    pub fn record(self, roster: &[Member]) -> Result<Expense, ValidationError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::MissingField("description".to_string()));
        }
        validate_payer(&self.paid_by, roster)?;
        let split = self.split.for_payer(&self.paid_by);
        let shares = calculate_shares(self.amount, &split, roster)?;

        Ok(Expense {
            id: Uuid::new_v4().to_string(),
            description: description.to_string(),
            amount: self.amount,
            category: self.category,
            payer_id: self.paid_by,
            split_policy: split.policy(),
            shares,
            created_at: Utc::now(),
        })
    }
}

/// Computes the shares of `amount` according to `input`.
///
/// Every selected member must be on `roster`, and appear only once. An
/// `Individual` split has no payer here yet and selects nobody.
pub fn calculate_shares(
    amount: Money,
    input: &SplitInput,
    roster: &[Member],
) -> Result<Vec<Share>, ValidationError> {
    if amount.is_negative() {
        return Err(ValidationError::InvalidAmount(format!(
            "expense amount {amount} is negative"
        )));
    }
    check_selection(&input.member_ids(), roster)?;

    match input {
        SplitInput::Individual => Err(ValidationError::EmptySelection),
        SplitInput::Equal { members } => Ok(equal_shares(amount, members)),
        SplitInput::Custom { amounts } => custom_shares(amount, amounts),
        SplitInput::Percentage { percentages } => percentage_shares(amount, percentages),
    }
}

/// The payer of an expense must be a current member of the trip.
pub fn validate_payer(payer_id: &str, roster: &[Member]) -> Result<(), ValidationError> {
    if roster.iter().any(|m| m.id == payer_id) {
        Ok(())
    } else {
        Err(ValidationError::UnknownMember(payer_id.to_string()))
    }
}

fn check_selection(selected: &[&str], roster: &[Member]) -> Result<(), ValidationError> {
    if selected.is_empty() {
        return Err(ValidationError::EmptySelection);
    }
    let known: HashSet<&str> = roster.iter().map(|m| m.id.as_str()).collect();
    let mut seen = HashSet::with_capacity(selected.len());
    for &member_id in selected {
        if !known.contains(member_id) {
            return Err(ValidationError::UnknownMember(member_id.to_string()));
        }
        if !seen.insert(member_id) {
            return Err(ValidationError::DuplicateMember(member_id.to_string()));
        }
    }
    Ok(())
}

fn equal_shares(amount: Money, members: &[MemberId]) -> Vec<Share> {
    let (piece, remainder) = amount.divide(members.len());
    let last = members.len() - 1;
    members
        .iter()
        .enumerate()
        .map(|(i, member_id)| Share {
            member_id: member_id.clone(),
            share_amount: if i == last { piece + remainder } else { piece },
        })
        .collect()
}

fn custom_shares(amount: Money, amounts: &[CustomAmount]) -> Result<Vec<Share>, ValidationError> {
    if let Some(negative) = amounts.iter().find(|a| a.amount.is_negative()) {
        return Err(ValidationError::InvalidAmount(format!(
            "share of \"{}\" is negative",
            negative.member_id
        )));
    }
    let total: EnteredAmount = amounts.iter().map(|a| a.amount).sum();
    let expected = EnteredAmount::from(amount);
    if (total.micros() - expected.micros()).abs() >= AMOUNT_TOLERANCE {
        return Err(ValidationError::SplitMismatch(format!(
            "shares total {total}, expense is {amount}"
        )));
    }
    Ok(absorb_last(
        amount,
        amounts.iter().map(|a| (&a.member_id, a.amount.to_money())),
    ))
}

fn percentage_shares(
    amount: Money,
    percentages: &[PercentageShare],
) -> Result<Vec<Share>, ValidationError> {
    let total: u64 = percentages.iter().map(|p| p.percentage.micros()).sum();
    if total.abs_diff(Percentage::HUNDRED.micros()) >= PERCENTAGE_TOLERANCE {
        return Err(ValidationError::SplitMismatch(format!(
            "percentages total {}, expected 100.00%",
            Percentage::from_micros(total)
        )));
    }
    // Floored, so every share but the last can only undershoot.
    Ok(absorb_last(
        amount,
        percentages
            .iter()
            .map(|p| (&p.member_id, amount.portion(p.percentage))),
    ))
}

/// Half a cent, in millionths of a major unit.
const AMOUNT_TOLERANCE: i128 = 5_000;

/// Half a hundredth of a percent, in millionths of a percent.
const PERCENTAGE_TOLERANCE: u64 = 5_000;

/// Hands out `amount` in list order: each member gets its rounded share,
/// capped at what is left, and the last one gets whatever remains.
fn absorb_last<'a>(
    amount: Money,
    rounded: impl ExactSizeIterator<Item = (&'a MemberId, Money)>,
) -> Vec<Share> {
    let last = rounded.len().saturating_sub(1);
    let mut allocated = Money::ZERO;
    let mut shares = Vec::with_capacity(rounded.len());
    for (i, (member_id, share_amount)) in rounded.enumerate() {
        let left = amount - allocated;
        let share_amount = if i == last { left } else { share_amount.min(left) };
        allocated += share_amount;
        shares.push(Share {
            member_id: member_id.clone(),
            share_amount,
        });
    }
    shares
}
