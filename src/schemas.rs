use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::ValidationError, money::Money};

pub type MemberId = String;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Member {
    pub id: MemberId,
    pub display_name: String,
}

impl Member {
    pub fn new(id: impl Into<MemberId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Trip {
    pub id: String,
    pub name: String,
    pub members: Vec<Member>,
    /// Members who left the trip. Their expenses stay on record.
    #[serde(default)]
    pub former_members: Vec<Member>,
    pub expenses: Vec<Expense>,
}

impl Trip {
    pub fn new(id: impl Into<String>, name: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            members,
            former_members: vec![],
            expenses: vec![],
        }
    }

    pub fn is_member(&self, member_id: &str) -> bool {
        self.members.iter().any(|m| m.id == member_id)
    }

    /// Looks a member up in the current roster, then among former members.
    pub fn find_member(&self, member_id: &str) -> Option<&Member> {
        self.members
            .iter()
            .chain(self.former_members.iter())
            .find(|m| m.id == member_id)
    }

    /// Total spent on the trip once an expense of `amount` is added. Fails
    /// rather than let the total leave the range balances are kept in.
    pub fn total_with(&self, amount: Money) -> Result<Money, ValidationError> {
        self.expenses
            .iter()
            .try_fold(amount, |total, e| total.checked_add(e.amount))
            .ok_or_else(|| ValidationError::InvalidAmount("trip total is too large".to_string()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Transport,
    Accommodation,
    Activities,
    Shopping,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Transport,
        Category::Accommodation,
        Category::Activities,
        Category::Shopping,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Food => "Food & Dining",
            Category::Transport => "Transportation",
            Category::Accommodation => "Accommodation",
            Category::Activities => "Activities",
            Category::Shopping => "Shopping",
            Category::Other => "Other",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    Equal,
    Custom,
    Percentage,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Share {
    pub member_id: MemberId,
    pub share_amount: Money,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount: Money,
    #[serde(default)]
    pub category: Category,
    pub payer_id: MemberId,
    pub split_policy: SplitPolicy,
    pub shares: Vec<Share>,
    pub created_at: DateTime<Utc>,
}
