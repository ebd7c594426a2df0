//! Expense splitting and balance reconciliation for shared trips.
//!
//! The core ([`split`], [`balance`], [`exchange`], [`report`]) is pure and
//! works on in-memory snapshots of a trip. [`store`] and the binary wrap it in
//! a small HTTP service backed by MongoDB.

pub mod balance;
pub mod error;
pub mod exchange;
pub mod money;
pub mod report;
pub mod schemas;
pub mod settings;
pub mod split;
pub mod store;

pub use balance::{reconcile, total_net, Balance, DepartedMembers};
pub use error::{ServerError, ValidationError};
pub use exchange::{settle, Exchange};
pub use money::{EnteredAmount, Money, Percentage};
pub use report::ExpenseReport;
pub use schemas::{Category, Expense, Member, MemberId, Share, SplitPolicy, Trip};
pub use split::{calculate_shares, validate_payer, NewExpense, SplitInput};
