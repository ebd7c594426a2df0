//! Trips persisted in MongoDB, one document per trip with its roster and
//! expenses embedded.
//!
//! Roster changes are single conditional updates, so two concurrent requests
//! can never both add (or both remove) the same member.

use mongodb::{
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Client, Collection, IndexModel,
};

use crate::{
    error::ServerError,
    schemas::{Expense, Member, Trip},
};

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone, Debug)]
pub struct TripStore {
    trips: Collection<Trip>,
}

impl TripStore {
    /// Opens the `Trips` collection and makes sure trip ids are unique.
    pub async fn connect(client: &Client, database: &str) -> Result<Self, ServerError> {
        let store = Self {
            trips: client.database(database).collection("Trips"),
        };
        let index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        store.trips.create_index(index, None).await?;
        Ok(store)
    }

    pub async fn create_trip(&self, trip: &Trip) -> Result<(), ServerError> {
        match self.trips.insert_one(trip, None).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(ServerError::Conflict(trip.id.clone())),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_trip(&self, trip_id: &str) -> Result<Option<Trip>, ServerError> {
        Ok(self.trips.find_one(doc! { "id": trip_id }, None).await?)
    }

    pub async fn require_trip(&self, trip_id: &str) -> Result<Trip, ServerError> {
        self.find_trip(trip_id)
            .await?
            .ok_or_else(|| ServerError::NotFound(trip_id.to_string()))
    }

    /// Adds `member` to the roster. A former member rejoining is taken off
    /// the former members list.
    pub async fn add_member(&self, trip_id: &str, member: &Member) -> Result<(), ServerError> {
        let result = self
            .trips
            .update_one(
                without_member(trip_id, &member.id),
                doc! {
                    "$push": { "members": bson::to_bson(member)? },
                    "$pull": { "former_members": { "id": member.id.as_str() } },
                },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            self.require_trip(trip_id).await?;
            return Err(ServerError::Conflict(member.id.clone()));
        }
        Ok(())
    }

    /// Moves a member from the roster to the former members. Their expenses
    /// are left untouched.
    pub async fn remove_member(&self, trip_id: &str, member_id: &str) -> Result<Member, ServerError> {
        let trip = self.require_trip(trip_id).await?;
        let member = trip
            .members
            .into_iter()
            .find(|m| m.id == member_id)
            .ok_or_else(|| ServerError::NotFound(member_id.to_string()))?;
        let result = self
            .trips
            .update_one(
                with_member(trip_id, member_id),
                doc! {
                    "$pull": { "members": { "id": member_id } },
                    "$push": { "former_members": bson::to_bson(&member)? },
                },
                None,
            )
            .await?;
        // Someone else removed them in between.
        if result.matched_count == 0 {
            return Err(ServerError::NotFound(member_id.to_string()));
        }
        Ok(member)
    }

    pub async fn push_expense(&self, trip_id: &str, expense: &Expense) -> Result<(), ServerError> {
        let result = self
            .trips
            .update_one(
                doc! { "id": trip_id },
                doc! { "$push": { "expenses": bson::to_bson(expense)? } },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(ServerError::NotFound(trip_id.to_string()));
        }
        Ok(())
    }
}

/// Matches the trip only while `member_id` is on its roster.
fn with_member(trip_id: &str, member_id: &str) -> Document {
    doc! { "id": trip_id, "members.id": member_id }
}

/// Matches the trip only while `member_id` is not on its roster.
fn without_member(trip_id: &str, member_id: &str) -> Document {
    doc! { "id": trip_id, "members.id": { "$ne": member_id } }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}
