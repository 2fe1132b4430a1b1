use crate::data::country::Country;
use crate::data::persistence::Persistable;
use crate::data::trip::{Trip, TripData};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("trip '{0}' not found")]
    NotFound(String),
    #[error("end date {end} is before start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// One delivery on a subscription: the owner's full trip list, or the error
/// that prevented producing it.
pub type TripSnapshot = Result<Vec<Trip>, StoreError>;

/// Whole-field replacement for an existing trip. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripPatch {
    pub country: Option<Country>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Receiving end of a live trip-list query. Dropping it ends the subscription.
pub struct Subscription {
    id: SubscriptionId,
    rx: Receiver<TripSnapshot>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Everything delivered since the last call, in arrival order.
    pub fn drain(&self) -> Vec<TripSnapshot> {
        self.rx.try_iter().collect()
    }
}

/// Storage collaborator for trip records, scoped by owner.
pub trait TripStore {
    fn create_trip(
        &mut self,
        owner_id: &str,
        country: Country,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<String, StoreError>;

    fn update_trip(&mut self, id: &str, patch: TripPatch) -> Result<(), StoreError>;

    fn delete_trip(&mut self, id: &str) -> Result<(), StoreError>;

    /// Starts a live query. The current snapshot is delivered immediately,
    /// then again after every write that touches `owner_id`.
    fn subscribe_trips(&mut self, owner_id: &str) -> Result<Subscription, StoreError>;

    fn unsubscribe(&mut self, id: SubscriptionId);

    /// Picks up writes made outside this handle and republishes.
    fn refresh(&mut self) {}
}

struct Subscriber {
    id: SubscriptionId,
    owner_id: String,
    tx: Sender<TripSnapshot>,
}

/// `TripStore` backed by `trips.json` in the data directory.
pub struct FileTripStore {
    dir: PathBuf,
    data: TripData,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
}

impl FileTripStore {
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        let data = TripData::load_from(dir)?;
        debug!(dir = %dir.display(), trips = data.trips.len(), "opened trip store");
        Ok(FileTripStore {
            dir: dir.to_path_buf(),
            data,
            subscribers: Vec::new(),
            next_subscription: 0,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Trip> {
        self.data.get(id)
    }

    pub fn trips_for(&self, owner_id: &str) -> Vec<Trip> {
        self.data.for_owner(owner_id)
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Re-reads the file, picking up writes from other sessions. On failure
    /// every subscriber receives the error and the in-memory copy is kept.
    pub fn reload(&mut self) {
        match TripData::load_from(&self.dir) {
            Ok(data) => {
                self.data = data;
                let owners: BTreeSet<String> =
                    self.subscribers.iter().map(|s| s.owner_id.clone()).collect();
                for owner in owners {
                    self.publish(&owner);
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to reload trips");
                let msg = format!("{e:#}");
                self.subscribers.retain(|s| {
                    s.tx
                        .send(Err(StoreError::Storage(anyhow::anyhow!(msg.clone()))))
                        .is_ok()
                });
            }
        }
    }

    /// Persists `next` and only then makes it the current state, so a failed
    /// write leaves the store untouched.
    fn commit(&mut self, next: TripData) -> Result<(), StoreError> {
        next.save_to(&self.dir)?;
        self.data = next;
        Ok(())
    }

    fn publish(&mut self, owner_id: &str) {
        let snapshot = self.data.for_owner(owner_id);
        self.subscribers.retain(|s| {
            if s.owner_id != owner_id {
                return true;
            }
            let alive = s.tx.send(Ok(snapshot.clone())).is_ok();
            if !alive {
                debug!(subscription = s.id.0, "pruned closed subscription");
            }
            alive
        });
    }
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), StoreError> {
    if end < start {
        return Err(StoreError::InvalidRange { start, end });
    }
    Ok(())
}

impl TripStore for FileTripStore {
    fn create_trip(
        &mut self,
        owner_id: &str,
        country: Country,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<String, StoreError> {
        check_range(start_date, end_date)?;
        let id = Uuid::new_v4().to_string();
        let mut next = self.data.clone();
        next.add(Trip::new(&id, owner_id, country, start_date, end_date));
        self.commit(next)?;
        info!(trip_id = %id, owner_id, %country, %start_date, %end_date, "created trip");
        self.publish(owner_id);
        Ok(id)
    }

    fn update_trip(&mut self, id: &str, patch: TripPatch) -> Result<(), StoreError> {
        let mut next = self.data.clone();
        let trip = next
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let start = patch.start_date.unwrap_or(trip.start_date);
        let end = patch.end_date.unwrap_or(trip.end_date);
        check_range(start, end)?;
        trip.start_date = start;
        trip.end_date = end;
        if let Some(country) = patch.country {
            trip.country = country;
        }
        let owner_id = trip.owner_id.clone();
        self.commit(next)?;
        info!(trip_id = id, owner_id = %owner_id, "updated trip");
        self.publish(&owner_id);
        Ok(())
    }

    fn delete_trip(&mut self, id: &str) -> Result<(), StoreError> {
        let mut next = self.data.clone();
        let removed = next
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.commit(next)?;
        info!(trip_id = id, owner_id = %removed.owner_id, "deleted trip");
        self.publish(&removed.owner_id);
        Ok(())
    }

    fn subscribe_trips(&mut self, owner_id: &str) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::channel();
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        // Receiver is held locally, so the first send cannot fail.
        let _ = tx.send(Ok(self.data.for_owner(owner_id)));
        self.subscribers.push(Subscriber {
            id,
            owner_id: owner_id.to_string(),
            tx,
        });
        debug!(subscription = id.0, owner_id, "subscribed to trips");
        Ok(Subscription { id, rx })
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|s| s.id != id);
        debug!(
            subscription = id.0,
            remaining = self.subscribers.len(),
            "unsubscribed from trips"
        );
    }

    fn refresh(&mut self) {
        self.reload();
    }
}
