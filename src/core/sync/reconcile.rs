use std::sync::Arc;

use crate::models::{Consultation, ConsultationId};

/// Items whose identity can survive a refresh.
pub trait Reconcilable {
    type Key: PartialEq;

    fn key(&self) -> Self::Key;

    /// True when nothing the UI renders for the selection has changed.
    fn same_significant(&self, other: &Self) -> bool;
}

impl Reconcilable for Consultation {
    type Key = ConsultationId;

    fn key(&self) -> ConsultationId {
        self.id
    }

    fn same_significant(&self, other: &Self) -> bool {
        self.id == other.id
            && self.status == other.status
            && self.started_at == other.started_at
            && self.patient_name == other.patient_name
            && self.patient_photo_url == other.patient_photo_url
            && self.doctor_name == other.doctor_name
            && self.doctor_photo_url == other.doctor_photo_url
    }
}

/// Re-points a selection into a freshly fetched collection.
///
/// Keeps the previous `Arc` when its significant fields are unchanged so
/// observers can skip re-rendering, takes the fresh item when they changed,
/// and yields `None` once the item is gone.
pub fn reconcile_selection<T: Reconcilable>(
    previous: Option<&Arc<T>>,
    fresh: &[Arc<T>],
) -> Option<Arc<T>> {
    let previous = previous?;
    let key = previous.key();
    let updated = fresh.iter().find(|item| item.key() == key)?;

    if previous.same_significant(updated) {
        Some(Arc::clone(previous))
    } else {
        Some(Arc::clone(updated))
    }
}

/// Keeps unchanged items of the previous collection, so a poll that returns
/// the same data hands out the same pointers.
pub fn reconcile_collection<T: Reconcilable + PartialEq>(
    previous: &[Arc<T>],
    fresh: Vec<T>,
) -> Vec<Arc<T>> {
    fresh
        .into_iter()
        .map(|item| {
            previous
                .iter()
                .find(|old| old.key() == item.key() && ***old == item)
                .map(Arc::clone)
                .unwrap_or_else(|| Arc::new(item))
        })
        .collect()
}

/// Default pick when nothing is selected yet.
pub fn select_initial<T>(fresh: &[Arc<T>]) -> Option<Arc<T>> {
    fresh.first().cloned()
}
