//! Keeps a batch listing from "losing" enrolled students.
//!
//! Listings that were not asked to populate `enrolledStudents` come back
//! without it, or with a partial list. Rather than wiping what the client
//! already knew, the fresh batches get the missing enrollments restored from
//! the previous listing. This compensates for the API populating the
//! relationship only on some calls; pass `force_refresh` to skip it.

use std::collections::{HashMap, HashSet};

use crate::model::{Batch, EntityId};

/// Merges `incoming` over `previous`.
///
/// The result has exactly the batches of `incoming`, in its order. Only
/// `enrolledStudents` is ever touched, and only ever grown.
pub fn merge_batches(previous: &[Batch], incoming: Vec<Batch>) -> Vec<Batch> {
    if previous.is_empty() {
        return incoming;
    }
    if incoming.is_empty() {
        return previous.to_vec();
    }

    let mut known: HashMap<&EntityId, &Batch> = HashMap::with_capacity(previous.len());
    for batch in previous {
        known.entry(&batch.id).or_insert(batch);
    }

    incoming
        .into_iter()
        .map(|mut batch| {
            if let Some(old) = known.get(&batch.id) {
                restore_enrollment(&mut batch, old);
            }
            batch
        })
        .collect()
}

fn restore_enrollment(batch: &mut Batch, old: &Batch) {
    let Some(old_students) = old
        .enrolled_students
        .as_ref()
        .filter(|students| !students.is_empty())
    else {
        return;
    };

    match batch.enrolled_students.as_mut() {
        None => batch.enrolled_students = Some(old_students.clone()),
        Some(students) if students.len() < old_students.len() => {
            let mut present = students
                .iter()
                .map(|entry| entry.id().clone())
                .collect::<HashSet<_>>();
            for entry in old_students {
                if present.insert(entry.id().clone()) {
                    students.push(entry.clone());
                }
            }
        }
        Some(_) => {}
    }
}
