use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use chrono::{DateTime, FixedOffset};
use derive_new::new;
use std::collections::{BinaryHeap, HashSet};

/// Lazy walk over the ancestors of a commit
///
/// Commits are yielded in reverse-chronological topological order: the walk is
/// seeded at the start commit and parents only enter the queue once one of
/// their descendants has been yielded, so a commit never precedes a
/// descendant. Merge commits fan the walk out over every parent.
///
/// The iterator is finite and not restartable mid-flight; build a new one to
/// walk again.
#[derive(Clone, new)]
pub struct RevList<'r> {
    repository: &'r Repository,
    start_oid: ObjectId,
}

impl<'r> RevList<'r> {
    pub fn into_iter(self) -> anyhow::Result<RevListIter<'r>> {
        let start = self
            .repository
            .database()
            .load_slim_commit(&self.start_oid)?;

        let mut queue = BinaryHeap::new();
        queue.push(QueueEntry {
            timestamp: start.timestamp,
            oid: start.oid.clone(),
        });

        Ok(RevListIter {
            repository: self.repository,
            queue,
            seen: HashSet::from([start.oid]),
        })
    }
}

/// Queue slot ordered by (timestamp, id) so the heap pops the newest commit
/// first and residual timestamp ties stay deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QueueEntry {
    timestamp: DateTime<FixedOffset>,
    oid: ObjectId,
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.oid.cmp(&other.oid))
    }
}

pub struct RevListIter<'r> {
    repository: &'r Repository,
    queue: BinaryHeap<QueueEntry>,
    seen: HashSet<ObjectId>,
}

impl Iterator for RevListIter<'_> {
    type Item = anyhow::Result<(ObjectId, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.queue.pop()?;

        let commit = match self
            .repository
            .database()
            .parse_object_as_commit(&entry.oid)
        {
            Ok(Some(commit)) => commit,
            Ok(None) => {
                self.queue.clear();
                return Some(Err(anyhow::anyhow!(
                    "object {} is not a commit",
                    entry.oid
                )));
            }
            Err(error) => {
                self.queue.clear();
                return Some(Err(error));
            }
        };

        for parent in commit.parents() {
            if !self.seen.insert(parent.clone()) {
                continue;
            }

            match self.repository.database().load_slim_commit(parent) {
                Ok(slim) => self.queue.push(QueueEntry {
                    timestamp: slim.timestamp,
                    oid: slim.oid,
                }),
                Err(error) => {
                    self.queue.clear();
                    return Some(Err(error));
                }
            }
        }

        Some(Ok((entry.oid, commit)))
    }
}
