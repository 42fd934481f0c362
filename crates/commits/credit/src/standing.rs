use chrono::{DateTime, Utc};
use commits_types::{CommitmentRecord, UserHandle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{CreditEngine, CreditValue};

/// Per-user summary.
///
/// `open` counts every uncompleted record; `overdue` is the subset of those
/// past their deadline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStanding {
    pub total: usize,
    pub open: usize,
    pub overdue: usize,
    pub resolved: usize,
    pub credit: CreditValue,
}

impl CreditEngine {
    /// Summarize records per user as of `now`.
    pub fn standing<'a, I>(&self, records: I, now: DateTime<Utc>) -> BTreeMap<UserHandle, UserStanding>
    where
        I: IntoIterator<Item = &'a CommitmentRecord>,
    {
        let mut standings: BTreeMap<UserHandle, UserStanding> = BTreeMap::new();
        for record in records {
            let entry = standings.entry(record.user.clone()).or_default();
            entry.total += 1;
            if record.is_resolved() {
                entry.resolved += 1;
            } else {
                entry.open += 1;
                if record.is_overdue(now) {
                    entry.overdue += 1;
                }
            }
            entry.credit = entry.credit + self.score(record, now);
        }
        standings
    }
}
