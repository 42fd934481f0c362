use std::collections::BTreeMap;

use crate::{CommitmentRecord, UserHandle};

/// Group items by the user of their record.
///
/// Each user's items keep the relative order they had in `items`.
pub fn group_by_user<T, I>(items: I) -> BTreeMap<UserHandle, Vec<T>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<CommitmentRecord>,
{
    let mut groups: BTreeMap<UserHandle, Vec<T>> = BTreeMap::new();
    for item in items {
        let user = item.as_ref().user.clone();
        groups.entry(user).or_default().push(item);
    }
    groups
}
