use std::collections::HashMap;

use crate::classifier::thread_key;
use crate::models::{NotificationGroup, NotificationRecord};

/// Fold a flat record history into one display group per thread, newest thread first.
///
/// The representative of a thread is its latest record; among records sharing
/// the maximum timestamp the last one encountered wins. Threads with equal
/// latest timestamps keep the order in which they first appeared.
pub fn group_for_display(records: &[NotificationRecord]) -> Vec<NotificationGroup> {
    let mut partitions: Vec<(String, Vec<&NotificationRecord>)> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = thread_key(record);
        match index_by_key.get(&key) {
            Some(&idx) => partitions[idx].1.push(record),
            None => {
                index_by_key.insert(key.clone(), partitions.len());
                partitions.push((key, vec![record]));
            }
        }
    }

    let mut groups: Vec<NotificationGroup> = partitions
        .into_iter()
        .filter_map(|(key, members)| summarize(key, &members))
        .collect();

    // sort_by is stable, so ties keep partition order
    groups.sort_by(|a, b| b.latest_timestamp.cmp(&a.latest_timestamp));
    groups
}

fn summarize(thread_key: String, members: &[&NotificationRecord]) -> Option<NotificationGroup> {
    let latest = members
        .iter()
        .copied()
        .reduce(|best, next| if next.timestamp >= best.timestamp { next } else { best })?;

    Some(NotificationGroup {
        thread_key,
        package_name: latest.package_name.clone(),
        app_name: latest.app_name.clone(),
        title: latest.title.clone(),
        content: latest.content.clone(),
        latest_timestamp: latest.timestamp,
        icon_data: latest.icon_data.clone(),
        total_count: members.len(),
        has_unread: members.iter().any(|r| !r.is_read),
    })
}
