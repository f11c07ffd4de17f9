//! Read-only views over the events log for listing routes.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::path::Path;

use assure_audit::store::open_log;
use assure_contracts::{AssureError, AssureResult, Record};

/// Read the last `limit` records from the events log, oldest first.
///
/// Scans the whole file and keeps a sliding tail; the log is the only index
/// there is.
pub fn read_last_events(path: &Path, limit: usize) -> AssureResult<Vec<Record>> {
    let file = open_log(path)?;
    let mut items: VecDeque<Record> = VecDeque::with_capacity(limit + 1);

    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(&line).map_err(|e| AssureError::Decode {
            reason: e.to_string(),
        })?;
        items.push_back(record);
        if items.len() > limit {
            items.pop_front();
        }
    }
    Ok(items.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    use assure_audit::Store;
    use assure_contracts::Event;

    fn event(seq: u64) -> Event {
        let mut payload = serde_json::Map::new();
        payload.insert("seq".to_string(), json!(seq));
        Event {
            kind: "trade".to_string(),
            payload,
            ..Event::default()
        }
    }

    #[test]
    fn returns_tail_in_order() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path(), 100).unwrap();
        for i in 0..5 {
            store.append(event(i)).unwrap();
        }

        let items = read_last_events(store.events_path(), 2).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].index, 4);
        assert_eq!(items[1].index, 5);
    }

    #[test]
    fn short_log_returns_everything() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path(), 100).unwrap();
        store.append(event(0)).unwrap();

        let items = read_last_events(store.events_path(), 100).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].index, 1);
    }

    #[test]
    fn missing_log_is_empty() {
        let dir = tempdir().unwrap();
        let items = read_last_events(&dir.path().join("events.log"), 10).unwrap();
        assert!(items.is_empty());
    }
}
