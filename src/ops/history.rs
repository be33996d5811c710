use crate::model::entry::{Entry, HISTORY_LIMIT, HistoryRecord};

/// History that `next` should carry after replacing `previous`.
///
/// When `password`, `username` or `notes` changed, a record holding the old
/// values of just those fields is prepended, stamped with the previous
/// `updated_at`, and the list is cut to [`HISTORY_LIMIT`]. Otherwise the
/// previous history is returned unchanged.
pub fn record_edit(previous: &Entry, next: &Entry) -> Vec<HistoryRecord> {
    let password = (previous.password != next.password).then(|| previous.password.clone());
    let username = (previous.username != next.username).then(|| previous.username.clone());
    let notes = (previous.notes != next.notes).then(|| previous.notes.clone());

    if password.is_none() && username.is_none() && notes.is_none() {
        return previous.history.clone();
    }

    let mut history = Vec::with_capacity(HISTORY_LIMIT);
    history.push(HistoryRecord {
        timestamp: previous.updated_at,
        password,
        username,
        notes,
    });
    history.extend(previous.history.iter().cloned());
    history.truncate(HISTORY_LIMIT);
    history
}
