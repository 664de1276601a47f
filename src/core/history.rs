/// History log: append-only audit trail of node visits.

use chrono::{DateTime, Utc};

use crate::schema::history::{HistoryEntry, HistoryId};
use crate::schema::node::{ChoiceId, NodeId};
use crate::schema::state::StateId;

/// Ordered record of every (node, choice) visit. There is no update or
/// delete; ids increase with insertion order.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

/// Entries appended on top of a log but not yet part of it.
///
/// An action appends into a stage, persists it, and only then folds it
/// into the log with [`HistoryLog::commit`].
#[derive(Debug, Clone)]
pub struct HistoryStage {
    next_id: u64,
    entries: Vec<HistoryEntry>,
}

impl HistoryStage {
    pub fn append(
        &mut self,
        state_id: StateId,
        node_id: NodeId,
        choice_id: Option<ChoiceId>,
        timestamp: DateTime<Utc>,
    ) -> HistoryEntry {
        let entry = HistoryEntry {
            id: HistoryId(self.next_id),
            state_id,
            node_id,
            choice_id,
            timestamp,
        };
        self.next_id += 1;
        self.entries.push(entry.clone());
        entry
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from persisted entries, in id order.
    pub fn from_entries(mut entries: Vec<HistoryEntry>) -> Self {
        entries.sort_by_key(|e| e.id);
        Self { entries }
    }

    fn next_id(&self) -> u64 {
        self.entries.last().map_or(1, |e| e.id.0 + 1)
    }

    pub fn append(
        &mut self,
        state_id: StateId,
        node_id: NodeId,
        choice_id: Option<ChoiceId>,
        timestamp: DateTime<Utc>,
    ) -> HistoryEntry {
        let mut stage = self.stage();
        let entry = stage.append(state_id, node_id, choice_id, timestamp);
        self.commit(stage);
        entry
    }

    /// Open a stage whose ids continue this log.
    pub fn stage(&self) -> HistoryStage {
        HistoryStage {
            next_id: self.next_id(),
            entries: Vec::new(),
        }
    }

    /// Fold a stage opened on this log into it.
    pub fn commit(&mut self, stage: HistoryStage) {
        debug_assert!(stage
            .entries
            .first()
            .map_or(true, |e| e.id.0 == self.next_id()));
        self.entries.extend(stage.entries);
    }

    pub fn all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// How many times the player arrived at `node_id`.
    pub fn visits_to(&self, node_id: NodeId) -> usize {
        self.entries
            .iter()
            .filter(|e| e.node_id == node_id && e.is_arrival())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn append_assigns_monotonic_ids() {
        let mut log = HistoryLog::new();
        let a = log.append(StateId(1), NodeId(1), None, at(0));
        let b = log.append(StateId(1), NodeId(1), Some(ChoiceId(1)), at(1));
        let c = log.append(StateId(1), NodeId(2), None, at(2));
        assert_eq!(a.id, HistoryId(1));
        assert_eq!(b.id, HistoryId(2));
        assert_eq!(c.id, HistoryId(3));
        assert_eq!(log.len(), 3);
        assert_eq!(log.all()[1].choice_id, Some(ChoiceId(1)));
    }

    #[test]
    fn stage_is_invisible_until_commit() {
        let mut log = HistoryLog::new();
        log.append(StateId(1), NodeId(1), None, at(0));

        let mut stage = log.stage();
        let staged = stage.append(StateId(1), NodeId(1), Some(ChoiceId(2)), at(1));
        assert_eq!(staged.id, HistoryId(2));
        assert_eq!(log.len(), 1);

        log.commit(stage);
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().unwrap().id, HistoryId(2));
    }

    #[test]
    fn dropped_stage_leaves_log_untouched() {
        let mut log = HistoryLog::new();
        log.append(StateId(1), NodeId(1), None, at(0));
        {
            let mut stage = log.stage();
            stage.append(StateId(1), NodeId(3), None, at(1));
        }
        assert_eq!(log.len(), 1);
        let next = log.append(StateId(1), NodeId(2), None, at(2));
        assert_eq!(next.id, HistoryId(2));
    }

    #[test]
    fn visits_count_arrivals_only() {
        let mut log = HistoryLog::new();
        log.append(StateId(1), NodeId(1), None, at(0));
        log.append(StateId(1), NodeId(1), Some(ChoiceId(1)), at(1));
        log.append(StateId(1), NodeId(1), None, at(2));
        assert_eq!(log.visits_to(NodeId(1)), 2);
        assert_eq!(log.visits_to(NodeId(2)), 0);
    }

    #[test]
    fn from_entries_sorts_and_continues_ids() {
        let mut source = HistoryLog::new();
        source.append(StateId(1), NodeId(1), None, at(0));
        source.append(StateId(1), NodeId(2), None, at(1));
        let mut entries = source.all().to_vec();
        entries.reverse();

        let mut log = HistoryLog::from_entries(entries);
        assert_eq!(log.all()[0].id, HistoryId(1));
        let next = log.append(StateId(1), NodeId(3), None, at(2));
        assert_eq!(next.id, HistoryId(3));
    }
}
