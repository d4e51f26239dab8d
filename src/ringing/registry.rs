use crate::ringing::model::{RingingActions, RingingEntry, ToolId, ToolKind};

/// Currently ringing tools in insertion order.
#[derive(Debug, Default)]
pub struct RingingRegistry {
    entries: Vec<RingingEntry>,
}

impl RingingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing entries win: a second insert under the same id is refused
    /// and the new entry is handed back untouched.
    pub fn insert(&mut self, entry: RingingEntry) -> Result<(), RingingEntry> {
        if self.contains(&entry.tool_id) {
            return Err(entry);
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, tool_id: &ToolId) -> Option<RingingEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| &entry.tool_id == tool_id)?;
        Some(self.entries.remove(index))
    }

    /// Hands out the entry's callbacks, leaving the entry registered with
    /// none bound.
    pub fn take_actions(&mut self, tool_id: &ToolId) -> Option<(ToolKind, RingingActions)> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| &entry.tool_id == tool_id)?;
        Some((entry.kind(), std::mem::take(&mut entry.actions)))
    }

    pub fn get(&self, tool_id: &ToolId) -> Option<&RingingEntry> {
        self.entries.iter().find(|entry| &entry.tool_id == tool_id)
    }

    pub fn contains(&self, tool_id: &ToolId) -> bool {
        self.get(tool_id).is_some()
    }

    /// Most recent `rang_at`; among equal timestamps the earliest inserted
    /// entry wins, as a stable descending sort would leave it first.
    pub fn latest(&self) -> Option<&RingingEntry> {
        self.entries.iter().fold(None, |best, entry| match best {
            Some(current) if current.rang_at >= entry.rang_at => Some(current),
            _ => Some(entry),
        })
    }

    /// Entries of one kind, most recent first, stable for equal timestamps.
    pub fn latest_first(&self, kind: ToolKind) -> Vec<&RingingEntry> {
        let mut matching = self
            .entries
            .iter()
            .filter(|entry| entry.kind() == kind)
            .collect::<Vec<_>>();
        matching.sort_by(|a, b| b.rang_at.cmp(&a.rang_at));
        matching
    }

    pub fn ids(&self) -> Vec<ToolId> {
        self.entries
            .iter()
            .map(|entry| entry.tool_id.clone())
            .collect()
    }

    pub fn drain(&mut self) -> Vec<RingingEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
