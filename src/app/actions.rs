use thiserror::Error;

use crate::clipboard::{Clipboard, ClipboardError};
use crate::dream::DreamRecord;
use crate::storage::{HistoryRepository, StorageError};
use crate::timefmt;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("dream {0} is not in the loaded list")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The stored record was replaced by this one.
    Updated(DreamRecord),
    /// This record was removed from the stored list.
    Removed(DreamRecord),
    /// The id was absent from the freshly read list; nothing was written.
    Missing,
}

/// Mutations against the stored history. Every call reads the list fresh, applies
/// one change, and writes the whole list back.
pub struct ActionDispatcher<'a> {
    repo: &'a dyn HistoryRepository,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(repo: &'a dyn HistoryRepository) -> Self {
        Self { repo }
    }

    pub fn set_collected(&self, id: &str, collected: bool) -> Result<Outcome, ActionError> {
        self.set_collected_at(id, collected, &timefmt::now_timestamp())
    }

    pub fn set_collected_at(
        &self,
        id: &str,
        collected: bool,
        now: &str,
    ) -> Result<Outcome, ActionError> {
        let mut records = self.repo.load()?;
        let Some(position) = records.iter().position(|record| record.id == id) else {
            tracing::warn!(id = %id, "collect target vanished from storage");
            return Ok(Outcome::Missing);
        };
        let next = records[position].with_collected(collected, now);
        records[position] = next.clone();
        self.repo.save(&records)?;
        tracing::info!(id = %id, collected, "collection flag updated");
        Ok(Outcome::Updated(next))
    }

    /// Removes the first record with `id`. Absent ids leave storage untouched.
    pub fn delete(&self, id: &str) -> Result<Outcome, ActionError> {
        let mut records = self.repo.load()?;
        let Some(position) = records.iter().position(|record| record.id == id) else {
            tracing::warn!(id = %id, "delete target not present in storage");
            return Ok(Outcome::Missing);
        };
        let removed = records.remove(position);
        self.repo.save(&records)?;
        tracing::info!(id = %id, "dream deleted");
        Ok(Outcome::Removed(removed))
    }

    pub fn find(&self, id: &str) -> Result<Option<DreamRecord>, ActionError> {
        Ok(self
            .repo
            .load()?
            .into_iter()
            .find(|record| record.id == id))
    }
}

pub fn share(record: &DreamRecord, clipboard: &mut dyn Clipboard) -> Result<(), ActionError> {
    clipboard.set_text(&record.content)?;
    tracing::info!(id = %record.id, "dream content copied to clipboard");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::storage::MemoryHistory;
    use assert_matches::assert_matches;

    fn history() -> MemoryHistory {
        MemoryHistory::new(vec![
            DreamRecord::new("a", "Paper boats", "poetic", "2024-01-01T00:00:00Z")
                .collected_at("2024-01-02T00:00:00Z"),
            DreamRecord::new("b", "Clockwork owl", "fantasy", "2024-01-03T00:00:00Z"),
            DreamRecord::new("c", "Laughing moon", "humorous", "2024-01-04T00:00:00Z"),
        ])
    }

    #[test]
    fn delete_removes_exactly_one_entry() -> anyhow::Result<()> {
        let repo = history();
        let dispatcher = ActionDispatcher::new(&repo);
        let outcome = dispatcher.delete("b")?;
        assert_matches!(outcome, Outcome::Removed(ref record) if record.id == "b");
        let remaining: Vec<_> = repo.snapshot().into_iter().map(|r| r.id).collect();
        assert_eq!(remaining, vec!["a", "c"]);
        Ok(())
    }

    #[test]
    fn delete_of_absent_id_is_a_no_op() -> anyhow::Result<()> {
        let repo = history();
        let before = repo.snapshot();
        let outcome = ActionDispatcher::new(&repo).delete("zzz")?;
        assert_eq!(outcome, Outcome::Missing);
        assert_eq!(repo.snapshot(), before);
        assert_eq!(repo.save_count(), 0);
        Ok(())
    }

    #[test]
    fn collect_then_uncollect_restores_other_fields() -> anyhow::Result<()> {
        let repo = history();
        let original = repo.snapshot()[1].clone();
        let dispatcher = ActionDispatcher::new(&repo);

        let outcome = dispatcher.set_collected_at("b", true, "2024-02-01T00:00:00Z")?;
        assert_matches!(outcome, Outcome::Updated(ref record) if record.is_collected);
        assert_eq!(
            repo.snapshot()[1].collect_time.as_deref(),
            Some("2024-02-01T00:00:00Z")
        );

        dispatcher.set_collected_at("b", false, "2024-02-02T00:00:00Z")?;
        assert_eq!(repo.snapshot()[1], original);
        assert_eq!(repo.save_count(), 2);
        Ok(())
    }

    #[test]
    fn collect_of_absent_id_is_a_no_op() -> anyhow::Result<()> {
        let repo = history();
        let dispatcher = ActionDispatcher::new(&repo);
        assert_eq!(dispatcher.set_collected("nope", true)?, Outcome::Missing);
        assert_eq!(dispatcher.set_collected("nope", false)?, Outcome::Missing);
        assert_eq!(repo.save_count(), 0);

        dispatcher.set_collected("a", false)?;
        assert!(!repo.snapshot()[0].is_collected);
        assert_eq!(repo.snapshot()[0].collect_time, None);
        Ok(())
    }

    #[test]
    fn write_failure_propagates_as_storage_error() {
        let repo = history();
        repo.set_fail_writes(true);
        let err = ActionDispatcher::new(&repo).delete("a").unwrap_err();
        assert_matches!(err, ActionError::Storage(ref inner) if inner.is_write_failure());
        assert_eq!(repo.snapshot().len(), 3);
    }

    #[test]
    fn share_copies_content() -> anyhow::Result<()> {
        let record = history().snapshot().remove(0);
        let mut clipboard = MemoryClipboard::new();
        share(&record, &mut clipboard)?;
        assert_eq!(clipboard.contents(), Some("Paper boats"));

        let mut broken = MemoryClipboard::unavailable();
        assert_matches!(share(&record, &mut broken), Err(ActionError::Clipboard(_)));
        Ok(())
    }
}
