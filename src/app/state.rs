use std::time::{Duration, Instant};

use strum::{EnumIter, IntoEnumIterator};

use crate::app::actions::{self, ActionDispatcher, ActionError, Outcome};
use crate::catalog::{CatalogItem, Category};
use crate::clipboard::Clipboard;
use crate::config::AppConfig;
use crate::debounce::Debouncer;
use crate::dream::DreamRecord;
use crate::search::{filter_collection, CollectionQuery, SortKey, SortOrder, SortSpec};
use crate::storage::HistoryRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Tab {
    Collection,
    Foods,
    Knowledge,
    Sights,
    Thinking,
}

impl Tab {
    pub fn title(self) -> &'static str {
        match self.category() {
            Some(category) => category.title(),
            None => "Dream Collection",
        }
    }

    pub fn category(self) -> Option<Category> {
        match self {
            Tab::Collection => None,
            Tab::Foods => Some(Category::Foods),
            Tab::Knowledge => Some(Category::Knowledge),
            Tab::Sights => Some(Category::Sights),
            Tab::Thinking => Some(Category::Thinking),
        }
    }

    pub fn index(self) -> usize {
        Tab::iter().position(|tab| tab == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Tab::iter().nth(index)
    }

    pub fn next(self) -> Self {
        Tab::from_index(self.index() + 1).unwrap_or(Tab::Collection)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub expires_at: Instant,
}

/// A blocking confirmation waiting on the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Collect { id: String, collect: bool },
    Delete { id: String },
}

impl Confirmation {
    pub fn prompt(&self) -> &'static str {
        match self {
            Confirmation::Collect { collect: true, .. } => "Add this dream to your collection?",
            Confirmation::Collect { collect: false, .. } => {
                "Remove this dream from your collection?"
            }
            Confirmation::Delete { .. } => "Delete this dream permanently? This cannot be undone.",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Confirmation::Collect { id, .. } | Confirmation::Delete { id } => id,
        }
    }
}

/// Pure transitions of the collection screen. Everything but detail open/close
/// re-derives the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    SwitchTab(Tab),
    SearchInput { text: String, at: Instant },
    FinishSearch,
    ClearSearch,
    SortBy(SortKey),
    SortOrder(SortOrder),
    OpenDetail,
    CloseDetail,
    MoveSelection(isize),
    Tick { at: Instant },
}

#[derive(Debug)]
pub struct ViewState {
    pub current_tab: Tab,
    /// Text as typed; becomes `search_keyword` once the debounce settles.
    pub search_input: String,
    pub search_keyword: String,
    pub search_active: bool,
    pub sort: SortSpec,
    pub selected: usize,
    pub catalog_selected: usize,
    pub selected_dream: Option<DreamRecord>,
    pub show_dream_detail: bool,
    pub confirmation: Option<Confirmation>,
    pub notice: Option<Notice>,
    history: Vec<DreamRecord>,
    collection: Vec<DreamRecord>,
    revision: u64,
    search_debounce: Debouncer<String>,
    notice_duration: Duration,
}

impl ViewState {
    pub fn new(sort: SortSpec, debounce: Duration, notice_duration: Duration) -> Self {
        Self {
            current_tab: Tab::Collection,
            search_input: String::new(),
            search_keyword: String::new(),
            search_active: false,
            sort,
            selected: 0,
            catalog_selected: 0,
            selected_dream: None,
            show_dream_detail: false,
            confirmation: None,
            notice: None,
            history: Vec::new(),
            collection: Vec::new(),
            revision: 0,
            search_debounce: Debouncer::new(debounce),
            notice_duration,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.collection.default_sort,
            config.collection.debounce_duration(),
            config.notice.duration(),
        )
    }

    pub fn collection(&self) -> &[DreamRecord] {
        &self.collection
    }

    pub fn history(&self) -> &[DreamRecord] {
        &self.history
    }

    /// Bumped every time the filter pipeline runs.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn query(&self) -> CollectionQuery {
        CollectionQuery {
            keyword: self.search_keyword.clone(),
            sort: self.sort,
        }
    }

    pub fn is_search_pending(&self) -> bool {
        self.search_debounce.is_pending()
    }

    pub fn highlighted(&self) -> Option<&DreamRecord> {
        self.collection.get(self.selected)
    }

    /// The record actions apply to: the open detail, else the highlighted row.
    pub fn target(&self) -> Option<&DreamRecord> {
        if self.show_dream_detail {
            self.selected_dream.as_ref()
        } else {
            self.highlighted()
        }
    }

    pub fn catalog_items(&self) -> &'static [CatalogItem] {
        self.current_tab
            .category()
            .map(Category::items)
            .unwrap_or(&[])
    }

    pub fn reduce(mut self, transition: Transition) -> Self {
        self.apply(transition);
        self
    }

    pub fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::SwitchTab(tab) => {
                if self.current_tab != tab {
                    self.current_tab = tab;
                    self.catalog_selected = 0;
                    self.show_dream_detail = false;
                    self.search_active = false;
                }
                self.rederive();
            }
            Transition::SearchInput { text, at } => {
                self.search_input = text.clone();
                self.search_debounce.schedule_at(text, at);
            }
            Transition::FinishSearch => {
                self.search_active = false;
                if let Some(keyword) = self.search_debounce.flush() {
                    self.search_keyword = keyword;
                    self.selected = 0;
                    self.rederive();
                }
            }
            Transition::ClearSearch => {
                self.search_active = false;
                self.search_debounce.cancel_all();
                self.search_input.clear();
                self.search_keyword.clear();
                self.selected = 0;
                self.rederive();
            }
            Transition::SortBy(field) => {
                self.sort.field = field;
                self.rederive();
            }
            Transition::SortOrder(direction) => {
                self.sort.direction = direction;
                self.rederive();
            }
            Transition::OpenDetail => {
                if let Some(record) = self.highlighted().cloned() {
                    self.selected_dream = Some(record);
                    self.show_dream_detail = true;
                }
            }
            Transition::CloseDetail => {
                self.show_dream_detail = false;
                self.selected_dream = None;
            }
            Transition::MoveSelection(delta) => self.move_selection(delta),
            Transition::Tick { at } => {
                if let Some(keyword) = self.search_debounce.poll_at(at) {
                    self.search_keyword = keyword;
                    self.selected = 0;
                    self.rederive();
                }
                if self
                    .notice
                    .as_ref()
                    .map(|notice| at >= notice.expires_at)
                    .unwrap_or(false)
                {
                    self.notice = None;
                }
            }
        }
    }

    /// Screen (re-)entry: reload from storage and re-derive.
    pub fn on_show(&mut self, repo: &dyn HistoryRepository) {
        match repo.load() {
            Ok(records) => {
                tracing::debug!(count = records.len(), "history loaded");
                self.history = records;
            }
            Err(err) => {
                tracing::error!(?err, "failed to load dream history");
                self.history.clear();
                self.notify(NoticeLevel::Error, "Failed to load your collection");
            }
        }
        self.rederive();
        if let Some(current) = self.selected_dream.as_ref() {
            let refreshed = self
                .collection
                .iter()
                .find(|record| record.id == current.id)
                .cloned();
            if refreshed.is_none() {
                self.show_dream_detail = false;
            }
            self.selected_dream = refreshed;
        }
    }

    pub fn request_toggle_collect(&mut self) {
        let Some(id) = self.target().map(|record| record.id.to_string()) else {
            return;
        };
        match self.lookup_loaded(&id) {
            Ok(record) => {
                self.confirmation = Some(Confirmation::Collect {
                    id: record.id.to_string(),
                    collect: !record.is_collected,
                });
            }
            Err(err) => self.report_action_error(&err),
        }
    }

    pub fn request_delete(&mut self) {
        let Some(id) = self.target().map(|record| record.id.to_string()) else {
            return;
        };
        match self.lookup_loaded(&id) {
            Ok(_) => self.confirmation = Some(Confirmation::Delete { id }),
            Err(err) => self.report_action_error(&err),
        }
    }

    pub fn cancel_confirmation(&mut self) {
        self.confirmation = None;
    }

    /// Applies the pending confirmation against storage, then reloads.
    pub fn confirm(&mut self, repo: &dyn HistoryRepository) -> Option<Outcome> {
        let confirmation = self.confirmation.take()?;
        let dispatcher = ActionDispatcher::new(repo);
        let result = match &confirmation {
            Confirmation::Collect { id, collect } => dispatcher.set_collected(id, *collect),
            Confirmation::Delete { id } => dispatcher.delete(id),
        };
        match result {
            Ok(outcome) => {
                let message = match (&confirmation, &outcome) {
                    (_, Outcome::Missing) => "That dream no longer exists",
                    (Confirmation::Collect { collect: true, .. }, _) => "Added to collection",
                    (Confirmation::Collect { collect: false, .. }, _) => {
                        "Removed from collection"
                    }
                    (Confirmation::Delete { .. }, _) => "Dream deleted",
                };
                let level = if outcome == Outcome::Missing {
                    NoticeLevel::Info
                } else {
                    NoticeLevel::Success
                };
                if matches!(confirmation, Confirmation::Delete { .. }) {
                    self.show_dream_detail = false;
                    self.selected_dream = None;
                }
                self.on_show(repo);
                self.notify(level, message);
                Some(outcome)
            }
            Err(err) => {
                tracing::error!(?err, id = %confirmation.id(), "collection update failed");
                self.report_action_error(&err);
                None
            }
        }
    }

    pub fn share(&mut self, clipboard: &mut dyn Clipboard) {
        let Some(record) = self.target().cloned() else {
            return;
        };
        let result = self
            .lookup_loaded(record.id.as_str())
            .and_then(|record| actions::share(&record, clipboard));
        match result {
            Ok(()) => self.notify(NoticeLevel::Success, "Copied to clipboard"),
            Err(err) => {
                tracing::error!(?err, id = %record.id, "share failed");
                self.report_action_error(&err);
            }
        }
    }

    pub fn tap_catalog_item(&mut self) {
        let Some(item) = self
            .current_tab
            .category()
            .and_then(|category| category.item(self.catalog_selected))
        else {
            return;
        };
        self.notify(NoticeLevel::Info, item.tap_message());
    }

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notice = Some(Notice {
            message: message.into(),
            level,
            expires_at: Instant::now() + self.notice_duration,
        });
    }

    fn lookup_loaded(&self, id: &str) -> Result<DreamRecord, ActionError> {
        self.collection
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or_else(|| ActionError::NotFound(id.to_string()))
    }

    fn report_action_error(&mut self, err: &ActionError) {
        let message = match err {
            ActionError::NotFound(_) => "That dream is no longer in your collection",
            ActionError::Storage(inner) if inner.is_read_failure() => {
                "Could not read your collection"
            }
            ActionError::Storage(_) => "Could not save your changes",
            ActionError::Clipboard(_) => "Could not copy to the clipboard",
        };
        self.notify(NoticeLevel::Error, message);
    }

    fn rederive(&mut self) {
        self.collection = filter_collection(&self.history, &self.query());
        self.revision += 1;
        self.normalize_selection();
    }

    fn move_selection(&mut self, delta: isize) {
        let (len, current) = match self.current_tab {
            Tab::Collection => (self.collection.len(), self.selected),
            _ => (self.catalog_items().len(), self.catalog_selected),
        };
        if len == 0 {
            return;
        }
        let next = (current as isize + delta).clamp(0, len as isize - 1) as usize;
        match self.current_tab {
            Tab::Collection => self.selected = next,
            _ => self.catalog_selected = next,
        }
    }

    fn normalize_selection(&mut self) {
        if self.collection.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.collection.len() {
            self.selected = self.collection.len() - 1;
        }
    }
}
