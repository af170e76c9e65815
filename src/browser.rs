//! Application context: catalog, filter engine, and preview modal
//!
//! The browser owns all session state. The UI translates interactions into
//! [`Command`]s; background fetches come back as [`BrowserEvent`]s. Anything
//! that needs I/O is returned to the caller as an [`Effect`].

use std::time::Duration;

use crate::core::catalog::Catalog;
use crate::core::debounce::{Clock, Debouncer, SystemClock};
use crate::core::filter::{distinct_categories, CategoryFilter, FilterState};
use crate::core::markup::MarkupConverter;
use crate::core::modal::{MarkupTicket, ModalState, PreviewRequest};

/// Quiet period before a search edit takes effect
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Shown in place of the list when the catalog cannot be loaded
pub const CATALOG_LOAD_ERROR: &str = "未加载数据库";

/// Shown when nothing matches the current filters
pub const NO_RESULTS: &str = "未搜索到匹配的项目";

/// Label of the permanent "all" category entry
pub const ALL_CATEGORIES_LABEL: &str = "全部";

/// Result count line
pub fn result_count_text(count: usize) -> String {
    format!("找到 {} 个文档", count)
}

/// Keys the browser reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Escape,
    Other,
}

/// A user interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Category entry clicked
    SelectCategory(CategoryFilter),
    /// Search input edited
    SearchInput(String),
    /// Frame tick; lets the search debounce fire
    Tick,
    /// Card activated, by catalog index
    OpenDocument(usize),
    /// Modal close control clicked
    CloseClicked,
    /// Click landed on the modal backdrop
    BackdropClicked,
    /// Click landed inside the modal content
    ContentClicked,
    KeyPressed(KeyCode),
}

/// I/O the caller must perform on the browser's behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchCatalog,
    FetchMarkup { ticket: MarkupTicket, file: String },
    ShowBinary { file: String },
}

/// Completion of a background fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    /// Raw catalog payload, or the fetch error
    CatalogFetched(Result<String, String>),
    /// Markup text for a ticket, or the fetch error
    MarkupFetched {
        ticket: MarkupTicket,
        result: Result<String, String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    NotStarted,
    Loading,
    Loaded,
    Failed,
}

/// One card in the document list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Catalog index the card opens
    pub index: usize,
    pub category: String,
    pub date: String,
    pub title: String,
}

/// What the list area shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Loading,
    LoadFailed(String),
    NoResults(String),
    Cards(Vec<Card>),
}

/// Rendered output of the filter engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    /// Result count line; absent until the catalog is loaded
    pub count: Option<String>,
    pub list: ListView,
}

impl Default for View {
    fn default() -> Self {
        Self {
            count: None,
            list: ListView::Loading,
        }
    }
}

/// Entry in the category selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOption {
    pub filter: CategoryFilter,
    pub label: String,
    pub active: bool,
}

/// Session state for the document browser
pub struct Browser<C: Clock = SystemClock> {
    clock: C,
    catalog: Catalog,
    status: LoadStatus,
    categories: Vec<String>,
    filter: FilterState,
    search: Debouncer<String>,
    modal: ModalState,
    converter: Box<dyn MarkupConverter>,
    view: View,
    render_count: u64,
}

impl Browser<SystemClock> {
    pub fn new(converter: Box<dyn MarkupConverter>) -> Self {
        Self::with_clock(SystemClock, converter)
    }
}

impl<C: Clock> Browser<C> {
    pub fn with_clock(clock: C, converter: Box<dyn MarkupConverter>) -> Self {
        Self {
            clock,
            catalog: Catalog::default(),
            status: LoadStatus::NotStarted,
            categories: Vec::new(),
            filter: FilterState::default(),
            search: Debouncer::new(SEARCH_DEBOUNCE),
            modal: ModalState::new(),
            converter,
            view: View::default(),
            render_count: 0,
        }
    }

    /// Begin the session. The catalog is requested exactly once.
    pub fn start(&mut self) -> Option<Effect> {
        if self.status != LoadStatus::NotStarted {
            return None;
        }
        self.status = LoadStatus::Loading;
        Some(Effect::FetchCatalog)
    }

    #[cfg(test)]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[allow(dead_code)]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[allow(dead_code)]
    pub fn status(&self) -> LoadStatus {
        self.status
    }

    #[allow(dead_code)]
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Number of renders so far
    #[allow(dead_code)]
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Time until a pending search edit fires
    pub fn next_deadline(&self) -> Option<Duration> {
        self.search.remaining(self.clock.now())
    }

    /// Selector entries: "all" first, then each category once
    pub fn category_options(&self) -> Vec<CategoryOption> {
        std::iter::once((CategoryFilter::All, ALL_CATEGORIES_LABEL.to_string()))
            .chain(
                self.categories
                    .iter()
                    .map(|c| (CategoryFilter::Only(c.clone()), c.clone())),
            )
            .map(|(filter, label)| CategoryOption {
                active: filter == self.filter.category,
                filter,
                label,
            })
            .collect()
    }

    /// Apply a user interaction
    pub fn dispatch(&mut self, command: Command) -> Option<Effect> {
        if command != Command::Tick {
            tracing::debug!("Dispatching {:?}", command);
        }

        match command {
            Command::SelectCategory(category) => {
                self.set_category(category);
                None
            }
            Command::SearchInput(text) => {
                self.set_search_query(text);
                None
            }
            Command::Tick => {
                self.poll_search();
                None
            }
            Command::OpenDocument(index) => self.open(index),
            Command::CloseClicked | Command::BackdropClicked => {
                self.close();
                None
            }
            Command::ContentClicked => None,
            Command::KeyPressed(KeyCode::Escape) => {
                if self.modal.is_open() {
                    self.close();
                }
                None
            }
            Command::KeyPressed(KeyCode::Other) => None,
        }
    }

    /// Apply a background fetch result
    pub fn handle_event(&mut self, event: BrowserEvent) {
        match event {
            BrowserEvent::CatalogFetched(result) => self.finish_catalog_load(result),
            BrowserEvent::MarkupFetched { ticket, result } => {
                let result = result.map(|text| self.converter.convert(&text));
                if let Err(ref e) = result {
                    tracing::warn!("Markdown preview failed: {}", e);
                }
                if !self.modal.complete_markup(ticket, result) {
                    tracing::debug!("Discarding stale markdown result {:?}", ticket);
                }
            }
        }
    }

    fn finish_catalog_load(&mut self, result: Result<String, String>) {
        if self.status != LoadStatus::Loading {
            tracing::warn!("Ignoring catalog result outside of initial load");
            return;
        }

        match result.and_then(|payload| Catalog::from_json(&payload).map_err(|e| e.to_string())) {
            Ok(catalog) => {
                tracing::info!("Loaded catalog with {} documents", catalog.len());
                self.categories = distinct_categories(&catalog);
                self.catalog = catalog;
                self.status = LoadStatus::Loaded;
                self.render();
            }
            Err(e) => {
                tracing::error!("Failed to load documents: {}", e);
                self.catalog = Catalog::default();
                self.categories.clear();
                self.status = LoadStatus::Failed;
                self.view = View {
                    count: None,
                    list: ListView::LoadFailed(CATALOG_LOAD_ERROR.to_string()),
                };
            }
        }
    }

    /// Make `category` the single active selector entry and re-render
    pub fn set_category(&mut self, category: CategoryFilter) {
        self.filter.category = category;
        self.render();
    }

    /// Debounced search: only the last edit within the quiet period applies
    pub fn set_search_query(&mut self, text: String) {
        self.search.push(text, self.clock.now());
    }

    /// Fire the pending search edit if its quiet period has elapsed. The
    /// query is applied to the filter state as it is now.
    pub fn poll_search(&mut self) -> bool {
        match self.search.poll(self.clock.now()) {
            Some(text) => {
                self.filter.set_search_query(&text);
                self.render();
                true
            }
            None => false,
        }
    }

    /// Recompute the visible set and the list view
    pub fn render(&mut self) {
        match self.status {
            LoadStatus::Loaded => {}
            // Nothing to render until the catalog arrives; a failed load
            // keeps its error message
            _ => return,
        }

        let cards: Vec<Card> = self
            .filter
            .visible(&self.catalog)
            .into_iter()
            .map(|(index, record)| Card {
                index,
                category: record.category.clone(),
                date: record.date.clone(),
                title: record.title.clone(),
            })
            .collect();

        self.render_count += 1;
        self.view = View {
            count: Some(result_count_text(cards.len())),
            list: if cards.is_empty() {
                ListView::NoResults(NO_RESULTS.to_string())
            } else {
                ListView::Cards(cards)
            },
        };
    }

    /// Open the catalog record at `index` in the preview modal
    pub fn open(&mut self, index: usize) -> Option<Effect> {
        let Some(doc) = self.catalog.get(index).cloned() else {
            tracing::warn!("No document at index {}", index);
            return None;
        };

        tracing::info!("Opening preview: {} ({})", doc.title, doc.file);
        match self.modal.open(doc) {
            PreviewRequest::FetchMarkup { ticket, file } => Some(Effect::FetchMarkup { ticket, file }),
            PreviewRequest::ShowBinary { file } => Some(Effect::ShowBinary { file }),
        }
    }

    /// Close the preview modal; a no-op when it is already closed
    pub fn close(&mut self) {
        if self.modal.close() {
            tracing::info!("Closed preview");
        }
    }
}
