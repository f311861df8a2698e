//! The quote store: the in-memory collection and its mirror in storage.
//!
//! All mutation goes through [`QuoteStore`]. Every mutation persists the full
//! collection and then broadcasts a [`StoreChange`], so anything displaying
//! the collection (the category selector, a daemon component) can subscribe
//! instead of being called directly.

use std::path::Path;

use rand::Rng;
use tokio::sync::broadcast;

use crate::category::CategoryIndex;
use crate::error::Result;
use crate::quote::{NewQuote, Quote};
use crate::select::{CategoryFilter, Selection, select};
use crate::storage::{KeyValueStore, LAST_CATEGORY_KEY, LAST_QUOTE_KEY, QUOTES_KEY};
use crate::transfer;

pub const NOTICE_ADDED: &str = "Quote added successfully!";
pub const NOTICE_IMPORTED: &str = "Quotes imported successfully!";

const CHANGE_CHANNEL_CAPACITY: usize = 32;

/// What happened to the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// The collection was (re)loaded from storage.
    Loaded { len: usize },
    /// Quotes were added at the end.
    Appended { added: usize, len: usize },
    /// The collection was swapped out wholesale.
    Replaced { len: usize },
}

impl StoreChange {
    pub fn len(&self) -> usize {
        match self {
            StoreChange::Loaded { len }
            | StoreChange::Appended { len, .. }
            | StoreChange::Replaced { len } => *len,
        }
    }
}

pub struct QuoteStore {
    quotes: Vec<Quote>,
    durable: Box<dyn KeyValueStore>,
    session: Box<dyn KeyValueStore>,
    changes: broadcast::Sender<StoreChange>,
}

impl QuoteStore {
    /// Create an empty store over the given storage scopes, without loading.
    pub fn new(
        durable: impl KeyValueStore + 'static,
        session: impl KeyValueStore + 'static,
    ) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            quotes: Vec::new(),
            durable: Box::new(durable),
            session: Box::new(session),
            changes,
        }
    }

    /// Create a store and load whatever is persisted.
    pub fn open(
        durable: impl KeyValueStore + 'static,
        session: impl KeyValueStore + 'static,
    ) -> Self {
        let mut store = Self::new(durable, session);
        store.load();
        store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Replace the in-memory collection with the persisted one.
    ///
    /// Missing or unreadable data leaves an empty collection. Failures are
    /// logged, never returned.
    pub fn load(&mut self) {
        self.quotes = match self.durable.get(QUOTES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Quote>>(&raw) {
                Ok(quotes) => quotes,
                Err(e) => {
                    tracing::warn!(error = %e, "stored quotes are not valid json, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored quotes, starting empty");
                Vec::new()
            }
        };

        tracing::debug!(count = self.quotes.len(), "loaded quotes");
        self.notify(StoreChange::Loaded {
            len: self.quotes.len(),
        });
    }

    pub fn save(&mut self) -> Result<()> {
        let raw = serde_json::to_string(&self.quotes)?;
        self.durable.set(QUOTES_KEY, &raw)
    }

    /// Persist `quotes`, and only once that succeeded make it the in-memory
    /// collection. A failed write leaves memory matching what is on disk.
    fn commit(&mut self, quotes: Vec<Quote>) -> Result<()> {
        let raw = serde_json::to_string(&quotes)?;
        self.durable.set(QUOTES_KEY, &raw)?;
        self.quotes = quotes;
        Ok(())
    }

    pub fn append(&mut self, quote: Quote) -> Result<()> {
        self.extend(vec![quote]).map(|_| ())
    }

    /// Append quotes at the end, returning how many were added.
    pub fn extend(&mut self, quotes: Vec<Quote>) -> Result<usize> {
        let added = quotes.len();
        let mut next = Vec::with_capacity(self.quotes.len() + added);
        next.extend_from_slice(&self.quotes);
        next.extend(quotes);
        self.commit(next)?;
        self.notify(StoreChange::Appended {
            added,
            len: self.quotes.len(),
        });
        Ok(added)
    }

    pub fn replace_all(&mut self, quotes: Vec<Quote>) -> Result<()> {
        self.commit(quotes)?;
        self.notify(StoreChange::Replaced {
            len: self.quotes.len(),
        });
        Ok(())
    }

    /// The add-form flow: validate, then append and persist.
    ///
    /// A validation failure leaves the collection untouched.
    pub fn add(&mut self, input: &NewQuote) -> Result<Quote> {
        let quote = input.validate()?;
        self.append(quote.clone())?;
        tracing::info!(category = %quote.category, "added quote");
        Ok(quote)
    }

    /// Import an uploaded file's contents. Additive: the parsed quotes are
    /// appended to whatever is already there.
    pub fn import_json(&mut self, contents: &str) -> Result<usize> {
        let quotes = transfer::parse_import(contents)?;
        self.import(quotes)
    }

    /// [`QuoteStore::import_json`] for a file on disk.
    pub fn import_file(&mut self, path: &Path) -> Result<usize> {
        let quotes = transfer::read_import(path)?;
        self.import(quotes)
    }

    fn import(&mut self, quotes: Vec<Quote>) -> Result<usize> {
        let added = self.extend(quotes)?;
        tracing::info!(added, "imported quotes");
        Ok(added)
    }

    pub fn export_json(&self) -> Result<String> {
        transfer::export_json(&self.quotes)
    }

    pub fn categories(&self) -> CategoryIndex {
        CategoryIndex::build(&self.quotes)
    }

    /// Pick a random quote and remember it in session storage.
    ///
    /// Nothing is remembered when the filter leaves no candidates.
    pub fn show_random<R: Rng + ?Sized>(
        &mut self,
        filter: &CategoryFilter,
        rng: &mut R,
    ) -> Result<Selection> {
        let selection = select(&self.quotes, filter, rng);

        if let Selection::Quote(quote) = &selection {
            let raw = serde_json::to_string(quote)?;
            self.session.set(LAST_QUOTE_KEY, &raw)?;
        }

        Ok(selection)
    }

    /// The last quote shown in this session, if any.
    pub fn last_shown(&self) -> Option<Quote> {
        let raw = match self.session.get(LAST_QUOTE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read last shown quote");
                return None;
            }
        };

        serde_json::from_str(&raw)
            .inspect_err(|e| tracing::warn!(error = %e, "last shown quote is not valid json"))
            .ok()
    }

    pub fn remember_category(&mut self, filter: &CategoryFilter) -> Result<()> {
        self.durable.set(LAST_CATEGORY_KEY, &filter.to_string())
    }

    /// The last selected filter, defaulting to all categories.
    pub fn last_category(&self) -> CategoryFilter {
        match self.durable.get(LAST_CATEGORY_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_default(),
            Ok(None) => CategoryFilter::All,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read last category");
                CategoryFilter::All
            }
        }
    }

    fn notify(&self, change: StoreChange) {
        // No subscribers is normal for one-shot CLI commands
        let _ = self.changes.send(change);
    }
}

impl std::fmt::Debug for QuoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteStore")
            .field("len", &self.quotes.len())
            .finish_non_exhaustive()
    }
}
