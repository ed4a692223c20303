//! URL query string adapter: one query parameter per field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::types::FlatMap;

use super::{FlatStore, ReadStore, StoreResult};

/// Navigation history owning the current location.
pub trait History {
    /// Path component of the current location, without the query.
    fn path(&self) -> &str;
    /// Query component of the current location, `""` or starting with `?`.
    fn search(&self) -> &str;
    /// Navigates to `url`, adding a history entry.
    fn push(&mut self, url: &str) -> StoreResult<()>;
    /// Navigates to `url`, replacing the current entry.
    fn replace(&mut self, url: &str) -> StoreResult<()>;
}

/// In-process [`History`] with a browser-like entry stack.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    /// Starts at `url` (path plus optional `?query`).
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            entries: vec![url.into()],
            index: 0,
        }
    }

    /// Current location, path plus query.
    pub fn location(&self) -> &str {
        &self.entries[self.index]
    }

    /// Number of entries up to and including the current one.
    pub fn depth(&self) -> usize {
        self.index + 1
    }

    /// Steps back one entry; returns false at the first entry.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History for MemoryHistory {
    fn path(&self) -> &str {
        let location = self.location();
        location.split_once('?').map_or(location, |(path, _)| path)
    }

    fn search(&self) -> &str {
        let location = self.location();
        location.find('?').map_or("", |idx| &location[idx..])
    }

    fn push(&mut self, url: &str) -> StoreResult<()> {
        self.entries.truncate(self.index + 1);
        self.entries.push(url.to_string());
        self.index += 1;
        Ok(())
    }

    fn replace(&mut self, url: &str) -> StoreResult<()> {
        self.entries[self.index] = url.to_string();
        Ok(())
    }
}

/// Navigation options for query string writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
}

/// New query string contents accepted by [`set_query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInit {
    /// Already encoded query, with or without the leading `?`.
    Raw(String),
    /// Ordered, unencoded pairs.
    Pairs(Vec<(String, String)>),
    /// Unencoded map; `None` values are omitted.
    Map(BTreeMap<String, Option<String>>),
}

/// Replaces the query of the current location and navigates there.
///
/// Returns the new query, `""` or starting with `?`.
pub fn set_query<H: History + ?Sized>(
    history: &mut H,
    init: QueryInit,
    options: QueryOptions,
) -> StoreResult<String> {
    let encoded = match init {
        QueryInit::Raw(raw) => raw.strip_prefix('?').unwrap_or(&raw).to_string(),
        QueryInit::Pairs(pairs) => encode_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
        QueryInit::Map(map) => encode_pairs(
            map.iter()
                .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v))),
        ),
    };

    let search = if encoded.is_empty() {
        String::new()
    } else {
        format!("?{encoded}")
    };
    let url = format!("{}{search}", history.path());

    if options.replace {
        history.replace(&url)?;
    } else {
        history.push(&url)?;
    }
    Ok(search)
}

/// [`FlatStore`] reading and writing query parameters of a [`History`].
///
/// Saves keep parameters that are not part of the flat map.
#[derive(Debug, Clone)]
pub struct QueryStringStore<H: History> {
    history: H,
    options: QueryOptions,
}

impl<H: History> QueryStringStore<H> {
    /// Wraps `history`.
    pub fn new(history: H, options: QueryOptions) -> Self {
        Self { history, options }
    }

    /// Underlying history.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Mutable access to the underlying history, e.g. to navigate back.
    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    /// Releases the underlying history.
    pub fn into_history(self) -> H {
        self.history
    }

    // Repeated keys keep their first value, matching `get`.
    fn current_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        for (k, v) in parse_query(self.history.search()) {
            params.entry(k).or_insert(v);
        }
        params
    }
}

impl<H: History> ReadStore for QueryStringStore<H> {
    fn get(&self, field: &str) -> StoreResult<Option<String>> {
        Ok(parse_query(self.history.search())
            .into_iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v))
    }
}

impl<H: History> FlatStore for QueryStringStore<H> {
    fn save(&mut self, flat: &FlatMap) -> StoreResult<()> {
        let mut params = self.current_params();
        for (field, value) in flat {
            match value {
                Some(value) => {
                    params.insert(field.clone(), value.clone());
                }
                None => {
                    params.remove(field);
                }
            }
        }
        params.retain(|_, v| !v.is_empty());

        let search = set_query(
            &mut self.history,
            QueryInit::Pairs(params.into_iter().collect()),
            self.options,
        )?;
        tracing::trace!(%search, replace = self.options.replace, "query string saved");
        Ok(())
    }
}

fn parse_query(search: &str) -> Vec<(String, String)> {
    let query = search.strip_prefix('?').unwrap_or(search);
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn encode_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
