/// Item catalog loading.
///
/// Accepts a JSON array of item objects, a JSON array of names, or plain text
/// with one name per line. Objects may carry any of the descriptive fields
/// below; only `name` is required.
use rankulator_core::Item;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog looks like JSON but failed to parse: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog entry {0} has an empty name")]
    EmptyName(usize),

    #[error("No items left to rank{0}")]
    NoItems(String),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawEntry {
    Name(String),
    Full(CatalogEntry),
}

/// One catalog record before it becomes a ranking item.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(default)]
    id: Option<RawId>,
    pub name: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default, alias = "years_exp")]
    pub years_exp: Option<u32>,
    #[serde(default)]
    pub age: Option<u32>,
    /// Lower is more prominent.
    #[serde(default, alias = "search_rank")]
    pub search_rank: Option<u64>,
    /// Missing means active.
    #[serde(default)]
    pub active: Option<bool>,
}

impl CatalogEntry {
    fn named(name: &str) -> Self {
        CatalogEntry {
            id: None,
            name: name.to_string(),
            position: None,
            team: None,
            college: None,
            years_exp: None,
            age: None,
            search_rank: None,
            active: None,
        }
    }

    /// `index` is the entry's 0-based position in the file, used when no id is given.
    fn into_item(self, index: usize) -> Item {
        let id = match self.id {
            Some(RawId::Text(s)) => s,
            Some(RawId::Number(n)) => n.to_string(),
            None => format!("item-{}", index + 1),
        };
        let mut item = Item::new(id, self.name.trim());
        item.position = self.position;
        let fields = [
            ("team", self.team),
            ("college", self.college),
            ("years_exp", self.years_exp.map(|v| v.to_string())),
            ("age", self.age.map(|v| v.to_string())),
            ("search_rank", self.search_rank.map(|v| v.to_string())),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                item = item.with_metadata(key, value);
            }
        }
        item
    }
}

/// Narrowing applied to catalog file entries after parsing.
#[derive(Debug, Clone)]
pub struct CatalogFilter {
    /// Keep only items with this position (case-insensitive).
    pub position: Option<String>,
    /// Keep the N most prominent items by `search_rank` (unranked items last).
    /// Falls back to the position's default count when a position is set.
    pub limit: Option<usize>,
    /// Drop entries marked `"active": false`.
    pub active_only: bool,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        CatalogFilter {
            position: None,
            limit: None,
            active_only: true,
        }
    }
}

impl CatalogFilter {
    fn effective_limit(&self) -> Option<usize> {
        self.limit
            .or_else(|| self.position.as_deref().and_then(default_position_count))
    }
}

/// How many players of a position a typical ranking covers.
pub fn default_position_count(position: &str) -> Option<usize> {
    match position.to_ascii_uppercase().as_str() {
        "QB" => Some(16),
        "RB" => Some(20),
        "WR" => Some(30),
        "TE" => Some(12),
        _ => None,
    }
}

/// Parse catalog text into entries, keeping file order.
pub fn parse_catalog(content: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
    let trimmed = content.trim();
    let entries: Vec<CatalogEntry> = if trimmed.starts_with('[') {
        let raw: Vec<RawEntry> = serde_json::from_str(trimmed)?;
        raw.into_iter()
            .map(|entry| match entry {
                RawEntry::Name(name) => CatalogEntry::named(&name),
                RawEntry::Full(full) => full,
            })
            .collect()
    } else {
        trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(CatalogEntry::named)
            .collect()
    };

    if let Some(idx) = entries.iter().position(|e| e.name.trim().is_empty()) {
        return Err(CatalogError::EmptyName(idx + 1));
    }
    Ok(entries)
}

fn filter_entries(entries: Vec<CatalogEntry>, filter: &CatalogFilter) -> Vec<(usize, CatalogEntry)> {
    let mut indexed: Vec<(usize, CatalogEntry)> = entries
        .into_iter()
        .enumerate()
        .filter(|(_, entry)| !filter.active_only || entry.active != Some(false))
        .filter(|(_, entry)| match (&filter.position, &entry.position) {
            (Some(wanted), Some(pos)) => wanted.eq_ignore_ascii_case(pos),
            (Some(_), None) => false,
            (None, _) => true,
        })
        .collect();

    if let Some(limit) = filter.effective_limit() {
        // Stable: unranked entries keep file order after the ranked ones.
        indexed.sort_by_key(|(_, entry)| entry.search_rank.unwrap_or(u64::MAX));
        indexed.truncate(limit);
    }
    indexed
}

fn no_items(filter: &CatalogFilter) -> CatalogError {
    let context = match &filter.position {
        Some(pos) => format!(" for position {pos}"),
        None => String::new(),
    };
    CatalogError::NoItems(context)
}

/// Apply `filter` and convert to ranking items.
pub fn select_items(entries: Vec<CatalogEntry>, filter: &CatalogFilter) -> Result<Vec<Item>, CatalogError> {
    let indexed = filter_entries(entries, filter);
    if indexed.is_empty() {
        return Err(no_items(filter));
    }
    Ok(indexed
        .into_iter()
        .map(|(idx, entry)| entry.into_item(idx))
        .collect())
}

/// Read, parse and filter a catalog file, then append inline names.
///
/// The filter only narrows file entries; inline names are always kept.
pub fn load_items(
    path: Option<&Path>,
    inline_items: &[String],
    filter: &CatalogFilter,
) -> Result<Vec<Item>, CatalogError> {
    let entries = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })?;
            parse_catalog(&content)?
        }
        None => Vec::new(),
    };
    let file_count = entries.len();

    let mut items: Vec<Item> = filter_entries(entries, filter)
        .into_iter()
        .map(|(idx, entry)| entry.into_item(idx))
        .collect();
    items.extend(
        inline_items
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .enumerate()
            .map(|(i, name)| CatalogEntry::named(name).into_item(file_count + i)),
    );

    if items.is_empty() {
        return Err(no_items(filter));
    }
    Ok(items)
}
