use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::quote::Quote;
use crate::store::QuoteStore;

/// How remote quotes are folded into the local collection.
///
/// None of these resolve real conflicts: there are no versions or
/// timestamps, only text equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Remote collection overwrites local.
    Replace,
    /// Remote quotes go in front of local ones; duplicates are kept.
    Prepend,
    /// Remote quotes whose text is not already known are appended. A known
    /// text keeps its local category.
    #[default]
    #[serde(alias = "union-by-key")]
    AppendNew,
}

impl MergePolicy {
    /// The collection that results from merging `remote` into `local`.
    pub fn merge(self, local: &[Quote], remote: Vec<Quote>) -> Vec<Quote> {
        match self {
            MergePolicy::Replace => remote,
            MergePolicy::Prepend => remote.into_iter().chain(local.iter().cloned()).collect(),
            MergePolicy::AppendNew => local
                .iter()
                .cloned()
                .chain(new_by_text(local, remote))
                .collect(),
        }
    }

    /// Merge into the store and persist, returning how many remote quotes
    /// ended up in the collection.
    pub fn apply(self, store: &mut QuoteStore, remote: Vec<Quote>) -> Result<usize> {
        match self {
            MergePolicy::AppendNew => {
                let fresh = new_by_text(store.quotes(), remote);
                if fresh.is_empty() {
                    return Ok(0);
                }
                store.extend(fresh)
            }
            MergePolicy::Replace | MergePolicy::Prepend => {
                let added = remote.len();
                let merged = self.merge(store.quotes(), remote);
                store.replace_all(merged)?;
                Ok(added)
            }
        }
    }
}

// Remote quotes whose text is not already present, also deduplicated among
// themselves.
fn new_by_text(local: &[Quote], remote: Vec<Quote>) -> Vec<Quote> {
    let mut known: HashSet<String> = local.iter().map(|q| q.text.clone()).collect();
    remote
        .into_iter()
        .filter(|q| known.insert(q.text.clone()))
        .collect()
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MergePolicy::Replace => "replace",
            MergePolicy::Prepend => "prepend",
            MergePolicy::AppendNew => "append-new",
        })
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(MergePolicy::Replace),
            "prepend" => Ok(MergePolicy::Prepend),
            "append-new" | "union-by-key" => Ok(MergePolicy::AppendNew),
            other => Err(format!(
                "unknown merge policy `{other}`; expected replace|prepend|append-new"
            )),
        }
    }
}
