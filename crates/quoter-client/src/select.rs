//! Random selection, optionally restricted to one category.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::quote::Quote;

/// Keyword the category selector uses for "no filtering".
pub const ALL_CATEGORIES: &str = "all";

const EMPTY_COLLECTION: &str = "No quotes available.";
const EMPTY_CATEGORY: &str = "No quotes available for this category.";

/// The category constraint applied when picking a quote.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => quote.category == *category,
        }
    }

    /// The quotes that pass this filter, in collection order.
    pub fn apply<'a>(&'a self, quotes: &'a [Quote]) -> impl Iterator<Item = &'a Quote> + 'a {
        quotes.iter().filter(move |q| self.matches(q))
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ALL_CATEGORIES {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Only(s.to_string()))
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL_CATEGORIES),
            CategoryFilter::Only(category) => f.write_str(category),
        }
    }
}

/// Outcome of a selection: either a quote, or the empty-state message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Quote(Quote),
    Empty(&'static str),
}

impl Selection {
    pub fn quote(&self) -> Option<&Quote> {
        match self {
            Selection::Quote(quote) => Some(quote),
            Selection::Empty(_) => None,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Quote(quote) => quote.fmt(f),
            Selection::Empty(message) => f.write_str(message),
        }
    }
}

/// Pick one quote uniformly at random from those matching `filter`.
pub fn select<R: Rng + ?Sized>(quotes: &[Quote], filter: &CategoryFilter, rng: &mut R) -> Selection {
    if quotes.is_empty() {
        return Selection::Empty(EMPTY_COLLECTION);
    }

    let candidates: Vec<&Quote> = filter.apply(quotes).collect();

    match candidates.choose(rng) {
        Some(quote) => Selection::Quote((*quote).clone()),
        None => Selection::Empty(EMPTY_CATEGORY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample() -> Vec<Quote> {
        vec![
            Quote::new("The best way to get started is to quit talking.", "Motivation"),
            Quote::new("Life is what happens when you're busy.", "Life"),
            Quote::new("Don't let yesterday take up too much of today.", "Motivation"),
            Quote::new("The purpose of our lives is to be happy.", "Happiness"),
        ]
    }

    #[test]
    fn filter_parses_all_keyword() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "Life".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only("Life".into())
        );
    }

    #[test]
    fn selected_quote_respects_filter() {
        let quotes = sample();
        let filter = CategoryFilter::Only("Motivation".into());

        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selection = select(&quotes, &filter, &mut rng);
            assert_eq!(selection.quote().unwrap().category, "Motivation");
        }
    }

    #[test]
    fn all_filter_can_reach_every_quote() {
        let quotes = sample();
        let mut seen = std::collections::HashSet::new();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            if let Selection::Quote(q) = select(&quotes, &CategoryFilter::All, &mut rng) {
                seen.insert(q.text);
            }
        }

        assert_eq!(seen.len(), quotes.len());
    }

    #[test]
    fn same_seed_same_pick() {
        let quotes = sample();
        let a = select(&quotes, &CategoryFilter::All, &mut StdRng::seed_from_u64(42));
        let b = select(&quotes, &CategoryFilter::All, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn empty_states() {
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(
            select(&[], &CategoryFilter::All, &mut rng),
            Selection::Empty("No quotes available.")
        );
        assert_eq!(
            select(&sample(), &CategoryFilter::Only("Sports".into()), &mut rng),
            Selection::Empty("No quotes available for this category.")
        );
    }
}
