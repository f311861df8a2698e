use clap::Args;
use colored::Colorize;
use eyre::{Result, bail};

use quoter_client::{CategoryFilter, Error, NewQuote, QuoteStore, Selection, store::NOTICE_ADDED};

use super::{alert, notify};

#[derive(Args, Debug)]
pub struct Random {
    /// Only pick from this category ("all" for every category). Defaults to
    /// the last category picked
    #[arg(long, short)]
    category: Option<String>,
}

impl Random {
    pub fn run(self, mut store: QuoteStore) -> Result<()> {
        let filter = match self.category {
            Some(category) => {
                let filter: CategoryFilter = category.parse()?;
                store.remember_category(&filter)?;
                filter
            }
            None => store.last_category(),
        };

        match store.show_random(&filter, &mut rand::thread_rng())? {
            Selection::Quote(quote) => {
                println!("\"{}\"", quote.text.bold());
                println!("  — {}", quote.category.italic());
            }
            Selection::Empty(message) => println!("{}", message.dimmed()),
        }

        Ok(())
    }
}

pub fn last(store: &QuoteStore) -> Result<()> {
    match store.last_shown() {
        Some(quote) => println!("{quote}"),
        None => println!("{}", "No quote shown in this session yet.".dimmed()),
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct List {
    /// Only list quotes in this category
    #[arg(long, short)]
    category: Option<String>,
}

impl List {
    pub fn run(self, store: &QuoteStore) -> Result<()> {
        let filter: CategoryFilter = match self.category {
            Some(category) => category.parse()?,
            None => CategoryFilter::All,
        };

        for quote in filter.apply(store.quotes()) {
            println!("{quote}");
        }

        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct Add {
    /// The quote text
    #[arg(long, short)]
    text: String,

    /// The quote category
    #[arg(long, short)]
    category: String,
}

impl Add {
    pub fn run(self, mut store: QuoteStore) -> Result<()> {
        match store.add(&NewQuote::new(self.text, self.category)) {
            Ok(_) => {
                notify(NOTICE_ADDED);
                Ok(())
            }
            Err(Error::Validation(e)) => {
                alert(&e.to_string());
                bail!("quote not added")
            }
            Err(e) => Err(e.into()),
        }
    }
}

pub fn categories(store: &QuoteStore) -> Result<()> {
    let selected = store.last_category();

    for option in store.categories().options() {
        if option.filter() == selected {
            println!("{} {}", "*".green(), option.to_string().bold());
        } else {
            println!("  {option}");
        }
    }

    Ok(())
}
