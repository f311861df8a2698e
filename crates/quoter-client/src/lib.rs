#![deny(unsafe_code)]

//! Client library for quoter: the quote collection, its storage, random
//! selection, import/export and server sync.

pub mod category;
pub mod error;
pub mod quote;
pub mod select;
pub mod settings;
pub mod storage;
pub mod store;
pub mod sync;
pub mod transfer;

pub use category::{CategoryIndex, CategoryOption};
pub use error::{Error, ImportError, Result, ValidationError};
pub use quote::{NewQuote, Quote};
pub use select::{CategoryFilter, Selection};
pub use settings::Settings;
pub use store::{QuoteStore, StoreChange};
