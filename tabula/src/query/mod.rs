//! Table views: search filtering, locale-aware ordering and pagination.
//!
//! Every statement built here quotes identifiers with
//! [`SqlSecurity::quote_identifier`](crate::security::SqlSecurity::quote_identifier)
//! and binds user text as a parameter.

mod fetch;
mod order;
mod page;
mod search;

pub use fetch::{count_rows, fetch_rows, load_all, load_page, TablePage, TableRequest};
pub use order::{sort_key_expression, OrderExpression, SortDirection, SortSpec};
pub use page::PageWindow;
pub use search::SearchFilter;
