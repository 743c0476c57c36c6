//! Read-side statement building
//!
//! - [`build_filter`]: optional filter values to a WHERE fragment and ordered params
//! - [`select_page`] / [`count_matching`]: the paired data and count statements
//! - [`paginate`]: the pagination descriptor for a list read

mod filter;
mod pagination;
mod statement;

pub use filter::{build_filter, Filter};
pub use pagination::{paginate, PageRequest, PaginationMeta};
pub use statement::{
    count_matching, delete_by_id, insert, select_by_id, select_page, SqlValue, Statement,
};
