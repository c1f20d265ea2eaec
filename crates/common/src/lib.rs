//! Primitives shared by the order and product services.

pub mod id;
pub mod page;

pub use id::new_id;
pub use page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageRequest};
