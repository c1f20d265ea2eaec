pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use common::PageRequest;

/// Builds a page request from optional query parameters. A missing size
/// selects the default page size.
fn page_request(page_size: Option<u32>, page_token: Option<String>) -> PageRequest {
    PageRequest::new(page_size.unwrap_or(0), page_token)
}
