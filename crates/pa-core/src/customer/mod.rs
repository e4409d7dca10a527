//! Customer records
//!
//! Read-only lookup of the customers that outbound calls are placed for.

mod store;
mod types;

pub use store::{CustomerStore, InMemoryCustomerStore, SqliteCustomerStore};
pub use types::Customer;
