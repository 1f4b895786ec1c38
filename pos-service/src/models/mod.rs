//! Domain models for pos-service.

mod customer;
mod invoice;
mod owner;
mod product;
mod transaction;

pub use customer::Customer;
pub use invoice::{Invoice, InvoiceItem, InvoiceStatus, PaymentMode};
pub use owner::{OwnerStats, OWNER_STATS_ID};
pub use product::Product;
pub use transaction::{TransactionKind, TransactionRecord};
