pub mod metrics;
pub mod notify;
pub mod repository;
pub mod settlement;

pub use metrics::{init_metrics, render_metrics};
pub use notify::{InvoiceNotice, NoopNotifier, Notifier, NotifierError, WhatsappNotifier};
pub use repository::PosRepository;
pub use settlement::{price_items, round2, SettlementService};
