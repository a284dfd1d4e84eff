pub mod entry;
pub mod log_file;
pub mod receipt;
pub mod transition;

pub use entry::ReceiptLogEntry;
pub use log_file::{EntryFilter, LogFile, LogMetadata};
pub use receipt::{Currency, ReceiptData};
pub use transition::StatusTransition;
