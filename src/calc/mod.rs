pub mod window;

pub use window::{count_days, relevant_window_with, AccountingSnapshot, AllowanceStatus, StayRule};
