pub mod report;

pub use report::{Browser, ClickSummary, Device};
