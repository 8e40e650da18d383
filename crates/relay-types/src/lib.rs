pub mod alert;
pub mod bucket;

pub use alert::{Alert, AlertBatch, AlertStatus, Labels};
pub use bucket::{AlertBucket, AlertGroup};
