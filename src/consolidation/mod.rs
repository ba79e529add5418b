//! Legacy identifier consolidation.
//!
//! Early versions of the wiki stored pages under free-form names like
//! `LabInventory` or `Lab-Inventory`. Today's canonical identifiers are
//! snake_case. This module finds pages still stored under legacy names and
//! migrates each one onto its canonical identifier, quarantining the old
//! file and keeping the indexes in step.

mod migrate;
mod resolver;
mod scan;

pub use migrate::MigrateJob;
pub use resolver::{ConflictResolver, ConflictWinner, LongerTextWins};
pub use scan::{find_legacy_groups, ScanJob, SCAN_QUEUE};
