//! Persistent domain records: accounts, ledger entries, and spin rows.
//!
//! Each record is a plain domain type; DDL lives in a feature-gated
//! schema module so the engine builds without the database stack.

mod account;
mod ledger;
mod spin;

pub use account::Account;
pub use account::AccountStatus;
pub use ledger::EntryKind;
pub use ledger::LedgerEntry;
pub use spin::SpinRecord;
pub use spin::StateRecord;
