//! # NFT Registry
//!
//! A non-fungible-token ownership registry. The crate tracks exclusive
//! ownership of a fixed universe of integer-identified tokens, mediates
//! transfers through owner- or delegate-authorized operations, and maintains
//! the aggregate counts (per-owner balances, total supply) that follow from
//! them:
//!
//! - **Collection** — immutable per-instance metadata: name, symbol, the
//!   bound on the token id space, and the base URI used for metadata
//!   resolution.
//! - **Events** — the observable `Transfer` / `Approval` / `ApprovalForAll`
//!   log, plus replay: folding a log from empty state back into ownership
//!   state, so any ledger can be audited against its own history.
//! - **TokenLedger** — all mutable state and every operation: mint, burn,
//!   transfer, per-token approval, and owner-wide operator approval.
//!
//! ## Design Principles
//!
//! 1. All-or-nothing operations: a failed precondition mutates nothing and
//!    emits nothing. There are no partial transfers.
//! 2. Authorization is one predicate — owner, approved delegate, or operator
//!    — evaluated exactly once per mutating call.
//! 3. Addresses are opaque, host-authenticated principal identifiers. The
//!    registry never authenticates a caller; it only decides what a given
//!    caller is allowed to do.
//! 4. Every public type is serializable (serde) for wire transport and
//!    persistent storage.

pub mod collection;
pub mod events;
pub mod ledger;

pub use collection::Collection;
pub use events::{Address, Event, ReplayState, TokenId};
pub use ledger::{LedgerError, TokenLedger};
