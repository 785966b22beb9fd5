//! # Registry Events
//!
//! Every mutating ledger operation appends exactly one event to an ordered,
//! append-only log. The log is the registry's observable history: tests and
//! hosts assert on the sequence directly, and the full ownership state is
//! re-derivable from it — [`replay`] folds a log from empty state into a
//! [`ReplayState`], which must match what the ledger itself reports.
//!
//! Event shapes follow the standard NFT convention: `Transfer` with an
//! absent `from` is a mint, with an absent `to` a burn; `Approval` covers
//! revocations (absent delegate); `ApprovalForAll` carries the grant flag.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Token identifier. Ids are drawn from the fixed space `[0, max_supply)`
/// configured on the collection.
pub type TokenId = u64;

/// An opaque, host-authenticated principal identifier.
///
/// The registry treats addresses as given — it never authenticates them.
/// The empty string is the null address: it can never own or receive tokens.
pub type Address = String;

/// Returns whether `addr` is the null address.
pub fn is_null_address(addr: &str) -> bool {
    addr.is_empty()
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// An entry in the registry's observable event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Ownership of `token_id` changed. `from` is `None` on mint, `to` is
    /// `None` on burn, both are addresses on a transfer.
    Transfer {
        from: Option<Address>,
        to: Option<Address>,
        token_id: TokenId,
    },
    /// The per-token delegate for `token_id` was set (or revoked, when
    /// `approved` is `None`) by its owner.
    Approval {
        owner: Address,
        approved: Option<Address>,
        token_id: TokenId,
    },
    /// `operator` was granted (or had revoked) the right to move any token
    /// owned by `owner`. Emitted even when the flag does not change.
    ApprovalForAll {
        owner: Address,
        operator: Address,
        approved: bool,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Transfer {
                from,
                to,
                token_id,
            } => write!(
                f,
                "Transfer({} -> {}, token {})",
                from.as_deref().unwrap_or("none"),
                to.as_deref().unwrap_or("none"),
                token_id
            ),
            Event::Approval {
                owner,
                approved,
                token_id,
            } => write!(
                f,
                "Approval({} approves {}, token {})",
                owner,
                approved.as_deref().unwrap_or("none"),
                token_id
            ),
            Event::ApprovalForAll {
                owner,
                operator,
                approved,
            } => write!(f, "ApprovalForAll({} -> {}: {})", owner, operator, approved),
        }
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// Ownership state reconstructed from an event log.
///
/// Zero balances and empty operator sets are pruned, so two states that
/// describe the same ownership compare equal regardless of history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayState {
    /// Current owner of every existing token.
    pub owners: HashMap<TokenId, Address>,
    /// Current per-token approved delegate, where one is set.
    pub approvals: HashMap<TokenId, Address>,
    /// Token count per owning address.
    pub balances: HashMap<Address, u64>,
    /// Operator grants per owner.
    pub operators: HashMap<Address, HashSet<Address>>,
    /// Count of currently existing tokens.
    pub total_supply: u64,
}

/// Folds an event sequence from empty state into the ownership state it
/// describes.
///
/// Assumes a log produced by a well-formed ledger (each event was emitted by
/// an operation whose preconditions held). Malformed sequences — a transfer
/// of a token never minted, say — are folded permissively rather than
/// rejected: replay is an audit tool, not a validator.
pub fn replay<'a, I>(events: I) -> ReplayState
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut state = ReplayState::default();

    for event in events {
        match event {
            Event::Transfer {
                from,
                to,
                token_id,
            } => {
                // Any ownership change clears the token's delegate.
                state.approvals.remove(token_id);

                if let Some(from) = from {
                    debit_balance(&mut state.balances, from);
                    state.owners.remove(token_id);
                    state.total_supply = state.total_supply.saturating_sub(1);
                }
                if let Some(to) = to {
                    *state.balances.entry(to.clone()).or_insert(0) += 1;
                    state.owners.insert(*token_id, to.clone());
                    state.total_supply += 1;
                }
            }
            Event::Approval {
                approved, token_id, ..
            } => match approved {
                Some(delegate) => {
                    state.approvals.insert(*token_id, delegate.clone());
                }
                None => {
                    state.approvals.remove(token_id);
                }
            },
            Event::ApprovalForAll {
                owner,
                operator,
                approved,
            } => {
                if *approved {
                    state
                        .operators
                        .entry(owner.clone())
                        .or_default()
                        .insert(operator.clone());
                } else if let Some(set) = state.operators.get_mut(owner) {
                    set.remove(operator);
                    if set.is_empty() {
                        state.operators.remove(owner);
                    }
                }
            }
        }
    }

    state
}

fn debit_balance(balances: &mut HashMap<Address, u64>, addr: &str) {
    if let Some(balance) = balances.get_mut(addr) {
        *balance = balance.saturating_sub(1);
        if *balance == 0 {
            balances.remove(addr);
        }
    }
}
