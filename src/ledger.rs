//! # Token Ledger
//!
//! The registry's single mutable aggregate: per-token owners and delegates,
//! per-owner operator grants and balances, the total supply, and the event
//! log. Every operation is atomic from the caller's perspective — it either
//! fully applies its effect and appends its event, or fails with no state
//! change.
//!
//! ## Authorization Model
//!
//! - **Mint gating**: the ledger itself does not restrict who may mint.
//!   Hosts that want a designated minter role layer that policy above the
//!   ledger; it is not part of the ledger's invariants.
//! - **Transfer / burn**: the caller must be the token's owner, its approved
//!   delegate, or an operator approved by the owner. The three checks are
//!   combined in one predicate, [`TokenLedger::is_authorized`].
//! - **Delegate hygiene**: the per-token delegate is cleared on every
//!   ownership change. Clearing is the mechanism that keeps a stale delegate
//!   from moving the token again after it has changed hands.
//!
//! ## Id Space
//!
//! Valid ids are `[0, max_supply)`. Ids are single-use: once a token is
//! burned its id is retired and can never be minted again, so an id's
//! ownership history is unambiguous.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::collection::Collection;
use crate::events::{is_null_address, Address, Event, ReplayState, TokenId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by ledger operations.
///
/// All are fail-fast precondition violations; none are transient, and a
/// failed operation leaves the ledger exactly as it was.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The target address is the null address, which can never own tokens.
    #[error("invalid receiver: the null address cannot own tokens")]
    InvalidReceiver,

    /// The id was minted before (whether or not the token still exists —
    /// burned ids are retired, not recycled).
    #[error("token {0} has already been minted")]
    TokenAlreadyExists(TokenId),

    /// The id lies outside the collection's id space.
    #[error("token {token_id} is outside the id space [0, {max_supply})")]
    SupplyExceeded {
        /// The id that was requested.
        token_id: TokenId,
        /// The collection's exclusive id bound.
        max_supply: u64,
    },

    /// The referenced token has no current owner (never minted, or burned).
    #[error("token {0} does not exist")]
    NonexistentToken(TokenId),

    /// A transfer's stated `from` does not match the token's actual owner.
    #[error("owner mismatch for token {token_id}: stated {stated}, actual {actual}")]
    OwnerMismatch {
        /// The token being transferred.
        token_id: TokenId,
        /// The owner the caller claimed.
        stated: Address,
        /// The owner on record.
        actual: Address,
    },

    /// The caller is neither the owner, the approved delegate, nor an
    /// approved operator for the token's owner.
    #[error("caller {caller} is not authorized for token {token_id}")]
    Unauthorized {
        /// The principal that attempted the operation.
        caller: Address,
        /// The token it attempted to act on.
        token_id: TokenId,
    },
}

// ---------------------------------------------------------------------------
// TokenLedger
// ---------------------------------------------------------------------------

/// The ownership/approval ledger for one collection.
///
/// Operations take `&mut self`; Rust's exclusivity is the serialization the
/// atomicity contract relies on. A host exposing the ledger concurrently
/// must wrap it in its own lock or single-writer task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLedger {
    /// Immutable collection metadata, set at construction.
    collection: Collection,
    /// Current owner of every existing token.
    owners: HashMap<TokenId, Address>,
    /// Per-token approved delegate, where one is set.
    approvals: HashMap<TokenId, Address>,
    /// Operator grants: `owner -> set of operators`.
    operators: HashMap<Address, HashSet<Address>>,
    /// Token count per owning address. Entries are pruned at zero.
    balances: HashMap<Address, u64>,
    /// Ids of burned tokens. Retired ids may never be minted again.
    retired: HashSet<TokenId>,
    /// Count of currently existing tokens.
    total_supply: u64,
    /// Ordered, append-only event log.
    events: Vec<Event>,
}

impl TokenLedger {
    /// Creates an empty ledger for the given collection. Every id starts in
    /// the nonexistent state.
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            owners: HashMap::new(),
            approvals: HashMap::new(),
            operators: HashMap::new(),
            balances: HashMap::new(),
            retired: HashSet::new(),
            total_supply: 0,
            events: Vec::new(),
        }
    }

    /// The collection this ledger was constructed with.
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Mints `token_id` to `to`.
    ///
    /// The ledger imposes no caller restriction here; who may mint is host
    /// policy (see the module docs).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidReceiver`] if `to` is the null address.
    /// Returns [`LedgerError::SupplyExceeded`] if `token_id` is outside
    /// `[0, max_supply)`.
    /// Returns [`LedgerError::TokenAlreadyExists`] if the id is live or
    /// retired.
    pub fn mint(&mut self, to: &str, token_id: TokenId) -> Result<(), LedgerError> {
        if is_null_address(to) {
            return Err(LedgerError::InvalidReceiver);
        }
        if token_id >= self.collection.max_supply {
            return Err(LedgerError::SupplyExceeded {
                token_id,
                max_supply: self.collection.max_supply,
            });
        }
        if self.owners.contains_key(&token_id) || self.retired.contains(&token_id) {
            return Err(LedgerError::TokenAlreadyExists(token_id));
        }

        self.owners.insert(token_id, to.to_string());
        *self.balances.entry(to.to_string()).or_insert(0) += 1;
        self.total_supply += 1;
        self.events.push(Event::Transfer {
            from: None,
            to: Some(to.to_string()),
            token_id,
        });

        debug!(token_id, to = %to, "token minted");
        Ok(())
    }

    /// Burns `token_id`, retiring its id permanently.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NonexistentToken`] if the token has no owner.
    /// Returns [`LedgerError::Unauthorized`] if `caller` is not the owner,
    /// the approved delegate, or an approved operator.
    pub fn burn(&mut self, caller: &str, token_id: TokenId) -> Result<(), LedgerError> {
        let owner = self
            .owners
            .get(&token_id)
            .cloned()
            .ok_or(LedgerError::NonexistentToken(token_id))?;
        if !self.is_authorized(caller, token_id) {
            return Err(LedgerError::Unauthorized {
                caller: caller.to_string(),
                token_id,
            });
        }

        self.approvals.remove(&token_id);
        self.debit(&owner);
        self.total_supply -= 1;
        self.owners.remove(&token_id);
        self.retired.insert(token_id);
        self.events.push(Event::Transfer {
            from: Some(owner.clone()),
            to: None,
            token_id,
        });

        debug!(token_id, owner = %owner, caller = %caller, "token burned");
        Ok(())
    }

    /// Transfers `token_id` from `from` to `to`.
    ///
    /// The receiver check runs before the authorization check, so a transfer
    /// to the null address reports [`LedgerError::InvalidReceiver`] no
    /// matter who the caller is.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NonexistentToken`] if the token has no owner.
    /// Returns [`LedgerError::OwnerMismatch`] if `from` is not the owner on
    /// record.
    /// Returns [`LedgerError::InvalidReceiver`] if `to` is the null address.
    /// Returns [`LedgerError::Unauthorized`] if `caller` is not the owner,
    /// the approved delegate, or an approved operator.
    pub fn transfer_from(
        &mut self,
        caller: &str,
        from: &str,
        to: &str,
        token_id: TokenId,
    ) -> Result<(), LedgerError> {
        let owner = self
            .owners
            .get(&token_id)
            .cloned()
            .ok_or(LedgerError::NonexistentToken(token_id))?;
        if owner != from {
            return Err(LedgerError::OwnerMismatch {
                token_id,
                stated: from.to_string(),
                actual: owner,
            });
        }
        if is_null_address(to) {
            return Err(LedgerError::InvalidReceiver);
        }
        if !self.is_authorized(caller, token_id) {
            return Err(LedgerError::Unauthorized {
                caller: caller.to_string(),
                token_id,
            });
        }

        self.approvals.remove(&token_id);
        self.debit(from);
        *self.balances.entry(to.to_string()).or_insert(0) += 1;
        self.owners.insert(token_id, to.to_string());
        self.events.push(Event::Transfer {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            token_id,
        });

        debug!(token_id, from = %from, to = %to, caller = %caller, "token transferred");
        Ok(())
    }

    /// Sets (or, with `None`, revokes) the approved delegate for `token_id`.
    ///
    /// Only the token's owner or one of the owner's operators may approve.
    /// The delegate may equal the owner; self-approval is not special-cased.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NonexistentToken`] if the token has no owner.
    /// Returns [`LedgerError::Unauthorized`] if `caller` is neither the
    /// owner nor an approved operator.
    pub fn approve(
        &mut self,
        caller: &str,
        delegate: Option<&str>,
        token_id: TokenId,
    ) -> Result<(), LedgerError> {
        let owner = self
            .owners
            .get(&token_id)
            .cloned()
            .ok_or(LedgerError::NonexistentToken(token_id))?;
        if caller != owner && !self.is_operator(&owner, caller) {
            return Err(LedgerError::Unauthorized {
                caller: caller.to_string(),
                token_id,
            });
        }

        // A null delegate is a revocation, same as `None`.
        let delegate = delegate.filter(|d| !is_null_address(d));
        match delegate {
            Some(d) => {
                self.approvals.insert(token_id, d.to_string());
            }
            None => {
                self.approvals.remove(&token_id);
            }
        }
        self.events.push(Event::Approval {
            owner: owner.clone(),
            approved: delegate.map(String::from),
            token_id,
        });

        debug!(token_id, owner = %owner, delegate = delegate.unwrap_or("none"), "delegate set");
        Ok(())
    }

    /// Grants or revokes `operator`'s right to move any token `owner` owns.
    ///
    /// Operator grants are per `(owner, operator)` pair and persist across
    /// transfers of individual tokens. The call is infallible and idempotent
    /// in state, but the `ApprovalForAll` event is appended on every call —
    /// a no-op grant is still observable.
    pub fn set_approval_for_all(&mut self, owner: &str, operator: &str, approved: bool) {
        if approved {
            self.operators
                .entry(owner.to_string())
                .or_default()
                .insert(operator.to_string());
        } else if let Some(set) = self.operators.get_mut(owner) {
            set.remove(operator);
            if set.is_empty() {
                self.operators.remove(owner);
            }
        }
        self.events.push(Event::ApprovalForAll {
            owner: owner.to_string(),
            operator: operator.to_string(),
            approved,
        });

        debug!(owner = %owner, operator = %operator, approved, "operator approval set");
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Returns the current owner of `token_id`, or
    /// [`LedgerError::NonexistentToken`] if it is unminted or burned.
    pub fn owner_of(&self, token_id: TokenId) -> Result<&str, LedgerError> {
        self.owners
            .get(&token_id)
            .map(String::as_str)
            .ok_or(LedgerError::NonexistentToken(token_id))
    }

    /// Returns whether `token_id` currently has an owner.
    pub fn exists(&self, token_id: TokenId) -> bool {
        self.owners.contains_key(&token_id)
    }

    /// Returns the number of tokens `address` owns. Never fails; unknown
    /// addresses own zero.
    pub fn balance_of(&self, address: &str) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Returns the approved delegate for `token_id`, or `None` if no
    /// delegate is set.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NonexistentToken`] if the token has no owner.
    pub fn get_approved(&self, token_id: TokenId) -> Result<Option<&str>, LedgerError> {
        if !self.exists(token_id) {
            return Err(LedgerError::NonexistentToken(token_id));
        }
        Ok(self.approvals.get(&token_id).map(String::as_str))
    }

    /// Returns whether `operator` holds an operator grant from `owner`.
    /// Never fails; ungranted pairs default to `false`.
    pub fn is_approved_for_all(&self, owner: &str, operator: &str) -> bool {
        self.is_operator(owner, operator)
    }

    /// Returns the count of currently existing tokens.
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Returns the metadata URI for `token_id`, or
    /// [`LedgerError::NonexistentToken`] if it is unminted or burned.
    pub fn token_uri(&self, token_id: TokenId) -> Result<String, LedgerError> {
        if !self.exists(token_id) {
            return Err(LedgerError::NonexistentToken(token_id));
        }
        Ok(self.collection.token_uri(token_id))
    }

    /// The ordered event log, oldest first.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Snapshots the current ownership state in the same shape
    /// [`crate::events::replay`] produces, for auditing the ledger against
    /// its own log.
    pub fn checkpoint(&self) -> ReplayState {
        ReplayState {
            owners: self.owners.clone(),
            approvals: self.approvals.clone(),
            balances: self.balances.clone(),
            operators: self.operators.clone(),
            total_supply: self.total_supply,
        }
    }

    /// Returns whether `caller` may transfer or burn `token_id`: it is the
    /// owner, the approved delegate, or an operator approved by the owner.
    /// Nonexistent tokens authorize no one.
    pub fn is_authorized(&self, caller: &str, token_id: TokenId) -> bool {
        let Some(owner) = self.owners.get(&token_id) else {
            return false;
        };
        owner == caller
            || self.approvals.get(&token_id).map(String::as_str) == Some(caller)
            || self.is_operator(owner, caller)
    }

    fn is_operator(&self, owner: &str, operator: &str) -> bool {
        self.operators
            .get(owner)
            .is_some_and(|set| set.contains(operator))
    }

    fn debit(&mut self, addr: &str) {
        if let Some(balance) = self.balances.get_mut(addr) {
            *balance -= 1;
            if *balance == 0 {
                self.balances.remove(addr);
            }
        }
    }
}
