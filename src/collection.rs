//! # Collection Metadata
//!
//! The immutable identity of a deployed registry instance: name, symbol, the
//! bound on the token id space, and the base URI that metadata references are
//! resolved against. All four are fixed at construction; the registry stores
//! them as given and never validates or transforms them beyond the base-URI
//! concatenation in [`Collection::token_uri`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::TokenId;

/// Immutable metadata for a token collection.
///
/// One `Collection` exists per registry instance. The mutable ownership
/// state lives in [`crate::ledger::TokenLedger`], which holds the collection
/// it was constructed with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    /// Unique identifier for this instance, assigned at construction.
    pub collection_id: Uuid,
    /// Human-readable collection name (e.g., "MyNFT").
    pub name: String,
    /// Ticker symbol (e.g., "MNFT").
    pub symbol: String,
    /// Exclusive upper bound on the token id space: valid ids are
    /// `0..max_supply`. This bounds the id space, not concurrent existence.
    pub max_supply: u64,
    /// String prefix for metadata resolution. Token URIs are formed by
    /// appending the decimal token id.
    pub base_uri: String,
    /// Timestamp when the collection was created.
    pub created_at: DateTime<Utc>,
}

impl Collection {
    /// Creates a new collection with a fresh instance id.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        max_supply: u64,
        base_uri: impl Into<String>,
    ) -> Self {
        Self {
            collection_id: Uuid::new_v4(),
            name: name.into(),
            symbol: symbol.into(),
            max_supply,
            base_uri: base_uri.into(),
            created_at: Utc::now(),
        }
    }

    /// Returns the metadata URI for a token id: the base URI with the
    /// decimal id appended. Existence is not checked here; the ledger's
    /// `token_uri` query layers that on top.
    pub fn token_uri(&self, token_id: TokenId) -> String {
        format!("{}{}", self.base_uri, token_id)
    }
}
