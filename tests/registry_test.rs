//! Integration tests for the token registry.
//!
//! These exercise full scenarios across module boundaries: mint-to-transfer
//! lifecycles, delegate and operator flows, event-log assertions, replay
//! auditing, and snapshot persistence.

use nft_registry::events::replay;
use nft_registry::{Collection, Event, LedgerError, TokenLedger};

/// Helper: a fresh ledger for the standard test collection.
fn registry() -> TokenLedger {
    TokenLedger::new(Collection::new(
        "MyNFT",
        "MNFT",
        100,
        "https://example.com/meta/",
    ))
}

// ---------------------------------------------------------------------------
// Lifecycle Scenarios
// ---------------------------------------------------------------------------

#[test]
fn mint_emits_transfer_from_none_and_sets_owner_balance_supply() {
    let mut nft = registry();
    nft.mint("addr1", 10).unwrap();

    assert_eq!(
        nft.events().first(),
        Some(&Event::Transfer {
            from: None,
            to: Some("addr1".into()),
            token_id: 10,
        })
    );
    assert_eq!(nft.total_supply(), 1);
    assert_eq!(nft.owner_of(10).unwrap(), "addr1");
    assert_eq!(nft.balance_of("addr1"), 1);
}

#[test]
fn approved_delegate_can_transfer_and_approval_event_is_emitted() {
    let mut nft = registry();
    nft.mint("addr1", 11).unwrap();
    nft.approve("addr1", Some("addr2"), 11).unwrap();

    assert!(nft.events().contains(&Event::Approval {
        owner: "addr1".into(),
        approved: Some("addr2".into()),
        token_id: 11,
    }));
    assert_eq!(nft.get_approved(11).unwrap(), Some("addr2"));

    nft.transfer_from("addr2", "addr1", "addr3", 11).unwrap();
    assert_eq!(nft.owner_of(11).unwrap(), "addr3");
}

#[test]
fn operator_can_move_multiple_tokens() {
    let mut nft = registry();
    nft.mint("addr1", 21).unwrap();
    nft.mint("addr1", 22).unwrap();

    nft.set_approval_for_all("addr1", "addr2", true);
    assert!(nft.events().contains(&Event::ApprovalForAll {
        owner: "addr1".into(),
        operator: "addr2".into(),
        approved: true,
    }));

    nft.transfer_from("addr2", "addr1", "addr3", 21).unwrap();
    nft.transfer_from("addr2", "addr1", "addr3", 22).unwrap();
    assert_eq!(nft.owner_of(21).unwrap(), "addr3");
    assert_eq!(nft.owner_of(22).unwrap(), "addr3");
    assert_eq!(nft.balance_of("addr3"), 2);
}

#[test]
fn burn_by_owner_removes_ownership_and_decreases_supply() {
    let mut nft = registry();
    nft.mint("addr1", 41).unwrap();
    assert_eq!(nft.total_supply(), 1);

    nft.burn("addr1", 41).unwrap();
    assert_eq!(nft.total_supply(), 0);
    assert!(!nft.exists(41));
    assert_eq!(nft.owner_of(41), Err(LedgerError::NonexistentToken(41)));
}

#[test]
fn burn_by_operator_succeeds_without_direct_ownership() {
    let mut nft = registry();
    nft.mint("addr1", 7).unwrap();
    nft.set_approval_for_all("addr1", "addr2", true);

    nft.burn("addr2", 7).unwrap();
    assert!(!nft.exists(7));
}

#[test]
fn repeated_approvals_and_revocations() {
    let mut nft = registry();
    nft.mint("addr1", 51).unwrap();

    nft.approve("addr1", Some("addr2"), 51).unwrap();
    assert_eq!(nft.get_approved(51).unwrap(), Some("addr2"));

    nft.approve("addr1", None, 51).unwrap();
    assert_eq!(nft.get_approved(51).unwrap(), None);

    nft.set_approval_for_all("addr1", "addr2", true);
    assert!(nft.is_approved_for_all("addr1", "addr2"));
    nft.set_approval_for_all("addr1", "addr2", false);
    assert!(!nft.is_approved_for_all("addr1", "addr2"));
}

// ---------------------------------------------------------------------------
// Failure Semantics
// ---------------------------------------------------------------------------

#[test]
fn transfer_to_null_address_fails_with_ownership_unchanged() {
    let mut nft = registry();
    nft.mint("addr1", 31).unwrap();

    assert_eq!(
        nft.transfer_from("addr1", "addr1", "", 31),
        Err(LedgerError::InvalidReceiver)
    );
    assert_eq!(nft.owner_of(31).unwrap(), "addr1");
    assert_eq!(nft.balance_of("addr1"), 1);
}

#[test]
fn unauthorized_transfer_fails_closed() {
    let mut nft = registry();
    nft.mint("addr1", 9).unwrap();

    let before = nft.checkpoint();
    assert_eq!(
        nft.transfer_from("addr4", "addr1", "addr3", 9),
        Err(LedgerError::Unauthorized {
            caller: "addr4".into(),
            token_id: 9,
        })
    );
    assert_eq!(nft.owner_of(9).unwrap(), "addr1");
    assert_eq!(nft.checkpoint(), before);
}

#[test]
fn second_mint_of_same_id_fails_without_state_change() {
    let mut nft = registry();
    nft.mint("addr1", 5).unwrap();
    let before = nft.checkpoint();
    let before_log = nft.events().to_vec();

    assert_eq!(
        nft.mint("addr2", 5),
        Err(LedgerError::TokenAlreadyExists(5))
    );
    assert_eq!(nft.checkpoint(), before);
    assert_eq!(nft.events(), before_log.as_slice());
}

#[test]
fn revocation_round_trip_emits_one_event_per_call() {
    let mut nft = registry();
    nft.set_approval_for_all("addr1", "addr2", true);
    nft.set_approval_for_all("addr1", "addr2", false);

    assert!(!nft.is_approved_for_all("addr1", "addr2"));
    let grants: Vec<_> = nft
        .events()
        .iter()
        .filter(|e| matches!(e, Event::ApprovalForAll { .. }))
        .collect();
    assert_eq!(grants.len(), 2);
}

// ---------------------------------------------------------------------------
// Aggregate Consistency
// ---------------------------------------------------------------------------

/// Walks a mixed operation sequence and checks the derived-count invariants
/// after every single step: each balance equals the number of tokens owned,
/// and total supply equals the number of existing tokens.
#[test]
fn balances_and_supply_stay_consistent_through_mixed_sequence() {
    let mut nft = registry();

    let script: Vec<Box<dyn Fn(&mut TokenLedger)>> = vec![
        Box::new(|l| l.mint("alice", 1).unwrap()),
        Box::new(|l| l.mint("alice", 2).unwrap()),
        Box::new(|l| l.mint("bob", 3).unwrap()),
        Box::new(|l| l.set_approval_for_all("alice", "carol", true)),
        Box::new(|l| l.transfer_from("carol", "alice", "bob", 1).unwrap()),
        Box::new(|l| l.approve("bob", Some("alice"), 3).unwrap()),
        Box::new(|l| l.transfer_from("alice", "bob", "alice", 3).unwrap()),
        Box::new(|l| l.burn("carol", 2).unwrap()),
        Box::new(|l| l.mint("carol", 4).unwrap()),
        Box::new(|l| l.burn("bob", 1).unwrap()),
    ];

    for step in script {
        step(&mut nft);

        let state = nft.checkpoint();
        for (addr, balance) in &state.balances {
            let owned = state.owners.values().filter(|o| *o == addr).count() as u64;
            assert_eq!(*balance, owned, "balance invariant broken for {addr}");
        }
        assert_eq!(state.total_supply, state.owners.len() as u64);
    }
}

#[test]
fn replaying_the_event_log_reproduces_the_ledger_state() {
    let mut nft = registry();
    nft.mint("alice", 1).unwrap();
    nft.mint("alice", 2).unwrap();
    nft.mint("bob", 3).unwrap();
    nft.approve("alice", Some("bob"), 1).unwrap();
    nft.set_approval_for_all("bob", "carol", true);
    nft.transfer_from("bob", "alice", "carol", 1).unwrap();
    nft.burn("carol", 3).unwrap();
    nft.approve("alice", Some("dave"), 2).unwrap();
    nft.set_approval_for_all("bob", "carol", false);

    assert_eq!(replay(nft.events()), nft.checkpoint());
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn json_snapshot_round_trip_preserves_state() {
    let mut nft = registry();
    nft.mint("alice", 1).unwrap();
    nft.mint("bob", 2).unwrap();
    nft.approve("alice", Some("carol"), 1).unwrap();
    nft.set_approval_for_all("bob", "dave", true);
    nft.burn("bob", 2).unwrap();

    let json = serde_json::to_string(&nft).unwrap();
    let mut restored: TokenLedger = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.checkpoint(), nft.checkpoint());
    assert_eq!(restored.events(), nft.events());
    assert_eq!(
        restored.collection().collection_id,
        nft.collection().collection_id
    );

    // Retired ids survive the round trip: id 2 stays unmintable.
    assert_eq!(
        restored.mint("eve", 2),
        Err(LedgerError::TokenAlreadyExists(2))
    );
    // And the restored ledger keeps operating normally.
    restored.transfer_from("carol", "alice", "eve", 1).unwrap();
    assert_eq!(restored.owner_of(1).unwrap(), "eve");
}
