//! End-to-end scenarios: concurrency, durability and collaborator wiring.

use std::sync::{Arc, Mutex};
use std::thread;

use rebase_ledger::{
    AmountRequest, Collaborators, EventBus, LedgerConfig, LedgerError, LedgerEvent, NoopSink,
    RebaseLedger,
};
use rebase_nullables::{NullAuthorizer, NullClock};
use rebase_store_lmdb::LmdbEnvironment;
use rebase_types::{AccountId, Capability, Rate, Timestamp, RATE_SCALE};

fn collaborators(clock: Arc<NullClock>) -> Collaborators {
    Collaborators::new(Arc::new(NullAuthorizer::allow_all()), Arc::new(NoopSink), clock)
}

fn admin() -> AccountId {
    AccountId::new("admin")
}

#[test]
fn concurrent_transfers_conserve_total_principal() {
    // With a zero rate no interest is minted, so the total is exactly conserved.
    let clock = Arc::new(NullClock::new(0));
    let ledger = Arc::new(RebaseLedger::new(Rate::ZERO, collaborators(clock)));
    let accounts: Vec<AccountId> = (0..8).map(|i| AccountId::new(format!("acct_{i}"))).collect();
    for a in &accounts {
        ledger.mint(&admin(), a, 10_000).unwrap();
    }

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let ledger = Arc::clone(&ledger);
            let accounts = accounts.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    let from = &accounts[(t + i) % accounts.len()];
                    let to = &accounts[(t * 3 + i * 7 + 1) % accounts.len()];
                    // Failures for insufficient balance are expected and harmless.
                    let _ = ledger.transfer(from, to, AmountRequest::Exact((i % 13) as u128));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(ledger.total_principal(), 80_000);
}

#[test]
fn opposing_transfers_do_not_deadlock() {
    let clock = Arc::new(NullClock::new(0));
    let ledger = Arc::new(RebaseLedger::new(Rate::ZERO, collaborators(clock)));
    let (a, b) = (AccountId::new("a"), AccountId::new("b"));
    ledger.mint(&admin(), &a, 1_000).unwrap();
    ledger.mint(&admin(), &b, 1_000).unwrap();

    let forward = {
        let (ledger, a, b) = (Arc::clone(&ledger), a.clone(), b.clone());
        thread::spawn(move || {
            for _ in 0..2_000 {
                let _ = ledger.transfer(&a, &b, AmountRequest::Exact(1));
            }
        })
    };
    let backward = {
        let (ledger, a, b) = (Arc::clone(&ledger), a.clone(), b.clone());
        thread::spawn(move || {
            for _ in 0..2_000 {
                let _ = ledger.transfer(&b, &a, AmountRequest::Exact(1));
            }
        })
    };
    forward.join().unwrap();
    backward.join().unwrap();

    assert_eq!(ledger.principal_of(&a) + ledger.principal_of(&b), 2_000);
}

#[test]
fn ledger_survives_restart_through_lmdb() {
    let dir = tempfile::tempdir().unwrap();
    let config = LedgerConfig {
        data_dir: dir.path().to_path_buf(),
        map_size_mb: 16,
        initial_protocol_rate: 1_000_000_000_000_000, // 0.1% per second
        ..LedgerConfig::default()
    };
    let clock = Arc::new(NullClock::new(0));
    let alice = AccountId::new("alice");

    {
        let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes()).unwrap();
        let store = env.ledger_store();
        let ledger = RebaseLedger::load_from_store(
            &store,
            config.initial_rate(),
            collaborators(clock.clone()),
        )
        .unwrap();
        ledger.mint(&admin(), &alice, 1_000_000).unwrap();
        clock.advance(10);
        ledger.set_protocol_rate(&admin(), Rate::new(1)).unwrap();
        ledger.save_to_store(&store).unwrap();
    }

    let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes()).unwrap();
    let store = env.ledger_store();
    // The stored registry wins over the configured initial rate.
    let ledger = RebaseLedger::load_from_store(&store, Rate::new(999), collaborators(clock.clone()))
        .unwrap();

    assert_eq!(ledger.current_protocol_rate(), Rate::new(1));
    assert_eq!(ledger.principal_of(&alice), 1_000_000);
    assert_eq!(ledger.personal_rate_of(&alice), Rate::new(1_000_000_000_000_000));
    assert_eq!(ledger.balance_of_now(&alice).unwrap(), 1_010_000);
}

#[test]
fn events_reach_subscribers_in_commit_order() {
    let clock = Arc::new(NullClock::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut bus = EventBus::new();
    let sink = Arc::clone(&seen);
    bus.subscribe(Box::new(move |e| sink.lock().unwrap().push(e.clone())));

    let ledger = RebaseLedger::new(
        Rate::new(RATE_SCALE / 100),
        Collaborators::new(Arc::new(NullAuthorizer::allow_all()), Arc::new(bus), clock.clone()),
    );
    let (a, b) = (AccountId::new("a"), AccountId::new("b"));
    ledger.mint(&admin(), &a, 100).unwrap();
    clock.advance(10);
    ledger.transfer(&a, &b, AmountRequest::Exact(50)).unwrap();

    let events = seen.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            LedgerEvent::Minted {
                to: a.clone(),
                amount: 100
            },
            LedgerEvent::InterestSettled {
                account: a.clone(),
                delta: 10,
                new_principal: 110,
                at: Timestamp::new(10),
            },
            LedgerEvent::Transferred {
                from: a.clone(),
                to: b.clone(),
                amount: 50
            },
        ]
    );
}

#[test]
fn only_granted_callers_mint_and_lower_rates() {
    let clock = Arc::new(NullClock::new(0));
    let auth = Arc::new(NullAuthorizer::deny_all());
    let (bridge, governor, user) = (
        AccountId::new("bridge"),
        AccountId::new("governor"),
        AccountId::new("user"),
    );
    auth.grant(&bridge, Capability::MintAndBurn);
    auth.grant(&governor, Capability::RateAdmin);
    let ledger = RebaseLedger::new(
        Rate::new(100),
        Collaborators::new(auth.clone(), Arc::new(NoopSink), clock),
    );

    ledger.mint(&bridge, &user, 10).unwrap();
    assert!(matches!(
        ledger.mint(&governor, &user, 10),
        Err(LedgerError::Unauthorized { .. })
    ));
    assert!(matches!(
        ledger.burn(&user, &user, AmountRequest::Full),
        Err(LedgerError::Unauthorized { .. })
    ));
    assert!(matches!(
        ledger.set_protocol_rate(&bridge, Rate::new(1)),
        Err(LedgerError::Unauthorized { .. })
    ));
    ledger.set_protocol_rate(&governor, Rate::new(1)).unwrap();

    auth.revoke(&bridge, Capability::MintAndBurn);
    assert!(ledger.burn(&bridge, &user, AmountRequest::Full).is_err());
    assert_eq!(ledger.principal_of(&user), 10);
}

#[test]
fn unstorable_ids_never_block_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
    let store = env.ledger_store();
    let clock = Arc::new(NullClock::new(0));
    let ledger = RebaseLedger::new(Rate::ZERO, collaborators(clock.clone()));
    let alice = AccountId::new("alice");
    ledger.mint(&admin(), &alice, 100).unwrap();
    ledger.save_to_store(&store).unwrap();

    for bad in [AccountId::new(""), AccountId::new("k".repeat(600))] {
        assert!(matches!(
            ledger.transfer(&alice, &bad, AmountRequest::Exact(1)),
            Err(LedgerError::InvalidAccount(_))
        ));
        assert!(matches!(
            ledger.mint(&admin(), &bad, 1),
            Err(LedgerError::InvalidAccount(_))
        ));
    }
    ledger.mint(&admin(), &alice, 3).unwrap();
    ledger.save_to_store(&store).unwrap();

    let restored = RebaseLedger::load_from_store(&store, Rate::ZERO, collaborators(clock)).unwrap();
    assert_eq!(restored.principal_of(&alice), 103);
    assert_eq!(restored.total_principal(), 103);
}
