//! Account-facing ledger operations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rebase_store::LedgerStore;
use rebase_types::{AccountId, Authorizer, Capability, Clock, Rate, Timestamp};

use crate::account::AccountState;
use crate::accrual::{AccrualEngine, Settlement};
use crate::amount::AmountRequest;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::events::{EventSink, LedgerEvent};
use crate::registry::{RateChange, RateRegistry};

const REGISTRY_KEY: &[u8] = b"rate_registry";
const ALLOWANCES_KEY: &[u8] = b"allowances";

/// Allowances of `u128::MAX` are never decremented.
pub const UNLIMITED_ALLOWANCE: u128 = u128::MAX;

type AccountCell = Arc<Mutex<AccountState>>;
type AllowanceKey = (AccountId, AccountId);

/// External collaborators the ledger consults but does not own.
#[derive(Clone)]
pub struct Collaborators {
    pub authorizer: Arc<dyn Authorizer>,
    pub events: Arc<dyn EventSink>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    pub fn new(
        authorizer: Arc<dyn Authorizer>,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            authorizer,
            events,
            clock,
        }
    }
}

/// The interest-accruing ledger.
///
/// Every balance-changing call settles the touched accounts first, then moves
/// principal, then commits. Work happens on copies of the account states, so
/// a failing call leaves the table exactly as it was. Each call locks only
/// the accounts it touches; two-account calls lock in `AccountId` order.
pub struct RebaseLedger {
    registry: RwLock<RateRegistry>,
    accounts: RwLock<HashMap<AccountId, AccountCell>>,
    allowances: Mutex<HashMap<AllowanceKey, u128>>,
    authorizer: Arc<dyn Authorizer>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

// Committed state is only ever replaced wholesale, so a poisoned lock still
// guards a consistent value.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(rw: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    rw.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(rw: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    rw.write().unwrap_or_else(PoisonError::into_inner)
}

fn validate(ids: &[&AccountId]) -> Result<(), LedgerError> {
    match ids.iter().find(|id| !id.is_valid()) {
        Some(id) => Err(LedgerError::InvalidAccount((*id).clone())),
        None => Ok(()),
    }
}

fn settled_event(account: &AccountId, settlement: &Settlement) -> Option<LedgerEvent> {
    if settlement.delta == 0 {
        return None;
    }
    tracing::debug!(
        account = %account,
        delta = settlement.delta,
        new_principal = settlement.new_principal,
        at = %settlement.at,
        "interest settled"
    );
    Some(LedgerEvent::InterestSettled {
        account: account.clone(),
        delta: settlement.delta,
        new_principal: settlement.new_principal,
        at: settlement.at,
    })
}

impl RebaseLedger {
    /// Create an empty ledger offering `initial_rate` to newly funded accounts.
    pub fn new(initial_rate: Rate, collaborators: Collaborators) -> Self {
        let genesis = collaborators.clock.now();
        Self::with_parts(
            RateRegistry::new(initial_rate, genesis),
            HashMap::new(),
            HashMap::new(),
            collaborators,
        )
    }

    pub fn from_config(config: &LedgerConfig, collaborators: Collaborators) -> Self {
        Self::new(config.initial_rate(), collaborators)
    }

    fn with_parts(
        registry: RateRegistry,
        accounts: HashMap<AccountId, AccountCell>,
        allowances: HashMap<AllowanceKey, u128>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            registry: RwLock::new(registry),
            accounts: RwLock::new(accounts),
            allowances: Mutex::new(allowances),
            authorizer: collaborators.authorizer,
            events: collaborators.events,
            clock: collaborators.clock,
        }
    }

    // ── Collaborator plumbing ──────────────────────────────────────────

    fn authorize(&self, caller: &AccountId, capability: Capability) -> Result<(), LedgerError> {
        if self.authorizer.is_authorized(caller, capability) {
            return Ok(());
        }
        tracing::warn!(caller = %caller, %capability, "unauthorized call rejected");
        Err(LedgerError::Unauthorized {
            caller: caller.clone(),
            capability,
        })
    }

    fn publish(&self, events: Vec<LedgerEvent>) {
        for event in &events {
            self.events.emit(event);
        }
    }

    /// Fetch (or create) the lock cell for an account.
    fn cell(&self, id: &AccountId) -> AccountCell {
        if let Some(cell) = read(&self.accounts).get(id) {
            return Arc::clone(cell);
        }
        Arc::clone(write(&self.accounts).entry(id.clone()).or_default())
    }

    /// Drop entries a failed call created for accounts it never committed to.
    ///
    /// A cell still referenced elsewhere belongs to an in-flight call and is
    /// left alone; new references can only be taken under the table lock.
    fn discard_untouched(&self, ids: &[&AccountId]) {
        let mut accounts = write(&self.accounts);
        for id in ids {
            let untouched = accounts
                .get(*id)
                .is_some_and(|cell| Arc::strong_count(cell) == 1 && lock(cell).is_pristine());
            if untouched {
                accounts.remove(*id);
            }
        }
    }

    /// Snapshot an account without creating it.
    fn peek(&self, id: &AccountId) -> Option<AccountState> {
        let cell = read(&self.accounts).get(id).cloned()?;
        let state = lock(&cell).clone();
        Some(state)
    }

    // ── Protocol rate ──────────────────────────────────────────────────

    pub fn current_protocol_rate(&self) -> Rate {
        read(&self.registry).current_protocol_rate()
    }

    pub fn rate_history(&self) -> Vec<RateChange> {
        read(&self.registry).history().to_vec()
    }

    /// Lower the protocol rate offered to newly funded accounts.
    ///
    /// Requires [`Capability::RateAdmin`]. Existing accounts keep their rates.
    /// Returns the previous protocol rate.
    pub fn set_protocol_rate(&self, caller: &AccountId, new_rate: Rate) -> Result<Rate, LedgerError> {
        self.authorize(caller, Capability::RateAdmin)?;
        let now = self.clock.now();
        let previous = {
            let mut registry = write(&self.registry);
            match registry.set_protocol_rate(new_rate, now) {
                Ok(previous) => previous,
                Err(e) => {
                    tracing::warn!(requested = %new_rate, error = %e, "protocol rate update rejected");
                    return Err(e);
                }
            }
        };
        tracing::info!(previous = %previous, current = %new_rate, at = %now, "protocol rate changed");
        self.publish(vec![LedgerEvent::ProtocolRateChanged {
            previous,
            current: new_rate,
            at: now,
        }]);
        Ok(previous)
    }

    // ── Reads ──────────────────────────────────────────────────────────

    /// Balance including interest owed at `now`. Never mutates state.
    pub fn balance_of(&self, id: &AccountId, now: Timestamp) -> Result<u128, LedgerError> {
        match self.peek(id) {
            Some(state) => AccrualEngine::current_balance(&state, now),
            None => Ok(0),
        }
    }

    /// Balance at the clock's current time.
    pub fn balance_of_now(&self, id: &AccountId) -> Result<u128, LedgerError> {
        self.balance_of(id, self.clock.now())
    }

    /// Materialized balance, excluding interest accrued since the last settlement.
    pub fn principal_of(&self, id: &AccountId) -> u128 {
        self.peek(id).map(|s| s.principal()).unwrap_or(0)
    }

    /// Rate locked in for the account; zero if it was never funded.
    pub fn personal_rate_of(&self, id: &AccountId) -> Rate {
        self.peek(id).map(|s| s.personal_rate()).unwrap_or(Rate::ZERO)
    }

    pub fn last_settled_at(&self, id: &AccountId) -> Option<Timestamp> {
        self.peek(id).and_then(|s| s.last_settled_at())
    }

    pub fn account(&self, id: &AccountId) -> AccountState {
        self.peek(id).unwrap_or_default()
    }

    /// Sum of materialized principal across all accounts (saturating).
    pub fn total_principal(&self) -> u128 {
        read(&self.accounts)
            .values()
            .map(|cell| lock(cell).principal())
            .fold(0u128, u128::saturating_add)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        lock(&self.allowances)
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    // ── Mint / burn ────────────────────────────────────────────────────

    /// Create `amount` new units for `to`.
    ///
    /// Requires [`Capability::MintAndBurn`]. An unfunded recipient is assigned
    /// the current protocol rate.
    pub fn mint(&self, caller: &AccountId, to: &AccountId, amount: u128) -> Result<u128, LedgerError> {
        self.authorize(caller, Capability::MintAndBurn)?;
        validate(&[to])?;
        let now = self.clock.now();
        let cell = self.cell(to);
        let mut events = Vec::new();
        {
            let mut committed = lock(&cell);
            let mut state = committed.clone();
            let settlement = AccrualEngine::settle(&mut state, now)?;
            if amount > 0 {
                let protocol_rate = self.current_protocol_rate();
                if RateRegistry::assign_rate(&mut state, protocol_rate) {
                    tracing::debug!(account = %to, rate = %protocol_rate, "assigned protocol rate");
                }
            }
            state.principal = state
                .principal
                .checked_add(amount)
                .ok_or(LedgerError::ArithmeticOverflow)?;
            *committed = state;

            events.extend(settled_event(to, &settlement));
            events.push(LedgerEvent::Minted {
                to: to.clone(),
                amount,
            });
        }
        tracing::debug!(to = %to, amount, "minted");
        self.publish(events);
        Ok(amount)
    }

    /// Destroy units held by `from`. Returns the amount burned.
    ///
    /// Requires [`Capability::MintAndBurn`]. [`AmountRequest::Full`] burns the
    /// whole balance including interest accrued up to now.
    pub fn burn(&self, caller: &AccountId, from: &AccountId, request: AmountRequest) -> Result<u128, LedgerError> {
        self.authorize(caller, Capability::MintAndBurn)?;
        validate(&[from])?;
        let result = self.burn_settled(from, request);
        if result.is_err() {
            self.discard_untouched(&[from]);
        }
        result
    }

    fn burn_settled(&self, from: &AccountId, request: AmountRequest) -> Result<u128, LedgerError> {
        let now = self.clock.now();
        let cell = self.cell(from);
        let mut events = Vec::new();
        let amount = {
            let mut committed = lock(&cell);
            let mut state = committed.clone();
            let settlement = AccrualEngine::settle(&mut state, now)?;
            let amount = request.resolve(state.principal);
            if amount > state.principal {
                return Err(LedgerError::InsufficientBalance {
                    needed: amount,
                    available: state.principal,
                });
            }
            state.principal -= amount;
            *committed = state;

            events.extend(settled_event(from, &settlement));
            events.push(LedgerEvent::Burned {
                from: from.clone(),
                amount,
            });
            amount
        };
        tracing::debug!(from = %from, amount, "burned");
        self.publish(events);
        Ok(amount)
    }

    // ── Transfers and allowances ───────────────────────────────────────

    /// Move units from `from` to `to`. Returns the amount moved.
    ///
    /// A recipient with zero principal inherits the sender's personal rate.
    pub fn transfer(&self, from: &AccountId, to: &AccountId, request: AmountRequest) -> Result<u128, LedgerError> {
        validate(&[from, to])?;
        self.move_principal(from, to, request, None)
    }

    /// Move units on behalf of `from`, consuming `spender`'s allowance.
    pub fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        request: AmountRequest,
    ) -> Result<u128, LedgerError> {
        validate(&[spender, from, to])?;
        self.move_principal(from, to, request, Some(spender))
    }

    /// Set the amount `spender` may move out of `owner`'s account.
    pub fn approve(&self, owner: &AccountId, spender: &AccountId, amount: u128) -> Result<(), LedgerError> {
        validate(&[owner, spender])?;
        lock(&self.allowances).insert((owner.clone(), spender.clone()), amount);
        self.publish(vec![LedgerEvent::Approval {
            owner: owner.clone(),
            spender: spender.clone(),
            amount,
        }]);
        Ok(())
    }

    /// Consume allowance. Must be the last fallible step before commit.
    fn spend_allowance(&self, owner: &AccountId, spender: &AccountId, amount: u128) -> Result<(), LedgerError> {
        let mut allowances = lock(&self.allowances);
        let key = (owner.clone(), spender.clone());
        let approved = allowances.get(&key).copied().unwrap_or(0);
        if approved == UNLIMITED_ALLOWANCE {
            return Ok(());
        }
        if approved < amount {
            return Err(LedgerError::InsufficientAllowance {
                needed: amount,
                available: approved,
            });
        }
        allowances.insert(key, approved - amount);
        Ok(())
    }

    fn move_principal(
        &self,
        from: &AccountId,
        to: &AccountId,
        request: AmountRequest,
        spender: Option<&AccountId>,
    ) -> Result<u128, LedgerError> {
        let now = self.clock.now();
        let result = if from == to {
            self.self_transfer(from, request, spender, now)
        } else {
            self.transfer_between(from, to, request, spender, now)
        };
        if result.is_err() {
            self.discard_untouched(&[from, to]);
        }
        result
    }

    fn transfer_between(
        &self,
        from: &AccountId,
        to: &AccountId,
        request: AmountRequest,
        spender: Option<&AccountId>,
        now: Timestamp,
    ) -> Result<u128, LedgerError> {
        let from_cell = self.cell(from);
        let to_cell = self.cell(to);
        let mut events = Vec::new();
        let amount = {
            let (mut from_committed, mut to_committed) = if from < to {
                let f = lock(&from_cell);
                let t = lock(&to_cell);
                (f, t)
            } else {
                let t = lock(&to_cell);
                let f = lock(&from_cell);
                (f, t)
            };
            let mut source = from_committed.clone();
            let mut dest = to_committed.clone();

            let source_settlement = AccrualEngine::settle(&mut source, now)?;
            let dest_settlement = AccrualEngine::settle(&mut dest, now)?;

            let amount = request.resolve(source.principal);
            if amount > source.principal {
                return Err(LedgerError::InsufficientBalance {
                    needed: amount,
                    available: source.principal,
                });
            }
            if amount > 0 && RateRegistry::assign_rate(&mut dest, source.personal_rate) {
                tracing::debug!(account = %to, rate = %source.personal_rate, from = %from, "inherited sender rate");
            }
            let dest_principal = dest
                .principal
                .checked_add(amount)
                .ok_or(LedgerError::ArithmeticOverflow)?;
            if let Some(spender) = spender {
                self.spend_allowance(from, spender, amount)?;
            }
            source.principal -= amount;
            dest.principal = dest_principal;

            *from_committed = source;
            *to_committed = dest;

            events.extend(settled_event(from, &source_settlement));
            events.extend(settled_event(to, &dest_settlement));
            amount
        };
        events.push(LedgerEvent::Transferred {
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        tracing::debug!(from = %from, to = %to, amount, "transferred");
        self.publish(events);
        Ok(amount)
    }

    /// Settle once, validate, and leave principal where it is.
    fn self_transfer(
        &self,
        account: &AccountId,
        request: AmountRequest,
        spender: Option<&AccountId>,
        now: Timestamp,
    ) -> Result<u128, LedgerError> {
        let cell = self.cell(account);
        let mut events = Vec::new();
        let amount = {
            let mut committed = lock(&cell);
            let mut state = committed.clone();
            let settlement = AccrualEngine::settle(&mut state, now)?;
            let amount = request.resolve(state.principal);
            if amount > state.principal {
                return Err(LedgerError::InsufficientBalance {
                    needed: amount,
                    available: state.principal,
                });
            }
            if let Some(spender) = spender {
                self.spend_allowance(account, spender, amount)?;
            }
            *committed = state;
            events.extend(settled_event(account, &settlement));
            amount
        };
        events.push(LedgerEvent::Transferred {
            from: account.clone(),
            to: account.clone(),
            amount,
        });
        self.publish(events);
        Ok(amount)
    }
}

impl RebaseLedger {
    /// Persist the account table, rate registry and allowances in one batch.
    ///
    /// All account locks are held (in `AccountId` order) while the snapshot
    /// is taken, so concurrent transfers are captured either fully or not at
    /// all.
    pub fn save_to_store(&self, store: &dyn LedgerStore) -> Result<(), LedgerError> {
        let accounts = read(&self.accounts);
        let mut cells: Vec<(&AccountId, &AccountCell)> = accounts.iter().collect();
        cells.sort_by(|a, b| a.0.cmp(b.0));
        let guards: Vec<(&AccountId, MutexGuard<'_, AccountState>)> =
            cells.into_iter().map(|(id, cell)| (id, lock(cell))).collect();

        let mut account_entries = Vec::with_capacity(guards.len());
        for (id, state) in &guards {
            if state.is_pristine() {
                continue;
            }
            account_entries.push(((*id).clone(), bincode::serialize(&**state)?));
        }

        let registry_bytes = bincode::serialize(&*read(&self.registry))?;
        let allowances: Vec<(AllowanceKey, u128)> = lock(&self.allowances)
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        let allowance_bytes = bincode::serialize(&allowances)?;

        store.write_batch(
            &account_entries,
            &[
                (REGISTRY_KEY.to_vec(), registry_bytes),
                (ALLOWANCES_KEY.to_vec(), allowance_bytes),
            ],
        )?;
        tracing::info!(accounts = account_entries.len(), "ledger saved to store");
        Ok(())
    }

    /// Restore a ledger from a store.
    ///
    /// `initial_rate` is used only when the store holds no rate registry yet.
    pub fn load_from_store(
        store: &dyn LedgerStore,
        initial_rate: Rate,
        collaborators: Collaborators,
    ) -> Result<Self, LedgerError> {
        let registry = match store.get_meta(REGISTRY_KEY)? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => RateRegistry::new(initial_rate, collaborators.clock.now()),
        };

        let allowances: HashMap<AllowanceKey, u128> = match store.get_meta(ALLOWANCES_KEY)? {
            Some(bytes) => bincode::deserialize::<Vec<(AllowanceKey, u128)>>(&bytes)?
                .into_iter()
                .collect(),
            None => HashMap::new(),
        };

        let mut accounts = HashMap::new();
        for (id, bytes) in store.iter_accounts()? {
            let state: AccountState = bincode::deserialize(&bytes)?;
            accounts.insert(id, Arc::new(Mutex::new(state)));
        }
        tracing::info!(accounts = accounts.len(), "ledger loaded from store");

        Ok(Self::with_parts(registry, accounts, allowances, collaborators))
    }
}
