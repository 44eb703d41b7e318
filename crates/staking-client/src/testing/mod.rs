//! In-memory stand-in for a Rocket Pool deployment.
//!
//! [`MockChain`] answers the same contract names and methods the live
//! contracts do and rejects writes with the same kind of revert reasons, so
//! the components can be driven end to end without a node. Historical
//! block ids are ignored: every read sees the latest state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy::{
    dyn_abi::DynSolValue,
    eips::BlockId,
    primitives::{keccak256, ruint::UintTryFrom, Address, TxHash, B256, U256},
};
use async_trait::async_trait;
use log::debug;
use tokio::sync::Mutex;

use crate::web3::contracts::constants::names::{
    ROCKET_DAO_NODE_TRUSTED, ROCKET_DAO_NODE_TRUSTED_PROPOSALS,
    ROCKET_DAO_NODE_TRUSTED_SETTINGS_PROPOSALS, ROCKET_DAO_PROPOSAL, ROCKET_DAO_PROTOCOL,
    ROCKET_REWARDS_POOL, ROCKET_STORAGE, ROCKET_TOKEN_NETH, ROCKET_TOKEN_RETH, ROCKET_TOKEN_RPL,
};
use crate::web3::contracts::core::error::InvokeError;
use crate::web3::contracts::core::invoker::{Clock, ContractInvoker, InvokeResult, TimeAdvancer};
use crate::web3::contracts::core::resolver::contract_address_key;
use crate::web3::contracts::helpers::fixed_point::{claim_amount, Ratio, SCALE};
use crate::web3::contracts::structs::proposal::{Proposal, ProposalState, VOTE_WEIGHT};
use crate::web3::wallet::Wallet;

pub const GENESIS_TIME: u64 = 1_700_000_000;

/// A mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTransaction {
    pub hash: TxHash,
    pub contract: String,
    pub method: String,
    pub from: Address,
}

#[derive(Debug, Clone)]
struct Claimer {
    registered_at: u64,
    percent: U256,
    /// Interval start of the last successful claim.
    last_claim: Option<u64>,
}

#[derive(Debug, Clone, Default)]
struct ClaimsCategory {
    enabled: bool,
    percent: U256,
    claimers: HashMap<Address, Claimer>,
}

#[derive(Debug, Clone)]
struct MockProposal {
    proposer: Address,
    created: u64,
    start: u64,
    end: u64,
    votes_for: U256,
    votes_against: U256,
    votes_required: U256,
    executed: bool,
    cancelled: bool,
    voters: HashSet<Address>,
}

#[derive(Debug, Clone, Default)]
struct Ledger {
    total_supply: U256,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

impl Ledger {
    fn balance(&self, owner: &Address) -> U256 {
        self.balances.get(owner).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn mint(&mut self, to: Address, amount: U256) {
        *self.balances.entry(to).or_default() += amount;
        self.total_supply += amount;
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: U256) -> InvokeResult<()> {
        let balance = self.balance(&from);
        if balance < amount {
            return Err(revert("ERC20: transfer amount exceeds balance"));
        }
        self.balances.insert(from, balance - amount);
        *self.balances.entry(to).or_default() += amount;
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct ChainState {
    now: u64,
    interval_start: u64,
    interval_duration: u64,
    interval_rewards_total: U256,
    addresses: HashMap<String, Address>,
    categories: HashMap<String, ClaimsCategory>,
    members: Vec<Address>,
    vote_delay: u64,
    vote_time: u64,
    proposals: Vec<MockProposal>,
    tokens: HashMap<String, Ledger>,
    eth_balances: HashMap<Address, U256>,
    bootstrap_mode: bool,
    settings: HashMap<(String, String), DynSolValue>,
    failures: HashMap<(String, String), InvokeError>,
    calls: HashMap<(String, String), usize>,
    transactions: Vec<MockTransaction>,
    /// Mined ahead of the next `transact`, as if sent by someone else.
    front_run: Vec<(String, String, Vec<DynSolValue>, Address)>,
}

fn revert(reason: &str) -> InvokeError {
    InvokeError::Reverted(reason.to_string())
}

fn name_address(name: &str) -> Address {
    Address::from_word(keccak256(name.as_bytes()))
}

fn gas_for(method: &str) -> u64 {
    match method {
        "claim" => 120_000,
        "vote" => 90_000,
        "execute" => 150_000,
        "transfer" | "approve" | "transferFrom" => 52_000,
        _ => 70_000,
    }
}

fn arg(args: &[DynSolValue], index: usize) -> InvokeResult<&DynSolValue> {
    args.get(index)
        .ok_or_else(|| InvokeError::Abi(format!("missing argument {index}")))
}

fn bad_arg(index: usize, expected: &str) -> InvokeError {
    InvokeError::Abi(format!("argument {index} is not {expected}"))
}

fn uint_arg(args: &[DynSolValue], index: usize) -> InvokeResult<U256> {
    arg(args, index)?
        .as_uint()
        .map(|(value, _)| value)
        .ok_or_else(|| bad_arg(index, "a uint"))
}

fn id_arg(args: &[DynSolValue], index: usize) -> InvokeResult<u64> {
    u64::try_from(uint_arg(args, index)?).map_err(|_| bad_arg(index, "a proposal id"))
}

fn bool_arg(args: &[DynSolValue], index: usize) -> InvokeResult<bool> {
    arg(args, index)?
        .as_bool()
        .ok_or_else(|| bad_arg(index, "a bool"))
}

fn address_arg(args: &[DynSolValue], index: usize) -> InvokeResult<Address> {
    arg(args, index)?
        .as_address()
        .ok_or_else(|| bad_arg(index, "an address"))
}

fn string_arg(args: &[DynSolValue], index: usize) -> InvokeResult<&str> {
    arg(args, index)?
        .as_str()
        .ok_or_else(|| bad_arg(index, "a string"))
}

fn bytes32_arg(args: &[DynSolValue], index: usize) -> InvokeResult<B256> {
    match arg(args, index)?.as_fixed_bytes() {
        Some((bytes, 32)) => Ok(B256::from_slice(bytes)),
        _ => Err(bad_arg(index, "a bytes32")),
    }
}

fn uint<T>(value: T) -> Vec<DynSolValue>
where
    U256: UintTryFrom<T>,
{
    vec![DynSolValue::Uint(U256::from(value), 256)]
}

fn boolean(value: bool) -> Vec<DynSolValue> {
    vec![DynSolValue::Bool(value)]
}

impl ChainState {
    fn new() -> Self {
        let mut state = Self {
            now: GENESIS_TIME,
            interval_start: GENESIS_TIME,
            interval_duration: 28 * 24 * 60 * 60,
            interval_rewards_total: U256::ZERO,
            addresses: HashMap::new(),
            categories: HashMap::new(),
            members: Vec::new(),
            vote_delay: 60,
            vote_time: 2 * 24 * 60 * 60,
            proposals: Vec::new(),
            tokens: HashMap::new(),
            eth_balances: HashMap::new(),
            bootstrap_mode: true,
            settings: HashMap::new(),
            failures: HashMap::new(),
            calls: HashMap::new(),
            transactions: Vec::new(),
            front_run: Vec::new(),
        };
        for name in [
            ROCKET_STORAGE,
            ROCKET_REWARDS_POOL,
            ROCKET_DAO_PROPOSAL,
            ROCKET_DAO_NODE_TRUSTED,
            ROCKET_DAO_NODE_TRUSTED_PROPOSALS,
            ROCKET_DAO_NODE_TRUSTED_SETTINGS_PROPOSALS,
            ROCKET_DAO_PROTOCOL,
        ] {
            state.register(name);
        }
        for token in [ROCKET_TOKEN_RPL, ROCKET_TOKEN_RETH, ROCKET_TOKEN_NETH] {
            state.register(token);
            state.tokens.insert(token.to_string(), Ledger::default());
        }
        state
    }

    fn register(&mut self, name: &str) -> Address {
        *self
            .addresses
            .entry(name.to_string())
            .or_insert_with(|| name_address(name))
    }

    /// Counts the call and surfaces an injected failure.
    fn record(&mut self, contract: &str, method: &str) -> InvokeResult<()> {
        let key = (contract.to_string(), method.to_string());
        *self.calls.entry(key.clone()).or_default() += 1;
        match self.failures.get(&key) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn ensure_known(&self, contract: &str) -> InvokeResult<()> {
        if self.addresses.contains_key(contract) {
            Ok(())
        } else {
            Err(InvokeError::UnknownContract(contract.to_string()))
        }
    }

    fn mine(&mut self, contract: &str, method: &str, from: Address) -> TxHash {
        let hash = keccak256((self.transactions.len() as u64).to_be_bytes());
        self.transactions.push(MockTransaction {
            hash,
            contract: contract.to_string(),
            method: method.to_string(),
            from,
        });
        hash
    }

    fn apply_front_run(&mut self) {
        for (contract, method, args, from) in std::mem::take(&mut self.front_run) {
            match self.write(&contract, &method, &args, from) {
                Ok(()) => {
                    self.mine(&contract, &method, from);
                }
                Err(err) => debug!("Front-run {contract}.{method} from {from} failed: {err}"),
            }
        }
    }

    fn no_method(contract: &str, method: &str) -> InvokeError {
        InvokeError::Abi(format!("{contract} has no method {method}"))
    }

    fn claim_possible(&self, category: &ClaimsCategory, claimer: &Address) -> bool {
        category.enabled
            && category.claimers.get(claimer).is_some_and(|c| {
                c.registered_at <= self.interval_start && c.last_claim != Some(self.interval_start)
            })
    }

    /// Registered share; still reported after the claimer has claimed.
    fn claimer_percent(&self, category: &ClaimsCategory, claimer: &Address) -> U256 {
        category
            .claimers
            .get(claimer)
            .map(|c| c.percent)
            .unwrap_or_default()
    }

    fn claimer_amount(&self, category: &ClaimsCategory, claimer: &Address) -> U256 {
        if !self.claim_possible(category, claimer) {
            return U256::ZERO;
        }
        claim_amount(
            self.interval_rewards_total,
            Ratio::from_raw(category.percent),
            Ratio::from_raw(self.claimer_percent(category, claimer)),
        )
        .unwrap_or_default()
    }

    fn proposal(&self, id: u64) -> InvokeResult<&MockProposal> {
        usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|index| self.proposals.get(index))
            .ok_or_else(|| revert("Invalid proposal ID"))
    }

    fn proposal_mut(&mut self, id: u64) -> InvokeResult<&mut MockProposal> {
        usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|index| self.proposals.get_mut(index))
            .ok_or_else(|| revert("Invalid proposal ID"))
    }

    fn proposal_state(&self, id: u64) -> InvokeResult<ProposalState> {
        let p = self.proposal(id)?;
        let view = Proposal {
            id,
            proposer: p.proposer,
            created_at: p.created,
            vote_delay_end: p.start,
            voting_end: p.end,
            votes_for: p.votes_for,
            votes_against: p.votes_against,
            quorum_threshold: p.votes_required,
            member_count: self.members.len() as u64,
            executed: p.executed,
            cancelled: p.cancelled,
        };
        Ok(view.state_at(self.now))
    }

    fn ledger(&self, token: &str) -> InvokeResult<&Ledger> {
        self.tokens
            .get(token)
            .ok_or_else(|| InvokeError::UnknownContract(token.to_string()))
    }

    fn ledger_mut(&mut self, token: &str) -> InvokeResult<&mut Ledger> {
        self.tokens
            .get_mut(token)
            .ok_or_else(|| InvokeError::UnknownContract(token.to_string()))
    }

    fn read(
        &self,
        contract: &str,
        method: &str,
        args: &[DynSolValue],
    ) -> InvokeResult<Vec<DynSolValue>> {
        self.ensure_known(contract)?;

        if let Some(category) = self.categories.get(contract) {
            return match method {
                "getEnabled" => Ok(boolean(category.enabled)),
                "getClaimPossible" => {
                    Ok(boolean(self.claim_possible(category, &address_arg(args, 0)?)))
                }
                "getClaimRewardsPerc" => {
                    Ok(uint(self.claimer_percent(category, &address_arg(args, 0)?)))
                }
                "getClaimRewardsAmount" => {
                    Ok(uint(self.claimer_amount(category, &address_arg(args, 0)?)))
                }
                _ => Err(Self::no_method(contract, method)),
            };
        }

        if let Some(ledger) = self.tokens.get(contract) {
            return match method {
                "totalSupply" => Ok(uint(ledger.total_supply)),
                "balanceOf" => Ok(uint(ledger.balance(&address_arg(args, 0)?))),
                "allowance" => Ok(uint(
                    ledger.allowance(address_arg(args, 0)?, address_arg(args, 1)?),
                )),
                _ => Err(Self::no_method(contract, method)),
            };
        }

        match (contract, method) {
            (ROCKET_STORAGE, "getAddress") => {
                let key = bytes32_arg(args, 0)?;
                let address = self
                    .addresses
                    .iter()
                    .find(|(name, _)| contract_address_key(name) == key)
                    .map(|(_, address)| *address)
                    .unwrap_or(Address::ZERO);
                Ok(vec![DynSolValue::Address(address)])
            }

            (ROCKET_REWARDS_POOL, "getClaimIntervalTimeStart") => Ok(uint(self.interval_start)),
            (ROCKET_REWARDS_POOL, "getClaimIntervalTime") => Ok(uint(self.interval_duration)),
            (ROCKET_REWARDS_POOL, "getClaimIntervalRewardsTotal") => {
                Ok(uint(self.interval_rewards_total))
            }
            (ROCKET_REWARDS_POOL, "getClaimingContractPerc") => {
                let percent = self
                    .categories
                    .get(string_arg(args, 0)?)
                    .map(|c| c.percent)
                    .unwrap_or_default();
                Ok(uint(percent))
            }
            (ROCKET_REWARDS_POOL, "getClaimingContractExists") => {
                Ok(boolean(self.categories.contains_key(string_arg(args, 0)?)))
            }
            (ROCKET_REWARDS_POOL, "getClaimingContractUserRegisteredTime") => {
                let claimer = address_arg(args, 1)?;
                let registered = self
                    .categories
                    .get(string_arg(args, 0)?)
                    .and_then(|c| c.claimers.get(&claimer))
                    .map(|c| c.registered_at)
                    .unwrap_or_default();
                Ok(uint(registered))
            }

            (ROCKET_DAO_PROPOSAL, "getTotal") => Ok(uint(self.proposals.len() as u64)),
            (ROCKET_DAO_PROPOSAL, "getProposer") => Ok(vec![DynSolValue::Address(
                self.proposal(id_arg(args, 0)?)?.proposer,
            )]),
            (ROCKET_DAO_PROPOSAL, "getCreated") => Ok(uint(self.proposal(id_arg(args, 0)?)?.created)),
            (ROCKET_DAO_PROPOSAL, "getStart") => Ok(uint(self.proposal(id_arg(args, 0)?)?.start)),
            (ROCKET_DAO_PROPOSAL, "getEnd") => Ok(uint(self.proposal(id_arg(args, 0)?)?.end)),
            (ROCKET_DAO_PROPOSAL, "getVotesFor") => {
                Ok(uint(self.proposal(id_arg(args, 0)?)?.votes_for))
            }
            (ROCKET_DAO_PROPOSAL, "getVotesAgainst") => {
                Ok(uint(self.proposal(id_arg(args, 0)?)?.votes_against))
            }
            (ROCKET_DAO_PROPOSAL, "getVotesRequired") => {
                Ok(uint(self.proposal(id_arg(args, 0)?)?.votes_required))
            }
            (ROCKET_DAO_PROPOSAL, "getExecuted") => {
                Ok(boolean(self.proposal(id_arg(args, 0)?)?.executed))
            }
            (ROCKET_DAO_PROPOSAL, "getCancelled") => {
                Ok(boolean(self.proposal(id_arg(args, 0)?)?.cancelled))
            }
            (ROCKET_DAO_PROPOSAL, "getReceiptHasVoted") => {
                let voter = address_arg(args, 1)?;
                Ok(boolean(
                    self.proposal(id_arg(args, 0)?)?.voters.contains(&voter),
                ))
            }

            (ROCKET_DAO_NODE_TRUSTED, "getMemberCount") => Ok(uint(self.members.len() as u64)),

            (ROCKET_DAO_NODE_TRUSTED_SETTINGS_PROPOSALS, "getVoteDelayTime") => {
                Ok(uint(self.vote_delay))
            }
            (ROCKET_DAO_NODE_TRUSTED_SETTINGS_PROPOSALS, "getVoteTime") => Ok(uint(self.vote_time)),

            _ => Err(Self::no_method(contract, method)),
        }
    }

    fn write(
        &mut self,
        contract: &str,
        method: &str,
        args: &[DynSolValue],
        from: Address,
    ) -> InvokeResult<()> {
        self.ensure_known(contract)?;

        if self.categories.contains_key(contract) {
            return match method {
                "claim" => self.claim(contract, from),
                _ => Err(Self::no_method(contract, method)),
            };
        }

        if self.tokens.contains_key(contract) {
            return match method {
                "transfer" => {
                    let (to, amount) = (address_arg(args, 0)?, uint_arg(args, 1)?);
                    self.ledger_mut(contract)?.move_balance(from, to, amount)
                }
                "approve" => {
                    let (spender, amount) = (address_arg(args, 0)?, uint_arg(args, 1)?);
                    self.ledger_mut(contract)?
                        .allowances
                        .insert((from, spender), amount);
                    Ok(())
                }
                "transferFrom" => {
                    let (owner, to, amount) =
                        (address_arg(args, 0)?, address_arg(args, 1)?, uint_arg(args, 2)?);
                    let ledger = self.ledger_mut(contract)?;
                    let allowed = ledger.allowance(owner, from);
                    if allowed < amount {
                        return Err(revert("ERC20: insufficient allowance"));
                    }
                    ledger.move_balance(owner, to, amount)?;
                    ledger.allowances.insert((owner, from), allowed - amount);
                    Ok(())
                }
                _ => Err(Self::no_method(contract, method)),
            };
        }

        match (contract, method) {
            (ROCKET_DAO_NODE_TRUSTED_PROPOSALS, "vote") => {
                self.vote(id_arg(args, 0)?, bool_arg(args, 1)?, from)
            }
            (ROCKET_DAO_NODE_TRUSTED_PROPOSALS, "execute") => self.execute(id_arg(args, 0)?),

            (ROCKET_DAO_PROTOCOL, "bootstrapSettingBool") => {
                let value = DynSolValue::Bool(bool_arg(args, 2)?);
                self.bootstrap_setting(args, value)
            }
            (ROCKET_DAO_PROTOCOL, "bootstrapSettingUint") => {
                let value = DynSolValue::Uint(uint_arg(args, 2)?, 256);
                self.bootstrap_setting(args, value)
            }
            (ROCKET_DAO_PROTOCOL, "bootstrapSettingAddress") => {
                let value = DynSolValue::Address(address_arg(args, 2)?);
                self.bootstrap_setting(args, value)
            }
            (ROCKET_DAO_PROTOCOL, "bootstrapSettingClaimer") => {
                self.bootstrap_claimer(string_arg(args, 0)?, uint_arg(args, 1)?)
            }

            _ => Err(Self::no_method(contract, method)),
        }
    }

    fn claim(&mut self, category: &str, from: Address) -> InvokeResult<()> {
        let (possible, amount) = match self.categories.get(category) {
            Some(c) => (self.claim_possible(c, &from), self.claimer_amount(c, &from)),
            None => (false, U256::ZERO),
        };
        if !possible {
            return Err(revert("This claimer is not eligible to claim"));
        }

        let interval_start = self.interval_start;
        if let Some(claimer) = self
            .categories
            .get_mut(category)
            .and_then(|c| c.claimers.get_mut(&from))
        {
            claimer.last_claim = Some(interval_start);
        }
        self.ledger_mut(ROCKET_TOKEN_RPL)?.mint(from, amount);
        Ok(())
    }

    fn vote(&mut self, id: u64, support: bool, from: Address) -> InvokeResult<()> {
        if !self.members.contains(&from) {
            return Err(revert("Invalid trusted node"));
        }
        if self.proposal_state(id)? != ProposalState::Active {
            return Err(revert("Voting is not active for this proposal"));
        }
        let proposal = self.proposal_mut(id)?;
        if !proposal.voters.insert(from) {
            return Err(revert("Member has already voted on proposal"));
        }
        if support {
            proposal.votes_for += VOTE_WEIGHT;
        } else {
            proposal.votes_against += VOTE_WEIGHT;
        }
        Ok(())
    }

    fn execute(&mut self, id: u64) -> InvokeResult<()> {
        if self.proposal_state(id)? != ProposalState::Succeeded {
            return Err(revert(
                "Proposal has not succeeded, has expired or has already been executed",
            ));
        }
        self.proposal_mut(id)?.executed = true;
        Ok(())
    }

    fn bootstrap_setting(&mut self, args: &[DynSolValue], value: DynSolValue) -> InvokeResult<()> {
        if !self.bootstrap_mode {
            return Err(revert("Bootstrap mode not engaged"));
        }
        let key = (string_arg(args, 0)?.to_string(), string_arg(args, 1)?.to_string());
        self.settings.insert(key, value);
        Ok(())
    }

    fn bootstrap_claimer(&mut self, contract: &str, percent: U256) -> InvokeResult<()> {
        if !self.bootstrap_mode {
            return Err(revert("Bootstrap mode not engaged"));
        }
        let others = self
            .categories
            .iter()
            .filter(|(name, _)| name.as_str() != contract)
            .fold(U256::ZERO, |total, (_, c)| total.saturating_add(c.percent));
        if others.saturating_add(percent) > SCALE {
            return Err(revert("Claimers total percentage cannot exceed 100%"));
        }
        self.register(contract);
        self.categories
            .entry(contract.to_string())
            .or_insert_with(|| ClaimsCategory {
                enabled: true,
                ..Default::default()
            })
            .percent = percent;
        Ok(())
    }
}

/// Shared handle to the simulated chain. Clones see the same state.
#[derive(Clone)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ChainState::new())),
        }
    }

    pub async fn now(&self) -> u64 {
        self.state.lock().await.now
    }

    pub async fn set_time(&self, now: u64) {
        self.state.lock().await.now = now;
    }

    pub async fn set_interval(&self, start: u64, duration_secs: u64, rewards_total: U256) {
        let mut state = self.state.lock().await;
        state.interval_start = start;
        state.interval_duration = duration_secs;
        state.interval_rewards_total = rewards_total;
    }

    pub async fn add_category(&self, name: &str, enabled: bool, percent: Ratio) {
        let mut state = self.state.lock().await;
        state.register(name);
        let category = state.categories.entry(name.to_string()).or_default();
        category.enabled = enabled;
        category.percent = percent.raw();
    }

    /// Registers `claimer` with a category previously added through
    /// [`add_category`](Self::add_category).
    pub async fn register_claimer(
        &self,
        category: &str,
        claimer: Address,
        registered_at: u64,
        percent: Ratio,
    ) {
        let mut state = self.state.lock().await;
        state
            .categories
            .entry(category.to_string())
            .or_default()
            .claimers
            .insert(
                claimer,
                Claimer {
                    registered_at,
                    percent: percent.raw(),
                    last_claim: None,
                },
            );
    }

    pub async fn set_members(&self, members: &[Address]) {
        self.state.lock().await.members = members.to_vec();
    }

    pub async fn set_proposal_settings(&self, vote_delay: u64, vote_time: u64) {
        let mut state = self.state.lock().await;
        state.vote_delay = vote_delay;
        state.vote_time = vote_time;
    }

    /// Submits a proposal that needs `quorum` member votes. Returns its id.
    pub async fn create_proposal(&self, proposer: Address, quorum: u64) -> u64 {
        let mut state = self.state.lock().await;
        let start = state.now + state.vote_delay;
        let end = start + state.vote_time;
        let proposal = MockProposal {
            proposer,
            created: state.now,
            start,
            end,
            votes_for: U256::ZERO,
            votes_against: U256::ZERO,
            votes_required: U256::from(quorum) * VOTE_WEIGHT,
            executed: false,
            cancelled: false,
            voters: HashSet::new(),
        };
        state.proposals.push(proposal);
        let id = state.proposals.len() as u64;
        debug!("Mock proposal {id} opens at {start}, closes at {end}");
        id
    }

    pub async fn cancel_proposal(&self, id: u64) {
        if let Ok(proposal) = self.state.lock().await.proposal_mut(id) {
            proposal.cancelled = true;
        }
    }

    pub async fn mint(&self, token: &str, to: Address, amount: U256) {
        if let Ok(ledger) = self.state.lock().await.ledger_mut(token) {
            ledger.mint(to, amount);
        }
    }

    pub async fn token_balance(&self, token: &str, owner: Address) -> U256 {
        self.state
            .lock()
            .await
            .ledger(token)
            .map(|ledger| ledger.balance(&owner))
            .unwrap_or_default()
    }

    pub async fn set_eth_balance(&self, address: Address, amount: U256) {
        self.state.lock().await.eth_balances.insert(address, amount);
    }

    pub async fn set_bootstrap_mode(&self, enabled: bool) {
        self.state.lock().await.bootstrap_mode = enabled;
    }

    /// Makes every call to `contract.method` fail with `err`.
    pub async fn fail_method(&self, contract: &str, method: &str, err: InvokeError) {
        self.state
            .lock()
            .await
            .failures
            .insert((contract.to_string(), method.to_string()), err);
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    pub async fn call_count(&self, contract: &str, method: &str) -> usize {
        self.state
            .lock()
            .await
            .calls
            .get(&(contract.to_string(), method.to_string()))
            .copied()
            .unwrap_or_default()
    }

    pub async fn transactions(&self) -> Vec<MockTransaction> {
        self.state.lock().await.transactions.clone()
    }

    /// Queues a transaction that lands just before the next `transact`.
    pub async fn front_run(
        &self,
        contract: &str,
        method: &str,
        args: Vec<DynSolValue>,
        from: Address,
    ) {
        self.state.lock().await.front_run.push((
            contract.to_string(),
            method.to_string(),
            args,
            from,
        ));
    }

    pub async fn setting(&self, contract: &str, setting: &str) -> Option<DynSolValue> {
        self.state
            .lock()
            .await
            .settings
            .get(&(contract.to_string(), setting.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ContractInvoker for MockChain {
    async fn call(
        &self,
        contract: &str,
        method: &str,
        args: &[DynSolValue],
        _at: Option<BlockId>,
    ) -> InvokeResult<Vec<DynSolValue>> {
        let mut state = self.state.lock().await;
        state.record(contract, method)?;
        state.read(contract, method, args)
    }

    async fn transact(
        &self,
        contract: &str,
        method: &str,
        args: &[DynSolValue],
        wallet: &Wallet,
    ) -> InvokeResult<TxHash> {
        let mut state = self.state.lock().await;
        state.record(contract, method)?;
        let from = wallet.address();
        state.apply_front_run();
        state.write(contract, method, args, from)?;
        Ok(state.mine(contract, method, from))
    }

    async fn estimate_gas(
        &self,
        contract: &str,
        method: &str,
        args: &[DynSolValue],
        wallet: &Wallet,
    ) -> InvokeResult<u64> {
        let mut state = self.state.lock().await;
        state.record(contract, method)?;
        let mut scratch = state.clone();
        scratch.write(contract, method, args, wallet.address())?;
        Ok(gas_for(method))
    }

    async fn native_balance(&self, address: Address, _at: Option<BlockId>) -> InvokeResult<U256> {
        let mut state = self.state.lock().await;
        state.record("eth", "getBalance")?;
        Ok(state.eth_balances.get(&address).copied().unwrap_or_default())
    }

    async fn contract_address(&self, contract: &str) -> InvokeResult<Address> {
        let state = self.state.lock().await;
        state.ensure_known(contract)?;
        Ok(name_address(contract))
    }
}

#[async_trait]
impl Clock for MockChain {
    async fn block_timestamp(&self, _at: Option<BlockId>) -> InvokeResult<u64> {
        let mut state = self.state.lock().await;
        state.record("block", "timestamp")?;
        Ok(state.now)
    }
}

#[async_trait]
impl TimeAdvancer for MockChain {
    async fn increase_time(&self, seconds: u64) -> InvokeResult<()> {
        let mut state = self.state.lock().await;
        state.record("evm", "increaseTime")?;
        state.now += seconds;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_storage_resolves_registered_names() {
        let chain = MockChain::new();
        let key = DynSolValue::FixedBytes(contract_address_key(ROCKET_REWARDS_POOL), 32);
        let values = chain
            .call(ROCKET_STORAGE, "getAddress", &[key], None)
            .await
            .unwrap();
        assert_eq!(
            values[0].as_address(),
            Some(name_address(ROCKET_REWARDS_POOL))
        );

        let key = DynSolValue::FixedBytes(contract_address_key("rocketClaimDAO"), 32);
        let values = chain
            .call(ROCKET_STORAGE, "getAddress", &[key], None)
            .await
            .unwrap();
        assert_eq!(values[0].as_address(), Some(Address::ZERO));
    }

    #[tokio::test]
    async fn test_estimate_does_not_mutate() {
        let chain = MockChain::new();
        let wallet = Wallet::random();
        chain
            .mint(ROCKET_TOKEN_RPL, wallet.address(), U256::from(10))
            .await;

        let args = [
            DynSolValue::Address(Address::repeat_byte(1)),
            DynSolValue::Uint(U256::from(4), 256),
        ];
        chain
            .estimate_gas(ROCKET_TOKEN_RPL, "transfer", &args, &wallet)
            .await
            .unwrap();
        assert_eq!(
            chain.token_balance(ROCKET_TOKEN_RPL, wallet.address()).await,
            U256::from(10)
        );
        assert!(chain.transactions().await.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let chain = MockChain::new();
        chain
            .fail_method(
                ROCKET_DAO_PROPOSAL,
                "getTotal",
                InvokeError::Transport("timeout".to_string()),
            )
            .await;
        let result = chain.call(ROCKET_DAO_PROPOSAL, "getTotal", &[], None).await;
        assert_eq!(result, Err(InvokeError::Transport("timeout".to_string())));
        assert_eq!(chain.call_count(ROCKET_DAO_PROPOSAL, "getTotal").await, 1);

        chain.clear_failures().await;
        assert!(chain
            .call(ROCKET_DAO_PROPOSAL, "getTotal", &[], None)
            .await
            .is_ok());
    }
}
