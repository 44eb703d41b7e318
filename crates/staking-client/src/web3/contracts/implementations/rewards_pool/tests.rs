use super::*;
use crate::testing::{MockChain, GENESIS_TIME};
use crate::web3::contracts::constants::names::ROCKET_TOKEN_RPL;
use crate::web3::contracts::helpers::fixed_point::SCALE;

const DAY: u64 = 24 * 60 * 60;

fn eth(value: u64) -> U256 {
    U256::from(value) * SCALE
}

fn ratio(value: f64) -> Ratio {
    Ratio::from_f64(value).unwrap()
}

async fn setup(rewards_total: U256) -> (Arc<MockChain>, RewardsIntervalOracle<MockChain, MockChain>) {
    let chain = Arc::new(MockChain::new());
    chain.set_interval(GENESIS_TIME, 28 * DAY, rewards_total).await;
    chain.add_category(ROCKET_CLAIM_NODE, true, ratio(0.10)).await;
    chain
        .add_category(ROCKET_CLAIM_TRUSTED_NODE, true, ratio(0.20))
        .await;
    let oracle = RewardsIntervalOracle::new(chain.clone(), chain.clone());
    (chain, oracle)
}

#[tokio::test]
async fn test_current_interval_and_status() {
    let (chain, oracle) = setup(eth(1000)).await;
    chain.set_time(GENESIS_TIME + 3 * DAY).await;

    let interval = oracle.get_current_interval(None).await.unwrap();
    assert_eq!(interval.start, GENESIS_TIME);
    assert_eq!(interval.duration, Duration::from_secs(28 * DAY));

    let status = oracle.get_interval_status(None).await.unwrap();
    assert_eq!(status.current_time, GENESIS_TIME + 3 * DAY);
    assert_eq!(status.next_interval_at, GENESIS_TIME + 28 * DAY);
    assert_eq!(status.seconds_until_next, 25 * DAY);

    assert_eq!(oracle.get_interval_rewards_total(None).await.unwrap(), eth(1000));
}

#[tokio::test]
async fn test_zero_interval_duration_is_rejected() {
    let (chain, oracle) = setup(eth(1000)).await;
    chain.set_interval(GENESIS_TIME, 0, eth(1000)).await;

    let result = oracle.get_current_interval(None).await;
    assert!(matches!(
        result,
        Err(ContractError::ChainRead {
            source: InvokeError::Decode(_),
            ..
        })
    ));
}

#[tokio::test]
async fn test_category_percents() {
    let (_chain, oracle) = setup(eth(1000)).await;

    assert_eq!(
        oracle.get_node_operator_rewards_percent(None).await.unwrap(),
        ratio(0.10)
    );
    assert_eq!(
        oracle
            .get_trusted_node_operator_rewards_percent(None)
            .await
            .unwrap(),
        ratio(0.20)
    );

    let configs = oracle
        .get_category_configs(&[ROCKET_CLAIM_NODE, ROCKET_CLAIM_TRUSTED_NODE], None)
        .await
        .unwrap();
    assert_eq!(configs.len(), 2);
    assert!(configs.iter().all(|config| config.enabled));
    let total = configs
        .iter()
        .try_fold(Ratio::ZERO, |total, config| total.checked_add(config.global_percent))
        .unwrap();
    assert!(total.is_fraction());
}

#[tokio::test]
async fn test_category_percents_above_one_are_inconsistent() {
    let (chain, oracle) = setup(eth(1000)).await;
    chain.add_category(ROCKET_CLAIM_NODE, true, ratio(0.7)).await;
    chain
        .add_category(ROCKET_CLAIM_TRUSTED_NODE, true, ratio(0.4))
        .await;

    let result = oracle
        .get_category_configs(&[ROCKET_CLAIM_NODE, ROCKET_CLAIM_TRUSTED_NODE], None)
        .await;
    assert!(matches!(result, Err(ContractError::InconsistentState(_))));
}

#[tokio::test]
async fn test_unknown_category_is_not_found() {
    let (_chain, oracle) = setup(eth(1000)).await;

    let result = oracle.get_category_config("rocketClaimDAO", None).await;
    assert!(matches!(result, Err(ContractError::NotFound(_))));

    let result = oracle
        .get_claimer_share("rocketClaimDAO", Address::repeat_byte(1), None)
        .await;
    assert!(matches!(result, Err(ContractError::NotFound(_))));
}

#[tokio::test]
async fn test_transport_failure_is_chain_read() {
    let (chain, oracle) = setup(eth(1000)).await;
    chain
        .fail_method(
            ROCKET_REWARDS_POOL,
            "getClaimIntervalTime",
            InvokeError::Transport("connection reset".to_string()),
        )
        .await;

    let result = oracle.get_current_interval(None).await;
    assert!(matches!(
        result,
        Err(ContractError::ChainRead {
            source: InvokeError::Transport(_),
            ..
        })
    ));
}

#[tokio::test]
async fn test_claimer_share_truncates() {
    let (chain, oracle) = setup(eth(1000)).await;
    let claimer = Address::repeat_byte(0x11);
    chain
        .register_claimer(ROCKET_CLAIM_NODE, claimer, GENESIS_TIME - DAY, ratio(0.05))
        .await;

    let share = oracle
        .get_claimer_share(ROCKET_CLAIM_NODE, claimer, None)
        .await
        .unwrap();
    assert!(share.claim_possible);
    assert_eq!(share.percent_eligible, ratio(0.05));
    assert_eq!(share.amount_eligible, eth(5));

    // Reading twice without a state change yields the same share
    let again = oracle
        .get_claimer_share(ROCKET_CLAIM_NODE, claimer, None)
        .await
        .unwrap();
    assert_eq!(share, again);

    chain.set_interval(GENESIS_TIME, 28 * DAY, U256::from(999)).await;
    let share = oracle
        .get_claimer_share(ROCKET_CLAIM_NODE, claimer, None)
        .await
        .unwrap();
    assert_eq!(share.amount_eligible, U256::from(4));
}

#[tokio::test]
async fn test_late_registration_has_nothing_to_claim() {
    let (chain, oracle) = setup(eth(1000)).await;
    let claimer = Address::repeat_byte(0x22);
    chain
        .register_claimer(ROCKET_CLAIM_NODE, claimer, GENESIS_TIME + DAY, ratio(0.05))
        .await;

    let share = oracle
        .get_claimer_share(ROCKET_CLAIM_NODE, claimer, None)
        .await
        .unwrap();
    assert!(!share.claim_possible);
    assert!(!share.has_claimable());
    assert_eq!(
        oracle
            .get_registration_time(ROCKET_CLAIM_NODE, claimer, None)
            .await
            .unwrap(),
        GENESIS_TIME + DAY
    );
}

#[tokio::test]
async fn test_disabled_category_has_nothing_to_claim() {
    let (chain, oracle) = setup(eth(1000)).await;
    let claimer = Address::repeat_byte(0x33);
    chain.add_category(ROCKET_CLAIM_NODE, false, ratio(0.10)).await;
    chain
        .register_claimer(ROCKET_CLAIM_NODE, claimer, GENESIS_TIME - DAY, ratio(0.05))
        .await;

    let config = oracle
        .get_category_config(ROCKET_CLAIM_NODE, None)
        .await
        .unwrap();
    assert!(!config.enabled);

    let share = oracle
        .get_claimer_share(ROCKET_CLAIM_NODE, claimer, None)
        .await
        .unwrap();
    assert_eq!(share.amount_eligible, U256::ZERO);
}

#[tokio::test]
async fn test_claim_once_per_interval() {
    let (chain, oracle) = setup(eth(1000)).await;
    let wallet = Wallet::random();
    let claimer = wallet.address();
    chain
        .register_claimer(ROCKET_CLAIM_NODE, claimer, GENESIS_TIME - DAY, ratio(0.05))
        .await;

    let gas = oracle
        .estimate_claim_gas(ROCKET_CLAIM_NODE, &wallet)
        .await
        .unwrap();
    assert!(gas.safe_gas_limit > gas.estimated_gas);

    oracle
        .submit_claim(ROCKET_CLAIM_NODE, claimer, &wallet)
        .await
        .unwrap();
    assert_eq!(chain.token_balance(ROCKET_TOKEN_RPL, claimer).await, eth(5));

    let share = oracle
        .get_claimer_share(ROCKET_CLAIM_NODE, claimer, None)
        .await
        .unwrap();
    assert!(!share.claim_possible);
    assert_eq!(share.percent_eligible, ratio(0.05));
    assert!(share.percent_eligible > Ratio::ZERO);
    assert_eq!(share.amount_eligible, U256::ZERO);

    let result = oracle.submit_claim(ROCKET_CLAIM_NODE, claimer, &wallet).await;
    assert!(matches!(result, Err(ContractError::ClaimRejected { .. })));
    assert_eq!(chain.transactions().await.len(), 1);
}

#[tokio::test]
async fn test_claim_for_someone_else_is_rejected_locally() {
    let (chain, oracle) = setup(eth(1000)).await;
    let wallet = Wallet::random();
    let claimer = Address::repeat_byte(0x44);
    chain
        .register_claimer(ROCKET_CLAIM_NODE, claimer, GENESIS_TIME - DAY, ratio(0.05))
        .await;

    let result = oracle.submit_claim(ROCKET_CLAIM_NODE, claimer, &wallet).await;
    assert!(matches!(
        result,
        Err(ContractError::ClaimRejected { claimer: rejected, .. }) if rejected == claimer
    ));
    assert_eq!(chain.call_count(ROCKET_CLAIM_NODE, "claim").await, 0);
}
