//! Many tasks sharing one market behind the service lock

use binary_pool_market::{
    AppState, FeeRate, MarketConfig, MarketError, Outcome, SettlementPolicy, SharedState,
};
use std::net::SocketAddr;

const BETTORS: usize = 32;
const ROUNDS: u64 = 20;

fn shared_market() -> SharedState {
    let config = MarketConfig {
        fee_rate: FeeRate::default(),
        fee_recipient: Some("TREASURY".to_string()),
        custody_account: "CUSTODY".to_string(),
        settlement: SettlementPolicy::Open,
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        state_path: std::env::temp_dir().join("binary-pool-market-concurrency.json"),
    };
    AppState::new(&config).shared()
}

fn bettor(i: usize) -> String {
    format!("BETTOR_{:02}", i)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bets_and_withdrawals_conserve_pools() {
    let state = shared_market();
    {
        let mut app = state.write().await;
        for i in 0..BETTORS {
            app.market.asset_mut().mint(&bettor(i), 10_000).unwrap();
            app.market.asset_mut().approve(&bettor(i), 10_000);
        }
    }

    let mut handles = Vec::new();
    for i in 0..BETTORS {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            let me = bettor(i);
            let side = if i % 2 == 0 { Outcome::A } else { Outcome::B };
            for round in 1..=ROUNDS {
                state.write().await.market.place_bet(&me, side, round).unwrap();
                if round % 5 == 0 {
                    state.write().await.market.withdraw_bet(&me, side).unwrap();
                }
                // Readers never see a pool that disagrees with custody
                let app = state.read().await;
                assert_eq!(app.market.total_pool(), app.market.asset().custody_balance());
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let app = state.read().await;
    let mut sums = [0u64; 2];
    for i in 0..BETTORS {
        for outcome in Outcome::ALL {
            sums[outcome.index()] += app.market.stake_of(&bettor(i), outcome);
        }
    }
    assert_eq!(app.market.total_on(Outcome::A), sums[0]);
    assert_eq!(app.market.total_on(Outcome::B), sums[1]);
    assert_eq!(app.market.total_pool(), app.market.asset().custody_balance());
    // Every bettor withdrew on round 20, so nothing remains staked
    assert_eq!(app.market.total_pool(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_claims_pay_each_winner_once() {
    let state = shared_market();
    {
        let mut app = state.write().await;
        for i in 0..BETTORS {
            let me = bettor(i);
            app.market.asset_mut().mint(&me, 1_000).unwrap();
            app.market.asset_mut().approve(&me, 1_000);
            let side = if i % 4 == 0 { Outcome::B } else { Outcome::A };
            app.market.place_bet(&me, side, 100 + i as u64).unwrap();
        }
        app.market.settle_market(Outcome::A).unwrap();
    }

    let expected_fee = state.read().await.market.fee_amount();
    let mut handles = Vec::new();
    for i in 0..BETTORS {
        for _ in 0..3 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                state.write().await.market.claim_reward(&bettor(i))
            }));
        }
    }

    let mut paid = 0u64;
    let mut already_claimed = 0;
    let mut no_winning_stake = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(reward) => paid += reward,
            Err(MarketError::AlreadyClaimed) => already_claimed += 1,
            Err(MarketError::NoWinningStake) => no_winning_stake += 1,
            Err(other) => panic!("unexpected claim error: {}", other),
        }
    }

    let winners = BETTORS - BETTORS / 4;
    assert_eq!(already_claimed, winners * 2);
    assert_eq!(no_winning_stake, (BETTORS / 4) * 3);

    let app = state.read().await;
    let pool = app.market.total_pool();
    assert_eq!(app.market.asset().balance_of("TREASURY"), expected_fee);
    assert!(paid <= pool - expected_fee);
    assert!(pool - expected_fee - paid < winners as u64);
}
