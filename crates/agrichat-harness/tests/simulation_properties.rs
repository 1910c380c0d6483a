//! Property-based simulation tests.
//!
//! Two participants receive arbitrary interleavings of panel navigation,
//! typing, sends, clock jumps and server-side socket drops. The world asserts
//! the standard invariants after every step; the properties here add
//! cross-participant checks.

use std::time::Duration;

use agrichat_app::Intent;
use agrichat_harness::{Participant, SimEnv, SimWorld};
use agrichat_proto::{OrderId, OrderSummary, Role};
use proptest::prelude::*;

fn orders() -> Vec<OrderSummary> {
    serde_json::from_str(
        r#"[
            {"_id": "order-aaa111", "user": {"_id": "cust-1", "name": "Meera"}, "farmer": "farm-1"},
            {"_id": "order-bbb222", "user": {"_id": "cust-1", "name": "Meera"}, "farmer": "farm-1"}
        ]"#,
    )
    .unwrap()
}

#[derive(Debug, Clone)]
enum Op {
    Intent(bool, Intent),
    Advance(u64),
    Sever(bool),
}

fn intent_strategy() -> impl Strategy<Value = Intent> {
    let order = prop_oneof![
        Just(OrderId::from("order-aaa111")),
        Just(OrderId::from("order-bbb222")),
        Just(OrderId::from("order-unknown")),
    ];
    prop_oneof![
        2 => Just(Intent::OpenPanel),
        1 => Just(Intent::ClosePanel),
        1 => Just(Intent::ShowList),
        3 => order.prop_map(Intent::Select),
        1 => Just(Intent::Back),
        4 => "[a-z ]{0,8}".prop_map(Intent::Input),
        3 => Just(Intent::Send),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        8 => (any::<bool>(), intent_strategy()).prop_map(|(farmer, i)| Op::Intent(farmer, i)),
        2 => (0..3000u64).prop_map(Op::Advance),
        1 => any::<bool>().prop_map(Op::Sever),
    ]
}

fn run(seed: u64, ops: &[Op]) -> SimWorld {
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    rt.block_on(async {
        let mut world = SimWorld::new(SimEnv::with_seed(seed));
        let farmer = world.join("farm-1", Role::Farmer, orders());
        let customer = world.join("cust-1", Role::Customer, orders());
        world.start().await.unwrap();

        let pick = |is_farmer: bool| -> Participant { if is_farmer { farmer } else { customer } };
        for op in ops {
            match op {
                Op::Intent(is_farmer, intent) => world.intent(pick(*is_farmer), intent.clone()),
                Op::Advance(ms) => world.advance(Duration::from_millis(*ms)),
                Op::Sever(is_farmer) => world.runtime_mut(pick(*is_farmer)).driver_mut().sever(),
            }
            world.settle().await.unwrap();
        }
        world
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Invariants hold for every interleaving (asserted inside the world).
    #[test]
    fn prop_invariants_hold(ops in prop::collection::vec(op_strategy(), 0..40)) {
        run(1, &ops);
    }

    /// Closing both panels after any history releases every listener.
    #[test]
    fn prop_close_releases_listeners(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut ops = ops;
        ops.push(Op::Intent(true, Intent::ClosePanel));
        ops.push(Op::Intent(false, Intent::ClosePanel));
        let world = run(2, &ops);

        for client in world.snapshot().clients {
            prop_assert_eq!(client.live_subscriptions, 0);
            prop_assert!(client.session.is_none());
        }
    }

    /// The same seed and schedule produce the same persisted transcript.
    #[test]
    fn prop_replay_is_deterministic(ops in prop::collection::vec(op_strategy(), 0..30)) {
        let first = run(3, &ops);
        let second = run(3, &ops);

        for room in ["order-aaa111", "order-bbb222"] {
            let room = OrderId::from(room);
            prop_assert_eq!(
                first.with_server(|s| s.history(&room)),
                second.with_server(|s| s.history(&room))
            );
        }
    }
}
