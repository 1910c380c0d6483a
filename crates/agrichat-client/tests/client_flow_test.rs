//! End-to-end flows through `ChatClient` with a hand-driven clock.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use agrichat_client::{
    ChatClient, ClientAction, ClientConfig, ClientEvent, ConnectionState, Environment, Screen,
};
use agrichat_proto::{Message, OrderId, OrderSummary, Role, UserId};
use chrono::{DateTime, FixedOffset};

#[derive(Clone, Default)]
struct TestEnv {
    millis: Arc<AtomicU64>,
    counter: Arc<AtomicU64>,
}

impl TestEnv {
    fn advance(&self, ms: u64) {
        self.millis.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Environment for TestEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration.as_millis() as u64);
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let last = buffer.len() - 1;
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = if i == last { n as u8 } else { 0 };
        }
    }

    fn wall_clock(&self) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-01T09:30:00+05:30").unwrap()
    }
}

fn frames(actions: &[ClientAction]) -> Vec<&str> {
    actions
        .iter()
        .filter_map(|a| match a {
            ClientAction::SendFrame(frame) => Some(frame.as_str()),
            _ => None,
        })
        .collect()
}

fn farmer_orders() -> Vec<OrderSummary> {
    serde_json::from_str(
        r#"[{"_id":"order-123","status":"Pending","totalAmount":84,
             "items":[{"product":{"_id":"p1","name":"Spinach","unit":"bunch"},"quantity":2},
                      {"name":"Okra","quantity":1.5,"unit":"kg"}],
             "user":{"_id":"asha","name":"Asha","email":"asha@example.com"}},
            {"_id":"order-456","status":"Shipped","user":{"_id":"raj","name":"Raj"}}]"#,
    )
    .unwrap()
}

fn connected_farmer() -> (ChatClient<TestEnv>, TestEnv) {
    let env = TestEnv::default();
    let config = ClientConfig::new("ws://chat.test", UserId::from("farmer-1"), Role::Farmer);
    let mut client = ChatClient::new(env.clone(), config);

    let actions = client.start();
    assert_eq!(actions, vec![ClientAction::Connect { endpoint: "ws://chat.test".into() }]);

    let actions = client.handle(ClientEvent::Connected);
    assert_eq!(frames(&actions), [r#"["register_user","farmer-1"]"#]);

    (client, env)
}

fn open_with_orders(client: &mut ChatClient<TestEnv>) {
    let actions = client.handle(ClientEvent::OpenPanel);
    assert!(actions.contains(&ClientAction::FetchOrders { role: Role::Farmer }));
    client.handle(ClientEvent::OrdersLoaded(Ok(farmer_orders())));
    client.handle(ClientEvent::ShowList);
}

#[test]
fn select_joins_fetches_and_checks_presence() {
    let (mut client, _env) = connected_farmer();
    open_with_orders(&mut client);

    let actions = client.handle(ClientEvent::SelectOrder(OrderId::from("order-123")));
    insta::assert_snapshot!(frames(&actions).join("\n"), @r#"
    ["join_room","order-123"]
    ["check_online","asha"]
    "#);
    assert!(actions.contains(&ClientAction::FetchHistory { order_id: OrderId::from("order-123") }));

    let view = client.view();
    assert_eq!(view.screen, Screen::Chat);
    assert_eq!(view.title, "Asha");
    let chat = view.chat.unwrap();
    assert_eq!(chat.label, "Order #ER-123");
    assert_eq!(chat.details.as_deref(), Some("asha@example.com"));
    assert!(!chat.online);

    let summary = [chat.status.clone().unwrap_or_default()]
        .into_iter()
        .chain(chat.items.iter().cloned())
        .chain(chat.total.clone())
        .collect::<Vec<_>>()
        .join("\n");
    insta::assert_snapshot!(summary, @r"
    Pending
    2 bunch x Spinach
    1.5 kg x Okra
    ₹84.00
    ");
}

#[test]
fn farmer_scenario_two_conversations() {
    let (mut client, env) = connected_farmer();
    open_with_orders(&mut client);

    client.handle(ClientEvent::SelectOrder(OrderId::from("order-123")));
    client.handle(ClientEvent::HistoryLoaded {
        order_id: OrderId::from("order-123"),
        result: Ok(vec![
            serde_json::from_str::<Message>(
                r#"{"_id":"m1","senderId":{"_id":"asha"},"message":"Is the spinach fresh?","time":"09:00"}"#,
            )
            .unwrap(),
            serde_json::from_str::<Message>(
                r#"{"_id":"m2","senderId":"farmer-1","message":"Picked this morning","time":"09:05"}"#,
            )
            .unwrap(),
        ]),
    });

    let view = client.view();
    let mine: Vec<bool> = view.chat.as_ref().unwrap().lines.iter().map(|l| l.mine).collect();
    assert_eq!(mine, [false, true]);

    // Raj comes online; Asha's panel must not care.
    let actions = client.handle(ClientEvent::FrameReceived(r#"["user_online","raj"]"#.into()));
    assert!(actions.is_empty());

    client.handle(ClientEvent::FrameReceived(
        r#"["is_online_response",{"userId":"asha","isOnline":true}]"#.into(),
    ));
    assert!(client.view().chat.unwrap().online);

    // Typing burst then send
    client.handle(ClientEvent::InputChanged("T".into()));
    env.advance(500);
    client.handle(ClientEvent::InputChanged("Thanks".into()));
    let actions = client.handle(ClientEvent::Send);
    let sent = frames(&actions);
    assert_eq!(sent.len(), 2);
    assert!(sent[0].starts_with(r#"["send_message",{"#));
    assert!(sent[0].contains(r#""receiverId":"asha""#));
    assert!(sent[0].contains(r#""time":"09:30""#));
    assert_eq!(sent[1], r#"["stop_typing","order-123"]"#);

    env.advance(5000);
    assert!(frames(&client.handle(ClientEvent::Tick)).is_empty());

    // Switch to Raj
    let baseline = client.transport().subscriptions().len();
    client.handle(ClientEvent::Back);
    client.handle(ClientEvent::SelectOrder(OrderId::from("order-456")));
    assert_eq!(client.transport().subscriptions().len(), baseline);

    let actions = client.handle(ClientEvent::FrameReceived(
        r#"["receive_message",{"room":"order-456","authorId":"raj","message":"When will it ship?","time":"09:40"}]"#
            .into(),
    ));
    assert!(actions.contains(&ClientAction::Notify {
        order_id: OrderId::from("order-456"),
        preview: "When will it ship?".into(),
    }));

    // Asha typing in the old room must not reach Raj's panel
    client.handle(ClientEvent::FrameReceived(r#"["typing","order-123"]"#.into()));
    assert_eq!(client.view().chat.unwrap().typing, None);

    client.handle(ClientEvent::ClosePanel);
    assert_eq!(client.transport().subscriptions().len(), 0);
}

#[test]
fn typing_stops_after_quiet_period() {
    let (mut client, env) = connected_farmer();
    open_with_orders(&mut client);
    client.handle(ClientEvent::SelectOrder(OrderId::from("order-123")));

    let first = client.handle(ClientEvent::InputChanged("H".into()));
    assert_eq!(frames(&first), [r#"["typing","order-123"]"#]);
    env.advance(500);
    assert!(frames(&client.handle(ClientEvent::InputChanged("He".into()))).is_empty());
    env.advance(500);
    client.handle(ClientEvent::InputChanged("Hey".into()));

    env.advance(1999);
    assert!(frames(&client.handle(ClientEvent::Tick)).is_empty());
    env.advance(1);
    assert_eq!(frames(&client.handle(ClientEvent::Tick)), [r#"["stop_typing","order-123"]"#]);
}

#[test]
fn reconnect_rejoins_open_room() {
    let (mut client, env) = connected_farmer();
    open_with_orders(&mut client);
    client.handle(ClientEvent::SelectOrder(OrderId::from("order-123")));

    client.handle(ClientEvent::Disconnected);
    assert_eq!(client.connection_state(), ConnectionState::Reconnecting);

    // Emits while offline are dropped, never replayed
    client.handle(ClientEvent::InputChanged("lost".into()));

    env.advance(1000);
    let actions = client.handle(ClientEvent::Tick);
    assert!(actions.contains(&ClientAction::Connect { endpoint: "ws://chat.test".into() }));

    let actions = client.handle(ClientEvent::Connected);
    assert_eq!(frames(&actions), [
        r#"["register_user","farmer-1"]"#,
        r#"["join_room","order-123"]"#,
        r#"["check_online","asha"]"#,
    ]);
}

#[test]
fn empty_listing_shows_notice() {
    let (mut client, _env) = connected_farmer();
    client.handle(ClientEvent::OpenPanel);
    client.handle(ClientEvent::OrdersLoaded(Err(agrichat_client::FetchError::Status {
        status: 401,
    })));
    client.handle(ClientEvent::ShowList);

    let view = client.view();
    assert!(view.orders.is_empty());
    assert_eq!(view.notice.as_deref(), Some("No order history found."));
}

#[test]
fn send_without_session_is_noop() {
    let (mut client, _env) = connected_farmer();
    client.handle(ClientEvent::InputChanged("hello".into()));
    assert!(client.handle(ClientEvent::Send).is_empty());
}

#[test]
fn shutdown_stops_typing_releases_listeners_and_disconnects() {
    let (mut client, _env) = connected_farmer();
    open_with_orders(&mut client);
    client.handle(ClientEvent::SelectOrder(OrderId::from("order-123")));
    client.handle(ClientEvent::InputChanged("half".into()));

    let actions = client.shutdown();

    assert_eq!(frames(&actions), [r#"["stop_typing","order-123"]"#]);
    assert_eq!(
        actions.last(),
        Some(&ClientAction::Close { reason: "client disconnect".into() })
    );
    assert!(client.transport().subscriptions().is_empty());
    assert!(client.directory().session().is_none());
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);

    // A second shutdown has nothing left to do
    assert!(client.shutdown().is_empty());
}
