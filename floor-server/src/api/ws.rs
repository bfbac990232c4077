//! Observer WebSocket
//!
//! GET /ws
//!
//! Protocol:
//! - Server → Observer: [`ServerMessage`] (`ready`, `event`, `joined`, `left`, `error`)
//! - Observer → Server: [`ObserverCommand`] (`join_room`, `leave_room`)
//!
//! A new or lagged observer gets a full `ready` snapshot. An observer that
//! joined no room receives every event.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::{Router, routing::get};
use futures::{Sink, SinkExt, Stream, StreamExt};
use shared::message::{ObserverCommand, ServerMessage};
use tokio::time::Duration;

use crate::core::ServerState;
use crate::message::{ObserverId, Subscription};

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<ServerState> {
    Router::new().route("/ws", get(handle_ws))
}

async fn handle_ws(State(state): State<ServerState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| observer_session(socket, state))
}

async fn observer_session(socket: WebSocket, state: ServerState) {
    let (sink, stream) = socket.split();

    // Subscribe before the snapshot so nothing committed after it is missed
    let sub = state.hub.subscribe();
    run_session(sink, stream, state, sub).await;
}

/// Drive one observer until either side goes away
async fn run_session<Tx, Rx>(
    mut sink: Tx,
    mut stream: Rx,
    state: ServerState,
    mut sub: Subscription,
) where
    Tx: Sink<Message, Error = axum::Error> + Unpin,
    Rx: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let observer_id = sub.id;
    tracing::info!(observer_id, "Observer connected");

    if send_ready(&mut sink, &state).await.is_err() {
        state.hub.unsubscribe(observer_id);
        return;
    }

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }

            event = sub.rx.recv() => {
                let Some(event) = event else { break };
                if state.hub.take_lagged(observer_id) {
                    // The snapshot supersedes everything still queued
                    let mut skipped = 1;
                    while sub.rx.try_recv().is_ok() {
                        skipped += 1;
                    }
                    tracing::warn!(observer_id, skipped, "Observer lagged, resending snapshot");
                    if send_ready(&mut sink, &state).await.is_err() {
                        break;
                    }
                    continue;
                }
                if send_message(&mut sink, &ServerMessage::Event(event)).await.is_err() {
                    break;
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_command(&state, observer_id, text.as_str());
                        if send_message(&mut sink, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(observer_id, error = %e, "Observer socket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    state.hub.unsubscribe(observer_id);
    tracing::info!(observer_id, "Observer disconnected");
}

/// Apply a client frame and build the acknowledgement
fn handle_command(state: &ServerState, observer_id: ObserverId, text: &str) -> ServerMessage {
    match serde_json::from_str::<ObserverCommand>(text) {
        Ok(ObserverCommand::JoinRoom { room }) => {
            state.hub.join(observer_id, &room);
            ServerMessage::Joined { room }
        }
        Ok(ObserverCommand::LeaveRoom { room }) => {
            state.hub.leave(observer_id, &room);
            ServerMessage::Left { room }
        }
        Err(e) => ServerMessage::Error {
            message: format!("invalid command: {}", e),
        },
    }
}

async fn send_ready<S>(sink: &mut S, state: &ServerState) -> Result<(), ()>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let ready = match state.ready_snapshot().await {
        Ok(ready) => ready,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build observer snapshot");
            ServerMessage::Error {
                message: "snapshot unavailable".into(),
            }
        }
    };
    send_message(sink, &ready).await
}

async fn send_message<S>(sink: &mut S, msg: &ServerMessage) -> Result<(), ()>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::store::Store;
    use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
    use serde_json::Value;
    use shared::message::{ROOM_MAINTENANCE, station_room};
    use shared::models::{
        DowntimeCreate, Station, WorkOrderCreate, WorkOrderStatus, WorkOrderStatusUpdate,
    };
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    struct Client {
        tx: UnboundedSender<Result<Message, axum::Error>>,
        rx: UnboundedReceiver<Message>,
        session: JoinHandle<()>,
    }

    impl Client {
        fn connect(state: &ServerState, sub: Subscription) -> Self {
            let (server_tx, rx) = mpsc::unbounded::<Message>();
            let (tx, server_rx) = mpsc::unbounded::<Result<Message, axum::Error>>();
            let sink = server_tx.sink_map_err(axum::Error::new);
            let session = tokio::spawn(run_session(sink, server_rx, state.clone(), sub));
            Self { tx, rx, session }
        }

        fn send(&self, text: &str) {
            self.tx.unbounded_send(Ok(Message::Text(text.into()))).unwrap();
        }

        async fn frame(&mut self) -> Value {
            loop {
                let msg = timeout(Duration::from_secs(2), self.rx.next())
                    .await
                    .expect("no frame within 2s")
                    .expect("session closed");
                if let Message::Text(text) = msg {
                    return serde_json::from_str(text.as_str()).unwrap();
                }
            }
        }

        async fn assert_quiet(&mut self) {
            let next = timeout(Duration::from_millis(100), self.rx.next()).await;
            assert!(next.is_err(), "unexpected frame: {:?}", next);
        }

        async fn close(self) {
            drop(self.tx);
            timeout(Duration::from_secs(2), self.session)
                .await
                .expect("session did not end")
                .unwrap();
        }
    }

    fn progress(value: i64) -> WorkOrderStatusUpdate {
        WorkOrderStatusUpdate {
            status: Some(WorkOrderStatus::InProgress),
            progress: Some(value),
            ..Default::default()
        }
    }

    async fn with_work_order(state: &ServerState) -> WorkOrderCreate {
        let order = state
            .orders
            .create(shared::models::OrderCreate {
                customer: "ABC Construction".into(),
                delivery_date: chrono::NaiveDate::from_ymd_opt(2023, 8, 15).unwrap(),
                status: None,
            })
            .await
            .unwrap();
        WorkOrderCreate {
            order_id: order.id,
            product: "Linear Grill 200x50".into(),
            quantity: 50,
            station: Station::Coating,
        }
    }

    fn drain(sub: &mut Subscription) -> Vec<&'static str> {
        let mut names = Vec::new();
        while let Ok(event) = sub.rx.try_recv() {
            names.push(event.name());
        }
        names
    }

    #[test]
    fn test_commands_acknowledged() {
        let state = ServerState::in_memory();
        let sub = state.hub.subscribe();

        let reply = handle_command(&state, sub.id, r#"{"type":"join_room","room":"maintenance"}"#);
        assert!(matches!(reply, ServerMessage::Joined { ref room } if room == ROOM_MAINTENANCE));
        assert_eq!(state.hub.room_size(ROOM_MAINTENANCE), 1);

        let reply = handle_command(&state, sub.id, r#"{"type":"leave_room","room":"maintenance"}"#);
        assert!(matches!(reply, ServerMessage::Left { .. }));
        assert_eq!(state.hub.room_size(ROOM_MAINTENANCE), 0);

        let reply = handle_command(&state, sub.id, r#"{"type":"dance"}"#);
        assert!(matches!(reply, ServerMessage::Error { .. }));
    }

    #[tokio::test]
    async fn test_room_routing_through_services() {
        let state = ServerState::in_memory();
        let mut coating = state.hub.subscribe();
        let mut maintenance = state.hub.subscribe();
        let mut everyone = state.hub.subscribe();
        handle_command(
            &state,
            coating.id,
            &format!(r#"{{"type":"join_room","room":"{}"}}"#, station_room(Station::Coating)),
        );
        handle_command(&state, maintenance.id, r#"{"type":"join_room","room":"maintenance"}"#);

        let input = with_work_order(&state).await;
        state.work_orders.create(input).await.unwrap();
        state
            .downtime
            .report(shared::models::DowntimeCreate {
                machine: "Station-1".into(),
                reason: "Blade jammed".into(),
                reporter: None,
            })
            .await
            .unwrap();

        assert_eq!(drain(&mut coating), vec!["wo_updated"]);
        assert_eq!(drain(&mut maintenance), vec!["downtime_alert"]);
        assert_eq!(drain(&mut everyone), vec!["wo_updated", "downtime_alert"]);
    }

    #[tokio::test]
    async fn test_session_sends_ready_then_routed_events() {
        let state = ServerState::in_memory();
        let sub = state.hub.subscribe();
        let mut client = Client::connect(&state, sub);

        let ready = client.frame().await;
        assert_eq!(ready["type"], "ready");
        assert_eq!(ready["epoch"], state.epoch.as_str());
        assert!(ready["work_orders"].as_array().unwrap().is_empty());

        client.send(r#"{"type":"join_room","room":"maintenance"}"#);
        let joined = client.frame().await;
        assert_eq!(joined["type"], "joined");
        assert_eq!(joined["room"], ROOM_MAINTENANCE);

        // Station traffic is outside the joined room
        let input = with_work_order(&state).await;
        state.work_orders.create(input).await.unwrap();
        state
            .downtime
            .report(DowntimeCreate {
                machine: "Station-1".into(),
                reason: "Blade jammed".into(),
                reporter: None,
            })
            .await
            .unwrap();

        let event = client.frame().await;
        assert_eq!(event["type"], "event");
        assert_eq!(event["event"], "downtime_alert");
        assert_eq!(event["data"]["machine"], "Station-1");
        client.assert_quiet().await;

        client.send("not json");
        assert_eq!(client.frame().await["type"], "error");

        client.close().await;
        assert_eq!(state.hub.observer_count(), 0);
    }

    #[tokio::test]
    async fn test_lagged_observer_gets_snapshot_without_stale_events() {
        let config = Config {
            observer_channel_capacity: 2,
            ..Config::ephemeral()
        };
        let state = ServerState::new(config, Store::in_memory());
        let sub = state.hub.subscribe();

        // v1 and v2 fill the channel, v3 is dropped
        let input = with_work_order(&state).await;
        let id = state.work_orders.create(input).await.unwrap().work_order.id;
        state.work_orders.transition(id, progress(10)).await.unwrap();
        state.work_orders.transition(id, progress(20)).await.unwrap();

        let mut client = Client::connect(&state, sub);
        assert_eq!(client.frame().await["type"], "ready");
        let resent = client.frame().await;
        assert_eq!(resent["type"], "ready");
        assert_eq!(resent["work_orders"][0]["version"], 3);
        client.assert_quiet().await;

        state.work_orders.transition(id, progress(40)).await.unwrap();
        let event = client.frame().await;
        assert_eq!(event["event"], "wo_updated");
        assert_eq!(event["data"]["version"], 4);
        assert_eq!(event["data"]["progress"], 40);

        client.close().await;
    }
}
