//! Real-time floor events and the observer WebSocket protocol
//!
//! Server → Observer: [`ServerMessage`] (pushes)
//! Observer → Server: [`ObserverCommand`] (room membership)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{DashboardStats, DowntimeLog, Station, WorkOrderView};

/// Room for everything the production line cares about
pub const ROOM_PRODUCTION: &str = "production";
/// Room for maintenance crews (downtime only)
pub const ROOM_MAINTENANCE: &str = "maintenance";

/// Room name scoped to a single station, e.g. `station:cutting`
pub fn station_room(station: Station) -> String {
    format!("station:{}", station.as_str())
}

/// Kind of entity an event carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    WorkOrder,
    DowntimeLog,
}

/// Identity of the entity behind an event, used for per-entity ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: i64,
}

/// Domain event published after a committed mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum FloorEvent {
    /// Work order created or moved
    WoUpdated(WorkOrderView),
    /// Machine stoppage reported
    DowntimeAlert(DowntimeLog),
    /// Machine stoppage resolved
    DowntimeResolved(DowntimeLog),
}

impl FloorEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            FloorEvent::WoUpdated(_) => "wo_updated",
            FloorEvent::DowntimeAlert(_) => "downtime_alert",
            FloorEvent::DowntimeResolved(_) => "downtime_resolved",
        }
    }

    pub fn entity_key(&self) -> EntityKey {
        match self {
            FloorEvent::WoUpdated(view) => EntityKey {
                kind: EntityKind::WorkOrder,
                id: view.work_order.id,
            },
            FloorEvent::DowntimeAlert(log) | FloorEvent::DowntimeResolved(log) => EntityKey {
                kind: EntityKind::DowntimeLog,
                id: log.id,
            },
        }
    }

    /// Store version of the carried entity
    pub fn version(&self) -> u64 {
        match self {
            FloorEvent::WoUpdated(view) => view.work_order.version,
            FloorEvent::DowntimeAlert(log) | FloorEvent::DowntimeResolved(log) => log.version,
        }
    }

    /// Rooms this event is routed to
    pub fn rooms(&self) -> Vec<String> {
        match self {
            FloorEvent::WoUpdated(view) => vec![
                ROOM_PRODUCTION.to_string(),
                station_room(view.work_order.station),
            ],
            FloorEvent::DowntimeAlert(_) | FloorEvent::DowntimeResolved(_) => vec![
                ROOM_MAINTENANCE.to_string(),
                ROOM_PRODUCTION.to_string(),
            ],
        }
    }
}

impl fmt::Display for FloorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.entity_key();
        write!(f, "{}#{}@v{}", self.name(), key.id, self.version())
    }
}

/// Server → Observer push message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full state snapshot, sent on connect and after the observer lagged
    Ready {
        /// Changes on every server start; observers discard cached state when it differs
        epoch: String,
        work_orders: Vec<WorkOrderView>,
        stats: DashboardStats,
        active_downtime: Vec<DowntimeLog>,
    },
    /// A single domain event
    Event(FloorEvent),
    /// Room join acknowledged
    Joined { room: String },
    /// Room leave acknowledged
    Left { room: String },
    /// Malformed command
    Error { message: String },
}

/// Observer → Server command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObserverCommand {
    JoinRoom { room: String },
    LeaveRoom { room: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{WorkOrder, WorkOrderStatus};

    fn sample_view() -> WorkOrderView {
        WorkOrderView {
            work_order: WorkOrder {
                id: 7,
                order_id: 1,
                product: "Diffuser Type B".to_string(),
                quantity: 100,
                station: Station::Coating,
                status: WorkOrderStatus::InProgress,
                progress: 45,
                operator_id: Some(101),
                started_at: Some(1),
                completed_at: None,
                created_at: 1,
                updated_at: 2,
                version: 3,
            },
            order: None,
        }
    }

    #[test]
    fn test_event_frame_shape() {
        let msg = ServerMessage::Event(FloorEvent::WoUpdated(sample_view()));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "event");
        assert_eq!(value["event"], "wo_updated");
        assert_eq!(value["data"]["id"], 7);
        assert_eq!(value["data"]["status"], "in_progress");
    }

    #[test]
    fn test_work_order_rooms() {
        let event = FloorEvent::WoUpdated(sample_view());
        assert_eq!(event.rooms(), vec!["production", "station:coating"]);
        assert_eq!(event.version(), 3);
        assert_eq!(event.to_string(), "wo_updated#7@v3");
    }

    #[test]
    fn test_parse_observer_command() {
        let cmd: ObserverCommand =
            serde_json::from_str(r#"{"type":"join_room","room":"maintenance"}"#).unwrap();
        assert_eq!(
            cmd,
            ObserverCommand::JoinRoom {
                room: "maintenance".to_string()
            }
        );
    }
}
