//! Demo data
//!
//! Two customer orders and three work orders spread over the lifecycle, so a
//! fresh floor has something on the dashboard. Everything goes through the
//! services, which means the usual validation and events apply.

use chrono::NaiveDate;
use shared::models::{
    OrderCreate, OrderStatus, Station, WorkOrderCreate, WorkOrderStatus, WorkOrderStatusUpdate,
};

use crate::core::{FloorError, FloorResult};
use crate::planning::OrderService;
use crate::workorders::WorkOrderService;

/// Seed the demo floor when no orders exist yet.
///
/// Returns `false` without writing anything on a non-empty store.
pub async fn seed_demo_data(
    orders: &OrderService,
    work_orders: &WorkOrderService,
) -> FloorResult<bool> {
    if !orders.is_empty().await? {
        tracing::debug!("Store already has orders, skipping demo seed");
        return Ok(false);
    }

    let abc = orders
        .create(OrderCreate {
            customer: "ABC Construction".into(),
            delivery_date: date(2023, 8, 15)?,
            status: Some(OrderStatus::Production),
        })
        .await?;
    let skyline = orders
        .create(OrderCreate {
            customer: "Skyline Towers".into(),
            delivery_date: date(2023, 8, 20)?,
            status: Some(OrderStatus::New),
        })
        .await?;

    let cut = work_orders
        .create(job(abc.id, "Linear Grill 200x50", 50, Station::Cutting))
        .await?;
    work_orders
        .transition(cut.work_order.id, move_to(WorkOrderStatus::InProgress, None))
        .await?;
    work_orders
        .transition(cut.work_order.id, move_to(WorkOrderStatus::Completed, None))
        .await?;

    let coat = work_orders
        .create(job(abc.id, "Linear Grill 200x50", 50, Station::Coating))
        .await?;
    work_orders
        .transition(
            coat.work_order.id,
            move_to(WorkOrderStatus::InProgress, Some(45)),
        )
        .await?;

    work_orders
        .create(job(skyline.id, "Diffuser Type B", 100, Station::Cutting))
        .await?;

    tracing::info!("Seeded demo data: 2 orders, 3 work orders");
    Ok(true)
}

fn date(y: i32, m: u32, d: u32) -> FloorResult<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| FloorError::validation(format!("invalid date {y}-{m}-{d}")))
}

fn job(order_id: i64, product: &str, quantity: i64, station: Station) -> WorkOrderCreate {
    WorkOrderCreate {
        order_id,
        product: product.into(),
        quantity,
        station,
    }
}

fn move_to(status: WorkOrderStatus, progress: Option<i64>) -> WorkOrderStatusUpdate {
    WorkOrderStatusUpdate {
        status: Some(status),
        progress,
        ..Default::default()
    }
}
