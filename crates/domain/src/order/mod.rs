//! Order model and related types.

mod item;
mod model;
mod status;

pub use item::{OrderId, OrderItem};
pub use model::{NewOrder, Order};
pub use status::{OrderStatus, UnknownOrderStatus};
