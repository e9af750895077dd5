pub mod bus;
pub mod consumer;
pub mod types;

pub use bus::{Ack, DispatchError, EventBus, SharedEventBus};
pub use consumer::EventConsumer;
pub use types::{Event, FromEvent, TicketCreated, UserSignedUp};
