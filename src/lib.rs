mod actor;
mod ask;
mod channel;
mod context;
mod countme;
mod drop;
mod envelope;
mod error;
mod message;
mod reaper;
mod reference;
mod router;
mod system;
pub mod testkit;

pub mod prelude {
	pub use super::actor::Actor;
	pub use super::actor::Fault;
	pub use super::context::Context;
	pub use super::message::Message;
	pub use super::reference::ActorRef;
	pub use super::system::ActorSystem;
}

pub use actor::Actor;
pub use actor::Fault;
pub use context::Context;
pub use countme::{Report, Tally};
pub use error::{ActorError, ActorResult};
pub use message::{Message, Payload};
pub use reaper::{Reaper, Reaping};
pub use reference::ActorRef;
pub use router::RoundRobinRouter;
pub use system::{ActorSystem, ActorSystemBuilder, SYSTEM_NAMESPACE};
