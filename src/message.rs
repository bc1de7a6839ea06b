use std::fmt::Debug;
use std::sync::Arc;

use downcast_rs::DowncastSync;
use downcast_rs::impl_downcast;

/// Opaque user content carried by [`Message::User`].
///
/// Implemented for every `Send + Sync + Debug + 'static` type; receivers
/// recover the concrete value with [`Message::downcast_ref`].
pub trait Payload: DowncastSync + Debug {}

impl_downcast!(sync Payload);

impl<T: Send + Sync + Debug + 'static> Payload for T {}

/// Everything an actor mailbox can hold.
///
/// The control variants are interpreted by the dispatch loop or by the
/// built-in actors; `User` is handed to [`Actor::receive`](crate::Actor::receive).
#[derive(Clone, Debug)]
pub enum Message {
	/// Ends the receiver's dispatch loop once it is dequeued.
	PoisonPill,
	/// Registers the envelope sender as a watcher of the receiver.
	Watch,
	/// Sent to watchers by a terminated actor, with that actor as sender.
	Terminated,
	/// Unwrapped by the dispatch loop and processed as the inner message.
	Forward(Box<Message>),
	/// Fanned out by routers to every worker.
	Broadcast(Box<Message>),
	/// A message that could not be delivered, as seen by the dead-letter actor.
	DeadLetter(Box<Message>),
	User(Arc<dyn Payload>),
}

impl Message {
	pub fn user<T: Payload>(value: T) -> Self {
		Message::User(Arc::new(value))
	}

	pub fn broadcast(inner: Message) -> Self {
		Message::Broadcast(Box::new(inner))
	}

	pub fn forward(inner: Message) -> Self {
		Message::Forward(Box::new(inner))
	}

	pub fn downcast_ref<T: Payload>(&self) -> Option<&T> {
		match self {
			Message::User(payload) => {
				let payload: &dyn Payload = &**payload;
				payload.downcast_ref::<T>()
			}
			_ => None,
		}
	}

	pub fn is<T: Payload>(&self) -> bool {
		self.downcast_ref::<T>().is_some()
	}

	pub fn is_dead_letter(&self) -> bool {
		matches!(self, Message::DeadLetter(_))
	}
}
