use std::fmt::Debug;

use crate::message::Message;
use crate::reference::ActorRef;

/// A mailbox item: the message plus the reference replies should go to.
pub struct Envelope {
	pub message: Message,
	pub sender: Option<ActorRef>,
}

impl Debug for Envelope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Envelope")
			.field("message", &self.message)
			.field("sender", &self.sender.as_ref().map(ActorRef::name))
			.finish()
	}
}

impl Envelope {
	pub fn new(message: Message, sender: Option<ActorRef>) -> Self {
		Self { message, sender }
	}

	pub fn split(self) -> (Message, Option<ActorRef>) {
		(self.message, self.sender)
	}
}
