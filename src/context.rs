use std::ops::ControlFlow;

use crate::actor::Actor;
use crate::error::ActorResult;
use crate::message::Message;
use crate::message::Payload;
use crate::reference::ActorRef;
use crate::system::ActorSystem;

/// Per-actor execution context handed to every [`Actor`] hook.
///
/// It carries what the dispatch loop knows about the message being processed,
/// most importantly the sender replies should go to.
pub struct Context {
	system: ActorSystem,
	me: ActorRef,
	sender: Option<ActorRef>,
	flow: ControlFlow<()>,
}

impl Context {
	pub(crate) fn new(system: ActorSystem, me: ActorRef) -> Self {
		Self {
			system,
			me,
			sender: None,
			flow: ControlFlow::Continue(()),
		}
	}

	pub fn system(&self) -> &ActorSystem {
		&self.system
	}

	pub fn myself(&self) -> &ActorRef {
		&self.me
	}

	/// Sender of the message currently being processed.
	pub fn sender(&self) -> Option<&ActorRef> {
		self.sender.as_ref()
	}

	/// Leaves the dispatch loop once the current message is done.
	pub fn stop(&mut self) {
		self.flow = ControlFlow::Break(());
	}

	pub fn send(&self, target: &ActorRef, message: Message) {
		target.send_from(message, Some(&self.me));
	}

	pub fn tell<T: Payload>(&self, target: &ActorRef, value: T) {
		self.send(target, Message::user(value));
	}

	/// Answers the current sender, dead-lettering the reply if there is none.
	pub fn reply(&self, message: Message) {
		match &self.sender {
			Some(sender) => sender.send_from(message, Some(&self.me)),
			None => self.system.dead_letter(message),
		}
	}

	/// Relays a message while keeping the current sender.
	pub fn forward(&self, target: &ActorRef, message: Message) {
		target.send_from(message, self.sender.as_ref());
	}

	pub fn watch(&self, target: &ActorRef) {
		self.me.watch(target);
	}

	/// Registers a child actor and watches it.
	pub fn actor<A: Actor>(&self, name: impl Into<String>, actor: A) -> ActorResult<ActorRef> {
		let child = self.system.actor(name, actor)?;
		self.watch(&child);
		Ok(child)
	}

	pub(crate) fn is_running(&self) -> bool {
		self.flow.is_continue()
	}

	pub(crate) fn set_sender(&mut self, sender: Option<ActorRef>) {
		self.sender = sender;
	}
}
