use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;

use crate::channel::MailboxSender;
use crate::envelope::Envelope;
use crate::error::ActorError;
use crate::error::ActorResult;
use crate::message::Message;
use crate::message::Payload;
use crate::system::ActorSystem;
use crate::system::SystemShared;

/// Addressing handle for an actor registered with an [`ActorSystem`].
///
/// Cloning is cheap. Two references are equal when their names are equal;
/// names are unique within a system, but a name is never recycled after its
/// actor terminates, so equality does not tell apart actors of different
/// systems that happen to share a name.
#[derive(Clone)]
pub struct ActorRef {
	inner: Arc<RefInner>,
}

struct RefInner {
	name: String,
	mailbox: MailboxSender,
	system: Weak<SystemShared>,
}

impl ActorRef {
	pub(crate) fn new(name: String, mailbox: MailboxSender, system: Weak<SystemShared>) -> Self {
		Self {
			inner: Arc::new(RefInner {
				name,
				mailbox,
				system,
			}),
		}
	}

	pub fn name(&self) -> &str {
		&self.inner.name
	}

	/// Fire-and-forget send with the system's main actor as sender.
	///
	/// Inside an actor use [`Context::send`](crate::Context::send) so that
	/// replies come back to that actor instead.
	pub fn send(&self, message: Message) {
		let sender = self.system().map(|system| system.main_actor().clone());
		self.deliver(Envelope::new(message, sender));
	}

	pub fn send_from(&self, message: Message, sender: Option<&ActorRef>) {
		self.deliver(Envelope::new(message, sender.cloned()));
	}

	pub fn tell<T: Payload>(&self, value: T) {
		self.send(Message::user(value));
	}

	/// Makes `self` a watcher of `target`: once `target` terminates, `self`
	/// receives [`Message::Terminated`] with `target` as sender.
	pub fn watch(&self, target: &ActorRef) {
		target.send_from(Message::Watch, Some(self));
	}

	/// Blocking request/response. See [`ActorSystem::ask`].
	pub fn ask(&self, message: Message, timeout: Duration) -> ActorResult<Message> {
		let system = self.system().ok_or(ActorError::SystemInactive)?;
		system.ask(self, message, timeout)
	}

	/// True once the actor's dispatch loop has exited and its mailbox closed.
	pub fn is_terminated(&self) -> bool {
		self.inner.mailbox.is_closed()
	}

	pub(crate) fn poison(&self) {
		if !self.is_terminated() {
			self.send_from(Message::PoisonPill, None);
		}
	}

	pub(crate) fn deliver(&self, envelope: Envelope) {
		if let Err(envelope) = self.inner.mailbox.send(envelope) {
			self.undeliverable(envelope);
		}
	}

	/// Handles an envelope addressed to this actor after it stopped.
	pub(crate) fn undeliverable(&self, envelope: Envelope) {
		match envelope.split() {
			(Message::Watch, Some(watcher)) => {
				watcher.send_from(Message::Terminated, Some(self));
			}
			(message, _) => match self.system() {
				Some(system) => system.dead_letter(message),
				None => {
					tracing::trace!(actor = %self.name(), ?message, "system gone, dropping message");
				}
			},
		}
	}

	fn system(&self) -> Option<ActorSystem> {
		self.inner.system.upgrade().map(ActorSystem::from_shared)
	}
}

impl PartialEq for ActorRef {
	fn eq(&self, other: &Self) -> bool {
		self.inner.name == other.inner.name
	}
}

impl Eq for ActorRef {}

impl Hash for ActorRef {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.inner.name.hash(state);
	}
}

impl fmt::Debug for ActorRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl fmt::Display for ActorRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ActorRef(actor='{}')", self.inner.name)
	}
}
