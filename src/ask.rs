use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use parking_lot::Condvar;
use parking_lot::Mutex;

use crate::actor::Actor;
use crate::context::Context;
use crate::drop::PoisonOnDrop;
use crate::error::ActorError;
use crate::error::ActorResult;
use crate::message::Message;
use crate::reference::ActorRef;
use crate::system::ActorSystem;
use crate::system::reserved_name;

/// Single-slot handoff between an asking actor and the blocked caller.
#[derive(Default)]
struct ReplySlot {
	reply: Mutex<Option<Message>>,
	filled: Condvar,
}

impl ReplySlot {
	/// Keeps the first reply only.
	fn fill(&self, message: Message) -> bool {
		let mut reply = self.reply.lock();
		if reply.is_some() {
			return false;
		}
		*reply = Some(message);
		self.filled.notify_one();
		true
	}

	fn wait(&self, timeout: Duration) -> Option<Message> {
		// A deadline past what `Instant` can hold means no deadline.
		let deadline = Instant::now().checked_add(timeout);
		let mut reply = self.reply.lock();
		while reply.is_none() {
			match deadline {
				Some(deadline) => {
					if self.filled.wait_until(&mut reply, deadline).timed_out() {
						break;
					}
				}
				None => self.filled.wait(&mut reply),
			}
		}
		reply.take()
	}
}

/// Disposable actor that sends the request on behalf of a non-actor caller
/// and parks the first reply in the slot.
struct AskingActor {
	target: ActorRef,
	request: Option<Message>,
	slot: Arc<ReplySlot>,
}

impl Actor for AskingActor {
	fn before(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
		if let Some(request) = self.request.take() {
			ctx.send(&self.target, request);
		}
		Ok(())
	}

	fn receive(&mut self, _ctx: &mut Context, message: Message) -> anyhow::Result<()> {
		if !self.slot.fill(message) {
			tracing::debug!(actor = %self.target, "ignoring additional reply");
		}
		Ok(())
	}
}

impl ActorSystem {
	/// Sends `message` to `target` and blocks until the first reply or until
	/// `timeout` passes.
	///
	/// The wait is delegated to a short-lived actor, which is poisoned on
	/// every path out of this call; a late reply ends up as a dead letter.
	/// Calling this from an actor thread of the same system fails with
	/// [`ActorError::IllegalCaller`].
	pub fn ask(&self, target: &ActorRef, message: Message, timeout: Duration) -> ActorResult<Message> {
		self.ensure_outside_actor()?;

		let slot = Arc::new(ReplySlot::default());
		let seq = self.shared.ask_seq.fetch_add(1, Ordering::Relaxed);
		let asking = AskingActor {
			target: target.clone(),
			request: Some(message),
			slot: slot.clone(),
		};
		let asking = PoisonOnDrop(self.register(reserved_name(&format!("ask-{seq}")), asking, true)?);

		match slot.wait(timeout) {
			Some(reply) => Ok(reply),
			None => {
				tracing::debug!(actor = %target, via = %asking.name(), ?timeout, "Ask timed out");
				Err(ActorError::AskTimeout { timeout })
			}
		}
	}
}
