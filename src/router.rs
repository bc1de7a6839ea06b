use crate::actor::Actor;
use crate::context::Context;
use crate::error::ActorError;
use crate::error::ActorResult;
use crate::message::Message;
use crate::reference::ActorRef;

/// Forwards every message to the next worker in turn.
///
/// [`Message::Broadcast`] goes to all workers instead. The incoming sender is
/// kept either way, so workers reply straight to whoever asked.
#[derive(Debug)]
pub struct RoundRobinRouter {
	workers: Vec<ActorRef>,
	cursor: usize,
}

impl RoundRobinRouter {
	pub fn new(workers: impl IntoIterator<Item = ActorRef>) -> ActorResult<Self> {
		let workers: Vec<_> = workers.into_iter().collect();
		if workers.is_empty() {
			return Err(ActorError::NoRoutees);
		}
		Ok(Self { workers, cursor: 0 })
	}

	pub fn workers(&self) -> &[ActorRef] {
		&self.workers
	}
}

impl Actor for RoundRobinRouter {
	fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()> {
		match message {
			Message::Broadcast(inner) => {
				for worker in &self.workers {
					ctx.forward(worker, Message::Forward(inner.clone()));
				}
			}
			Message::Terminated => {
				tracing::debug!(sender = ?ctx.sender(), "router ignoring termination notice");
			}
			message => {
				ctx.forward(&self.workers[self.cursor], message);
				self.cursor = (self.cursor + 1) % self.workers.len();
			}
		}
		Ok(())
	}
}
