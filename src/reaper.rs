use std::collections::HashSet;

use crate::actor::Actor;
use crate::context::Context;
use crate::error::ActorError;
use crate::error::ActorResult;
use crate::message::Message;
use crate::reference::ActorRef;
use crate::system::ActorSystem;

type Starter = Box<dyn FnOnce(&mut Reaping<'_>) -> anyhow::Result<()> + Send>;

/// Shuts the system down once every actor it watches has terminated.
///
/// The starter runs once in `before` and registers the actors to wait for
/// through [`Reaping`].
pub struct Reaper {
	starter: Option<Starter>,
	watched: HashSet<ActorRef>,
}

impl Reaper {
	pub fn new(starter: impl FnOnce(&mut Reaping<'_>) -> anyhow::Result<()> + Send + 'static) -> Self {
		Self {
			starter: Some(Box::new(starter)),
			watched: HashSet::new(),
		}
	}

	fn reap(&self, ctx: &Context) -> anyhow::Result<()> {
		tracing::info!("All watched actors terminated, shutting down");
		match ctx.system().shutdown() {
			Ok(()) | Err(ActorError::SystemInactive) => Ok(()),
			Err(err) => Err(err.into()),
		}
	}
}

impl Actor for Reaper {
	fn before(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
		if let Some(starter) = self.starter.take() {
			starter(&mut Reaping {
				ctx: &mut *ctx,
				watched: &mut self.watched,
			})?;
		}
		if self.watched.is_empty() {
			return self.reap(ctx);
		}
		Ok(())
	}

	fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()> {
		if let Message::Terminated = message {
			if let Some(sender) = ctx.sender() {
				self.watched.remove(sender);
			}
			tracing::debug!(left = self.watched.len(), "watched actor terminated");
			if self.watched.is_empty() {
				return self.reap(ctx);
			}
		}
		Ok(())
	}
}

/// Registration hook handed to a [`Reaper`]'s starter.
pub struct Reaping<'a> {
	ctx: &'a mut Context,
	watched: &'a mut HashSet<ActorRef>,
}

impl Reaping<'_> {
	/// Registers a child actor the reaper waits for.
	pub fn actor<A: Actor>(&mut self, name: impl Into<String>, actor: A) -> ActorResult<ActorRef> {
		let child = self.ctx.actor(name, actor)?;
		self.watched.insert(child.clone());
		Ok(child)
	}

	/// Waits for an actor that already exists.
	pub fn watch(&mut self, target: &ActorRef) {
		self.ctx.watch(target);
		self.watched.insert(target.clone());
	}

	pub fn system(&self) -> &ActorSystem {
		self.ctx.system()
	}

	pub fn context(&mut self) -> &mut Context {
		self.ctx
	}
}
