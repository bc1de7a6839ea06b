use std::any::Any;
use std::any::type_name;
use std::collections::HashSet;
use std::io;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::thread;
use std::thread::JoinHandle;

use crate::channel::MailboxReceiver;
use crate::context::Context;
use crate::envelope::Envelope;
use crate::message::Message;
use crate::reference::ActorRef;
use crate::system::ActorSystem;

/// What the dispatch loop does after [`Actor::on_failure`] has seen an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fault {
	/// Leave the dispatch loop; `after` runs and watchers are notified.
	#[default]
	Stop,
	/// Drop the failed message and continue with the next one.
	Resume,
	/// Stop, then shut the whole system down.
	Escalate,
}

/// A unit of sequential logic owning its state and driven by its mailbox.
///
/// Every registered actor gets its own OS thread. Hooks only ever run on that
/// thread, one message at a time, so the actor can mutate `self` freely.
pub trait Actor: Send + 'static {
	/// Processes one message. Errors and panics are routed to
	/// [`Actor::on_failure`].
	fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()>;

	/// Runs once on the actor thread before the first message is read.
	fn before(&mut self, _ctx: &mut Context) -> anyhow::Result<()> {
		Ok(())
	}

	/// Runs once after the dispatch loop exited, before watchers are told.
	fn after(&mut self, _ctx: &mut Context) {}

	fn on_failure(&mut self, _ctx: &mut Context, _error: anyhow::Error) -> Fault {
		Fault::Stop
	}
}

/// Spawns the dedicated thread running `actor`'s dispatch loop.
pub(crate) fn start<A: Actor>(
	system: ActorSystem,
	me: ActorRef,
	rx: MailboxReceiver,
	actor: A,
	stack_size: Option<usize>,
) -> io::Result<JoinHandle<()>> {
	let mut builder = thread::Builder::new().name(format!("actor:{}", me.name()));
	if let Some(size) = stack_size {
		builder = builder.stack_size(size);
	}

	let dispatcher = Dispatcher {
		actor,
		ctx: Context::new(system, me),
		rx,
		watchers: HashSet::new(),
		escalated: false,
	};
	builder.spawn(move || dispatcher.run())
}

struct Dispatcher<A: Actor> {
	actor: A,
	ctx: Context,
	rx: MailboxReceiver,
	watchers: HashSet<ActorRef>,
	escalated: bool,
}

impl<A: Actor> Dispatcher<A> {
	fn run(mut self) {
		let span = tracing::info_span!("actor", name = %self.ctx.myself().name());
		let _enter = span.enter();
		let _count = self.ctx.system().census_ref().count::<A>();

		metrics::counter!("runy_actor_started_total").increment(1);
		metrics::gauge!("runy_actor_live").increment(1.0);
		tracing::debug!("Actor {} started", type_name::<A>());

		let before = guarded(|| self.actor.before(&mut self.ctx));
		if let Err(err) = before {
			self.fail(err);
		}

		while self.ctx.is_running() {
			let Some(envelope) = self.rx.recv() else {
				break;
			};
			let (message, sender) = envelope.split();
			self.dispatch(message, sender);
		}

		self.terminate();
	}

	fn dispatch(&mut self, message: Message, sender: Option<ActorRef>) {
		match message {
			Message::Forward(inner) => self.dispatch(*inner, sender),
			Message::PoisonPill => self.ctx.stop(),
			Message::Watch => match sender {
				Some(watcher) => {
					self.watchers.insert(watcher);
				}
				None => tracing::debug!("ignoring watch request without a sender"),
			},
			message => {
				self.ctx.set_sender(sender);
				let received = guarded(|| self.actor.receive(&mut self.ctx, message));
				if let Err(err) = received {
					self.fail(err);
				}
			}
		}
	}

	fn fail(&mut self, error: anyhow::Error) {
		tracing::warn!("Actor {} failed: {error:#}", type_name::<A>());

		let fault = panic::catch_unwind(AssertUnwindSafe(|| {
			self.actor.on_failure(&mut self.ctx, error)
		}))
		.unwrap_or_else(|_| {
			tracing::error!("Actor {} panicked in on_failure", type_name::<A>());
			Fault::Stop
		});

		match fault {
			Fault::Resume => {}
			Fault::Stop => self.ctx.stop(),
			Fault::Escalate => {
				self.escalated = true;
				self.ctx.stop();
			}
		}
	}

	fn terminate(mut self) {
		// Whatever is still queued was never processed.
		for envelope in self.rx.close_and_drain() {
			match envelope.split() {
				(Message::Watch, Some(watcher)) => {
					self.watchers.insert(watcher);
				}
				(message, sender) => {
					self.ctx.myself().undeliverable(Envelope::new(message, sender));
				}
			}
		}

		if panic::catch_unwind(AssertUnwindSafe(|| self.actor.after(&mut self.ctx))).is_err() {
			tracing::error!("Actor {} panicked in after", type_name::<A>());
		}

		for watcher in self.watchers.drain() {
			watcher.send_from(Message::Terminated, Some(self.ctx.myself()));
		}

		metrics::counter!("runy_actor_stopped_total").increment(1);
		metrics::gauge!("runy_actor_live").decrement(1.0);

		if self.escalated {
			tracing::error!("Actor {} escalated a failure, shutting the system down", type_name::<A>());
			if let Err(err) = self.ctx.system().shutdown() {
				tracing::debug!(%err, "system was already shutting down");
			}
		} else {
			tracing::info!("Actor {} completed gracefully", type_name::<A>());
		}
	}
}

/// Runs a hook, turning an escaping panic into an ordinary error.
fn guarded(hook: impl FnOnce() -> anyhow::Result<()>) -> anyhow::Result<()> {
	match panic::catch_unwind(AssertUnwindSafe(hook)) {
		Ok(result) => result,
		Err(panic) => Err(anyhow::anyhow!("panicked: {}", panic_message(&*panic))),
	}
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
	if let Some(message) = panic.downcast_ref::<&'static str>() {
		message
	} else if let Some(message) = panic.downcast_ref::<String>() {
		message
	} else {
		"non-string panic payload"
	}
}
