use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::thread;
use std::thread::JoinHandle;
use std::thread::ThreadId;
use std::time::Duration;
use std::time::Instant;

use parking_lot::Condvar;
use parking_lot::Mutex;

use crate::actor::Actor;
use crate::actor::Fault;
use crate::channel::MailboxReceiver;
use crate::channel::mailbox;
use crate::context::Context;
use crate::countme::Census;
use crate::countme::Report;
use crate::error::ActorError;
use crate::error::ActorResult;
use crate::message::Message;
use crate::reference::ActorRef;

/// Names starting with this marker belong to the system itself.
pub const SYSTEM_NAMESPACE: &str = "_system";

pub(crate) fn reserved_name(name: &str) -> String {
	format!("{SYSTEM_NAMESPACE}/{name}")
}

fn is_reserved(name: &str) -> bool {
	name.starts_with(SYSTEM_NAMESPACE)
}

type MainHandler = Box<dyn FnMut(&mut Context, Message) + Send>;
type DeadLetterHandler = Box<dyn FnMut(Message) + Send>;

/// Process-wide registry and lifecycle owner for a set of actors.
///
/// Registration, lookup and the shutdown broadcast all go through a single
/// lock, so they are linearizable with respect to each other. Cloning the
/// system only clones a handle.
#[derive(Clone)]
pub struct ActorSystem {
	pub(crate) shared: Arc<SystemShared>,
}

pub(crate) struct SystemShared {
	registry: Mutex<Registry>,
	inactive: Condvar,
	joined: Condvar,
	main: ActorRef,
	dead_letters: ActorRef,
	census: Census,
	stack_size: Option<usize>,
	pub(crate) ask_seq: AtomicU64,
}

struct Registry {
	active: bool,
	actors: HashMap<String, Entry>,
	/// Callers currently joining threads they took out of `actors`.
	joining: usize,
}

struct Entry {
	reference: ActorRef,
	thread_id: ThreadId,
	thread: Option<JoinHandle<()>>,
	ephemeral: bool,
}

impl Registry {
	/// Drops finished ephemeral actors so repeated asks do not grow the map.
	fn prune(&mut self) {
		self.actors.retain(|_, entry| {
			let finished = entry.thread.as_ref().is_none_or(JoinHandle::is_finished);
			!(entry.ephemeral && finished)
		});
	}
}

impl ActorSystem {
	pub fn new() -> ActorResult<Self> {
		Self::builder().build()
	}

	pub fn builder() -> ActorSystemBuilder {
		ActorSystemBuilder::default()
	}

	pub(crate) fn from_shared(shared: Arc<SystemShared>) -> Self {
		Self { shared }
	}

	/// Registers and starts an actor under a unique, non-reserved name.
	pub fn actor<A: Actor>(&self, name: impl Into<String>, actor: A) -> ActorResult<ActorRef> {
		let name = name.into();
		if is_reserved(&name) {
			return Err(ActorError::ReservedNamespace {
				name,
				namespace: SYSTEM_NAMESPACE,
			});
		}
		self.register(name, actor, false)
	}

	pub fn find(&self, name: &str) -> Option<ActorRef> {
		let registry = self.shared.registry.lock();
		registry.actors.get(name).map(|entry| entry.reference.clone())
	}

	pub fn is_active(&self) -> bool {
		self.shared.registry.lock().active
	}

	/// The root context: default sender for sends made outside any actor.
	pub fn main_actor(&self) -> &ActorRef {
		&self.shared.main
	}

	/// Marks the system inactive and poisons every actor, the dead-letter
	/// actor last. Does not wait for the actors to finish.
	pub fn shutdown(&self) -> ActorResult<()> {
		let mut registry = self.shared.registry.lock();
		if !registry.active {
			return Err(ActorError::SystemInactive);
		}
		registry.active = false;
		tracing::info!(actors = registry.actors.len(), "Shutting down actor system");

		for entry in registry.actors.values() {
			if entry.reference != self.shared.dead_letters {
				entry.reference.poison();
			}
		}
		self.shared.dead_letters.poison();
		self.shared.inactive.notify_all();
		Ok(())
	}

	/// Blocks until the system is shut down and every actor thread has exited.
	///
	/// Fails with [`ActorError::IllegalCaller`] on an actor thread of this
	/// system, where waiting would deadlock.
	pub fn wait_for_shutdown(&self) -> ActorResult<()> {
		self.ensure_outside_actor()?;
		{
			let mut registry = self.shared.registry.lock();
			while registry.active {
				self.shared.inactive.wait(&mut registry);
			}
		}
		self.join_all();
		Ok(())
	}

	/// Like [`wait_for_shutdown`](Self::wait_for_shutdown), but shuts the
	/// system down itself and fails once `timeout` passes without shutdown.
	pub fn wait_for_shutdown_timeout(&self, timeout: Duration) -> ActorResult<()> {
		self.ensure_outside_actor()?;
		let deadline = Instant::now().checked_add(timeout);
		let expired = {
			let mut registry = self.shared.registry.lock();
			while registry.active {
				match deadline {
					Some(deadline) => {
						if self.shared.inactive.wait_until(&mut registry, deadline).timed_out() {
							break;
						}
					}
					None => self.shared.inactive.wait(&mut registry),
				}
			}
			registry.active
		};

		if expired {
			tracing::warn!(?timeout, "Actor system still active at deadline, forcing shutdown");
			if let Err(err) = self.shutdown() {
				tracing::debug!(%err, "shutdown raced with the deadline");
			}
		}
		self.join_all();

		if expired {
			Err(ActorError::ShutdownTimeout { timeout })
		} else {
			Ok(())
		}
	}

	/// Hands an undeliverable message to the dead-letter actor.
	///
	/// Messages that already are dead letters are dropped instead of being
	/// wrapped again.
	pub fn dead_letter(&self, message: Message) {
		if message.is_dead_letter() {
			tracing::trace!(?message, "dropping undeliverable dead letter");
			return;
		}
		metrics::counter!("runy_actor_dead_letters_total").increment(1);
		self.shared
			.dead_letters
			.send_from(Message::DeadLetter(Box::new(message)), None);
	}

	/// Snapshot of how many actors of each type were started and are live.
	pub fn census(&self) -> Report {
		self.shared.census.report()
	}

	pub(crate) fn census_ref(&self) -> &Census {
		&self.shared.census
	}

	pub(crate) fn register<A: Actor>(
		&self,
		name: String,
		actor: A,
		ephemeral: bool,
	) -> ActorResult<ActorRef> {
		let mut registry = self.shared.registry.lock();
		if registry.actors.contains_key(&name) {
			return Err(ActorError::DuplicateName { name });
		}
		if !registry.active {
			return Err(ActorError::SystemInactive);
		}
		registry.prune();

		let (tx, rx) = mailbox();
		let reference = ActorRef::new(name, tx, Arc::downgrade(&self.shared));
		self.launch(&mut registry, reference.clone(), rx, actor, ephemeral)?;
		tracing::debug!(actor = %reference.name(), "Registered actor");
		Ok(reference)
	}

	fn launch<A: Actor>(
		&self,
		registry: &mut Registry,
		reference: ActorRef,
		rx: MailboxReceiver,
		actor: A,
		ephemeral: bool,
	) -> ActorResult<()> {
		let thread = crate::actor::start(self.clone(), reference.clone(), rx, actor, self.shared.stack_size)?;
		registry.actors.insert(
			reference.name().to_string(),
			Entry {
				reference,
				thread_id: thread.thread().id(),
				thread: Some(thread),
				ephemeral,
			},
		);
		Ok(())
	}

	pub(crate) fn ensure_outside_actor(&self) -> ActorResult<()> {
		let current = thread::current().id();
		let registry = self.shared.registry.lock();
		if registry.actors.values().any(|entry| entry.thread_id == current) {
			return Err(ActorError::IllegalCaller);
		}
		Ok(())
	}

	/// Joins every actor thread. Concurrent callers that find the handles
	/// already taken block until the caller holding them has joined them all.
	fn join_all(&self) {
		let (threads, dead_letters) = {
			let mut registry = self.shared.registry.lock();
			let mut threads = Vec::new();
			let mut dead_letters = None;
			for (name, entry) in registry.actors.iter_mut() {
				let Some(thread) = entry.thread.take() else {
					continue;
				};
				if entry.reference == self.shared.dead_letters {
					dead_letters = Some((name.clone(), thread));
				} else {
					threads.push((name.clone(), thread));
				}
			}

			if threads.is_empty() && dead_letters.is_none() {
				while registry.joining > 0 {
					self.shared.joined.wait(&mut registry);
				}
				return;
			}
			registry.joining += 1;
			(threads, dead_letters)
		};

		for (name, thread) in threads.into_iter().chain(dead_letters) {
			if thread.join().is_err() {
				tracing::error!(actor = %name, "Actor thread panicked");
			}
		}

		let mut registry = self.shared.registry.lock();
		registry.joining -= 1;
		self.shared.joined.notify_all();
	}
}

/// Configures the reserved actors and thread settings of an [`ActorSystem`].
#[derive(Default)]
pub struct ActorSystemBuilder {
	main_handler: Option<MainHandler>,
	dead_letter_handler: Option<DeadLetterHandler>,
	stack_size: Option<usize>,
}

impl ActorSystemBuilder {
	/// Behavior of the main actor, which receives replies to sends made
	/// outside any actor.
	pub fn on_default_actor_message(
		mut self,
		handler: impl FnMut(&mut Context, Message) + Send + 'static,
	) -> Self {
		self.main_handler = Some(Box::new(handler));
		self
	}

	/// Called with every dead letter, already unwrapped.
	pub fn on_dead_letter_message(mut self, handler: impl FnMut(Message) + Send + 'static) -> Self {
		self.dead_letter_handler = Some(Box::new(handler));
		self
	}

	pub fn stack_size(mut self, bytes: usize) -> Self {
		self.stack_size = Some(bytes);
		self
	}

	pub fn build(self) -> ActorResult<ActorSystem> {
		let (main_tx, main_rx) = mailbox();
		let (dead_tx, dead_rx) = mailbox();

		let shared = Arc::new_cyclic(|weak| SystemShared {
			registry: Mutex::new(Registry {
				active: true,
				actors: HashMap::new(),
				joining: 0,
			}),
			inactive: Condvar::new(),
			joined: Condvar::new(),
			main: ActorRef::new(reserved_name("main"), main_tx, weak.clone()),
			dead_letters: ActorRef::new(reserved_name("deadLetter"), dead_tx, weak.clone()),
			census: Census::default(),
			stack_size: self.stack_size,
			ask_seq: AtomicU64::new(0),
		});
		let system = ActorSystem { shared };

		let main = MainActor {
			handler: self.main_handler.unwrap_or_else(|| Box::new(|_: &mut Context, _: Message| {})),
		};
		let dead_letters = DeadLetterActor {
			handler: self.dead_letter_handler.unwrap_or_else(|| Box::new(|_: Message| {})),
		};

		let mut registry = system.shared.registry.lock();
		system.launch(&mut registry, system.shared.main.clone(), main_rx, main, false)?;
		let launched = system.launch(
			&mut registry,
			system.shared.dead_letters.clone(),
			dead_rx,
			dead_letters,
			false,
		);
		drop(registry);

		if let Err(err) = launched {
			system.shared.main.poison();
			return Err(err);
		}
		Ok(system)
	}
}

struct MainActor {
	handler: MainHandler,
}

impl Actor for MainActor {
	fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()> {
		(self.handler)(ctx, message);
		Ok(())
	}

	fn on_failure(&mut self, _ctx: &mut Context, _error: anyhow::Error) -> Fault {
		Fault::Resume
	}
}

struct DeadLetterActor {
	handler: DeadLetterHandler,
}

impl Actor for DeadLetterActor {
	fn receive(&mut self, _ctx: &mut Context, message: Message) -> anyhow::Result<()> {
		match message {
			Message::DeadLetter(message) => (self.handler)(*message),
			other => tracing::debug!(message = ?other, "dead-letter actor ignoring message"),
		}
		Ok(())
	}

	fn on_failure(&mut self, _ctx: &mut Context, _error: anyhow::Error) -> Fault {
		Fault::Resume
	}
}
