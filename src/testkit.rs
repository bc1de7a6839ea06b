//! Scripted end-to-end checks against a fresh [`ActorSystem`].
//!
//! ```no_run
//! use runy_thread_actor::Message;
//! use runy_thread_actor::testkit::actor_test;
//!
//! let reply = actor_test(|ctx| {
//!     ctx.send(ctx.myself(), Message::user(42));
//!     Ok(())
//! })
//! .unwrap();
//! assert_eq!(reply.unwrap().downcast_ref::<i32>(), Some(&42));
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::actor::Actor;
use crate::actor::Fault;
use crate::context::Context;
use crate::error::ActorError;
use crate::error::ActorResult;
use crate::message::Message;
use crate::system::ActorSystem;
use crate::system::ActorSystemBuilder;

const PROBE_NAME: &str = "test-probe";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

type Script = Box<dyn FnOnce(&mut Context) -> anyhow::Result<()> + Send>;

/// Runs `script` with default settings, see [`ActorTest::run`].
pub fn actor_test(
	script: impl FnOnce(&mut Context) -> anyhow::Result<()> + Send + 'static,
) -> ActorResult<Option<Message>> {
	ActorTest::new().run(script)
}

pub struct ActorTest {
	timeout: Duration,
	builder: ActorSystemBuilder,
}

impl Default for ActorTest {
	fn default() -> Self {
		Self::new()
	}
}

impl ActorTest {
	pub fn new() -> Self {
		Self {
			timeout: DEFAULT_TIMEOUT,
			builder: ActorSystem::builder(),
		}
	}

	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn main_handler(mut self, handler: impl FnMut(&mut Context, Message) + Send + 'static) -> Self {
		self.builder = self.builder.on_default_actor_message(handler);
		self
	}

	pub fn dead_letter_handler(mut self, handler: impl FnMut(Message) + Send + 'static) -> Self {
		self.builder = self.builder.on_dead_letter_message(handler);
		self
	}

	/// Starts a system and a probe actor whose `before` runs `script`.
	///
	/// The first message the probe receives (termination notices aside) is
	/// returned and shuts the system down. Returns `Ok(None)` when something
	/// else shut the system down first, and [`ActorError::ShutdownTimeout`]
	/// when nothing did within the timeout.
	pub fn run(
		self,
		script: impl FnOnce(&mut Context) -> anyhow::Result<()> + Send + 'static,
	) -> ActorResult<Option<Message>> {
		let system = self.builder.build()?;
		let outcome = Arc::new(Mutex::new(Outcome::default()));
		let probe = Probe {
			script: Some(Box::new(script)),
			outcome: outcome.clone(),
		};

		if let Err(err) = system.actor(PROBE_NAME, probe) {
			system.shutdown()?;
			system.wait_for_shutdown()?;
			return Err(err);
		}
		system.wait_for_shutdown_timeout(self.timeout)?;

		let mut outcome = outcome.lock();
		if let Some(reason) = outcome.failure.take() {
			return Err(ActorError::TestFailed { reason });
		}
		Ok(outcome.received.take())
	}
}

#[derive(Default)]
struct Outcome {
	received: Option<Message>,
	failure: Option<String>,
}

struct Probe {
	script: Option<Script>,
	outcome: Arc<Mutex<Outcome>>,
}

impl Actor for Probe {
	fn before(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
		match self.script.take() {
			Some(script) => script(ctx),
			None => Ok(()),
		}
	}

	fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()> {
		if let Message::Terminated = message {
			return Ok(());
		}
		self.outcome.lock().received.get_or_insert(message);
		match ctx.system().shutdown() {
			Ok(()) | Err(ActorError::SystemInactive) => Ok(()),
			Err(err) => Err(err.into()),
		}
	}

	fn on_failure(&mut self, _ctx: &mut Context, error: anyhow::Error) -> Fault {
		self.outcome.lock().failure = Some(format!("{error:#}"));
		Fault::Escalate
	}
}
