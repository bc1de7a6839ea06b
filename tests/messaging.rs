mod common;

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use common::{Dummy, Echo, eventually};
use parking_lot::Mutex;
use runy_thread_actor::testkit::{ActorTest, actor_test};
use runy_thread_actor::{Actor, ActorRef, ActorSystem, Context, Fault, Message};

#[derive(Debug)]
struct Start;
#[derive(Debug)]
struct Stop;
#[derive(Debug)]
struct Ping;
#[derive(Debug)]
struct Pong(u32);

#[derive(Default)]
struct PingActor {
	last_pong: u32,
	starter: Option<ActorRef>,
}

impl Actor for PingActor {
	fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()> {
		if message.is::<Start>() {
			let pong = ctx
				.system()
				.find("pong")
				.ok_or_else(|| anyhow::anyhow!("pong is not registered"))?;
			ctx.tell(&pong, Ping);
			self.starter = ctx.sender().cloned();
		} else if message.is::<Stop>() {
			ctx.reply(Message::PoisonPill);
			ctx.stop();
			if let Some(starter) = &self.starter {
				ctx.tell(starter, self.last_pong);
			}
		} else if let Some(Pong(id)) = message.downcast_ref::<Pong>() {
			self.last_pong = *id;
			ctx.reply(Message::user(Ping));
		}
		Ok(())
	}
}

#[derive(Default)]
struct PongActor {
	count: u32,
}

impl Actor for PongActor {
	fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()> {
		if message.is::<Ping>() {
			self.count += 1;
			if self.count < 100 {
				ctx.reply(Message::user(Pong(self.count)));
			} else {
				ctx.reply(Message::user(Stop));
			}
		}
		Ok(())
	}
}

#[test]
fn ping_pong() {
	let reply = actor_test(|ctx| {
		let ping = ctx.system().actor("ping", PingActor::default())?;
		ctx.system().actor("pong", PongActor::default())?;
		ctx.tell(&ping, Start);
		Ok(())
	})
	.unwrap()
	.unwrap();

	assert_eq!(reply.downcast_ref::<u32>(), Some(&99));
}

struct Collector {
	expected: usize,
	seen: Vec<usize>,
}

impl Actor for Collector {
	fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()> {
		if let Some(n) = message.downcast_ref::<usize>() {
			self.seen.push(*n);
			if self.seen.len() == self.expected {
				ctx.reply(Message::user(std::mem::take(&mut self.seen)));
			}
		}
		Ok(())
	}
}

#[test]
fn messages_from_one_sender_arrive_in_order() {
	const COUNT: usize = 1000;

	let reply = actor_test(|ctx| {
		let collector = ctx.system().actor(
			"collector",
			Collector {
				expected: COUNT,
				seen: Vec::new(),
			},
		)?;
		for n in 0..COUNT {
			ctx.tell(&collector, n);
		}
		Ok(())
	})
	.unwrap()
	.unwrap();

	let expected: Vec<usize> = (0..COUNT).collect();
	assert_eq!(reply.downcast_ref::<Vec<usize>>(), Some(&expected));
}

/// Echoes everything, answers "stop" with "answer" and stops.
struct EchoStop;

impl Actor for EchoStop {
	fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()> {
		if message.downcast_ref::<&str>() == Some(&"stop") {
			ctx.reply(Message::user("answer"));
			ctx.stop();
		} else {
			ctx.reply(message);
		}
		Ok(())
	}
}

#[test]
fn undeliverable_messages_become_dead_letters() {
	let dead_letters = Arc::new(Mutex::new(Vec::new()));

	let reply = ActorTest::new()
		.dead_letter_handler({
			let dead_letters = dead_letters.clone();
			move |message| {
				if let Some(n) = message.downcast_ref::<i32>() {
					dead_letters.lock().push(*n);
				}
			}
		})
		.run(|ctx| {
			let echo = ctx.system().actor("echoStop", EchoStop)?;
			let dummy = ctx.system().actor("dummy", Dummy)?;
			ctx.send(&dummy, Message::PoisonPill);
			while !dummy.is_terminated() {
				thread::sleep(Duration::from_millis(1));
			}
			ctx.tell(&dummy, 11);
			ctx.tell(&dummy, 12);
			echo.send_from(Message::user(3), None);
			echo.send_from(Message::user(4), None);
			echo.send_from(Message::user(5), None);
			ctx.tell(&echo, "stop");
			Ok(())
		})
		.unwrap()
		.unwrap();

	assert_eq!(reply.downcast_ref::<&str>(), Some(&"answer"));
	let mut dead_letters = dead_letters.lock().clone();
	dead_letters.sort();
	assert_eq!(dead_letters, vec![3, 4, 5, 11, 12]);
}

#[test]
fn messages_queued_behind_poison_pill_are_dead_lettered() {
	let (tx, rx) = mpsc::channel();
	let system = ActorSystem::builder()
		.on_dead_letter_message(move |message| {
			let _ = tx.send(message);
		})
		.build()
		.unwrap();

	let dummy = system.actor("dummy", Dummy).unwrap();
	dummy.send(Message::PoisonPill);
	dummy.tell("after the pill");

	let dead = rx.recv_timeout(Duration::from_secs(2)).unwrap();
	assert!(!dead.is_dead_letter());
	assert_eq!(dead.downcast_ref::<&str>(), Some(&"after the pill"));
	assert!(eventually(|| dummy.is_terminated()));

	system.shutdown().unwrap();
	system.wait_for_shutdown().unwrap();
}

/// Counts what it receives and reports the count once stopped.
struct Counter {
	seen: usize,
	report: mpsc::Sender<usize>,
}

impl Actor for Counter {
	fn receive(&mut self, _ctx: &mut Context, _message: Message) -> anyhow::Result<()> {
		self.seen += 1;
		Ok(())
	}

	fn after(&mut self, _ctx: &mut Context) {
		let _ = self.report.send(self.seen);
	}
}

#[test]
fn backlog_ahead_of_poison_pill_is_processed() {
	const BACKLOG: usize = 500;

	let (tx, rx) = mpsc::channel();
	let system = ActorSystem::new().unwrap();
	let counter = system
		.actor("counter", Counter { seen: 0, report: tx })
		.unwrap();

	for n in 0..BACKLOG {
		counter.tell(n);
	}
	counter.send(Message::PoisonPill);

	assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), BACKLOG);
	assert!(eventually(|| counter.is_terminated()));

	system.shutdown().unwrap();
	system.wait_for_shutdown().unwrap();
}

#[test]
fn dead_letters_are_not_wrapped_twice() {
	let (tx, rx) = mpsc::channel();
	let system = ActorSystem::builder()
		.on_dead_letter_message(move |message| {
			let _ = tx.send(message);
		})
		.build()
		.unwrap();

	system.dead_letter(Message::DeadLetter(Box::new(Message::user(1))));
	system.dead_letter(Message::user(2));

	let dead = rx.recv_timeout(Duration::from_secs(2)).unwrap();
	assert_eq!(dead.downcast_ref::<i32>(), Some(&2));

	system.shutdown().unwrap();
	system.wait_for_shutdown().unwrap();
	assert!(rx.try_recv().is_err());
}

#[test]
fn forward_is_unwrapped_by_the_receiver() {
	let system = ActorSystem::new().unwrap();
	let echo = system.actor("echo", Echo).unwrap();

	let reply = echo
		.ask(Message::forward(Message::user("relayed")), Duration::from_secs(1))
		.unwrap();
	assert_eq!(reply.downcast_ref::<&str>(), Some(&"relayed"));

	echo.send(Message::forward(Message::PoisonPill));
	assert!(eventually(|| echo.is_terminated()));

	system.shutdown().unwrap();
	system.wait_for_shutdown().unwrap();
}

/// Watches `target` in `before` and reports who terminated to `report_to`.
struct Watcher {
	target: ActorRef,
	report_to: ActorRef,
	poison: bool,
}

impl Actor for Watcher {
	fn before(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
		ctx.watch(&self.target);
		if self.poison {
			ctx.send(&self.target, Message::PoisonPill);
		}
		Ok(())
	}

	fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()> {
		if let Message::Terminated = message {
			let name = ctx.sender().map(|sender| sender.name().to_string());
			ctx.tell(&self.report_to, name);
		}
		Ok(())
	}
}

#[test]
fn watchers_are_told_about_termination() {
	let reply = actor_test(|ctx| {
		let target = ctx.system().actor("target", Dummy)?;
		let watcher = Watcher {
			target,
			report_to: ctx.myself().clone(),
			poison: true,
		};
		ctx.system().actor("watcher", watcher)?;
		Ok(())
	})
	.unwrap()
	.unwrap();

	assert_eq!(
		reply.downcast_ref::<Option<String>>(),
		Some(&Some("target".to_string()))
	);
}

#[test]
fn watching_a_terminated_actor_reports_at_once() {
	let reply = actor_test(|ctx| {
		let target = ctx.system().actor("target", Dummy)?;
		ctx.send(&target, Message::PoisonPill);
		while !target.is_terminated() {
			thread::sleep(Duration::from_millis(1));
		}
		let watcher = Watcher {
			target,
			report_to: ctx.myself().clone(),
			poison: false,
		};
		ctx.system().actor("watcher", watcher)?;
		Ok(())
	})
	.unwrap()
	.unwrap();

	assert_eq!(
		reply.downcast_ref::<Option<String>>(),
		Some(&Some("target".to_string()))
	);
}

struct Parent {
	report_to: ActorRef,
}

impl Actor for Parent {
	fn before(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
		let child = ctx.actor("child", Dummy)?;
		ctx.send(&child, Message::PoisonPill);
		Ok(())
	}

	fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()> {
		if let Message::Terminated = message {
			let name = ctx.sender().map(|sender| sender.name().to_string());
			ctx.tell(&self.report_to, name);
		}
		Ok(())
	}
}

#[test]
fn parents_watch_their_children() {
	let reply = actor_test(|ctx| {
		let parent = Parent {
			report_to: ctx.myself().clone(),
		};
		ctx.system().actor("parent", parent)?;
		Ok(())
	})
	.unwrap()
	.unwrap();

	assert_eq!(
		reply.downcast_ref::<Option<String>>(),
		Some(&Some("child".to_string()))
	);
}

/// Fails on "boom", panics on "panic", answers "ping" with "pong".
struct Faulty {
	policy: Fault,
}

impl Actor for Faulty {
	fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()> {
		match message.downcast_ref::<&str>() {
			Some(&"boom") => anyhow::bail!("boom"),
			Some(&"panic") => panic!("faulty actor panicked"),
			Some(&"ping") => ctx.reply(Message::user("pong")),
			_ => {}
		}
		Ok(())
	}

	fn on_failure(&mut self, _ctx: &mut Context, _error: anyhow::Error) -> Fault {
		self.policy
	}
}

#[test]
fn failures_stop_the_actor_by_default() {
	let system = ActorSystem::new().unwrap();
	let faulty = system
		.actor("faulty", Faulty { policy: Fault::default() })
		.unwrap();

	faulty.tell("boom");
	assert!(eventually(|| faulty.is_terminated()));
	assert!(system.is_active());

	system.shutdown().unwrap();
	system.wait_for_shutdown().unwrap();
}

#[test]
fn panics_are_handled_like_failures() {
	let system = ActorSystem::new().unwrap();
	let faulty = system
		.actor("faulty", Faulty { policy: Fault::Resume })
		.unwrap();

	faulty.tell("panic");
	faulty.tell("boom");
	let reply = faulty
		.ask(Message::user("ping"), Duration::from_secs(1))
		.unwrap();
	assert_eq!(reply.downcast_ref::<&str>(), Some(&"pong"));
	assert!(!faulty.is_terminated());

	system.shutdown().unwrap();
	system.wait_for_shutdown().unwrap();
}

#[test]
fn escalated_failures_shut_the_system_down() {
	let system = ActorSystem::new().unwrap();
	let faulty = system
		.actor("faulty", Faulty { policy: Fault::Escalate })
		.unwrap();

	faulty.tell("boom");
	system
		.wait_for_shutdown_timeout(Duration::from_secs(2))
		.unwrap();
	assert!(!system.is_active());
}

struct FailingStart;

impl Actor for FailingStart {
	fn before(&mut self, _ctx: &mut Context) -> anyhow::Result<()> {
		anyhow::bail!("cannot start")
	}

	fn receive(&mut self, _ctx: &mut Context, _message: Message) -> anyhow::Result<()> {
		Ok(())
	}
}

#[test]
fn failing_before_stops_the_actor() {
	let system = ActorSystem::new().unwrap();
	let actor = system.actor("failing", FailingStart).unwrap();

	assert!(eventually(|| actor.is_terminated()));

	system.shutdown().unwrap();
	system.wait_for_shutdown().unwrap();
}
