#![allow(dead_code)]

use std::thread;
use std::time::Duration;
use std::time::Instant;

use runy_thread_actor::Actor;
use runy_thread_actor::Context;
use runy_thread_actor::Message;

/// Polls `condition` until it holds or two seconds pass.
pub fn eventually(condition: impl Fn() -> bool) -> bool {
	let deadline = Instant::now() + Duration::from_secs(2);
	while Instant::now() < deadline {
		if condition() {
			return true;
		}
		thread::sleep(Duration::from_millis(5));
	}
	condition()
}

/// Ignores everything it receives.
pub struct Dummy;

impl Actor for Dummy {
	fn receive(&mut self, _ctx: &mut Context, _message: Message) -> anyhow::Result<()> {
		Ok(())
	}
}

/// Sends every message straight back to its sender.
pub struct Echo;

impl Actor for Echo {
	fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()> {
		ctx.reply(message);
		Ok(())
	}
}
