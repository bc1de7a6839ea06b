use runy_thread_actor::prelude::*;
use runy_thread_actor::Reaper;
use std::time::Duration;

// Messages
#[derive(Debug)]
pub struct Ball {
    pub hits: u32,
}

// Player that returns the ball until it has been hit `rounds` times
pub struct Player {
    rounds: u32,
}

impl Actor for Player {
    fn before(&mut self, ctx: &mut Context) -> anyhow::Result<()> {
        println!("{} ready", ctx.myself().name());
        Ok(())
    }

    fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()> {
        if let Some(ball) = message.downcast_ref::<Ball>() {
            println!("{} hits the ball ({})", ctx.myself().name(), ball.hits);
            if ball.hits >= self.rounds {
                // Both players stop; the reaper shuts the system down.
                ctx.reply(Message::PoisonPill);
                ctx.stop();
            } else {
                ctx.reply(Message::user(Ball { hits: ball.hits + 1 }));
            }
        }
        Ok(())
    }

    fn after(&mut self, ctx: &mut Context) {
        println!("{} leaves the table", ctx.myself().name());
    }
}

fn main() -> anyhow::Result<()> {
    println!("=== Ping Pong ===");

    let system = ActorSystem::new()?;
    system.actor(
        "reaper",
        Reaper::new(|reaping| {
            let ping = reaping.actor("ping", Player { rounds: 10 })?;
            let pong = reaping.actor("pong", Player { rounds: 10 })?;
            pong.send_from(Message::user(Ball { hits: 1 }), Some(&ping));
            Ok(())
        }),
    )?;

    system.wait_for_shutdown_timeout(Duration::from_secs(5))?;
    println!("\n{}", system.census());
    Ok(())
}
