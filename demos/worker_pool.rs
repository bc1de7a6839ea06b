use runy_thread_actor::prelude::*;
use runy_thread_actor::RoundRobinRouter;
use std::thread::sleep;
use std::time::Duration;

// Messages
#[derive(Debug)]
pub struct Task {
    pub id: u32,
    pub data: String,
    pub processing_time_ms: u64,
}

#[derive(Debug)]
pub struct TaskResult {
    pub task_id: u32,
    pub worker: String,
    pub result: String,
}

#[derive(Debug)]
pub struct GetWorkerStats;

#[derive(Debug)]
pub struct WorkerStats {
    pub worker: String,
    pub tasks_processed: u32,
}

// Worker actor that processes tasks
#[derive(Default)]
pub struct Worker {
    tasks_processed: u32,
}

impl Actor for Worker {
    fn receive(&mut self, ctx: &mut Context, message: Message) -> anyhow::Result<()> {
        let name = ctx.myself().name().to_string();

        if let Some(task) = message.downcast_ref::<Task>() {
            println!("{} processing task {} ({}ms)", name, task.id, task.processing_time_ms);

            // Simulate work
            sleep(Duration::from_millis(task.processing_time_ms));
            self.tasks_processed += 1;

            let result = format!("Processed '{}' by {}", task.data, name);
            ctx.reply(Message::user(TaskResult {
                task_id: task.id,
                worker: name,
                result,
            }));
        } else if message.is::<GetWorkerStats>() {
            ctx.reply(Message::user(WorkerStats {
                worker: name,
                tasks_processed: self.tasks_processed,
            }));
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    println!("=== Worker Pool ===");

    let system = ActorSystem::new()?;

    let workers = (1..=3)
        .map(|id| system.actor(format!("worker-{id}"), Worker::default()))
        .collect::<Result<Vec<_>, _>>()?;
    let pool = system.actor("pool", RoundRobinRouter::new(workers.clone())?)?;

    let tasks = [
        ("Process user data", 100),
        ("Generate report", 200),
        ("Send notifications", 50),
        ("Backup database", 300),
        ("Update cache", 75),
        ("Clean logs", 25),
    ];

    println!("\nSubmitting tasks...");
    for (id, (data, processing_time_ms)) in tasks.into_iter().enumerate() {
        let task = Task {
            id: id as u32 + 1,
            data: data.to_string(),
            processing_time_ms,
        };
        let reply = pool.ask(Message::user(task), Duration::from_secs(1))?;
        if let Some(result) = reply.downcast_ref::<TaskResult>() {
            println!("Task {} done by {}: {}", result.task_id, result.worker, result.result);
        }
    }

    println!("\nWorker statistics:");
    for worker in &workers {
        let reply = worker.ask(Message::user(GetWorkerStats), Duration::from_secs(1))?;
        if let Some(stats) = reply.downcast_ref::<WorkerStats>() {
            println!("{}: {} tasks processed", stats.worker, stats.tasks_processed);
        }
    }

    system.shutdown()?;
    system.wait_for_shutdown()?;
    println!("\n=== Worker Pool Complete ===");
    Ok(())
}
