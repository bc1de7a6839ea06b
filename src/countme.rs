use std::any::type_name;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use dashmap::DashMap;

#[derive(Debug, Default)]
struct Stats {
	total: AtomicUsize,
	max_live: AtomicUsize,
	live: AtomicUsize,
}

/// Per-system tally of running actors, keyed by actor type.
#[derive(Clone, Default)]
pub(crate) struct Census {
	counts: Arc<DashMap<&'static str, Stats>>,
}

impl Census {
	/// Counts one live instance of `T` until the returned guard is dropped.
	pub fn count<T: 'static>(&self) -> Count {
		let key = type_name::<T>();
		let entry = self.counts.entry(key).or_default();

		entry.total.fetch_add(1, Ordering::Relaxed);
		let live = entry.live.fetch_add(1, Ordering::Relaxed) + 1;
		entry.max_live.fetch_max(live, Ordering::Relaxed);

		Count {
			counts: self.counts.clone(),
			key,
		}
	}

	pub fn report(&self) -> Report {
		let by_type = self
			.counts
			.iter()
			.map(|entry| {
				let stats = entry.value();
				let tally = Tally {
					total: stats.total.load(Ordering::Relaxed),
					max_live: stats.max_live.load(Ordering::Relaxed),
					live: stats.live.load(Ordering::Relaxed),
				};
				(*entry.key(), tally)
			})
			.collect();
		Report { by_type }
	}
}

/// Guard held by an actor thread for as long as its actor runs.
#[derive(Debug)]
pub(crate) struct Count {
	counts: Arc<DashMap<&'static str, Stats>>,
	key: &'static str,
}

impl Drop for Count {
	fn drop(&mut self) {
		if let Some(entry) = self.counts.get(self.key) {
			entry.live.fetch_sub(1, Ordering::Relaxed);
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
	pub total: usize,
	pub max_live: usize,
	pub live: usize,
}

/// Snapshot of a system's actor counts, printable as a table.
#[derive(Debug, Clone, Default)]
pub struct Report {
	// BTreeMap keeps the table sorted by type name.
	by_type: BTreeMap<&'static str, Tally>,
}

impl Report {
	pub fn of<T: 'static>(&self) -> Tally {
		self.by_type.get(type_name::<T>()).copied().unwrap_or_default()
	}

	/// Actors of any type currently running.
	pub fn live(&self) -> usize {
		self.by_type.values().map(|tally| tally.live).sum()
	}

	pub fn total(&self) -> usize {
		self.by_type.values().map(|tally| tally.total).sum()
	}
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let column: usize = 10;
		let width = self.by_type.keys().map(|name| name.len()).fold("actor".len(), usize::max);

		writeln!(f, "{:<width$} {:>column$} {:>column$} {:>column$}", "actor", "started", "peak", "live")?;
		for (name, tally) in &self.by_type {
			writeln!(
				f,
				"{name:<width$} {:>column$} {:>column$} {:>column$}",
				tally.total, tally.max_live, tally.live
			)?;
		}
		Ok(())
	}
}
