use std::ops::Deref;

use crate::reference::ActorRef;

/// Poisons the wrapped actor when dropped, whichever way the owner exits.
#[derive(Debug)]
pub(crate) struct PoisonOnDrop(pub ActorRef);

impl Deref for PoisonOnDrop {
	type Target = ActorRef;
	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl Drop for PoisonOnDrop {
	fn drop(&mut self) {
		self.0.poison()
	}
}
