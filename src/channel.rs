use tokio::sync::mpsc;

use crate::envelope::Envelope;

/// Opens an unbounded mailbox: any number of producers, one consuming thread.
pub(crate) fn mailbox() -> (MailboxSender, MailboxReceiver) {
	let (tx, rx) = mpsc::unbounded_channel();
	(MailboxSender { tx }, MailboxReceiver { rx })
}

#[derive(Clone)]
pub(crate) struct MailboxSender {
	tx: mpsc::UnboundedSender<Envelope>,
}

impl MailboxSender {
	/// Never blocks. Hands the envelope back once the receiving side is closed.
	pub fn send(&self, envelope: Envelope) -> Result<(), Envelope> {
		self.tx.send(envelope).map_err(|err| err.0)
	}

	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}
}

pub(crate) struct MailboxReceiver {
	rx: mpsc::UnboundedReceiver<Envelope>,
}

impl MailboxReceiver {
	/// Parks the calling thread until an envelope arrives.
	///
	/// Must only run on a plain OS thread, never inside an async runtime.
	pub fn recv(&mut self) -> Option<Envelope> {
		self.rx.blocking_recv()
	}

	/// Rejects further sends and returns whatever was still queued.
	pub fn close_and_drain(&mut self) -> Vec<Envelope> {
		self.rx.close();
		let mut pending = Vec::new();
		while let Ok(envelope) = self.rx.try_recv() {
			pending.push(envelope);
		}
		pending
	}
}
