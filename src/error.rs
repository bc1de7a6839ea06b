use std::time::Duration;

pub type ActorResult<T> = Result<T, ActorError>;

#[derive(thiserror::Error, Debug)]
pub enum ActorError {
	#[error("actor '{name}' already exists")]
	DuplicateName { name: String },

	#[error("actor name '{name}' is inside the reserved '{namespace}' namespace")]
	ReservedNamespace {
		name: String,
		namespace: &'static str,
	},

	#[error("actor system is not active")]
	SystemInactive,

	#[error("an actor of the same system can not block on it")]
	IllegalCaller,

	#[error("no reply within {timeout:?}")]
	AskTimeout { timeout: Duration },

	#[error("system still active after {timeout:?}")]
	ShutdownTimeout { timeout: Duration },

	#[error("router needs at least one worker")]
	NoRoutees,

	#[error("scripted actor test failed: {reason}")]
	TestFailed { reason: String },

	#[error("failed to spawn actor thread")]
	Spawn(#[from] std::io::Error),
}
