//! One function per stage. Each takes the model service it runs against and
//! returns a typed result or a [`crate::PipelineError`].

mod classify;
mod evidence;
mod explain;
mod media;
mod question;

pub use classify::classify;
pub use evidence::{gather_evidence, FALLBACK_COUNTER_RESPONSE};
pub use explain::explain;
pub use media::analyze_media;
pub use question::answer_question;
