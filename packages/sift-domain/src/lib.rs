pub mod candidate;
pub mod category;
pub mod context;
pub mod guidance;
pub mod intent;
pub mod text;

pub use candidate::{Bucket, Candidate, TicketMeta};
pub use category::{CategoryPath, CategoryTree};
pub use context::{ConversationNote, TicketContext, TicketDetail};
pub use guidance::{Confidence, Guidance, GuidanceOutcome, SupportingTicket};
pub use intent::{QueryIntent, ResultSignals};
