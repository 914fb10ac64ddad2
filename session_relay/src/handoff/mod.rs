mod host;
mod message;
mod protocol;
mod scheduler;

pub use host::{DirectOutcome, DirectReply, ExtensionHost, MessagingError};
pub use message::{Envelope, HandoffMessage};
pub use protocol::{
    Delivery, EXTENSION_ID_PARAM, HandoffProtocol, HandoffSession, HandoffSettings,
    HandoffStatus, HandoffView, extension_id_from_query,
};
pub use scheduler::{RetryState, ScheduledTask};
