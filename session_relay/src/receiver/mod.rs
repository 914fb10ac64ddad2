//! Extension-side counterpart of the handoff

mod errors;
mod listener;
mod store;
mod user_info;

pub use errors::ReceiverError;
pub use listener::{BadgeState, EXTENSION_AUTH_PATH, ExtensionReceiver, extension_login_url};
pub use store::{InMemoryTokenStore, StoredToken, TokenStore};
pub use user_info::{UserInfo, decode_user_info};
