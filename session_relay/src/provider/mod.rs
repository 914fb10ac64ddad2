//! HTTP-backed identity provider (Supabase GoTrue compatible)

mod browser;
mod cookie_backend;
mod gotrue;

pub use browser::SupabaseBrowserClient;
pub use cookie_backend::{SupabaseCookieBackend, storage_key};
pub use gotrue::{GoTrueClient, ProviderSession, ProviderUser};
