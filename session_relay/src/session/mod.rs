mod backend;
mod cookie;
mod errors;
mod types;

pub use backend::{
    CodeExchange, CookieAuthBackend, ServerAuthClient, SessionProvider, UserLookup,
};
pub use cookie::{CookieOptions, CookieToSet, RequestCookies, SameSite};
pub use errors::AuthError;
pub use types::{Session, User};
