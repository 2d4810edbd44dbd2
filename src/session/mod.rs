//! Session ownership: durable storage, the user profile, and the store that
//! ties them together.
//!
//! DESIGN
//! ======
//! `SessionStore` is the one authority for "who is signed in". The route
//! guard and the request gateway both hold an `Arc<SessionStore>` instead of
//! reading storage on their own.

pub mod storage;
pub mod store;
pub mod user;

pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};
pub use store::{Session, SessionStore, TOKEN_KEY, USER_KEY};
pub use user::{User, UserId};
