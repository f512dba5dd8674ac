//! Aria Storage - local persistence
//!
//! Provides [`KeyValueStore`](aria_core::KeyValueStore) implementations and
//! the persisted session store.
//!
//! Keys used by the player:
//! - `session` - auth token and profile ([`SessionStore`])
//! - `theme` - theme preference (`aria-artwork`)
//! - `playback` - queue/position/mode snapshot (`aria-playback`)
//!
//! # Example
//!
//! ```no_run
//! use aria_storage::{FileStore, SessionStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(FileStore::open("./data").unwrap());
//! let sessions = SessionStore::load(store);
//! if sessions.is_authenticated() {
//!     println!("Signed in as {}", sessions.nickname());
//! }
//! ```

mod error;
mod session;
mod store;

pub use error::{Result, StorageError};
pub use session::{SessionStore, SESSION_KEY};
pub use store::{FileStore, MemoryStore};
