pub mod token_store;
pub mod tokens_file;

pub use token_store::{KeyringTokenStore, MemoryTokenStore, TokenStore, open_token_store};
pub use tokens_file::FileTokenStore;
