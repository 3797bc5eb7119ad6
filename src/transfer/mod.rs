//! File hand-off to the requesting channel.
//!
//! [`FileSender::prepare`] resolves a path, checks that it names a readable
//! regular file and opens it. The caller owns the returned [`PreparedFile`]
//! and streams it onward in chunks; nothing is read into memory up front.

mod path;
mod sender;

pub use path::{expand_tilde, normalize_lexically, resolve};
pub use sender::{
    FileSendRequest, FileSendResult, FileSender, FileSenderConfig, PreparedFile,
    DEFAULT_CHUNK_SIZE,
};
