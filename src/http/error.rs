use thiserror::Error;

use crate::http::parser::ParseError;

/// Why a connection handler gave up on its connection.
///
/// Would-block is not an error: it becomes `Poll::Pending`.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("peer closed the connection")]
    PeerClosed,
    #[error("socket accepted zero bytes")]
    WriteZero,
    #[error("request headers exceed {limit} bytes")]
    HeadersTooLarge { limit: usize },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Parse(#[from] ParseError),
}
