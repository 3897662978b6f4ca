mod documents;
mod error;
mod extract;
mod handlers;
mod helpers;
mod router;
mod types;

pub use error::{HandlerErr, Notice, NoticeKind, Reply};
pub use router::create_router;
pub use types::AppState;
