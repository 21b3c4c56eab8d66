mod range;
mod router;

pub use range::{RangeRequest, RangeResponse, serve_range};
pub use router::{ServerState, router, serve, serve_blocking};
