/// Middleware module
///
/// Custom middleware for request accounting.

mod hit_counter;

pub use hit_counter::HitCounterMiddleware;
