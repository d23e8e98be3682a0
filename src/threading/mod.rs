pub mod builder;
pub mod cache;
pub mod capability;
pub mod observer;
pub mod presentation;
pub mod sort;

pub use cache::ThreadCache;
pub use capability::ThreadingMode;
pub use observer::TracingObserver;
pub use presentation::PresentationHints;
pub use sort::{SortStrategy, sort_roots};
