//! Page logic for the post board: settings, the feed API seam and its HTTP
//! client, row sampling, row view-models, and the page controller.

pub mod api;
pub mod config;
pub mod error;
pub mod page;
pub mod row;
pub mod sampling;

pub use api::{FeedApi, HttpFeedClient};
pub use config::{load_settings, ClientSettings};
pub use error::FeedError;
pub use page::{DeleteOutcome, PageConfig, PageController, PageEvent, UpdateOutcome};
pub use row::{DeleteAffordance, Row, RowKey, UpdateAffordance, CONFIRMATION_LABEL};
