//! Identifier and value types shared by the catalog and notification contracts.
//!
//! - [`AppId`] - Validated, opaque marketplace app id
//! - [`AppStatus`] - Runtime status of an installed app
//!
//! # Example
//!
//! ```rust
//! use marketview_client::types::{AppId, AppStatus};
//!
//! let id = AppId::new("giphy").expect("valid id");
//! let status = AppStatus::new("auto_enabled");
//!
//! assert_eq!(id.as_str(), "giphy");
//! assert!(status.is_enabled());
//! ```

mod app_id;
mod app_status;

pub use app_id::{AppId, InvalidAppId};
pub use app_status::AppStatus;
