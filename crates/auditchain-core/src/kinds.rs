//! Event kinds used by the document workflow.
//!
//! The vocabulary is open: [`EventInput`](crate::EventInput) accepts any
//! string. These constants exist so collaborators spell the common ones the
//! same way.

pub const SESSION_STARTED: &str = "session_started";
pub const USER_LOGIN: &str = "user_login";
pub const USER_LOGOUT: &str = "user_logout";
pub const USER_SWITCHED: &str = "user_switched";
pub const PAGE_VISITED: &str = "page_visited";

pub const UPLOAD_STARTED: &str = "upload_started";
pub const UPLOAD_COMPLETED: &str = "upload_completed";

pub const PROFILE_SELECTED: &str = "profile_selected";
pub const PROFILE_CREATED: &str = "profile_created";
pub const PROFILE_UPDATED: &str = "profile_updated";
pub const PROFILE_DELETED: &str = "profile_deleted";

pub const MASKING_REQUESTED: &str = "masking_requested";
pub const MASKING_SUCCEEDED: &str = "masking_succeeded";
pub const ITEM_OVERRIDDEN: &str = "item_overridden";
pub const BATCH_ACTION: &str = "batch_action";

pub const DOWNLOAD_REQUESTED: &str = "download_requested";
pub const DOWNLOAD_COMPLETED: &str = "download_completed";

pub const SETTINGS_CHANGED: &str = "settings_changed";
