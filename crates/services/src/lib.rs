//! # services
//!
//! The core application logic of Campus-Board: the visibility resolver,
//! the comment/reply tree manager, engagement counters, the notification
//! emitter and feed, and the notice lifecycle. Everything here talks to
//! the outside world exclusively through the port traits in `domains`.

pub mod accounts;
pub mod comments;
pub mod engagement;
pub mod notices;
pub mod notifications;
pub mod timefmt;
pub mod views;
pub mod visibility;

pub use accounts::AccountService;
pub use comments::CommentService;
pub use engagement::EngagementService;
pub use notices::NoticeService;
pub use notifications::{NotificationEmitter, NotificationService};
