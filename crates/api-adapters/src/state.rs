//! Shared handler state: the assembled services plus the identity-side
//! collaborators the auth endpoints need directly.

use std::sync::Arc;

use auth_adapters::OtpStore;
use domains::{BlobStore, CredentialService, Notifier, UserRepo};
use services::{
    AccountService, CommentService, EngagementService, NoticeService, NotificationService,
};

#[derive(Clone)]
pub struct AppState {
    pub notices: Arc<NoticeService>,
    pub accounts: Arc<AccountService>,
    pub comments: Arc<CommentService>,
    pub engagement: Arc<EngagementService>,
    pub notifications: Arc<NotificationService>,
    pub users: Arc<dyn UserRepo>,
    pub credentials: Arc<dyn CredentialService>,
    pub blobs: Arc<dyn BlobStore>,
    pub otp: Arc<OtpStore>,
    pub mailer: Arc<dyn Notifier>,
}
