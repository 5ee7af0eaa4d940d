//! Log-only outbound mail. The deployment hooks a real provider in by
//! swapping this adapter; nothing in the core knows the difference.

use async_trait::async_trait;

use domains::{Notifier, Result};

#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_otp(&self, email: &str, code: &str) -> Result<()> {
        tracing::info!(%email, %code, "verification code issued");
        Ok(())
    }

    async fn send(&self, subject: &str, body: &str, to: &str) -> Result<()> {
        tracing::info!(%to, %subject, %body, "outbound mail");
        Ok(())
    }
}
