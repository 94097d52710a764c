//! Console channel printing reports to stdout

use crate::delivery::{DeliveryChannel, MessageId};
use crate::error::DeliveryError;
use crate::lookup::ReportStyle;
use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

/// Channel for the `check` subcommand
///
/// Placeholders are not printed; replacing one prints the report.
#[derive(Debug, Default)]
pub struct ConsoleChannel {
    next_id: AtomicI64,
}

impl ConsoleChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> MessageId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn print(&self, text: &str) -> Result<(), DeliveryError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", text.trim_end())?;
        stdout.flush()?;
        Ok(())
    }
}

#[async_trait]
impl DeliveryChannel for ConsoleChannel {
    async fn send(&self, text: &str) -> Result<MessageId, DeliveryError> {
        self.print(text)?;
        Ok(self.next_id())
    }

    async fn replace(&self, message: MessageId, text: &str) -> Result<(), DeliveryError> {
        debug!(message, "printing batch report");
        self.print(text)
    }

    async fn post_placeholder(&self) -> Result<MessageId, DeliveryError> {
        Ok(self.next_id())
    }

    fn report_style(&self) -> ReportStyle {
        ReportStyle::Plain
    }
}
