use tracing::debug;

use crate::{ChannelOutbound, Result};

/// Platform message-length ceiling, in characters.
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Attachment name used for replies too long to send inline.
pub const REPLY_FILENAME: &str = "response.txt";

/// Send a generated reply, inline when it fits and as a text file otherwise.
pub async fn deliver_reply(outbound: &dyn ChannelOutbound, to: &str, text: &str) -> Result<()> {
    let len = text.chars().count();
    if len >= MAX_MESSAGE_LEN {
        debug!(to, len, "reply over message limit, sending as file");
        outbound
            .send_file(to, REPLY_FILENAME, text.as_bytes().to_vec())
            .await
    } else {
        outbound.send_text(to, text).await
    }
}
