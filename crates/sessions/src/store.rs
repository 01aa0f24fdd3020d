use std::{
    collections::{HashMap, VecDeque},
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard},
};

use {shion_common::Content, tracing::trace};

use crate::entry::ConversationEntry;

/// Bounded per-channel conversation windows.
///
/// The map is guarded by a `std::sync::Mutex`: every operation is a short
/// in-memory update and the lock is never held across an `.await`. Callers
/// that interleave I/O between operations on the same channel must serialize
/// those channels themselves.
pub struct HistoryStore {
    max_len: NonZeroUsize,
    channels: Mutex<HashMap<String, VecDeque<ConversationEntry>>>,
}

impl HistoryStore {
    pub fn new(max_len: NonZeroUsize) -> Self {
        Self {
            max_len,
            channels: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len.get()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<ConversationEntry>>> {
        self.channels.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append `entry` to the channel's window.
    ///
    /// When the window is already full the oldest entry is removed and
    /// returned; otherwise `None`. Existing entries keep their order.
    pub fn put(&self, channel_id: &str, entry: ConversationEntry) -> Option<ConversationEntry> {
        let mut channels = self.lock();
        let window = channels
            .entry(channel_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.max_len.get()));

        let evicted = if window.len() >= self.max_len.get() {
            window.pop_front()
        } else {
            None
        };
        window.push_back(entry);

        trace!(
            channel_id,
            len = window.len(),
            evicted = evicted.is_some(),
            "history put"
        );
        evicted
    }

    /// Role + parts of every stored entry, oldest first. Empty for channels
    /// that have never been written.
    pub fn history_for(&self, channel_id: &str) -> Vec<Content> {
        self.lock()
            .get(channel_id)
            .map(|window| window.iter().map(ConversationEntry::content).collect())
            .unwrap_or_default()
    }

    /// Number of entries stored for a channel.
    pub fn len(&self, channel_id: &str) -> usize {
        self.lock().get(channel_id).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, channel_id: &str) -> bool {
        self.len(channel_id) == 0
    }

    /// Number of channels seen so far.
    pub fn channel_count(&self) -> usize {
        self.lock().len()
    }
}
