// ABOUTME: In-memory chat relay with capped history and non-blocking broadcast
// ABOUTME: Tracks connected sessions and emits system join/leave messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Relay MCP Server Contributors

//! In-memory chat relay shared by the chat tools.
//!
//! History is capped at [`MAX_HISTORY`] messages. Broadcasts never
//! block: each connection has a small buffered channel and slow or gone
//! consumers simply miss messages. A session stays listed as active
//! until it is unregistered or goes idle for [`SESSION_IDLE_SECS`];
//! idle sessions are evicted with the same leave notice.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::{mpsc, RwLock};

/// Maximum number of messages retained in history
pub const MAX_HISTORY: usize = 100;

/// Per-connection broadcast buffer depth
const CHANNEL_CAPACITY: usize = 10;

/// Sender name used for join/leave notices
pub const SYSTEM_SENDER: &str = "System";

/// Sessions without traffic for this long are considered gone
pub const SESSION_IDLE_SECS: i64 = 300;

/// A relayed chat message
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Message id, `msg_{unix_nanos}`
    pub id: String,
    /// Sender display name (GitHub login or `System`)
    pub sender: String,
    /// Message body
    pub message: String,
    /// Send time
    pub timestamp: DateTime<Utc>,
}

struct Connection {
    github_login: String,
    sender: mpsc::Sender<ChatMessage>,
    last_seen: DateTime<Utc>,
}

/// The shared relay
#[derive(Default)]
pub struct ChatRelay {
    connections: DashMap<String, Connection>,
    history: RwLock<VecDeque<ChatMessage>>,
}

impl ChatRelay {
    /// Create an empty relay
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and announce the join. Returns the receiver
    /// for messages broadcast while the session stays registered.
    pub async fn register(
        &self,
        session_id: &str,
        github_login: &str,
    ) -> mpsc::Receiver<ChatMessage> {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let replaced = self
            .connections
            .insert(
                session_id.to_owned(),
                Connection {
                    github_login: github_login.to_owned(),
                    sender,
                    last_seen: Utc::now(),
                },
            )
            .is_some();
        // Re-initializing an existing session is not a new arrival
        if !replaced {
            tracing::debug!(session_id = %session_id, github_login = %github_login, "chat session joined");
            self.broadcast(SYSTEM_SENDER, &format!("{github_login} joined the chat"))
                .await;
        }
        receiver
    }

    /// Remove a session and announce the leave
    pub async fn unregister(&self, session_id: &str) {
        if let Some((_, connection)) = self.connections.remove(session_id) {
            tracing::debug!(session_id = %session_id, "chat session left");
            self.broadcast(
                SYSTEM_SENDER,
                &format!("{} left the chat", connection.github_login),
            )
            .await;
        }
    }

    /// Record activity for a session, deferring its idle eviction
    pub fn touch(&self, session_id: &str) {
        if let Some(mut connection) = self.connections.get_mut(session_id) {
            connection.last_seen = Utc::now();
        }
    }

    /// Drop sessions idle longer than [`SESSION_IDLE_SECS`], announcing
    /// each leave
    pub async fn evict_idle(&self) {
        let cutoff = Utc::now() - Duration::seconds(SESSION_IDLE_SECS);
        let stale: Vec<String> = self
            .connections
            .iter()
            .filter(|entry| entry.last_seen < cutoff)
            .map(|entry| entry.key().clone())
            .collect();
        for session_id in stale {
            self.unregister(&session_id).await;
        }
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, session_id: &str, seconds: i64) {
        if let Some(mut connection) = self.connections.get_mut(session_id) {
            connection.last_seen = Utc::now() - Duration::seconds(seconds);
        }
    }

    /// Append to history and fan out to all connections without blocking
    pub async fn broadcast(&self, sender: &str, message: &str) -> ChatMessage {
        let now = Utc::now();
        let nanos = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros());
        let chat_message = ChatMessage {
            id: format!("msg_{nanos}"),
            sender: sender.to_owned(),
            message: message.to_owned(),
            timestamp: now,
        };

        {
            let mut history = self.history.write().await;
            history.push_back(chat_message.clone());
            while history.len() > MAX_HISTORY {
                history.pop_front();
            }
        }

        // Session liveness is tracked by register/unregister; a full or
        // closed buffer only drops this message for that connection.
        for connection in &self.connections {
            let _ = connection.sender.try_send(chat_message.clone());
        }

        chat_message
    }

    /// Most recent `limit` messages, oldest first
    pub async fn history(&self, limit: usize) -> Vec<ChatMessage> {
        let history = self.history.read().await;
        let skip = history.len().saturating_sub(limit);
        history.iter().skip(skip).cloned().collect()
    }

    /// Logins of currently connected sessions
    #[must_use]
    pub fn active_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self
            .connections
            .iter()
            .map(|entry| entry.github_login.clone())
            .collect();
        users.sort();
        users.dedup();
        users
    }
}
