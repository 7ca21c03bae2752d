//! Transport seam - the opaque collaborator that owns the wire
//!
//! The broadcaster never touches sockets. It asks a `Transport` to open a
//! named, parameterized channel and hands it connect/disconnect/message
//! handlers. Reconnection policy belongs to the transport, not this crate.

use std::fmt;
use std::sync::Arc;

use skirmish_core::{CampaignId, PushMessage, SkirmishResult, UserId};
use tokio::sync::mpsc;

/// Named channel topics the core subscribes to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Session-scoped channel: all updates within one campaign
    Campaign(CampaignId),
    /// Identity-scoped channel: cross-campaign notices for one user
    User(UserId),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Campaign(id) => write!(f, "campaign:{id}"),
            Topic::User(id) => write!(f, "user:{id}"),
        }
    }
}

/// Handlers attached to an open channel. All run on the transport's
/// delivery turns and must not block.
pub struct ChannelHandlers {
    pub on_connect: Option<Box<dyn Fn() + Send + Sync>>,
    pub on_disconnect: Option<Box<dyn Fn() + Send + Sync>>,
    pub on_message: Box<dyn Fn(PushMessage) + Send + Sync>,
}

impl ChannelHandlers {
    pub fn on_message(handler: impl Fn(PushMessage) + Send + Sync + 'static) -> Self {
        ChannelHandlers {
            on_connect: None,
            on_disconnect: None,
            on_message: Box::new(handler),
        }
    }
}

/// Handle to one open channel; closing is deterministic and idempotent.
pub trait ChannelHandle: Send + Sync {
    fn close(&self);
}

/// The opaque transport collaborator.
pub trait Transport: Send + Sync {
    /// Open a named channel and register its handlers. A connect failure is
    /// a transport error; it is logged by the caller and left to the
    /// transport's own retry policy.
    fn open(&self, topic: Topic, handlers: ChannelHandlers) -> SkirmishResult<Box<dyn ChannelHandle>>;
}

/// Push sender half for transports that deliver from a background task
pub type PushSender = mpsc::Sender<PushMessage>;

/// Push receiver half for transports that deliver from a background task
pub type PushReceiver = mpsc::Receiver<PushMessage>;

/// Forward messages from a transport-owned receive queue into a dispatcher.
/// The loop ends when the sender side is dropped.
pub fn start_dispatch_loop(
    dispatcher: Arc<crate::Dispatcher>,
    mut rx: PushReceiver,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            dispatcher.receive(message);
        }
        tracing::debug!("push dispatch loop ended");
    })
}
