//! Channel lifecycle - campaign-scoped and user-scoped channels
//!
//! The campaign channel is open only while all of its preconditions hold:
//! an identity is known, a campaign is selected, the campaign is not the
//! placeholder, and the consumer is not mid-initial-load (subscribing
//! against a stale cached campaign before the authoritative one is
//! confirmed would route updates to the wrong scope). The user channel only
//! needs a known identity.

use std::sync::Arc;

use parking_lot::Mutex;
use skirmish_core::{CampaignId, PushPayload, UserId};

use crate::{ChannelHandle, ChannelHandlers, Dispatcher, Subscription, Topic, Transport};

/// Inputs the campaign channel lifecycle is reconciled against
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelState {
    pub identity: Option<UserId>,
    pub campaign: Option<CampaignId>,
    /// True while the authoritative campaign is still being confirmed
    pub loading: bool,
}

impl ChannelState {
    /// The campaign a channel should be open against, if any.
    fn desired_campaign(&self) -> Option<CampaignId> {
        if self.identity.is_none() || self.loading {
            return None;
        }
        self.campaign.filter(|c| !c.is_placeholder())
    }
}

/// Session-scoped channel: one per selected campaign, torn down and
/// re-established whenever the lifecycle preconditions change.
pub struct CampaignChannel<T: Transport> {
    transport: Arc<T>,
    dispatcher: Arc<Dispatcher>,
    open: Mutex<Option<(CampaignId, Box<dyn ChannelHandle>)>>,
}

impl<T: Transport> CampaignChannel<T> {
    pub fn new(transport: Arc<T>, dispatcher: Arc<Dispatcher>) -> Self {
        CampaignChannel {
            transport,
            dispatcher,
            open: Mutex::new(None),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Register interest in an entity-type key on this channel's scope.
    pub fn subscribe(
        &self,
        entity_key: impl Into<String>,
        callback: impl Fn(&PushPayload) + Send + Sync + 'static,
    ) -> Subscription {
        self.dispatcher.subscribe(entity_key, callback)
    }

    /// Bring the channel in line with the current lifecycle inputs:
    /// close when any precondition stops holding, switch scopes by closing
    /// the old channel before opening the new one, and do nothing when the
    /// open channel already matches.
    pub fn reconcile(&self, state: &ChannelState) {
        let desired = state.desired_campaign();
        let mut open = self.open.lock();

        if open.as_ref().map(|(id, _)| *id) == desired {
            return;
        }

        if let Some((id, handle)) = open.take() {
            tracing::debug!(campaign = %id, "closing campaign channel");
            handle.close();
        }

        let Some(campaign) = desired else {
            return;
        };

        let dispatcher = Arc::clone(&self.dispatcher);
        let handlers = ChannelHandlers {
            on_connect: Some(Box::new(move || {
                tracing::debug!(campaign = %campaign, "campaign channel connected");
            })),
            on_disconnect: Some(Box::new(move || {
                tracing::debug!(campaign = %campaign, "campaign channel disconnected");
            })),
            on_message: Box::new(move |message| dispatcher.receive(message)),
        };

        match self.transport.open(Topic::Campaign(campaign), handlers) {
            Ok(handle) => {
                *open = Some((campaign, handle));
            }
            Err(e) => {
                // Left to the transport's retry policy; not surfaced to
                // subscribers as a hard error.
                tracing::warn!(campaign = %campaign, error = %e, "campaign channel open failed");
            }
        }
    }

    /// The campaign the channel is currently open against.
    pub fn open_campaign(&self) -> Option<CampaignId> {
        self.open.lock().as_ref().map(|(id, _)| *id)
    }

    /// Tear the channel down unconditionally.
    pub fn close(&self) {
        if let Some((id, handle)) = self.open.lock().take() {
            tracing::debug!(campaign = %id, "closing campaign channel");
            handle.close();
        }
    }
}

/// Identity-scoped channel: open whenever an identity is known, independent
/// of campaign selection. Carries cross-campaign notices and user-directed
/// notifications.
pub struct UserChannel<T: Transport> {
    transport: Arc<T>,
    dispatcher: Arc<Dispatcher>,
    open: Mutex<Option<(UserId, Box<dyn ChannelHandle>)>>,
}

impl<T: Transport> UserChannel<T> {
    pub fn new(transport: Arc<T>, dispatcher: Arc<Dispatcher>) -> Self {
        UserChannel {
            transport,
            dispatcher,
            open: Mutex::new(None),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Register interest in cross-campaign entity updates.
    pub fn subscribe(
        &self,
        entity_key: impl Into<String>,
        callback: impl Fn(&PushPayload) + Send + Sync + 'static,
    ) -> Subscription {
        self.dispatcher.subscribe(entity_key, callback)
    }

    /// Register interest in user-directed notifications.
    pub fn subscribe_notifications(
        &self,
        callback: impl Fn(&PushPayload) + Send + Sync + 'static,
    ) -> Subscription {
        self.dispatcher.subscribe_notifications(callback)
    }

    /// Open or close the channel to match the known identity.
    pub fn reconcile(&self, identity: Option<UserId>) {
        let mut open = self.open.lock();

        if open.as_ref().map(|(id, _)| *id) == identity {
            return;
        }

        if let Some((id, handle)) = open.take() {
            tracing::debug!(user = %id, "closing user channel");
            handle.close();
        }

        let Some(user) = identity else {
            return;
        };

        let dispatcher = Arc::clone(&self.dispatcher);
        let handlers = ChannelHandlers {
            on_connect: Some(Box::new(move || {
                tracing::debug!(user = %user, "user channel connected");
            })),
            on_disconnect: Some(Box::new(move || {
                tracing::debug!(user = %user, "user channel disconnected");
            })),
            on_message: Box::new(move |message| dispatcher.receive(message)),
        };

        match self.transport.open(Topic::User(user), handlers) {
            Ok(handle) => {
                *open = Some((user, handle));
            }
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "user channel open failed");
            }
        }
    }

    pub fn open_user(&self) -> Option<UserId> {
        self.open.lock().as_ref().map(|(id, _)| *id)
    }

    pub fn close(&self) {
        if let Some((id, handle)) = self.open.lock().take() {
            tracing::debug!(user = %id, "closing user channel");
            handle.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skirmish_core::{PushPayload, SkirmishError, SkirmishResult, ENTITY_FIGHT};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Records open/close order and keeps the handlers so tests can inject
    /// inbound messages.
    #[derive(Default)]
    struct MockTransport {
        log: Arc<Mutex<Vec<String>>>,
        handlers: Mutex<Vec<(Topic, Arc<ChannelHandlers>)>>,
        fail_next: AtomicBool,
    }

    struct MockHandle {
        topic: Topic,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ChannelHandle for MockHandle {
        fn close(&self) {
            self.log.lock().push(format!("close {}", self.topic));
        }
    }

    impl Transport for MockTransport {
        fn open(
            &self,
            topic: Topic,
            handlers: ChannelHandlers,
        ) -> SkirmishResult<Box<dyn ChannelHandle>> {
            if self.fail_next.swap(false, Ordering::AcqRel) {
                return Err(SkirmishError::Transport("connect refused".into()));
            }
            self.log.lock().push(format!("open {topic}"));
            self.handlers.lock().push((topic, Arc::new(handlers)));
            Ok(Box::new(MockHandle {
                topic,
                log: Arc::clone(&self.log),
            }))
        }
    }

    impl MockTransport {
        fn log(&self) -> Vec<String> {
            self.log.lock().clone()
        }

        /// Inject an inbound message on the most recently opened channel.
        fn push(&self, message: skirmish_core::PushMessage) {
            let handlers = self.handlers.lock();
            let (_, h) = handlers.last().expect("no channel open");
            (h.on_message)(message);
        }
    }

    fn state(identity: Option<u64>, campaign: Option<u64>, loading: bool) -> ChannelState {
        ChannelState {
            identity: identity.map(UserId::new),
            campaign: campaign.map(CampaignId::new),
            loading,
        }
    }

    fn campaign_channel() -> (Arc<MockTransport>, CampaignChannel<MockTransport>) {
        let transport = Arc::new(MockTransport::default());
        let channel = CampaignChannel::new(Arc::clone(&transport), Arc::new(Dispatcher::new()));
        (transport, channel)
    }

    #[test]
    fn test_channel_opens_only_when_all_preconditions_hold() {
        let (transport, channel) = campaign_channel();

        channel.reconcile(&state(None, Some(5), false));
        channel.reconcile(&state(Some(1), None, false));
        channel.reconcile(&state(Some(1), Some(0), false)); // placeholder
        channel.reconcile(&state(Some(1), Some(5), true)); // mid-initial-load
        assert_eq!(channel.open_campaign(), None);
        assert!(transport.log().is_empty());

        channel.reconcile(&state(Some(1), Some(5), false));
        assert_eq!(channel.open_campaign(), Some(CampaignId::new(5)));
        assert_eq!(transport.log(), vec!["open campaign:5"]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let (transport, channel) = campaign_channel();
        let s = state(Some(1), Some(5), false);

        channel.reconcile(&s);
        channel.reconcile(&s);
        channel.reconcile(&s);

        assert_eq!(transport.log(), vec!["open campaign:5"]);
    }

    #[test]
    fn test_switching_campaigns_closes_before_opening() {
        let (transport, channel) = campaign_channel();

        channel.reconcile(&state(Some(1), Some(5), false));
        channel.reconcile(&state(Some(1), Some(9), false));

        assert_eq!(
            transport.log(),
            vec!["open campaign:5", "close campaign:5", "open campaign:9"]
        );
        assert_eq!(channel.open_campaign(), Some(CampaignId::new(9)));
    }

    #[test]
    fn test_losing_identity_tears_down() {
        let (transport, channel) = campaign_channel();

        channel.reconcile(&state(Some(1), Some(5), false));
        channel.reconcile(&state(None, Some(5), false));

        assert_eq!(channel.open_campaign(), None);
        assert_eq!(transport.log(), vec!["open campaign:5", "close campaign:5"]);
    }

    #[test]
    fn test_open_failure_is_not_fatal() {
        let (transport, channel) = campaign_channel();
        transport.fail_next.store(true, Ordering::Release);

        channel.reconcile(&state(Some(1), Some(5), false));
        assert_eq!(channel.open_campaign(), None);

        // A later reconcile gets to try again.
        channel.reconcile(&state(Some(1), Some(5), false));
        assert_eq!(channel.open_campaign(), Some(CampaignId::new(5)));
    }

    #[test]
    fn test_inbound_messages_reach_subscribers() {
        let (transport, channel) = campaign_channel();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        let _sub = channel.subscribe(ENTITY_FIGHT, move |_| {
            h.fetch_add(1, Ordering::Relaxed);
        });

        channel.reconcile(&state(Some(1), Some(5), false));

        let mut msg = skirmish_core::PushMessage::new();
        msg.insert(ENTITY_FIGHT, PushPayload::Entity(json!({"id": 3})));
        transport.push(msg);

        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_user_channel_needs_identity_only() {
        let transport = Arc::new(MockTransport::default());
        let channel = UserChannel::new(Arc::clone(&transport), Arc::new(Dispatcher::new()));

        channel.reconcile(None);
        assert_eq!(channel.open_user(), None);

        channel.reconcile(Some(UserId::new(7)));
        assert_eq!(channel.open_user(), Some(UserId::new(7)));
        assert_eq!(transport.log(), vec!["open user:7"]);

        channel.reconcile(None);
        assert_eq!(channel.open_user(), None);
    }

    #[test]
    fn test_user_channel_notification_routing() {
        let transport = Arc::new(MockTransport::default());
        let channel = UserChannel::new(Arc::clone(&transport), Arc::new(Dispatcher::new()));

        let notified = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&notified);
        let _sub = channel.subscribe_notifications(move |_| {
            n.fetch_add(1, Ordering::Relaxed);
        });

        channel.reconcile(Some(UserId::new(7)));

        let mut msg = skirmish_core::PushMessage::new();
        msg.insert(
            skirmish_core::ENTITY_NOTIFICATION,
            PushPayload::Entity(json!({"title": "membership changed"})),
        );
        transport.push(msg);

        assert_eq!(notified.load(Ordering::Relaxed), 1);
    }
}
