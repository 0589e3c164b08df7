//! Target-aware share dispatch.
//!
//! [`ShareCoordinator`] owns the lifecycle of one share invocation at a time:
//! it assembles payload items, presents the chooser through a platform
//! [`ShareSurface`], resolves items per selected target, and intercepts the
//! synthetic WhatsApp entry to open a deep link instead of performing the
//! generic hand-off. All per-invocation state lives in a [`ShareSession`]
//! keyed by id, so callbacks from a superseded presentation are ignored
//! instead of contaminating a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;
use crate::exclusions::ExclusionSet;
use crate::models::{AnchorHint, ShareItem, ShareRequest, TargetDescriptor};
use crate::scheme;

/// How a staged file item is delivered to the synthetic WhatsApp target.
///
/// WhatsApp cannot receive text and a file through one hand-off, and its
/// deep link only carries text. The two observed behaviors are both
/// supported; hosts pick one at plugin init.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyntheticFilePolicy {
    /// The file is dropped from WhatsApp's view of the share whenever text
    /// is also staged; a file-only share opens the bare deep link.
    #[default]
    Drop,
    /// The file is copied to the pasteboard before the deep link opens, so
    /// the user can paste it into the conversation.
    PasteboardFallback,
}

/// Lifecycle of one share invocation. Terminal state is reached exactly
/// once, whether the user picks a target, cancels, or presentation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Assembling,
    Presenting,
    AwaitingSelection,
    Resolving,
    Invoking,
    Completed,
}

/// Value a [`ShareItem`] resolves to for a particular target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ResolvedItem {
    Text(String),
    FilePath(String),
    /// File delivered via pasteboard copy rather than direct hand-off.
    PasteboardFile(String),
}

/// Instruction handed back to the platform layer after target selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum Delivery {
    /// Synthetic target: open the deep link directly, optionally copying a
    /// file to the pasteboard first. The generic hand-off is bypassed.
    #[serde(rename_all = "camelCase")]
    DeepLink {
        url: String,
        pasteboard_file: Option<String>,
    },
    /// Ordinary target: the OS performs the hand-off with these values.
    #[serde(rename_all = "camelCase")]
    Generic { items: Vec<ResolvedItem> },
}

/// Everything the native chooser needs to present one share invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChooserPresentation {
    pub session_id: u64,
    pub items: Vec<ShareItem>,
    /// Preview values shown before a target is picked.
    pub placeholders: Vec<String>,
    pub excluded_activity_types: Vec<String>,
    /// Offered targets, synthetic WhatsApp entry included.
    pub targets: Vec<TargetDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<AnchorHint>,
}

/// Result of asking the surface to put the chooser on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// Chooser is up; selection/completion callbacks will follow.
    Initiated,
    /// No chooser exists on this platform; the session ends immediately.
    Unavailable,
}

/// Platform bindings the dispatcher is written against.
///
/// Implementations must marshal `present` onto the UI-owning context
/// themselves; the dispatcher only guarantees ordering, not threading.
/// `can_open_url` is a capability probe and must not open anything.
pub trait ShareSurface: Send + Sync {
    fn can_open_url(&self, url: &Url) -> bool;
    /// Fire-and-forget: a declined open is terminal for the attempt and is
    /// not reported back.
    fn open_url(&self, url: &Url);
    fn registered_targets(&self) -> Vec<TargetDescriptor>;
    fn present(&self, chooser: ChooserPresentation) -> PresentOutcome;
    /// Tear down the presentation anchor after the completion callback.
    fn dismiss(&self);
    /// Popover anchor for tablet-class layouts, if the platform wants one.
    fn anchor_hint(&self) -> Option<AnchorHint> {
        None
    }
}

/// Per-invocation state. Created at assembly, discarded at completion;
/// nothing outlives the call except the constant exclusion set.
#[derive(Debug)]
pub struct ShareSession {
    id: u64,
    items: Vec<ShareItem>,
    policy: SyntheticFilePolicy,
    phase: Phase,
}

impl ShareSession {
    fn new(id: u64, request: &ShareRequest, policy: SyntheticFilePolicy) -> Self {
        Self {
            id,
            items: request.items(),
            policy,
            phase: Phase::Assembling,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn items(&self) -> &[ShareItem] {
        &self.items
    }

    fn has_text(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, ShareItem::Text(_)))
    }

    /// Build the offered-target list: platform-registered targets minus the
    /// exclusion set, with the synthetic WhatsApp entry appended as a
    /// first-class participant.
    fn offered_targets(&mut self, registered: Vec<TargetDescriptor>) -> Vec<TargetDescriptor> {
        let mut offered = ExclusionSet::filter(registered);
        offered.push(scheme::synthetic_target());
        self.phase = Phase::Presenting;
        offered
    }

    fn begin_presentation(&mut self) {
        self.phase = Phase::AwaitingSelection;
    }

    /// Resolve one staged item for one target, evaluated independently per
    /// item. Ordinary targets get the natural value unconditionally; the
    /// synthetic target applies the file policy.
    pub fn resolve(&self, item: &ShareItem, target_id: &str) -> Option<ResolvedItem> {
        if target_id != scheme::TARGET_ID {
            return Some(match item {
                ShareItem::Text(text) => ResolvedItem::Text(text.clone()),
                ShareItem::File(path) => ResolvedItem::FilePath(path.clone()),
            });
        }
        match item {
            ShareItem::Text(text) => Some(ResolvedItem::Text(text.clone())),
            ShareItem::File(path) => match self.policy {
                SyntheticFilePolicy::PasteboardFallback => {
                    Some(ResolvedItem::PasteboardFile(path.clone()))
                }
                // WhatsApp cannot take both; when text is staged the file
                // yields no value for this target. A file-only share still
                // resolves the file, though the deep link cannot carry it.
                SyntheticFilePolicy::Drop => {
                    if self.has_text() {
                        None
                    } else {
                        Some(ResolvedItem::FilePath(path.clone()))
                    }
                }
            },
        }
    }

    /// A target was selected: resolve every staged item for it and produce
    /// the delivery instruction. Valid only while awaiting selection.
    fn select(&mut self, target_id: &str) -> Result<Delivery> {
        self.phase = Phase::Resolving;
        let resolved: Vec<ResolvedItem> = self
            .items
            .iter()
            .filter_map(|item| self.resolve(item, target_id))
            .collect();

        let delivery = if target_id == scheme::TARGET_ID {
            let text = resolved.iter().find_map(|r| match r {
                ResolvedItem::Text(text) => Some(text.as_str()),
                _ => None,
            });
            let pasteboard_file = resolved.iter().find_map(|r| match r {
                ResolvedItem::PasteboardFile(path) => Some(path.clone()),
                _ => None,
            });
            let url = scheme::send_url(text)?;
            Delivery::DeepLink {
                url: url.into(),
                pasteboard_file,
            }
        } else {
            Delivery::Generic { items: resolved }
        };

        self.phase = Phase::Invoking;
        Ok(delivery)
    }

    fn complete(&mut self) {
        self.phase = Phase::Completed;
    }
}

/// The coordinator backing the `installed` and `share` commands.
pub struct ShareCoordinator<S: ShareSurface> {
    surface: S,
    policy: SyntheticFilePolicy,
    next_id: AtomicU64,
    active: Mutex<Option<ShareSession>>,
}

impl<S: ShareSurface> ShareCoordinator<S> {
    pub fn new(surface: S, policy: SyntheticFilePolicy) -> Self {
        Self {
            surface,
            policy,
            next_id: AtomicU64::new(1),
            active: Mutex::new(None),
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<ShareSession>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Probe whether the messaging app is installed, without opening it.
    pub fn installed(&self) -> Result<bool> {
        let url = scheme::probe_url()?;
        Ok(self.surface.can_open_url(&url))
    }

    /// Start a share flow from a loose argument bag.
    ///
    /// Returns as soon as presentation has been initiated; cancellation and
    /// per-target hand-off failures are never surfaced to the caller. Only
    /// malformed arguments produce an error.
    pub fn share(&self, args: &serde_json::Value) -> Result<()> {
        let request = ShareRequest::from_args(args)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut session = ShareSession::new(id, &request, self.policy);

        let targets = session.offered_targets(self.surface.registered_targets());
        let chooser = ChooserPresentation {
            session_id: id,
            placeholders: session
                .items()
                .iter()
                .map(|item| item.placeholder().to_owned())
                .collect(),
            items: session.items().to_vec(),
            excluded_activity_types: ExclusionSet::identifiers().map(str::to_owned).collect(),
            targets,
            anchor: self.surface.anchor_hint(),
        };
        session.begin_presentation();

        let superseded = {
            let mut active = self.active();
            let stale = active.take();
            *active = Some(session);
            stale
        };
        if let Some(mut stale) = superseded {
            // A new invocation supersedes an unfinished one: finish it and
            // tear down its chooser now, since its own completion callback
            // will no longer match the slot. Late callbacks get dropped.
            log::debug!("superseding unfinished share session {}", stale.id());
            stale.complete();
            self.surface.dismiss();
        }

        log::info!("presenting share chooser (session {id})");
        match self.surface.present(chooser) {
            PresentOutcome::Initiated => {}
            PresentOutcome::Unavailable => {
                log::info!("share chooser unavailable on this platform (session {id})");
                self.finish(id);
            }
        }
        Ok(())
    }

    /// Callback from the platform layer: the user picked a target. Returns
    /// the delivery instruction, or `None` when the callback refers to a
    /// superseded or already-finished session.
    pub fn target_selected(&self, session_id: u64, target_id: &str) -> Result<Option<Delivery>> {
        let delivery = {
            let mut active = self.active();
            let session = match active.as_mut() {
                Some(session)
                    if session.id() == session_id
                        && session.phase() == Phase::AwaitingSelection =>
                {
                    session
                }
                _ => {
                    log::warn!("ignoring selection for stale share session {session_id}");
                    return Ok(None);
                }
            };
            session.select(target_id)?
        };

        if let Delivery::DeepLink { url, .. } = &delivery {
            log::info!("opening deep link for session {session_id}");
            match Url::parse(url) {
                Ok(url) => self.surface.open_url(&url),
                Err(e) => {
                    // Unreachable with a constant scheme; logged, not surfaced.
                    log::warn!("constructed deep link failed to re-parse: {e}");
                }
            }
        }
        Ok(Some(delivery))
    }

    /// Callback from the platform layer: the chooser finished, whether a
    /// target completed, failed, or the user cancelled with no selection.
    pub fn share_completed(&self, session_id: u64) {
        self.finish(session_id);
    }

    fn finish(&self, session_id: u64) {
        let mut active = self.active();
        match active.as_mut() {
            Some(session) if session.id() == session_id => {
                session.complete();
                *active = None;
            }
            _ => {
                log::debug!("completion for stale share session {session_id}");
                return;
            }
        }
        drop(active);
        self.surface.dismiss();
    }

    /// Phase of the in-flight session, if any. Diagnostic only.
    pub fn active_phase(&self) -> Option<Phase> {
        self.active().as_ref().map(ShareSession::phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TargetCategory;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, PartialEq)]
    enum SurfaceCall {
        CanOpenUrl(String),
        OpenUrl(String),
        Present(ChooserPresentation),
        Dismiss,
    }

    struct MockSurface {
        calls: StdMutex<Vec<SurfaceCall>>,
        scheme_openable: bool,
        registered: Vec<TargetDescriptor>,
        present_outcome: PresentOutcome,
    }

    impl MockSurface {
        fn new() -> Self {
            Self {
                calls: StdMutex::new(Vec::new()),
                scheme_openable: true,
                registered: Vec::new(),
                present_outcome: PresentOutcome::Initiated,
            }
        }

        fn calls(&self) -> Vec<SurfaceCall> {
            std::mem::take(&mut self.calls.lock().unwrap())
        }

        fn record(&self, call: SurfaceCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl ShareSurface for &MockSurface {
        fn can_open_url(&self, url: &Url) -> bool {
            self.record(SurfaceCall::CanOpenUrl(url.to_string()));
            self.scheme_openable
        }

        fn open_url(&self, url: &Url) {
            self.record(SurfaceCall::OpenUrl(url.to_string()));
        }

        fn registered_targets(&self) -> Vec<TargetDescriptor> {
            self.registered.clone()
        }

        fn present(&self, chooser: ChooserPresentation) -> PresentOutcome {
            self.record(SurfaceCall::Present(chooser));
            self.present_outcome
        }

        fn dismiss(&self) {
            self.record(SurfaceCall::Dismiss);
        }
    }

    fn target(id: &str) -> TargetDescriptor {
        TargetDescriptor {
            id: id.into(),
            display_name: id.into(),
            icon: None,
            category: TargetCategory::Share,
        }
    }

    fn presented(calls: &[SurfaceCall]) -> &ChooserPresentation {
        calls
            .iter()
            .find_map(|c| match c {
                SurfaceCall::Present(chooser) => Some(chooser),
                _ => None,
            })
            .expect("chooser was not presented")
    }

    #[test]
    fn installed_probes_the_reserved_scheme() {
        let surface = MockSurface::new();
        let coordinator = ShareCoordinator::new(&surface, SyntheticFilePolicy::default());
        assert!(coordinator.installed().unwrap());
        assert_eq!(
            surface.calls(),
            vec![SurfaceCall::CanOpenUrl("whatsapp://send?text=installed".into())]
        );
    }

    #[test]
    fn installed_is_false_when_scheme_is_not_openable() {
        let mut surface = MockSurface::new();
        surface.scheme_openable = false;
        let coordinator = ShareCoordinator::new(&surface, SyntheticFilePolicy::default());
        assert!(!coordinator.installed().unwrap());
    }

    #[test]
    fn chooser_offers_filtered_targets_plus_synthetic() {
        let mut surface = MockSurface::new();
        surface.registered = vec![
            target("com.example.SomeApp.Share"),
            target("com.apple.UIKit.activity.Mail"),
            target("com.tinyspeck.chatlyio.share"),
        ];
        let coordinator = ShareCoordinator::new(&surface, SyntheticFilePolicy::default());
        coordinator.share(&json!({ "text": "hi" })).unwrap();

        let calls = surface.calls();
        let chooser = presented(&calls);
        let ids: Vec<&str> = chooser.targets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["com.example.SomeApp.Share", scheme::TARGET_ID]
        );
        assert!(chooser
            .excluded_activity_types
            .contains(&"com.apple.UIKit.activity.AirDrop".to_owned()));
        assert_eq!(chooser.placeholders, vec!["hi"]);
    }

    #[test]
    fn synthetic_selection_with_text_and_file_opens_deep_link_and_drops_file() {
        let surface = MockSurface::new();
        let coordinator = ShareCoordinator::new(&surface, SyntheticFilePolicy::Drop);
        coordinator
            .share(&json!({ "text": "hello world", "file": "/tmp/pic.png" }))
            .unwrap();
        let session_id = presented(&surface.calls()).session_id;

        let delivery = coordinator
            .target_selected(session_id, scheme::TARGET_ID)
            .unwrap()
            .unwrap();
        assert_eq!(
            delivery,
            Delivery::DeepLink {
                url: "whatsapp://send?text=hello%20world".into(),
                pasteboard_file: None,
            }
        );
        assert_eq!(
            surface.calls(),
            vec![SurfaceCall::OpenUrl(
                "whatsapp://send?text=hello%20world".into()
            )]
        );
    }

    #[test]
    fn generic_selection_resolves_natural_values_without_open_url() {
        let surface = MockSurface::new();
        let coordinator = ShareCoordinator::new(&surface, SyntheticFilePolicy::Drop);
        coordinator
            .share(&json!({ "text": "hi", "file": "/tmp/pic.png" }))
            .unwrap();
        let session_id = presented(&surface.calls()).session_id;

        let delivery = coordinator
            .target_selected(session_id, "com.example.SomeApp.Share")
            .unwrap()
            .unwrap();
        assert_eq!(
            delivery,
            Delivery::Generic {
                items: vec![
                    ResolvedItem::Text("hi".into()),
                    ResolvedItem::FilePath("/tmp/pic.png".into()),
                ]
            }
        );
        assert!(surface.calls().is_empty());
    }

    #[test]
    fn file_only_share_opens_bare_deep_link_under_drop_policy() {
        let surface = MockSurface::new();
        let coordinator = ShareCoordinator::new(&surface, SyntheticFilePolicy::Drop);
        coordinator.share(&json!({ "file": "/tmp/pic.png" })).unwrap();
        let session_id = presented(&surface.calls()).session_id;

        let delivery = coordinator
            .target_selected(session_id, scheme::TARGET_ID)
            .unwrap()
            .unwrap();
        // The deep link cannot carry a file; WhatsApp receives no payload.
        assert_eq!(
            delivery,
            Delivery::DeepLink {
                url: "whatsapp://send".into(),
                pasteboard_file: None,
            }
        );
    }

    #[test]
    fn pasteboard_policy_carries_file_alongside_deep_link() {
        let surface = MockSurface::new();
        let coordinator =
            ShareCoordinator::new(&surface, SyntheticFilePolicy::PasteboardFallback);
        coordinator
            .share(&json!({ "text": "hi", "file": "/tmp/pic.png" }))
            .unwrap();
        let session_id = presented(&surface.calls()).session_id;

        let delivery = coordinator
            .target_selected(session_id, scheme::TARGET_ID)
            .unwrap()
            .unwrap();
        assert_eq!(
            delivery,
            Delivery::DeepLink {
                url: "whatsapp://send?text=hi".into(),
                pasteboard_file: Some("/tmp/pic.png".into()),
            }
        );
    }

    #[test]
    fn per_item_resolution_for_synthetic_target() {
        let request = ShareRequest {
            text: Some("hi".into()),
            file: Some("/tmp/pic.png".into()),
        };
        let session = ShareSession::new(1, &request, SyntheticFilePolicy::Drop);
        assert_eq!(
            session.resolve(&ShareItem::Text("hi".into()), scheme::TARGET_ID),
            Some(ResolvedItem::Text("hi".into()))
        );
        // With text staged, the file yields no value for WhatsApp.
        assert_eq!(
            session.resolve(&ShareItem::File("/tmp/pic.png".into()), scheme::TARGET_ID),
            None
        );
        // Other targets always get the natural value.
        assert_eq!(
            session.resolve(&ShareItem::File("/tmp/pic.png".into()), "com.example.Share"),
            Some(ResolvedItem::FilePath("/tmp/pic.png".into()))
        );
    }

    #[test]
    fn cancel_without_selection_completes_and_dismisses() {
        let surface = MockSurface::new();
        let coordinator = ShareCoordinator::new(&surface, SyntheticFilePolicy::default());
        coordinator.share(&json!({ "text": "hi" })).unwrap();
        let session_id = presented(&surface.calls()).session_id;

        coordinator.share_completed(session_id);
        assert_eq!(surface.calls(), vec![SurfaceCall::Dismiss]);
        assert_eq!(coordinator.active_phase(), None);

        // Late selection after completion is ignored.
        let delivery = coordinator
            .target_selected(session_id, scheme::TARGET_ID)
            .unwrap();
        assert_eq!(delivery, None);
        assert!(surface.calls().is_empty());
    }

    #[test]
    fn superseded_session_callbacks_are_ignored() {
        let surface = MockSurface::new();
        let coordinator = ShareCoordinator::new(&surface, SyntheticFilePolicy::default());
        coordinator.share(&json!({ "text": "first" })).unwrap();
        let first = presented(&surface.calls()).session_id;
        coordinator.share(&json!({ "text": "second" })).unwrap();
        let second = presented(&surface.calls()).session_id;
        assert_ne!(first, second);

        assert_eq!(coordinator.target_selected(first, scheme::TARGET_ID).unwrap(), None);

        // The live session still resolves against its own text.
        let delivery = coordinator
            .target_selected(second, scheme::TARGET_ID)
            .unwrap()
            .unwrap();
        assert_eq!(
            delivery,
            Delivery::DeepLink {
                url: "whatsapp://send?text=second".into(),
                pasteboard_file: None,
            }
        );
    }

    #[test]
    fn superseding_share_dismisses_the_previous_presentation() {
        let surface = MockSurface::new();
        let coordinator = ShareCoordinator::new(&surface, SyntheticFilePolicy::default());
        coordinator.share(&json!({ "text": "first" })).unwrap();
        let first = presented(&surface.calls()).session_id;

        coordinator.share(&json!({ "text": "second" })).unwrap();
        let calls = surface.calls();
        // The old chooser is torn down before the new one goes up.
        assert_eq!(calls[0], SurfaceCall::Dismiss);
        let second = presented(&calls).session_id;

        // The superseded session is already terminal; its late completion
        // callback must not dismiss the live chooser.
        coordinator.share_completed(first);
        assert!(surface.calls().is_empty());

        coordinator.share_completed(second);
        assert_eq!(surface.calls(), vec![SurfaceCall::Dismiss]);
    }

    #[test]
    fn empty_bag_presents_zero_items_and_reports_success() {
        let surface = MockSurface::new();
        let coordinator = ShareCoordinator::new(&surface, SyntheticFilePolicy::default());
        coordinator.share(&json!({})).unwrap();
        let calls = surface.calls();
        let chooser = presented(&calls);
        assert!(chooser.items.is_empty());
        assert!(chooser.placeholders.is_empty());
    }

    #[test]
    fn unavailable_surface_still_reports_success_and_finishes() {
        let mut surface = MockSurface::new();
        surface.present_outcome = PresentOutcome::Unavailable;
        let coordinator = ShareCoordinator::new(&surface, SyntheticFilePolicy::default());
        coordinator.share(&json!({ "text": "hi" })).unwrap();

        let calls = surface.calls();
        assert!(matches!(calls[0], SurfaceCall::Present(_)));
        assert_eq!(calls[1], SurfaceCall::Dismiss);
        assert_eq!(coordinator.active_phase(), None);
    }

    #[test]
    fn invalid_arguments_never_reach_the_surface() {
        let surface = MockSurface::new();
        let coordinator = ShareCoordinator::new(&surface, SyntheticFilePolicy::default());
        assert!(coordinator.share(&json!("not a map")).is_err());
        assert!(surface.calls().is_empty());
    }
}
