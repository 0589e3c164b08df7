use serde::de::DeserializeOwned;
use tauri::{plugin::PluginApi, AppHandle, Runtime};
use url::Url;

use crate::dispatch::{
    ChooserPresentation, Delivery, PresentOutcome, ShareCoordinator, ShareSurface,
    SyntheticFilePolicy,
};
use crate::models::TargetDescriptor;

/// Initialize the desktop plugin.
pub fn init<R: Runtime, C: DeserializeOwned>(
    app: &AppHandle<R>,
    _api: PluginApi<R, C>,
    policy: SyntheticFilePolicy,
) -> crate::Result<WhatsappShare<R>> {
    Ok(WhatsappShare {
        _app: app.clone(),
        coordinator: ShareCoordinator::new(DesktopSurface, policy),
    })
}

/// Desktop rendition of the share surface.
///
/// Desktop has neither a share sheet nor WhatsApp's URL scheme, so the probe
/// reports not installed and presentation is unavailable; `share` still
/// succeeds so frontends can call it unconditionally. The plugin must stay
/// loadable on desktop for cross-platform compatibility.
struct DesktopSurface;

impl ShareSurface for DesktopSurface {
    fn can_open_url(&self, url: &Url) -> bool {
        log::debug!("scheme probe unsupported on desktop: {url}");
        false
    }

    fn open_url(&self, url: &Url) {
        log::debug!("deep link ignored on desktop: {url}");
    }

    fn registered_targets(&self) -> Vec<TargetDescriptor> {
        Vec::new()
    }

    fn present(&self, _chooser: ChooserPresentation) -> PresentOutcome {
        PresentOutcome::Unavailable
    }

    fn dismiss(&self) {}
}

/// Access to the whatsapp-share APIs (desktop).
pub struct WhatsappShare<R: Runtime> {
    _app: AppHandle<R>,
    coordinator: ShareCoordinator<DesktopSurface>,
}

impl<R: Runtime> WhatsappShare<R> {
    /// Probe whether WhatsApp is installed. Always `0` on desktop.
    pub fn installed(&self) -> crate::Result<u8> {
        self.coordinator.installed().map(u8::from)
    }

    /// Start a share flow. On desktop the chooser is unavailable and the
    /// session completes immediately; the call still reports success.
    pub fn share(&self, arguments: &serde_json::Value) -> crate::Result<u8> {
        self.coordinator.share(arguments)?;
        Ok(1)
    }

    /// Selection callback. Desktop never presents a chooser, so this only
    /// ever sees stale session ids.
    pub fn resolve_share_target(
        &self,
        session_id: u64,
        target_id: &str,
    ) -> crate::Result<Option<Delivery>> {
        self.coordinator.target_selected(session_id, target_id)
    }

    /// Completion callback counterpart of [`Self::resolve_share_target`].
    pub fn complete_share(&self, session_id: u64) -> crate::Result<()> {
        self.coordinator.share_completed(session_id);
        Ok(())
    }
}
