use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tauri::{
    plugin::{PluginApi, PluginHandle},
    AppHandle, Runtime,
};
use url::Url;

use crate::dispatch::{
    ChooserPresentation, Delivery, PresentOutcome, ShareCoordinator, ShareSurface,
    SyntheticFilePolicy,
};
use crate::models::{AnchorHint, TargetDescriptor};

#[cfg(target_os = "ios")]
tauri::ios_plugin_binding!(init_plugin_whatsapp_share);

/// Initialize the mobile plugin by registering with the native layer.
pub fn init<R: Runtime, C: DeserializeOwned>(
    _app: &AppHandle<R>,
    api: PluginApi<R, C>,
    policy: SyntheticFilePolicy,
) -> crate::Result<WhatsappShare<R>> {
    #[cfg(target_os = "android")]
    let handle =
        api.register_android_plugin("com.plugins.whatsappshare", "WhatsappSharePlugin")?;
    #[cfg(target_os = "ios")]
    let handle = api.register_ios_plugin(init_plugin_whatsapp_share)?;
    Ok(WhatsappShare {
        coordinator: ShareCoordinator::new(MobileSurface(handle), policy),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UrlArgs<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoolResponse {
    value: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetsResponse {
    targets: Vec<TargetDescriptor>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnchorResponse {
    anchor: Option<AnchorHint>,
}

/// Share surface backed by the native (Kotlin/Swift) plugin layer.
///
/// The native side owns UI-thread marshalling: `presentChooser` hops onto
/// the main thread before putting the sheet up and returns once presentation
/// has been initiated. Selection and completion come back asynchronously
/// through the `resolve_share_target` / `complete_share` commands, carrying
/// the session id issued here.
struct MobileSurface<R: Runtime>(PluginHandle<R>);

impl<R: Runtime> ShareSurface for MobileSurface<R> {
    fn can_open_url(&self, url: &Url) -> bool {
        // Capability probe only; must not open anything.
        self.0
            .run_mobile_plugin::<BoolResponse>("canOpenUrl", UrlArgs { url: url.as_str() })
            .map(|r| r.value)
            .unwrap_or_else(|e| {
                log::warn!("canOpenUrl probe failed: {e}");
                false
            })
    }

    fn open_url(&self, url: &Url) {
        // Fire and forget: a declined open is not reported to the caller.
        if let Err(e) = self
            .0
            .run_mobile_plugin::<serde_json::Value>("openUrl", UrlArgs { url: url.as_str() })
        {
            log::warn!("openUrl was declined by the platform: {e}");
        }
    }

    fn registered_targets(&self) -> Vec<TargetDescriptor> {
        self.0
            .run_mobile_plugin::<TargetsResponse>("registeredTargets", ())
            .map(|r| r.targets)
            .unwrap_or_else(|e| {
                log::warn!("failed to enumerate share targets: {e}");
                Vec::new()
            })
    }

    fn present(&self, chooser: ChooserPresentation) -> PresentOutcome {
        match self
            .0
            .run_mobile_plugin::<serde_json::Value>("presentChooser", chooser)
        {
            Ok(_) => PresentOutcome::Initiated,
            Err(e) => {
                log::warn!("failed to present share chooser: {e}");
                PresentOutcome::Unavailable
            }
        }
    }

    fn dismiss(&self) {
        if let Err(e) = self
            .0
            .run_mobile_plugin::<serde_json::Value>("dismissChooser", ())
        {
            log::warn!("failed to dismiss share chooser: {e}");
        }
    }

    fn anchor_hint(&self) -> Option<AnchorHint> {
        // Tablet-class layouts get a centered popover anchor; phones get none.
        self.0
            .run_mobile_plugin::<AnchorResponse>("anchorHint", ())
            .map(|r| r.anchor)
            .unwrap_or_else(|e| {
                log::debug!("anchor hint unavailable: {e}");
                None
            })
    }
}

/// Access to the whatsapp-share APIs (mobile).
pub struct WhatsappShare<R: Runtime> {
    coordinator: ShareCoordinator<MobileSurface<R>>,
}

impl<R: Runtime> WhatsappShare<R> {
    /// Probe whether WhatsApp is installed via its reserved URL scheme.
    pub fn installed(&self) -> crate::Result<u8> {
        self.coordinator.installed().map(u8::from)
    }

    /// Assemble the payload and put the share chooser on screen. Returns `1`
    /// once presentation has been initiated; cancellation and hand-off
    /// failures are never surfaced back.
    pub fn share(&self, arguments: &serde_json::Value) -> crate::Result<u8> {
        self.coordinator.share(arguments)?;
        Ok(1)
    }

    /// Native callback: the user picked a target. Resolves the staged items
    /// for it and, for the synthetic WhatsApp entry, opens the deep link.
    pub fn resolve_share_target(
        &self,
        session_id: u64,
        target_id: &str,
    ) -> crate::Result<Option<Delivery>> {
        self.coordinator.target_selected(session_id, target_id)
    }

    /// Native callback: the chooser finished (completed, failed, or
    /// cancelled). Dismisses the presentation anchor and drops the session.
    pub fn complete_share(&self, session_id: u64) -> crate::Result<()> {
        self.coordinator.share_completed(session_id);
        Ok(())
    }
}
