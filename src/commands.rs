use tauri::{command, AppHandle, Runtime};

use crate::dispatch::Delivery;
use crate::Result;
use crate::WhatsappShareExt;

/// Check whether WhatsApp is installed on the device.
///
/// Probes the reserved `whatsapp://` scheme without opening it and returns
/// `1` or `0`.
#[command]
pub(crate) async fn installed<R: Runtime>(app: AppHandle<R>) -> Result<u8> {
    app.whatsapp_share().installed()
}

/// Present the native share chooser for an argument bag with optional
/// `text` and `file` string keys.
///
/// Returns `1` once presentation has been initiated. Rejects anything that
/// is not a string-keyed bag with `ERROR_SHARE`.
#[command]
pub(crate) async fn share<R: Runtime>(
    app: AppHandle<R>,
    arguments: serde_json::Value,
) -> Result<u8> {
    app.whatsapp_share().share(&arguments)
}

/// Invoked by the native layer when the user picks a chooser target.
///
/// Resolves the staged items for that target; for the synthetic WhatsApp
/// entry this also opens the deep link. Returns `null` for callbacks that
/// refer to a superseded session.
#[command]
pub(crate) async fn resolve_share_target<R: Runtime>(
    app: AppHandle<R>,
    session_id: u64,
    target_id: String,
) -> Result<Option<Delivery>> {
    app.whatsapp_share()
        .resolve_share_target(session_id, &target_id)
}

/// Invoked by the native layer when the chooser finishes, whether a target
/// completed, failed, or the user cancelled.
#[command]
pub(crate) async fn complete_share<R: Runtime>(app: AppHandle<R>, session_id: u64) -> Result<()> {
    app.whatsapp_share().complete_share(session_id)
}
