use tauri::{
    plugin::{Builder, TauriPlugin},
    Manager, Runtime,
};

pub use models::*;

#[cfg(desktop)]
mod desktop;
#[cfg(mobile)]
mod mobile;

mod commands;
mod error;
mod models;

pub mod dispatch;
pub mod exclusions;
pub mod scheme;

pub use dispatch::{Delivery, Phase, ResolvedItem, SyntheticFilePolicy};
pub use error::{Error, Result};

#[cfg(desktop)]
use desktop::WhatsappShare;
#[cfg(mobile)]
use mobile::WhatsappShare;

/// Extensions to [`tauri::App`], [`tauri::AppHandle`] and [`tauri::Window`] to access the whatsapp-share APIs.
pub trait WhatsappShareExt<R: Runtime> {
    fn whatsapp_share(&self) -> &WhatsappShare<R>;
}

impl<R: Runtime, T: Manager<R>> crate::WhatsappShareExt<R> for T {
    fn whatsapp_share(&self) -> &WhatsappShare<R> {
        self.state::<WhatsappShare<R>>().inner()
    }
}

/// Initializes the whatsapp-share plugin with the default file policy.
///
/// The plugin exposes two commands to the frontend:
/// - `installed`: probe WhatsApp's URL scheme, returning 1 or 0
/// - `share`: present the native share chooser with WhatsApp inserted as a
///   first-class entry that opens a `whatsapp://send` deep link instead of
///   receiving the generic hand-off
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    init_with_policy(SyntheticFilePolicy::default())
}

/// Initializes the plugin with an explicit [`SyntheticFilePolicy`] deciding
/// how a staged file reaches WhatsApp (dropped when text is present, or
/// copied to the pasteboard alongside the deep link).
pub fn init_with_policy<R: Runtime>(policy: SyntheticFilePolicy) -> TauriPlugin<R> {
    Builder::new("whatsapp-share")
        .invoke_handler(tauri::generate_handler![
            commands::installed,
            commands::share,
            commands::resolve_share_target,
            commands::complete_share,
        ])
        .setup(move |app, api| {
            #[cfg(mobile)]
            let whatsapp_share = mobile::init(app, api, policy)?;
            #[cfg(desktop)]
            let whatsapp_share = desktop::init(app, api, policy)?;
            app.manage(whatsapp_share);
            Ok(())
        })
        .build()
}
