const COMMANDS: &[&str] = &["installed", "share", "resolve_share_target", "complete_share"];

fn main() {
    tauri_plugin::Builder::new(COMMANDS)
        // Note: the native chooser/probe layer ships as a Swift Package / Android
        // library wired up by the host project, so no .android_path()/.ios_path()
        // here. The Swift plugin registers itself via @_cdecl.
        .build();
}
