// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except the Win32 window and DPI modules.
// Each unsafe block there MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

// Release builds run as a GUI application (no console window).
// Debug builds keep the console so that log output is visible.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[cfg(windows)]
mod dpi;
#[cfg(windows)]
mod window;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    #[cfg(windows)]
    if let Err(e) = window::run() {
        // Startup failed before or during the message loop.
        log::error!("{e}");
        window::show_error_dialog(&e.to_string());
        std::process::exit(1);
    }

    #[cfg(not(windows))]
    {
        log::error!("osdialog-demo is a Win32 application and only runs on Windows");
        std::process::exit(1);
    }
}
