// ── Demo window ───────────────────────────────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register the main window class.
//   • Create the top-level window, attach a menu bar and bind it as the owner
//     of every dialog the explorer opens.
//   • Run the Win32 message loop.
//   • Dispatch WM_COMMAND to the explorer and report each outcome in a
//     message box.
//
// The common dialogs run their own modal loop, so each menu command calls the
// explorer straight from the window procedure.

#![allow(unsafe_code)]

use std::{fmt::Write as _, num::NonZeroIsize, path::PathBuf, sync::OnceLock};

use osdialog::{
    raw_window_handle::{RawWindowHandle, Win32WindowHandle},
    Config, Error, Explorer, Result, RunHandler,
};
use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
        Graphics::Gdi::{GetStockObject, HBRUSH, WHITE_BRUSH},
        System::LibraryLoader::GetModuleHandleW,
        UI::WindowsAndMessaging::{
            AppendMenuW, CreateMenu, CreateWindowExW, DefWindowProcW, DestroyWindow,
            DispatchMessageW, GetMessageW, LoadCursorW, LoadIconW, MessageBoxW,
            PostQuitMessage, RegisterClassExW, SetMenu, ShowWindow, TranslateMessage,
            UpdateWindow, CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, HMENU, IDC_ARROW,
            IDI_APPLICATION, MB_ICONERROR, MB_ICONINFORMATION, MB_OK, MF_POPUP,
            MF_SEPARATOR, MF_STRING, MSG, SW_SHOW, WINDOW_EX_STYLE, WM_CLOSE, WM_COMMAND,
            WM_DESTROY, WNDCLASSEXW, WS_OVERLAPPEDWINDOW,
        },
    },
};

use crate::dpi;

// ── Window identity ───────────────────────────────────────────────────────────

const CLASS_NAME: PCWSTR = w!("OsdialogDemoWindow");
const APP_TITLE: PCWSTR = w!("osdialog demo");

/// Default client size at 96 DPI; scaled to the system DPI on creation.
const DEFAULT_WIDTH: i32 = 640;
const DEFAULT_HEIGHT: i32 = 420;

// ── Menu command IDs ──────────────────────────────────────────────────────────

const IDM_FILE_OPEN: usize = 1001;
const IDM_FILE_OPEN_MANY: usize = 1002;
const IDM_FILE_OPEN_IMAGE: usize = 1003;
const IDM_FILE_OPEN_IMAGES: usize = 1004;
const IDM_FILE_SAVE_AS: usize = 1005;
const IDM_FILE_EXIT: usize = 1010;
const IDM_HELP_ABOUT: usize = 9001;

const IMAGE_TYPES: &[&str] = &["png", "jpeg", "jpg"];
const ANY_TYPE: &[&str] = &[];
const SUGGESTED_NAME: &str = "default-name.txt";

/// Created once the window exists; read from the window procedure.
static EXPLORER: OnceLock<Explorer> = OnceLock::new();

// ── Public API ────────────────────────────────────────────────────────────────

/// Create the window and drive the message loop until the user closes it.
pub(crate) fn run() -> Result<()> {
    dpi::init();

    // SAFETY: GetModuleHandleW(None) returns the .exe's own HMODULE, which is
    // always valid for the process lifetime.
    let hmodule = unsafe { GetModuleHandleW(None) }.map_err(win32("GetModuleHandleW"))?;
    let hinstance = HINSTANCE(hmodule.0);

    register_class(hinstance)?;
    let hwnd = create_window(hinstance)?;

    let explorer = Explorer::with_config(RunHandler::inline(), Config::discover())?;
    if let Some(hwnd) = NonZeroIsize::new(hwnd.0 as isize) {
        explorer.set_view(RawWindowHandle::Win32(Win32WindowHandle::new(hwnd)));
    }
    log::info!("explorer {} ready", explorer.identity());
    if EXPLORER.set(explorer).is_err() {
        log::warn!("explorer already initialised; keeping the first one");
    }

    // SAFETY: hwnd was just returned by CreateWindowExW and is valid.
    // Both return values report previous state and are intentionally ignored.
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = UpdateWindow(hwnd);
    }

    message_loop()
}

/// Show a modal error dialog with the given message.  No owner window.
pub(crate) fn show_error_dialog(message: &str) {
    message_box(HWND::default(), "osdialog demo: fatal error", message, true);
}

// ── Window class registration ─────────────────────────────────────────────────

fn register_class(hinstance: HINSTANCE) -> Result<()> {
    // SAFETY: IDI_APPLICATION and IDC_ARROW are built-in resources present on
    // every Windows version.
    let icon = unsafe { LoadIconW(None, IDI_APPLICATION) }.map_err(win32("LoadIconW"))?;
    // SAFETY: as above.
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }.map_err(win32("LoadCursorW"))?;

    // SAFETY: GetStockObject with WHITE_BRUSH always returns a valid HGDIOBJ,
    // and stock brushes are valid HBRUSH values.
    let bg_brush = unsafe { HBRUSH(GetStockObject(WHITE_BRUSH).0) };

    let wndclass = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wnd_proc),
        hInstance: hinstance,
        hIcon: icon,
        hCursor: cursor,
        hbrBackground: bg_brush,
        lpszClassName: CLASS_NAME,
        hIconSm: icon,
        ..Default::default()
    };

    // SAFETY: wndclass is fully initialised with valid handles; CLASS_NAME is
    // a static null-terminated UTF-16 literal.
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        return Err(last_error("RegisterClassExW"));
    }
    Ok(())
}

// ── Window creation ───────────────────────────────────────────────────────────

fn create_window(hinstance: HINSTANCE) -> Result<HWND> {
    let dpi = dpi::get_system_dpi();

    // SAFETY: CLASS_NAME was just registered; hinstance is the exe's module.
    // A null parent makes a top-level window; the menu is attached below.
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            CLASS_NAME,
            APP_TITLE,
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            dpi::scale(DEFAULT_WIDTH, dpi),
            dpi::scale(DEFAULT_HEIGHT, dpi),
            HWND::default(),
            HMENU::default(),
            hinstance,
            None,
        )
    }
    .map_err(win32("CreateWindowExW"))?;

    let menu = build_menu()?;
    // SAFETY: hwnd and menu are valid handles.
    unsafe { SetMenu(hwnd, menu) }.map_err(win32("SetMenu"))?;

    Ok(hwnd)
}

// ── Menu construction ─────────────────────────────────────────────────────────

fn build_menu() -> Result<HMENU> {
    let append = win32("AppendMenuW");

    // SAFETY: every handle comes from a successful CreateMenu call, and every
    // label is a static null-terminated UTF-16 literal.
    unsafe {
        let bar = CreateMenu().map_err(win32("CreateMenu"))?;

        // ── File ──────────────────────────────────────────────────────────────
        let file = CreateMenu().map_err(win32("CreateMenu"))?;
        AppendMenuW(file, MF_STRING, IDM_FILE_OPEN, w!("&Open File…")).map_err(append)?;
        AppendMenuW(file, MF_STRING, IDM_FILE_OPEN_MANY, w!("Open &Files…")).map_err(append)?;
        AppendMenuW(file, MF_STRING, IDM_FILE_OPEN_IMAGE, w!("Open &Image…")).map_err(append)?;
        AppendMenuW(file, MF_STRING, IDM_FILE_OPEN_IMAGES, w!("Open I&mages…")).map_err(append)?;
        AppendMenuW(file, MF_SEPARATOR, 0, PCWSTR::null()).map_err(append)?;
        AppendMenuW(file, MF_STRING, IDM_FILE_SAVE_AS, w!("Save &As…")).map_err(append)?;
        AppendMenuW(file, MF_SEPARATOR, 0, PCWSTR::null()).map_err(append)?;
        AppendMenuW(file, MF_STRING, IDM_FILE_EXIT, w!("E&xit\tAlt+F4")).map_err(append)?;

        // ── Help ──────────────────────────────────────────────────────────────
        let help = CreateMenu().map_err(win32("CreateMenu"))?;
        AppendMenuW(help, MF_STRING, IDM_HELP_ABOUT, w!("&About…")).map_err(append)?;

        // The uIDNewItem parameter for MF_POPUP is the child HMENU cast to usize.
        AppendMenuW(bar, MF_POPUP, file.0 as usize, w!("&File")).map_err(append)?;
        AppendMenuW(bar, MF_POPUP, help.0 as usize, w!("&Help")).map_err(append)?;

        Ok(bar)
    }
}

// ── Message loop ──────────────────────────────────────────────────────────────

fn message_loop() -> Result<()> {
    let mut msg = MSG::default();

    loop {
        // SAFETY: &mut msg is a valid MSG pointer; a null HWND retrieves
        // messages for every window on this thread.
        let ret = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };

        match ret.0 {
            -1 => return Err(last_error("GetMessageW")),
            0 => break,
            // SAFETY: msg was populated by a successful GetMessageW call.
            _ => unsafe {
                let _ = TranslateMessage(&msg);
                let _ = DispatchMessageW(&msg);
            },
        }
    }

    Ok(())
}

// ── Window procedure ──────────────────────────────────────────────────────────

// SAFETY: wnd_proc is registered as lpfnWndProc in WNDCLASSEXW.
// Windows guarantees that hwnd, msg, wparam, and lparam are valid for the
// lifetime of this call; we must not store hwnd beyond the message handler.
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_CLOSE => {
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }

        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }

        WM_COMMAND => match wparam.0 & 0xFFFF {
            IDM_FILE_EXIT => {
                let _ = DestroyWindow(hwnd);
                LRESULT(0)
            }
            IDM_HELP_ABOUT => {
                about_dialog(hwnd);
                LRESULT(0)
            }
            cmd @ (IDM_FILE_OPEN
            | IDM_FILE_OPEN_MANY
            | IDM_FILE_OPEN_IMAGE
            | IDM_FILE_OPEN_IMAGES
            | IDM_FILE_SAVE_AS) => {
                on_file_command(hwnd, cmd);
                LRESULT(0)
            }
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        },

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

// ── File commands ─────────────────────────────────────────────────────────────

fn on_file_command(hwnd: HWND, cmd: usize) {
    let Some(explorer) = EXPLORER.get() else {
        log::warn!("menu command {cmd} before the explorer was ready");
        return;
    };

    let (title, outcome) = match cmd {
        IDM_FILE_OPEN => ("Open File", explorer.choose_file(ANY_TYPE).map(|p| vec![p])),
        IDM_FILE_OPEN_MANY => ("Open Files", explorer.choose_files(ANY_TYPE)),
        IDM_FILE_OPEN_IMAGE => ("Open Image", explorer.choose_file(IMAGE_TYPES).map(|p| vec![p])),
        IDM_FILE_OPEN_IMAGES => ("Open Images", explorer.choose_files(IMAGE_TYPES)),
        IDM_FILE_SAVE_AS => ("Save As", save_as(explorer)),
        _ => return,
    };

    match outcome {
        Ok(paths) => {
            log::info!("{title}: {} path(s)", paths.len());
            message_box(hwnd, title, &describe(&paths), false);
        }
        Err(e) if e.is_user_declined() => log::info!("{title}: cancelled"),
        Err(e) => {
            log::error!("{title}: {e}");
            message_box(hwnd, title, &e.to_string(), true);
        }
    }
}

/// Ask where to save, then write a short note there.
fn save_as(explorer: &Explorer) -> Result<Vec<PathBuf>> {
    let path = explorer.create_file(SUGGESTED_NAME)?;
    std::fs::write(&path, "Written by the osdialog demo.\r\n")?;
    Ok(vec![path])
}

fn describe(paths: &[PathBuf]) -> String {
    let mut text = String::new();
    for path in paths {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let _ = writeln!(text, "{} ({size} bytes)", path.display());
    }
    text
}

// ── Helper dialogs ────────────────────────────────────────────────────────────

fn about_dialog(hwnd: HWND) {
    let body = concat!(
        "osdialog demo ",
        env!("CARGO_PKG_VERSION"),
        "\n\nOpens the native Windows file dialogs through osdialog::Explorer.",
    );
    message_box(hwnd, "About osdialog demo", body, false);
}

fn message_box(owner: HWND, title: &str, body: &str, error: bool) {
    let title: Vec<u16> = title.encode_utf16().chain(std::iter::once(0)).collect();
    let body: Vec<u16> = body.encode_utf16().chain(std::iter::once(0)).collect();
    let icon = if error { MB_ICONERROR } else { MB_ICONINFORMATION };

    // SAFETY: both strings are null-terminated UTF-16 that outlive the call;
    // owner is either null or a live window on this thread.  The button
    // pressed is irrelevant for an OK-only box.
    unsafe {
        let _ = MessageBoxW(owner, PCWSTR(body.as_ptr()), PCWSTR(title.as_ptr()), MB_OK | icon);
    }
}

// ── Error helpers ─────────────────────────────────────────────────────────────

/// Map a `windows` crate error for `function` into the library's error.
fn win32(function: &'static str) -> impl Fn(windows::core::Error) -> Error + Copy {
    move |e| Error::Native {
        function,
        code: e.code().0 as u32,
    }
}

/// Capture the current Win32 last-error code for `function`.
///
/// Call immediately after the failing call; `GetLastError` reads thread-local
/// state that the next API call can overwrite.
fn last_error(function: &'static str) -> Error {
    // SAFETY: GetLastError reads thread-local state and never fails.
    let code = unsafe { GetLastError() };
    Error::Native {
        function,
        code: code.0,
    }
}
