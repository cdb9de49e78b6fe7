// ── Explorer facade ───────────────────────────────────────────────────────────
//
// The public entry point.  One `Explorer` per host window: it owns a registry
// identity for its whole lifetime and one platform backend behind a mutex, so
// calls on the same explorer run strictly one after another.  The anchor view
// lives outside that mutex: `set_view` never waits for a pending dialog.
//
// Every operation blocks until the dialog closes.  Call them from a worker
// thread if the UI must stay responsive; the facade never spawns one itself.

use std::{fmt, fs::File, path::PathBuf};

use parking_lot::Mutex;
use raw_window_handle::RawWindowHandle;

use crate::{
    config::Config,
    error::Result,
    platform::{self, BackendContext, BoundView, DialogBackend, RunHandler, ViewHandle},
    registry::{Identity, Registry},
};

/// Opens OS-native dialogs to choose existing files or a place to create one.
///
/// ```no_run
/// use osdialog::{Explorer, RunHandler};
///
/// let explorer = Explorer::new(RunHandler::inline());
/// match explorer.choose_file(&["png", "jpg"]) {
///     Ok(path) => println!("picked {}", path.display()),
///     Err(e) if e.is_user_declined() => println!("nothing picked"),
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
pub struct Explorer {
    identity: Identity,
    registry: &'static Registry,
    view: BoundView,
    backend: Mutex<Box<dyn DialogBackend>>,
}

impl Explorer {
    /// Create an explorer with the default [`Config`].
    ///
    /// `run` must execute tasks on the host's UI thread where the platform
    /// requires it (macOS).  Create one explorer per window.
    pub fn new(run: RunHandler) -> Self {
        Self::build(run, Config::default(), Registry::global(), platform::native)
    }

    /// Create an explorer with an explicit configuration.
    pub fn with_config(run: RunHandler, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(run, config, Registry::global(), platform::native))
    }

    fn build(
        run: RunHandler,
        config: Config,
        registry: &'static Registry,
        make: impl FnOnce(BackendContext) -> Box<dyn DialogBackend>,
    ) -> Self {
        let identity = registry.register();
        let view = BoundView::default();
        let backend = make(BackendContext {
            identity,
            run,
            config,
            registry,
            view: view.clone(),
        });
        Self {
            identity,
            registry,
            view,
            backend: Mutex::new(backend),
        }
    }

    /// Identity used to correlate native callbacks with this explorer.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Anchor dialogs to the host's window or view.
    ///
    /// May be called at any time and from any thread, including the UI thread
    /// while a dialog is open; the new view applies from the next dialog.
    /// Handle kinds the current platform does not use are ignored.
    pub fn set_view(&self, handle: RawWindowHandle) {
        let view = ViewHandle::from(handle);
        if view == ViewHandle::Other {
            log::warn!("explorer {}: ignoring unsupported window handle kind", self.identity);
            return;
        }
        log::debug!("explorer {}: binding view {view:?}", self.identity);
        self.view.set(view);
    }

    /// Let the user choose one existing file.
    ///
    /// `extensions` restricts the selectable files (`"png"`, `".png"` and
    /// `"*.png"` are equivalent).  An empty list accepts every file.
    pub fn choose_file<S: AsRef<str>>(&self, extensions: &[S]) -> Result<PathBuf> {
        let extensions = owned(extensions);
        self.backend.lock().choose_one(&extensions)
    }

    /// Let the user choose one or more existing files.
    pub fn choose_files<S: AsRef<str>>(&self, extensions: &[S]) -> Result<Vec<PathBuf>> {
        let extensions = owned(extensions);
        self.backend.lock().choose_many(&extensions)
    }

    /// Let the user choose where to create a file, pre-filling
    /// `suggested_name`.  Nothing is written; see
    /// [`Explorer::create_file_writer`] for that.
    pub fn create_file(&self, suggested_name: &str) -> Result<PathBuf> {
        self.backend.lock().create_and_choose(suggested_name)
    }

    // ── File handles ──────────────────────────────────────────────────────────

    /// [`choose_file`](Self::choose_file), then open the file for reading.
    pub fn open_file<S: AsRef<str>>(&self, extensions: &[S]) -> Result<File> {
        let path = self.choose_file(extensions)?;
        Ok(File::open(path)?)
    }

    /// [`choose_files`](Self::choose_files), then open every file for reading.
    ///
    /// If any file fails to open, the handles already opened are dropped and
    /// the error is returned.
    pub fn open_files<S: AsRef<str>>(&self, extensions: &[S]) -> Result<Vec<File>> {
        self.choose_files(extensions)?
            .into_iter()
            .map(|p| File::open(p).map_err(Into::into))
            .collect()
    }

    /// [`create_file`](Self::create_file), then create (or truncate) the file
    /// for writing.
    pub fn create_file_writer(&self, suggested_name: &str) -> Result<File> {
        let path = self.create_file(suggested_name)?;
        Ok(File::create(path)?)
    }
}

impl Default for Explorer {
    /// An explorer that runs native work on the calling thread.
    fn default() -> Self {
        Self::new(RunHandler::inline())
    }
}

impl Drop for Explorer {
    fn drop(&mut self) {
        self.registry.release(self.identity);
    }
}

impl fmt::Debug for Explorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Explorer")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

fn owned<S: AsRef<str>>(extensions: &[S]) -> Vec<String> {
    extensions.iter().map(|e| e.as_ref().to_owned()).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        fs,
        io::{Read, Write},
        path::Path,
        sync::{Arc, LazyLock, OnceLock, Weak},
        thread,
        time::Duration,
    };

    use super::*;
    use crate::{
        error::{Error, Result},
        filter,
        platform::{callback::CallbackBridge, Task},
    };

    static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

    /// Maps a request description (`"one:png,jpg"`, `"save:name.txt"`, …) to
    /// the URLs the fake native layer answers with.
    type Script = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

    /// Callback-native backend whose "panel" is a script run on the UI thread.
    struct Scripted {
        bridge: CallbackBridge,
        script: Script,
        view: BoundView,
        /// View read at the start of the most recent call.
        seen: Arc<Mutex<Option<ViewHandle>>>,
    }

    impl Scripted {
        fn ask(&self, what: String) -> Result<Vec<PathBuf>> {
            *self.seen.lock() = self.view.get();
            let script = Arc::clone(&self.script);
            self.bridge.request(move |id, registry| {
                registry.deliver(id, Ok(script(&what)));
            })
        }
    }

    impl DialogBackend for Scripted {
        fn choose_one(&mut self, extensions: &[String]) -> Result<PathBuf> {
            let filter = filter::joined_filter(extensions).unwrap_or_default();
            let mut paths = self.ask(format!("one:{filter}"))?;
            Ok(paths.swap_remove(0))
        }

        fn choose_many(&mut self, extensions: &[String]) -> Result<Vec<PathBuf>> {
            let filter = filter::joined_filter(extensions).unwrap_or_default();
            self.ask(format!("many:{filter}"))
        }

        fn create_and_choose(&mut self, suggested_name: &str) -> Result<PathBuf> {
            let mut paths = self.ask(format!("save:{suggested_name}"))?;
            Ok(paths.swap_remove(0))
        }
    }

    /// A host UI thread that runs posted tasks until its handler is dropped.
    fn ui_thread() -> RunHandler {
        let (tx, rx) = crossbeam::channel::unbounded::<Task>();
        thread::spawn(move || {
            for task in rx {
                task();
            }
        });
        RunHandler::new(move |task| {
            let _ = tx.send(task);
        })
    }

    fn scripted(script: impl Fn(&str) -> Vec<String> + Send + Sync + 'static) -> Explorer {
        scripted_with_view(script).0
    }

    fn scripted_with_view(
        script: impl Fn(&str) -> Vec<String> + Send + Sync + 'static,
    ) -> (Explorer, Arc<Mutex<Option<ViewHandle>>>) {
        let seen = Arc::new(Mutex::new(None));
        let recorded = Arc::clone(&seen);
        let script: Script = Arc::new(script);
        let explorer = Explorer::build(ui_thread(), Config::default(), &REGISTRY, move |ctx| {
            Box::new(Scripted {
                bridge: CallbackBridge::new(ctx.identity, ctx.run, ctx.registry),
                script,
                view: ctx.view,
                seen: recorded,
            }) as Box<dyn DialogBackend>
        });
        (explorer, seen)
    }

    fn win32_view(hwnd: isize) -> RawWindowHandle {
        use raw_window_handle::Win32WindowHandle;

        let hwnd = std::num::NonZeroIsize::new(hwnd).expect("non-zero");
        RawWindowHandle::Win32(Win32WindowHandle::new(hwnd))
    }

    fn file_url(path: &Path) -> String {
        url::Url::from_file_path(path)
            .expect("absolute path")
            .to_string()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("osdialog-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("mkdir");
        dir
    }

    // ── Facade operations ────────────────────────────────────────────────────

    #[test]
    fn create_file_returns_accepted_path() {
        let explorer = scripted(|req| {
            assert_eq!(req, "save:default-name.txt");
            vec!["file:///out/default-name.txt".to_owned()]
        });
        let path = explorer.create_file("default-name.txt").expect("path");
        assert_eq!(path, PathBuf::from("/out/default-name.txt"));
    }

    #[test]
    fn choose_file_passes_normalised_filter() {
        let explorer = scripted(|req| {
            assert_eq!(req, "one:png,jpg");
            vec!["file:///pics/cat.png".to_owned()]
        });
        let path = explorer.choose_file(&[".png", "*.jpg"]).expect("path");
        assert_eq!(path, PathBuf::from("/pics/cat.png"));
    }

    #[test]
    fn choose_files_returns_every_selection_in_order() {
        let explorer = scripted(|_| {
            vec![
                "file:///d/b.txt".to_owned(),
                "file:///d/a%20b.txt".to_owned(),
            ]
        });
        let none: [&str; 0] = [];
        let paths = explorer.choose_files(&none).expect("paths");
        assert_eq!(paths, vec![PathBuf::from("/d/b.txt"), PathBuf::from("/d/a b.txt")]);
    }

    #[test]
    fn cancel_is_user_declined() {
        let explorer = scripted(|_| Vec::new());
        let err = explorer.choose_file(&["txt"]).unwrap_err();
        assert!(err.is_user_declined(), "got {err:?}");
    }

    #[test]
    fn malformed_answer_is_decode_failure() {
        let explorer = scripted(|_| vec!["file:///ok".to_owned(), "file:///%FF".to_owned()]);
        let err = explorer.choose_files(&["txt"]).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "got {err:?}");
    }

    #[test]
    fn backend_reads_bound_view_when_the_dialog_starts() {
        let (explorer, seen) = scripted_with_view(|_| Vec::new());
        explorer.set_view(win32_view(0xBEEF));
        let _ = explorer.create_file("x.txt");
        assert_eq!(*seen.lock(), Some(ViewHandle::Win32(0xBEEF)));
    }

    #[test]
    fn unusable_handle_kind_keeps_previous_view() {
        use raw_window_handle::XlibWindowHandle;

        let (explorer, seen) = scripted_with_view(|_| Vec::new());
        explorer.set_view(win32_view(0x10));
        explorer.set_view(RawWindowHandle::Xlib(XlibWindowHandle::new(3)));
        let _ = explorer.create_file("x.txt");
        assert_eq!(*seen.lock(), Some(ViewHandle::Win32(0x10)));
    }

    #[test]
    fn set_view_on_ui_thread_while_a_dialog_is_pending() {
        let this: Arc<OnceLock<Weak<Explorer>>> = Arc::default();
        let from_ui = Arc::clone(&this);
        let (explorer, seen) = scripted_with_view(move |_| {
            // The host re-binds its view before the panel answers.
            if let Some(explorer) = from_ui.get().and_then(Weak::upgrade) {
                explorer.set_view(win32_view(0x42));
            }
            vec!["file:///out/x.txt".to_owned()]
        });
        let explorer = Arc::new(explorer);
        assert!(this.set(Arc::downgrade(&explorer)).is_ok());

        let (tx, rx) = crossbeam::channel::bounded(1);
        let worker = Arc::clone(&explorer);
        thread::spawn(move || {
            let _ = tx.send(worker.create_file("x.txt"));
        });

        let path = rx
            .recv_timeout(Duration::from_secs(3))
            .expect("create_file returned")
            .expect("path");
        assert_eq!(path, PathBuf::from("/out/x.txt"));
        // Read before the re-bind; the new view applies to the next dialog.
        assert_eq!(*seen.lock(), None);
        let _ = explorer.create_file("x.txt");
        assert_eq!(*seen.lock(), Some(ViewHandle::Win32(0x42)));
    }

    // ── Lifetime ─────────────────────────────────────────────────────────────

    #[test]
    fn identity_is_released_on_drop() {
        let explorer = scripted(|_| Vec::new());
        let id = explorer.identity();
        assert!(REGISTRY.is_registered(id));
        drop(explorer);
        assert!(!REGISTRY.is_registered(id));
        // A late answer for the dropped explorer is silently discarded.
        assert!(!REGISTRY.deliver(id, Ok(vec!["file:///late".to_owned()])));
    }

    #[test]
    fn explorers_on_parallel_threads_get_their_own_answers() {
        let explorers: Vec<Arc<Explorer>> = (0..4)
            .map(|i| {
                Arc::new(scripted(move |_| vec![format!("file:///explorer/{i}")]))
            })
            .collect();

        let workers: Vec<_> = explorers
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let e = Arc::clone(e);
                thread::spawn(move || {
                    for _ in 0..5 {
                        let path = e.create_file("x").expect("path");
                        assert_eq!(path, PathBuf::from(format!("/explorer/{i}")));
                    }
                })
            })
            .collect();

        for w in workers {
            w.join().expect("worker");
        }
    }

    #[test]
    fn calls_on_one_explorer_are_serialised() {
        let explorer = Arc::new(scripted(|req| vec![format!("file:///{}", &req[5..])]));
        let workers: Vec<_> = (0..4)
            .map(|i| {
                let e = Arc::clone(&explorer);
                thread::spawn(move || {
                    let name = format!("n{i}");
                    assert_eq!(e.create_file(&name).expect("path"), PathBuf::from(format!("/{name}")));
                })
            })
            .collect();
        for w in workers {
            w.join().expect("worker");
        }
    }

    // ── File handles ─────────────────────────────────────────────────────────

    #[test]
    fn open_file_reads_the_chosen_file() {
        let dir = scratch_dir("open");
        let path = dir.join("hello.txt");
        fs::write(&path, b"hello").expect("write");

        let url = file_url(&path);
        let explorer = scripted(move |_| vec![url.clone()]);
        let mut contents = String::new();
        explorer
            .open_file(&["txt"])
            .expect("file")
            .read_to_string(&mut contents)
            .expect("read");
        assert_eq!(contents, "hello");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn open_files_fails_whole_batch_on_missing_file() {
        let dir = scratch_dir("open-many");
        let present = dir.join("present.txt");
        fs::write(&present, b"x").expect("write");
        let urls = vec![file_url(&present), file_url(&dir.join("missing.txt"))];

        let explorer = scripted(move |_| urls.clone());
        let err = explorer.open_files(&["txt"]).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "got {err:?}");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn create_file_writer_creates_the_file() {
        let dir = scratch_dir("create");
        let path = dir.join("out.txt");

        let url = file_url(&path);
        let explorer = scripted(move |_| vec![url.clone()]);
        explorer
            .create_file_writer("out.txt")
            .expect("file")
            .write_all(b"saved")
            .expect("write");
        assert_eq!(fs::read(&path).expect("read back"), b"saved");

        let _ = fs::remove_dir_all(&dir);
    }

    // ── Configuration ────────────────────────────────────────────────────────

    #[test]
    fn invalid_config_is_rejected_before_registering() {
        let config = Config {
            path_buffer_len: 1,
            ..Config::default()
        };
        let err = Explorer::with_config(RunHandler::inline(), config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
