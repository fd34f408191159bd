use std::process::ExitCode;

use anyhow::{Context, Result};
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use super::Arguments;

/// Status reported when the hook fails or never runs.
pub const FAILURE_STATUS: i32 = 1;

/// Runs the application hook once and remembers its status.
///
/// Separated from the event loop so the launch contract can be driven
/// directly; [`run`] feeds it from winit's first `resumed` notification.
pub struct Launcher<F> {
    args: Vec<String>,
    exec: Option<F>,
    status: Option<i32>,
}

impl<F> Launcher<F>
where
    F: FnOnce(Arguments<'_>) -> Result<i32>,
{
    pub fn new(args: Vec<String>, exec: F) -> Self {
        Self {
            args,
            exec: Some(exec),
            status: None,
        }
    }

    /// Invokes the hook with the freshly created host window.
    ///
    /// Returns `false` without doing anything if the hook already ran.
    pub fn on_window_created(&mut self, window: Option<RawWindowHandle>) -> bool {
        let Some(exec) = self.exec.take() else {
            return false;
        };

        let status = match exec(Arguments::new(&self.args, window)) {
            Ok(status) => {
                log::debug!("application finished with status {status}");
                status
            }
            Err(err) => {
                log::error!("application failed: {err:#}");
                FAILURE_STATUS
            }
        };

        self.status = Some(status);
        true
    }

    /// Gives up without running the hook.
    pub fn abandon(&mut self) {
        if self.exec.take().is_some() {
            self.status = Some(FAILURE_STATUS);
        }
    }

    pub fn has_run(&self) -> bool {
        self.exec.is_none()
    }

    /// The hook's status, if it ran.
    pub fn status(&self) -> Option<i32> {
        self.status
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(exit_status_byte(self.status.unwrap_or(FAILURE_STATUS)))
    }
}

/// Process status as observed by a parent: the low byte.
pub fn exit_status_byte(status: i32) -> u8 {
    (status & 0xff) as u8
}

/// Runs `exec` inside a minimal OS event loop and returns its status as the
/// process exit code.
///
/// A hidden host window is created on the first `resumed` notification and
/// `exec` runs synchronously from that callback, on the event-loop thread;
/// the loop exits as soon as it returns. That window is the only one created
/// per run: it reaches `exec` through [`Arguments::window`], and a
/// [`WindowlessContext`](super::WindowlessContext) built from those arguments
/// anchors its device context on it. Arguments are passed through
/// unparsed. Errors from `exec` are logged with their cause chain and map to
/// status 1.
pub fn run<F>(exec: F) -> ExitCode
where
    F: FnOnce(Arguments<'_>) -> Result<i32>,
{
    let mut host = HostLoop {
        launcher: Launcher::new(std::env::args().collect(), exec),
    };

    if let Err(err) = pump(&mut host) {
        log::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    if !host.launcher.has_run() {
        log::error!("event loop exited before the host window was created");
    }
    host.launcher.exit_code()
}

fn pump<A: ApplicationHandler>(host: &mut A) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    event_loop
        .run_app(host)
        .context("winit event loop terminated with error")?;
    Ok(())
}

struct HostLoop<F> {
    launcher: Launcher<F>,
}

impl<F> ApplicationHandler for HostLoop<F>
where
    F: FnOnce(Arguments<'_>) -> Result<i32>,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.launcher.has_run() {
            event_loop.exit();
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("shade windowless host")
            .with_visible(false);

        match event_loop.create_window(attrs) {
            Ok(window) => {
                let handle = window.window_handle().ok().map(|h| h.as_raw());
                self.launcher.on_window_created(handle);
                drop(window);
            }
            Err(err) => {
                log::error!("failed to create host window: {err}");
                self.launcher.abandon();
            }
        }

        event_loop.exit();
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _id: WindowId,
        _event: WindowEvent,
    ) {
    }
}

/// Generates `fn main()` for a windowless application.
///
/// Installs the default logger, then hands `$exec` to [`run`](crate::platform::run).
///
/// ```rust,ignore
/// fn exec(args: shade_platform::platform::Arguments<'_>) -> anyhow::Result<i32> {
///     Ok(0)
/// }
///
/// shade_platform::windowless_main!(exec);
/// ```
#[macro_export]
macro_rules! windowless_main {
    ($exec:path) => {
        fn main() -> ::std::process::ExitCode {
            $crate::logging::init_logging($crate::logging::LoggingConfig::default());
            $crate::platform::run($exec)
        }
    };
}
