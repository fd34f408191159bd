use raw_window_handle::RawWindowHandle;

use super::{Arguments, Configuration, ContextDriver, ContextError};

/// Observable lifecycle state of a [`WindowlessContext`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ContextState {
    Uninitialized,
    Active,
}

/// Handles of a fully created context.
struct Active<D: ContextDriver> {
    window: D::Window,
    owns_window: bool,
    device_context: D::DeviceContext,
    rendering_context: D::RenderingContext,
    context: D::Context,
}

/// Owner of one hidden window, its device context, and the rendering context
/// current on the owning thread.
///
/// Either all three native handles are held together with the engine-facing
/// context object, or none are. Dropping an active owner detaches the context
/// and releases the handles in reverse acquisition order.
///
/// The device context is obtained from the host window in [`Arguments`] when
/// the driver can adopt it; that window stays owned by the entry point. Only
/// without a usable host window does the owner create (and later destroy) a
/// hidden window of its own.
///
/// ```rust,ignore
/// fn exec(args: Arguments<'_>) -> anyhow::Result<i32> {
///     let ctx = WglContext::new(&args, &Configuration::default())?;
///     let gl = ctx.context().expect("active").gl();
///     // render offscreen ...
///     Ok(0)
/// }
/// ```
pub struct WindowlessContext<D: ContextDriver> {
    driver: D,
    host: Option<RawWindowHandle>,
    active: Option<Active<D>>,
}

impl<D: ContextDriver> WindowlessContext<D> {
    /// Creates the context immediately.
    ///
    /// # Errors
    ///
    /// Returns the failed creation step. Nothing is leaked; the error is meant
    /// to be propagated out of the application hook, which terminates the
    /// process with a diagnostic.
    pub fn create(
        driver: D,
        arguments: &Arguments<'_>,
        configuration: &Configuration,
    ) -> anyhow::Result<Self> {
        let mut this = Self::no_create(driver, arguments);
        this.create_context(configuration)?;
        Ok(this)
    }

    /// Constructs the owner without a context; follow up with
    /// [`try_create_context`](Self::try_create_context) or
    /// [`create_context`](Self::create_context).
    pub fn no_create(driver: D, arguments: &Arguments<'_>) -> Self {
        log::debug!(
            "windowless owner for {} ({} args, host window: {})",
            arguments.program().unwrap_or("<unnamed>"),
            arguments.argc(),
            arguments.window().is_some(),
        );

        Self {
            driver,
            host: arguments.window(),
            active: None,
        }
    }

    /// Creates the context; failure is fatal for the caller.
    ///
    /// # Errors
    ///
    /// Any creation step failure, or [`ContextError::AlreadyCreated`] when a
    /// context already exists. The owner is left unchanged in both cases.
    pub fn create_context(&mut self, configuration: &Configuration) -> anyhow::Result<()> {
        self.attempt(configuration).map_err(|err| {
            let step = err.step();
            anyhow::Error::new(err)
                .context(format!("failed to create windowless GL context during {step}"))
        })
    }

    /// Creates the context, reporting failure only through the return value.
    ///
    /// On `false` the owner is `Uninitialized` (or still `Active`, if it
    /// already was) and may be retried, e.g. with another configuration.
    pub fn try_create_context(&mut self, configuration: &Configuration) -> bool {
        match self.attempt(configuration) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("windowless context attempt failed during {}: {err}", err.step());
                false
            }
        }
    }

    pub fn state(&self) -> ContextState {
        if self.active.is_some() {
            ContextState::Active
        } else {
            ContextState::Uninitialized
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Engine-facing context object, present while `Active`.
    pub fn context(&self) -> Option<&D::Context> {
        self.active.as_ref().map(|a| &a.context)
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn attempt(&mut self, configuration: &Configuration) -> Result<(), ContextError> {
        if self.active.is_some() {
            return Err(ContextError::AlreadyCreated);
        }

        let mut staged = Staged::new(&mut self.driver);

        let window = match self.host.and_then(|host| staged.driver.adopt_window(host)) {
            Some(window) => {
                log::debug!("anchoring on host window {window:?}");
                window
            }
            None => {
                log::debug!("creating hidden window");
                let window = staged.driver.create_hidden_window()?;
                staged.owns_window = true;
                window
            }
        };
        staged.window = Some(window);

        log::debug!("acquiring device context for {window:?}");
        let device_context = staged
            .driver
            .acquire_device_context(window, configuration.pixel_format())?;
        staged.device_context = Some(device_context);

        log::debug!("creating rendering context on {device_context:?}");
        let rendering_context = staged.driver.create_rendering_context(device_context)?;
        staged.rendering_context = Some(rendering_context);

        staged.driver.make_current(rendering_context, device_context)?;
        staged.current = true;

        let context = staged.driver.load_context(device_context, rendering_context)?;
        let owns_window = staged.owns_window;
        staged.disarm();

        log::info!("windowless GL context created ({rendering_context:?})");
        self.active = Some(Active {
            window,
            owns_window,
            device_context,
            rendering_context,
            context,
        });
        Ok(())
    }

    fn teardown(&mut self) {
        let Some(Active {
            window,
            owns_window,
            device_context,
            rendering_context,
            context,
        }) = self.active.take()
        else {
            return;
        };

        // The context object may still issue GL calls while it is dropped.
        drop(context);

        self.driver.release_current(device_context);
        self.driver.delete_rendering_context(rendering_context);
        self.driver.release_device_context(window, device_context);
        if owns_window {
            self.driver.destroy_window(window);
        }
        log::debug!("windowless GL context destroyed");
    }
}

impl<D: ContextDriver> Drop for WindowlessContext<D> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Handles acquired by an in-flight creation attempt.
///
/// Dropping the guard undoes every recorded step, newest first, so an early
/// return from any step leaves nothing behind.
struct Staged<'d, D: ContextDriver> {
    driver: &'d mut D,
    window: Option<D::Window>,
    owns_window: bool,
    device_context: Option<D::DeviceContext>,
    rendering_context: Option<D::RenderingContext>,
    current: bool,
}

impl<'d, D: ContextDriver> Staged<'d, D> {
    fn new(driver: &'d mut D) -> Self {
        Self {
            driver,
            window: None,
            owns_window: false,
            device_context: None,
            rendering_context: None,
            current: false,
        }
    }

    /// Hands ownership of every recorded handle to the caller.
    fn disarm(mut self) {
        self.window = None;
        self.device_context = None;
        self.rendering_context = None;
        self.current = false;
    }
}

impl<D: ContextDriver> Drop for Staged<'_, D> {
    fn drop(&mut self) {
        if self.current {
            if let Some(dc) = self.device_context {
                self.driver.release_current(dc);
            }
        }
        if let Some(rc) = self.rendering_context.take() {
            self.driver.delete_rendering_context(rc);
        }
        if let (Some(window), Some(dc)) = (self.window, self.device_context.take()) {
            self.driver.release_device_context(window, dc);
        }
        if let Some(window) = self.window.take() {
            log::debug!("rolling back partial context creation");
            if self.owns_window {
                self.driver.destroy_window(window);
            }
        }
    }
}

/// Windowless context backed by the native WGL driver.
#[cfg(windows)]
pub type WglContext = WindowlessContext<super::WglDriver>;

#[cfg(windows)]
impl WindowlessContext<super::WglDriver> {
    /// Creates a native WGL context immediately.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create).
    pub fn new(arguments: &Arguments<'_>, configuration: &Configuration) -> anyhow::Result<Self> {
        Self::create(super::WglDriver::new(), arguments, configuration)
    }

    /// Native owner without a context.
    pub fn no_create_native(arguments: &Arguments<'_>) -> Self {
        Self::no_create(super::WglDriver::new(), arguments)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroIsize;

    use raw_window_handle::{Win32WindowHandle, XlibWindowHandle};

    use super::*;
    use crate::platform::testing::{Call, FakeDriver, Fault};

    const HOST: u32 = 77;

    fn args() -> Vec<String> {
        vec!["windowless-test".to_string()]
    }

    fn win32_host() -> RawWindowHandle {
        let hwnd = NonZeroIsize::new(HOST as isize).expect("non-zero");
        RawWindowHandle::Win32(Win32WindowHandle::new(hwnd))
    }

    fn hosted_owner(driver: &FakeDriver, host: RawWindowHandle) -> WindowlessContext<FakeDriver> {
        let raw = args();
        WindowlessContext::no_create(driver.clone(), &Arguments::new(&raw, Some(host)))
    }

    fn owner(driver: &FakeDriver) -> WindowlessContext<FakeDriver> {
        let raw = args();
        WindowlessContext::no_create(driver.clone(), &Arguments::new(&raw, None))
    }

    // ── creation ──────────────────────────────────────────────────────────

    #[test]
    fn deferred_owner_starts_uninitialized() {
        let driver = FakeDriver::new();
        let ctx = owner(&driver);
        assert_eq!(ctx.state(), ContextState::Uninitialized);
        assert!(ctx.context().is_none());
        assert!(driver.calls().is_empty());
    }

    #[test]
    fn eager_create_activates_in_order() {
        let driver = FakeDriver::new();
        let raw = args();
        let ctx = WindowlessContext::create(
            driver.clone(),
            &Arguments::new(&raw, None),
            &Configuration::default(),
        )
        .expect("fake driver never fails");

        assert!(ctx.is_active());
        assert_eq!(
            driver.calls(),
            vec![
                Call::CreateWindow(1),
                Call::AcquireDeviceContext(2),
                Call::CreateRenderingContext(3),
                Call::MakeCurrent(3),
                Call::LoadContext(3),
            ]
        );
        assert_eq!(driver.current(), Some(3));
        assert_eq!(ctx.context().map(|c| c.rendering_context), Some(3));
    }

    #[test]
    fn configuration_reaches_the_device_context_step() {
        let driver = FakeDriver::new();
        let mut ctx = owner(&driver);
        let config = Configuration::new().with_depth_bits(16).with_double_buffer(false);
        assert!(ctx.try_create_context(&config));
        assert_eq!(driver.last_format(), Some(*config.pixel_format()));
    }

    // ── failure rollback ──────────────────────────────────────────────────

    #[test]
    fn try_create_rolls_back_every_failure_point() {
        for fault in Fault::ALL {
            let driver = FakeDriver::failing(fault);
            let mut ctx = owner(&driver);

            assert!(!ctx.try_create_context(&Configuration::default()), "{fault:?}");
            assert_eq!(ctx.state(), ContextState::Uninitialized, "{fault:?}");
            assert_eq!(driver.live_handles(), 0, "leaked handles after {fault:?}");
            assert_eq!(driver.current(), None, "{fault:?}");
        }
    }

    #[test]
    fn eager_create_fails_on_every_failure_point() {
        for fault in Fault::ALL {
            let driver = FakeDriver::failing(fault);
            let raw = args();
            let result = WindowlessContext::create(
                driver.clone(),
                &Arguments::new(&raw, None),
                &Configuration::default(),
            );

            let err = result.err().expect("fault must surface");
            let root = err.downcast_ref::<ContextError>().expect("root cause is ContextError");
            let expected = match fault {
                Fault::Surface => matches!(root, ContextError::SurfaceCreation { .. }),
                Fault::PixelFormat => matches!(root, ContextError::PixelFormatUnavailable { .. }),
                Fault::ContextCreation => matches!(root, ContextError::ContextCreation { .. }),
                Fault::MakeCurrent => matches!(root, ContextError::MakeCurrent { .. }),
                Fault::Load => matches!(root, ContextError::ContextCreation { .. }),
            };
            assert!(expected, "{fault:?} reported as {root:?}");
            assert!(format!("{err:#}").contains(root.step()));
            assert_eq!(driver.live_handles(), 0, "leaked handles after {fault:?}");
        }
    }

    #[test]
    fn make_current_failure_unwinds_in_reverse() {
        let driver = FakeDriver::failing(Fault::MakeCurrent);
        let mut ctx = owner(&driver);
        assert!(!ctx.try_create_context(&Configuration::default()));
        assert_eq!(
            driver.teardown_calls(),
            vec![
                Call::DeleteRenderingContext(3),
                Call::ReleaseDeviceContext(2),
                Call::DestroyWindow(1),
            ]
        );
    }

    #[test]
    fn load_failure_detaches_the_current_context_first() {
        let driver = FakeDriver::failing(Fault::Load);
        let mut ctx = owner(&driver);
        assert!(!ctx.try_create_context(&Configuration::default()));

        assert_eq!(
            driver.teardown_calls(),
            vec![
                Call::ReleaseCurrent(2),
                Call::DeleteRenderingContext(3),
                Call::ReleaseDeviceContext(2),
                Call::DestroyWindow(1),
            ]
        );
        assert_eq!(driver.current(), None);
        assert_eq!(driver.live_handles(), 0);
        assert_eq!(ctx.state(), ContextState::Uninitialized);
    }

    #[test]
    fn surface_failure_issues_no_teardown() {
        let driver = FakeDriver::failing(Fault::Surface);
        let mut ctx = owner(&driver);
        assert!(!ctx.try_create_context(&Configuration::default()));
        assert!(driver.calls().is_empty());
    }

    #[test]
    fn retry_succeeds_once_fault_is_cleared() {
        let driver = FakeDriver::failing(Fault::ContextCreation);
        let mut ctx = owner(&driver);

        assert!(!ctx.try_create_context(&Configuration::default()));
        assert_eq!(ctx.state(), ContextState::Uninitialized);

        driver.set_fault(None);
        assert!(ctx.try_create_context(&Configuration::default()));
        assert_eq!(ctx.state(), ContextState::Active);
        assert_eq!(driver.live_handles(), 3);
    }

    #[test]
    fn second_creation_is_refused_and_keeps_context() {
        let driver = FakeDriver::new();
        let mut ctx = owner(&driver);
        assert!(ctx.try_create_context(&Configuration::default()));
        driver.clear_calls();

        assert!(!ctx.try_create_context(&Configuration::default()));
        let err = ctx.create_context(&Configuration::default()).unwrap_err();
        assert_eq!(err.downcast_ref::<ContextError>(), Some(&ContextError::AlreadyCreated));

        assert!(ctx.is_active());
        assert!(driver.calls().is_empty());
    }

    // ── host window ───────────────────────────────────────────────────────

    #[test]
    fn host_window_anchors_the_context_without_a_second_window() {
        let driver = FakeDriver::new();
        let mut ctx = hosted_owner(&driver, win32_host());
        assert!(ctx.try_create_context(&Configuration::default()));

        assert_eq!(
            driver.calls(),
            vec![
                Call::AdoptWindow(HOST),
                Call::AcquireDeviceContext(1),
                Call::CreateRenderingContext(2),
                Call::MakeCurrent(2),
                Call::LoadContext(2),
            ]
        );
        assert_eq!(driver.live_handles(), 2);
    }

    #[test]
    fn host_window_survives_teardown() {
        let driver = FakeDriver::new();
        let mut ctx = hosted_owner(&driver, win32_host());
        assert!(ctx.try_create_context(&Configuration::default()));
        driver.clear_calls();

        drop(ctx);

        assert_eq!(
            driver.calls(),
            vec![
                Call::ReleaseCurrent(1),
                Call::DeleteRenderingContext(2),
                Call::ReleaseDeviceContext(1),
            ]
        );
        assert_eq!(driver.live_handles(), 0);
    }

    #[test]
    fn host_window_survives_rollback() {
        for fault in [Fault::PixelFormat, Fault::MakeCurrent, Fault::Load] {
            let driver = FakeDriver::failing(fault);
            let mut ctx = hosted_owner(&driver, win32_host());
            assert!(!ctx.try_create_context(&Configuration::default()), "{fault:?}");
            assert!(
                !driver.calls().contains(&Call::DestroyWindow(HOST)),
                "host window destroyed after {fault:?}"
            );
            assert_eq!(driver.live_handles(), 0, "{fault:?}");
        }
    }

    #[test]
    fn foreign_host_window_falls_back_to_a_hidden_one() {
        let driver = FakeDriver::new();
        let host = RawWindowHandle::Xlib(XlibWindowHandle::new(5));
        let mut ctx = hosted_owner(&driver, host);
        assert!(ctx.try_create_context(&Configuration::default()));
        assert_eq!(driver.calls().first(), Some(&Call::CreateWindow(1)));

        drop(ctx);
        assert_eq!(driver.teardown_calls().last(), Some(&Call::DestroyWindow(1)));
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn drop_of_active_owner_releases_in_reverse_order() {
        let driver = FakeDriver::new();
        let mut ctx = owner(&driver);
        assert!(ctx.try_create_context(&Configuration::default()));
        driver.clear_calls();

        drop(ctx);

        assert_eq!(
            driver.calls(),
            vec![
                Call::ReleaseCurrent(2),
                Call::DeleteRenderingContext(3),
                Call::ReleaseDeviceContext(2),
                Call::DestroyWindow(1),
            ]
        );
        assert_eq!(driver.live_handles(), 0);
        assert_eq!(driver.current(), None);
    }

    #[test]
    fn drop_of_uninitialized_owner_is_silent() {
        let driver = FakeDriver::new();
        drop(owner(&driver));
        assert!(driver.calls().is_empty());
    }

    #[test]
    fn drop_after_failed_attempt_is_silent() {
        let driver = FakeDriver::failing(Fault::PixelFormat);
        let mut ctx = owner(&driver);
        assert!(!ctx.try_create_context(&Configuration::default()));
        driver.clear_calls();

        drop(ctx);
        assert!(driver.calls().is_empty());
    }
}
