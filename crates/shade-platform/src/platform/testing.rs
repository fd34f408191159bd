//! Recording, fault-injecting driver for lifecycle tests.

use std::cell::RefCell;
use std::rc::Rc;

use raw_window_handle::RawWindowHandle;

use super::{ContextDriver, ContextError, PixelFormat};

/// Driver call as seen by the fake, with the handle it concerned.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Call {
    AdoptWindow(u32),
    CreateWindow(u32),
    AcquireDeviceContext(u32),
    CreateRenderingContext(u32),
    MakeCurrent(u32),
    LoadContext(u32),
    ReleaseCurrent(u32),
    DeleteRenderingContext(u32),
    ReleaseDeviceContext(u32),
    DestroyWindow(u32),
}

impl Call {
    pub fn is_teardown(&self) -> bool {
        matches!(
            self,
            Call::ReleaseCurrent(_)
                | Call::DeleteRenderingContext(_)
                | Call::ReleaseDeviceContext(_)
                | Call::DestroyWindow(_)
        )
    }
}

/// Creation step the fake refuses.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Fault {
    Surface,
    PixelFormat,
    ContextCreation,
    MakeCurrent,
    Load,
}

impl Fault {
    pub const ALL: [Fault; 5] = [
        Fault::Surface,
        Fault::PixelFormat,
        Fault::ContextCreation,
        Fault::MakeCurrent,
        Fault::Load,
    ];
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<Call>,
    fault: Option<Fault>,
    next_handle: u32,
    windows: usize,
    device_contexts: usize,
    rendering_contexts: usize,
    current: Option<u32>,
    last_format: Option<PixelFormat>,
}

impl Recorder {
    fn handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

/// Clones share one recorder, so a test keeps a clone to inspect calls after
/// the owner under test has been dropped.
#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    state: Rc<RefCell<Recorder>>,
}

/// Context object handed out by [`FakeDriver`].
#[derive(Debug, Eq, PartialEq)]
pub struct FakeContext {
    pub rendering_context: u32,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(fault: Fault) -> Self {
        let driver = Self::new();
        driver.set_fault(Some(fault));
        driver
    }

    pub fn set_fault(&self, fault: Option<Fault>) {
        self.state.borrow_mut().fault = fault;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn teardown_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_teardown).collect()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Windows, device contexts and rendering contexts still alive.
    pub fn live_handles(&self) -> usize {
        let s = self.state.borrow();
        s.windows + s.device_contexts + s.rendering_contexts
    }

    pub fn current(&self) -> Option<u32> {
        self.state.borrow().current
    }

    pub fn last_format(&self) -> Option<PixelFormat> {
        self.state.borrow().last_format
    }

    fn faulted(&self, fault: Fault) -> bool {
        self.state.borrow().fault == Some(fault)
    }
}

impl ContextDriver for FakeDriver {
    type Window = u32;
    type DeviceContext = u32;
    type RenderingContext = u32;
    type Context = FakeContext;

    /// Adopts Win32 handles only, recording the raw `hwnd` as the window.
    fn adopt_window(&mut self, host: RawWindowHandle) -> Option<u32> {
        let RawWindowHandle::Win32(handle) = host else {
            return None;
        };
        let window = u32::try_from(handle.hwnd.get()).ok()?;
        self.state.borrow_mut().calls.push(Call::AdoptWindow(window));
        Some(window)
    }

    fn create_hidden_window(&mut self) -> Result<u32, ContextError> {
        if self.faulted(Fault::Surface) {
            return Err(ContextError::surface_creation("injected"));
        }
        let mut s = self.state.borrow_mut();
        let window = s.handle();
        s.windows += 1;
        s.calls.push(Call::CreateWindow(window));
        Ok(window)
    }

    fn acquire_device_context(
        &mut self,
        _window: u32,
        format: &PixelFormat,
    ) -> Result<u32, ContextError> {
        if self.faulted(Fault::PixelFormat) {
            return Err(ContextError::pixel_format_unavailable("injected"));
        }
        let mut s = self.state.borrow_mut();
        let dc = s.handle();
        s.device_contexts += 1;
        s.last_format = Some(*format);
        s.calls.push(Call::AcquireDeviceContext(dc));
        Ok(dc)
    }

    fn create_rendering_context(&mut self, _device_context: u32) -> Result<u32, ContextError> {
        if self.faulted(Fault::ContextCreation) {
            return Err(ContextError::context_creation("injected"));
        }
        let mut s = self.state.borrow_mut();
        let rc = s.handle();
        s.rendering_contexts += 1;
        s.calls.push(Call::CreateRenderingContext(rc));
        Ok(rc)
    }

    fn make_current(
        &mut self,
        rendering_context: u32,
        _device_context: u32,
    ) -> Result<(), ContextError> {
        if self.faulted(Fault::MakeCurrent) {
            return Err(ContextError::make_current("injected"));
        }
        let mut s = self.state.borrow_mut();
        s.current = Some(rendering_context);
        s.calls.push(Call::MakeCurrent(rendering_context));
        Ok(())
    }

    fn load_context(
        &mut self,
        _device_context: u32,
        rendering_context: u32,
    ) -> Result<FakeContext, ContextError> {
        if self.faulted(Fault::Load) {
            return Err(ContextError::context_creation("injected"));
        }
        self.state.borrow_mut().calls.push(Call::LoadContext(rendering_context));
        Ok(FakeContext { rendering_context })
    }

    fn release_current(&mut self, device_context: u32) {
        let mut s = self.state.borrow_mut();
        s.current = None;
        s.calls.push(Call::ReleaseCurrent(device_context));
    }

    fn delete_rendering_context(&mut self, rendering_context: u32) {
        let mut s = self.state.borrow_mut();
        s.rendering_contexts -= 1;
        s.calls.push(Call::DeleteRenderingContext(rendering_context));
    }

    fn release_device_context(&mut self, _window: u32, device_context: u32) {
        let mut s = self.state.borrow_mut();
        s.device_contexts -= 1;
        s.calls.push(Call::ReleaseDeviceContext(device_context));
    }

    fn destroy_window(&mut self, window: u32) {
        let mut s = self.state.borrow_mut();
        s.windows -= 1;
        s.calls.push(Call::DestroyWindow(window));
    }
}
