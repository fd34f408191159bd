//! Native WGL driver.
//!
//! Plain Win32: a hidden `CS_OWNDC` window, `GetDC`, a classic
//! `ChoosePixelFormat`/`SetPixelFormat` negotiation and `wglCreateContext`.

use std::ffi::{CStr, c_void};
use std::mem;
use std::ptr;
use std::sync::OnceLock;

use raw_window_handle::RawWindowHandle;
use windows_sys::Win32::Foundation::{
    ERROR_CLASS_ALREADY_EXISTS, FreeLibrary, GetLastError, HINSTANCE, HMODULE, HWND,
};
use windows_sys::Win32::Graphics::Gdi::{GetDC, HDC, ReleaseDC};
use windows_sys::Win32::Graphics::OpenGL::{
    ChoosePixelFormat, DescribePixelFormat, HGLRC, PFD_DOUBLEBUFFER, PFD_DRAW_TO_WINDOW,
    PFD_GENERIC_ACCELERATED, PFD_GENERIC_FORMAT, PFD_MAIN_PLANE, PFD_SUPPORT_OPENGL,
    PFD_TYPE_RGBA, PIXELFORMATDESCRIPTOR, SetPixelFormat, wglCreateContext, wglDeleteContext,
    wglGetProcAddress, wglMakeCurrent,
};
use windows_sys::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress, LoadLibraryA};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    CS_OWNDC, CW_USEDEFAULT, CreateWindowExW, DefWindowProcW, DestroyWindow, RegisterClassExW,
    WNDCLASSEXW, WS_OVERLAPPEDWINDOW,
};

use super::{ContextDriver, ContextError, PixelFormat};
use crate::gl::GlContext;

const WINDOW_CLASS: &str = "ShadeWindowlessAnchor";

/// Set once the anchor window class exists in this process. Never unregistered.
static CLASS_REGISTERED: OnceLock<()> = OnceLock::new();

/// WGL implementation of [`ContextDriver`].
///
/// Holds raw Win32 pointers and is therefore confined to the thread that
/// created it. The `opengl32.dll` reference taken for function loading is
/// dropped with the driver, after the owner has deleted its context.
#[derive(Debug, Default)]
pub struct WglDriver {
    opengl32: Option<HMODULE>,
}

impl WglDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn opengl32(&mut self) -> Result<HMODULE, ContextError> {
        if let Some(module) = self.opengl32 {
            return Ok(module);
        }

        let module = unsafe { LoadLibraryA(c"opengl32.dll".as_ptr().cast()) };
        if module.is_null() {
            return Err(ContextError::context_creation(format!(
                "cannot load opengl32.dll ({})",
                last_error()
            )));
        }

        self.opengl32 = Some(module);
        Ok(module)
    }
}

impl Drop for WglDriver {
    fn drop(&mut self) {
        if let Some(module) = self.opengl32.take() {
            if unsafe { FreeLibrary(module) } == 0 {
                log::warn!("FreeLibrary(opengl32.dll) failed ({})", last_error());
            }
        }
    }
}

impl ContextDriver for WglDriver {
    type Window = HWND;
    type DeviceContext = HDC;
    type RenderingContext = HGLRC;
    type Context = GlContext;

    fn adopt_window(&mut self, host: RawWindowHandle) -> Option<HWND> {
        match host {
            RawWindowHandle::Win32(handle) => Some(handle.hwnd.get() as HWND),
            _ => None,
        }
    }

    fn create_hidden_window(&mut self) -> Result<HWND, ContextError> {
        let instance = unsafe { GetModuleHandleW(ptr::null()) };
        register_window_class(instance)?;

        let class = wide(WINDOW_CLASS);
        // No WS_VISIBLE: the window is never shown.
        let window = unsafe {
            CreateWindowExW(
                0,
                class.as_ptr(),
                class.as_ptr(),
                WS_OVERLAPPEDWINDOW,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                32,
                32,
                ptr::null_mut(),
                ptr::null_mut(),
                instance,
                ptr::null(),
            )
        };

        if window.is_null() {
            return Err(ContextError::surface_creation(format!(
                "CreateWindowExW failed ({})",
                last_error()
            )));
        }
        Ok(window)
    }

    fn acquire_device_context(
        &mut self,
        window: HWND,
        format: &PixelFormat,
    ) -> Result<HDC, ContextError> {
        let dc = unsafe { GetDC(window) };
        if dc.is_null() {
            return Err(ContextError::pixel_format_unavailable(format!(
                "GetDC failed ({})",
                last_error()
            )));
        }

        // SAFETY: `dc` was just obtained from a live window.
        if let Err(err) = unsafe { configure_pixel_format(dc, format) } {
            unsafe { ReleaseDC(window, dc) };
            return Err(err);
        }
        Ok(dc)
    }

    fn create_rendering_context(&mut self, device_context: HDC) -> Result<HGLRC, ContextError> {
        let rc = unsafe { wglCreateContext(device_context) };
        if rc.is_null() {
            return Err(ContextError::context_creation(format!(
                "wglCreateContext failed ({})",
                last_error()
            )));
        }
        Ok(rc)
    }

    fn make_current(
        &mut self,
        rendering_context: HGLRC,
        device_context: HDC,
    ) -> Result<(), ContextError> {
        if unsafe { wglMakeCurrent(device_context, rendering_context) } == 0 {
            return Err(ContextError::make_current(format!(
                "wglMakeCurrent failed ({})",
                last_error()
            )));
        }
        Ok(())
    }

    fn load_context(
        &mut self,
        _device_context: HDC,
        _rendering_context: HGLRC,
    ) -> Result<GlContext, ContextError> {
        let opengl32 = self.opengl32()?;

        // SAFETY: the rendering context is current on this thread, which is
        // what `wglGetProcAddress` and glow's GL_VERSION query require.
        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|name| proc_address(opengl32, name))
        };
        Ok(GlContext::new(gl))
    }

    fn release_current(&mut self, device_context: HDC) {
        if unsafe { wglMakeCurrent(device_context, ptr::null_mut()) } == 0 {
            log::warn!("wglMakeCurrent(null) failed ({})", last_error());
        }
    }

    fn delete_rendering_context(&mut self, rendering_context: HGLRC) {
        if unsafe { wglDeleteContext(rendering_context) } == 0 {
            log::warn!("wglDeleteContext failed ({})", last_error());
        }
    }

    fn release_device_context(&mut self, window: HWND, device_context: HDC) {
        if unsafe { ReleaseDC(window, device_context) } == 0 {
            log::warn!("ReleaseDC failed");
        }
    }

    fn destroy_window(&mut self, window: HWND) {
        if unsafe { DestroyWindow(window) } == 0 {
            log::warn!("DestroyWindow failed ({})", last_error());
        }
    }
}

fn register_window_class(instance: HINSTANCE) -> Result<(), ContextError> {
    if CLASS_REGISTERED.get().is_some() {
        return Ok(());
    }

    let class_name = wide(WINDOW_CLASS);
    let class = WNDCLASSEXW {
        cbSize: mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_OWNDC,
        lpfnWndProc: Some(DefWindowProcW),
        cbClsExtra: 0,
        cbWndExtra: 0,
        hInstance: instance,
        hIcon: ptr::null_mut(),
        hCursor: ptr::null_mut(),
        hbrBackground: ptr::null_mut(),
        lpszMenuName: ptr::null(),
        lpszClassName: class_name.as_ptr(),
        hIconSm: ptr::null_mut(),
    };

    if unsafe { RegisterClassExW(&class) } == 0 {
        let code = unsafe { GetLastError() };
        // Another thread won the race; the class is usable either way.
        if code != ERROR_CLASS_ALREADY_EXISTS {
            return Err(ContextError::surface_creation(format!(
                "RegisterClassExW failed (error {code})"
            )));
        }
    }

    log::debug!("registered window class {WINDOW_CLASS}");
    CLASS_REGISTERED.get_or_init(|| ());
    Ok(())
}

/// # Safety
///
/// `dc` must be a valid device context with no pixel format set yet.
unsafe fn configure_pixel_format(dc: HDC, format: &PixelFormat) -> Result<(), ContextError> {
    let requested = descriptor(format);

    let index = unsafe { ChoosePixelFormat(dc, &requested) };
    if index == 0 {
        return Err(ContextError::pixel_format_unavailable(format!(
            "ChoosePixelFormat found no match for {format:?} ({})",
            last_error()
        )));
    }

    let mut chosen: PIXELFORMATDESCRIPTOR = unsafe { mem::zeroed() };
    let described = unsafe {
        DescribePixelFormat(
            dc,
            index,
            mem::size_of::<PIXELFORMATDESCRIPTOR>() as u32,
            &mut chosen,
        )
    };
    if described == 0 {
        return Err(ContextError::pixel_format_unavailable(format!(
            "DescribePixelFormat({index}) failed ({})",
            last_error()
        )));
    }

    if !is_accelerated(chosen.dwFlags as u32) {
        return Err(ContextError::pixel_format_unavailable(format!(
            "pixel format {index} is not hardware accelerated"
        )));
    }

    if unsafe { SetPixelFormat(dc, index, &chosen) } == 0 {
        return Err(ContextError::pixel_format_unavailable(format!(
            "SetPixelFormat({index}) failed ({})",
            last_error()
        )));
    }

    log::debug!(
        "pixel format {index}: {} color / {} depth / {} stencil bits",
        chosen.cColorBits,
        chosen.cDepthBits,
        chosen.cStencilBits
    );
    Ok(())
}

fn descriptor(format: &PixelFormat) -> PIXELFORMATDESCRIPTOR {
    let mut flags = PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL;
    if format.double_buffered {
        flags |= PFD_DOUBLEBUFFER;
    }

    // SAFETY: PIXELFORMATDESCRIPTOR is plain data; all-zero is a valid value.
    let mut pfd: PIXELFORMATDESCRIPTOR = unsafe { mem::zeroed() };
    pfd.nSize = mem::size_of::<PIXELFORMATDESCRIPTOR>() as u16;
    pfd.nVersion = 1;
    pfd.dwFlags = flags as _;
    pfd.iPixelType = PFD_TYPE_RGBA as _;
    pfd.cColorBits = format.color_bits;
    pfd.cDepthBits = format.depth_bits;
    pfd.cStencilBits = format.stencil_bits;
    pfd.iLayerType = PFD_MAIN_PLANE as _;
    pfd
}

/// Generic (GDI software) formats only count when the ICD accelerates them.
fn is_accelerated(flags: u32) -> bool {
    let generic = flags & PFD_GENERIC_FORMAT as u32 != 0;
    let accelerated = flags & PFD_GENERIC_ACCELERATED as u32 != 0;
    !generic || accelerated
}

/// Resolves a GL entry point, falling back to `opengl32.dll` for the GL 1.1
/// functions `wglGetProcAddress` does not return.
fn proc_address(opengl32: HMODULE, name: &CStr) -> *const c_void {
    let address = unsafe { wglGetProcAddress(name.as_ptr().cast()) }.map_or(0, |f| f as usize);

    // 1, 2, 3 and -1 are documented failure sentinels on some drivers.
    if matches!(address as isize, 0 | 1 | 2 | 3 | -1) {
        unsafe { GetProcAddress(opengl32, name.as_ptr().cast()) }
            .map_or(ptr::null(), |f| f as *const c_void)
    } else {
        address as *const c_void
    }
}

fn last_error() -> String {
    format!("error {}", unsafe { GetLastError() })
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
