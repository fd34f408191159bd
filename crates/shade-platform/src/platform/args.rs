use raw_window_handle::RawWindowHandle;

/// Process arguments plus the host window handle, as handed to the application
/// hook by [`run`](super::run).
///
/// Borrowed for the duration of the hook; nothing here is owned.
#[derive(Debug, Copy, Clone)]
pub struct Arguments<'a> {
    args: &'a [String],
    window: Option<RawWindowHandle>,
}

impl<'a> Arguments<'a> {
    pub fn new(args: &'a [String], window: Option<RawWindowHandle>) -> Self {
        Self { args, window }
    }

    /// Raw arguments, program name first. Not parsed.
    pub fn args(&self) -> &'a [String] {
        self.args
    }

    pub fn argc(&self) -> usize {
        self.args.len()
    }

    pub fn program(&self) -> Option<&'a str> {
        self.args.first().map(String::as_str)
    }

    /// Hidden host window created by the entry-point driver, if any. The
    /// context owner draws through it and leaves its destruction to the
    /// entry point.
    pub fn window(&self) -> Option<RawWindowHandle> {
        self.window
    }
}
