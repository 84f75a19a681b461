use std::io::Write;

/// The process environment a command runs in: its two output streams and its exit.
///
/// Commands never touch stdout, stderr or `process::exit` directly, so they can be driven from
/// tests with captured output.
pub trait Host: Send + Sync {
    /// Stream for results.
    fn output(&mut self) -> impl Write;

    /// Stream for diagnostics.
    fn error(&mut self) -> impl Write;

    /// End the process with `code`. Test hosts only record it.
    fn exit(&mut self, code: i32);
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct TestHost {
    pub output_buf: Vec<u8>,
    pub error_buf: Vec<u8>,
    pub exit_code: Option<i32>,
}

#[cfg(test)]
impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written to the output stream so far.
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }
}

#[cfg(test)]
impl Host for TestHost {
    fn output(&mut self) -> impl Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl Write {
        &mut self.error_buf
    }

    fn exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}
