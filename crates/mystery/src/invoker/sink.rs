use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Where an embedded runtime's print calls land
///
/// Shared by every run in a session. A run swaps its own buffer in with
/// [`PrintTarget::redirect`] and the previous sink comes back when the guard
/// is dropped.
pub struct PrintTarget {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl PrintTarget {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
        }
    }

    /// Write `text` to whichever sink is current
    pub fn print(&self, text: &str) -> io::Result<()> {
        let mut sink = self.lock();
        sink.write_all(text.as_bytes())?;
        sink.flush()
    }

    /// Swap `sink` in until the returned guard is dropped
    #[must_use = "the previous sink is restored as soon as the guard is dropped"]
    pub fn redirect(&self, sink: impl Write + Send + 'static) -> SinkGuard<'_> {
        let previous = std::mem::replace(&mut *self.lock(), Box::new(sink));
        SinkGuard {
            target: self,
            previous: Some(previous),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        // A panic mid-print leaves the sink usable.
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for PrintTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrintTarget").finish_non_exhaustive()
    }
}

/// Restores the previous sink of a [`PrintTarget`] on drop
pub struct SinkGuard<'a> {
    target: &'a PrintTarget,
    previous: Option<Box<dyn Write + Send>>,
}

impl Drop for SinkGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *self.target.lock() = previous;
        }
    }
}

/// In-memory sink that can be read while clones are still writing
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, decoded lossily
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
