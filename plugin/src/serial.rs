//! Fixed-layout encode/decode cursors for plugin payloads. Values are
//! written field by field in native byte order, with no padding, tags, or
//! length prefixes; both sides must agree on the exact layout.

use crate::types::PluginError;

/// Sequential writer over a host-sized buffer.
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn put_f32(&mut self, value: f32) {
        self.put_bytes(&value.to_ne_bytes());
    }

    pub fn put_i32(&mut self, value: i32) {
        self.put_bytes(&value.to_ne_bytes());
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        assert!(end <= self.buf.len(), "serialization overruns its buffer");
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

    /// End-pointer check: the buffer must have been filled exactly.
    pub fn finish(self) {
        assert_eq!(self.pos, self.buf.len(), "serialization did not fill its buffer");
    }
}

/// Sequential reader over a serialized payload.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn take_f32(&mut self) -> Result<f32, PluginError> {
        Ok(f32::from_ne_bytes(self.take_bytes()?))
    }

    pub fn take_i32(&mut self) -> Result<i32, PluginError> {
        Ok(i32::from_ne_bytes(self.take_bytes()?))
    }

    fn take_bytes<const N: usize>(&mut self) -> Result<[u8; N], PluginError> {
        let end = self.pos + N;
        if end > self.buf.len() {
            return Err(PluginError::MalformedPayload {
                expected: end,
                found: self.buf.len(),
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..end]);
        self.pos = end;
        Ok(out)
    }

    /// The payload must have been consumed exactly; trailing bytes are a
    /// malformed payload, never silently ignored.
    pub fn finish(self) -> Result<(), PluginError> {
        if self.pos != self.buf.len() {
            return Err(PluginError::MalformedPayload {
                expected: self.pos,
                found: self.buf.len(),
            });
        }
        Ok(())
    }
}
