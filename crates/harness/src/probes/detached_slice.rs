use crate::assert::assert_throws;
use crate::{Context, Options, Probe, ProbeError};
use memprobe_rt_buffer::ArrayBuffer;
use memprobe_rt_core::ErrorClass;

/// Checks that slicing a detached buffer throws a `TypeError`, with and without explicit bounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetachedSliceProbe;

impl Probe for DetachedSliceProbe {
    fn name(&self) -> &'static str {
        "detached-buffer-slice"
    }

    fn description(&self) -> &'static str {
        "slicing a detached ArrayBuffer throws a TypeError"
    }

    fn required_options(&self) -> Options {
        *Options::new().debug_builtin(true)
    }

    fn default_options(&self) -> Options {
        *Options::new().debug_builtin(true).direct_byte_buffer(true)
    }

    fn run(&self, cx: &Context) -> Result<(), ProbeError> {
        let buffer = ArrayBuffer::new(8)?;
        cx.debug()?.typed_array_detach_buffer(&buffer)?;

        assert_throws(|| buffer.slice(Some(2), Some(6)), ErrorClass::TypeError)?;
        assert_throws(|| buffer.slice(None, None), ErrorClass::TypeError)?;
        Ok(())
    }
}
