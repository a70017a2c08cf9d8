//! Open macOS `utun` interfaces.
//!
//! ```no_run
//! # fn main() -> Result<(), utun::Error> {
//! let device = utun::open("utun10")?;
//! println!("opened {}", device.name());
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "tokio")]
mod async_device;
mod device;
mod error;
#[cfg(target_os = "macos")]
mod macos;
mod name;
pub mod sys;

#[cfg(feature = "tokio")]
pub use async_device::AsyncDevice;
pub use device::Device;
pub use error::Error;
pub use name::{InterfaceRequest, IFACE_PREFIX};

use tracing::debug;

/// Options for opening a utun device.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    cloexec: bool,
    nonblocking: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            cloexec: true,
            nonblocking: true,
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the control socket close-on-exec. Enabled by default.
    pub fn cloexec(mut self, cloexec: bool) -> Self {
        self.cloexec = cloexec;
        self
    }

    /// Switch the returned descriptor to non-blocking mode. Enabled by default.
    pub fn nonblocking(mut self, nonblocking: bool) -> Self {
        self.nonblocking = nonblocking;
        self
    }

    /// Opens the interface `name`, which must look like `utun<N>`.
    ///
    /// The kernel refuses units that are already taken, so at most one caller
    /// can hold a given unit. The returned [`Device::name`] is the name reported
    /// by the kernel.
    pub fn open(&self, name: &str) -> Result<Device, Error> {
        let req = InterfaceRequest::parse(name)?;
        debug!("opening {} with {:?}", req, self);
        self.open_request(req)
    }

    #[cfg(target_os = "macos")]
    fn open_request(&self, req: InterfaceRequest) -> Result<Device, Error> {
        macos::open(req, self)
    }

    #[cfg(not(target_os = "macos"))]
    fn open_request(&self, _req: InterfaceRequest) -> Result<Device, Error> {
        Err(Error::Unsupported)
    }
}

/// Opens `name` with the default [`OpenOptions`].
pub fn open(name: &str) -> Result<Device, Error> {
    OpenOptions::default().open(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = OpenOptions::new();
        assert!(opts.cloexec);
        assert!(opts.nonblocking);

        let opts = OpenOptions::new().cloexec(false).nonblocking(false);
        assert!(!opts.cloexec);
        assert!(!opts.nonblocking);
    }

    #[test]
    fn test_open_validates_before_syscalls() {
        assert!(matches!(open("tun"), Err(Error::InvalidName)));
        assert!(matches!(open("utun"), Err(Error::InvalidUnit)));
        assert!(matches!(open("utun-1"), Err(Error::InvalidUnit)));
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_open_unsupported() {
        assert!(matches!(open("utun10"), Err(Error::Unsupported)));
    }
}
