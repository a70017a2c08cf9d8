use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd};

use crate::{sys, Error};

/// An opened utun interface.
///
/// Reads and writes go straight to the kernel control socket. Each read returns one
/// packet, prefixed by the 4-byte protocol family header the utun driver uses.
/// Dropping the device closes the socket, which destroys the interface.
#[derive(Debug)]
pub struct Device {
    fd: OwnedFd,
    name: String,
}

impl Device {
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    pub(crate) fn new(fd: OwnedFd, name: String) -> Self {
        Self { fd, name }
    }

    /// Interface name assigned by the kernel.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_nonblocking(&self) -> Result<bool, Error> {
        sys::is_nonblocking(self.fd.as_raw_fd()).map_err(Error::ModeConfiguration)
    }

    pub fn into_file(self) -> File {
        File::from(self.fd)
    }

    fn read_fd(&self, buf: &mut [u8]) -> io::Result<usize> {
        let ret = unsafe { libc::read(self.fd.as_raw_fd(), buf.as_mut_ptr() as _, buf.len()) };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(ret as usize)
        }
    }

    fn write_fd(&self, buf: &[u8]) -> io::Result<usize> {
        let ret = unsafe { libc::write(self.fd.as_raw_fd(), buf.as_ptr() as _, buf.len()) };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(ret as usize)
        }
    }
}

impl Read for Device {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_fd(buf)
    }
}

impl Read for &Device {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_fd(buf)
    }
}

impl Write for Device {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_fd(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Write for &Device {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_fd(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsFd for Device {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for Device {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl IntoRawFd for Device {
    fn into_raw_fd(self) -> RawFd {
        self.fd.into_raw_fd()
    }
}

impl From<Device> for OwnedFd {
    fn from(device: Device) -> Self {
        device.fd
    }
}
