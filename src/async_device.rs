use std::io::{self, Read, Write};

use nix::errno::Errno;
use tokio::io::unix::AsyncFd;
use tracing::debug;

use crate::{Device, Error};

/// A [`Device`] registered with the tokio reactor.
#[derive(Debug)]
pub struct AsyncDevice {
    fd: AsyncFd<Device>,
}

impl AsyncDevice {
    /// The device must already be non-blocking, which is what [`crate::open`] returns.
    ///
    /// On failure the device is dropped, closing the interface. Use [`AsyncDevice::try_new`]
    /// to keep it.
    pub fn new(device: Device) -> Result<Self, Error> {
        Self::try_new(device).map_err(|(_, e)| e)
    }

    /// Like [`AsyncDevice::new`], but hands the device back when it cannot be registered.
    pub fn try_new(device: Device) -> Result<Self, (Device, Error)> {
        match device.is_nonblocking() {
            Ok(true) => {}
            Ok(false) => return Err((device, Error::ModeConfiguration(Errno::EINVAL))),
            Err(e) => return Err((device, e)),
        }
        match AsyncFd::try_new(device) {
            Ok(fd) => Ok(Self { fd }),
            Err(e) => {
                let (device, e) = e.into_parts();
                Err((device, e.into()))
            }
        }
    }

    pub fn name(&self) -> &str {
        self.fd.get_ref().name()
    }

    pub async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.fd.readable().await?;
            match guard.try_io(|inner| inner.get_ref().read(buf)) {
                Ok(ret) => {
                    if let Ok(n) = &ret {
                        debug!("TUN read {} bytes", n);
                    }
                    return ret;
                }
                Err(_would_block) => continue,
            }
        }
    }

    pub async fn send(&self, buf: &[u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.fd.writable().await?;
            match guard.try_io(|inner| inner.get_ref().write(buf)) {
                Ok(ret) => return ret,
                Err(_would_block) => continue,
            }
        }
    }

    pub fn into_inner(self) -> Device {
        self.fd.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use std::os::fd::{AsRawFd, OwnedFd};
    use std::os::unix::net::UnixDatagram;

    use super::*;
    use crate::sys;

    fn device_pair(nonblocking: bool) -> (Device, UnixDatagram) {
        let (a, b) = UnixDatagram::pair().unwrap();
        let device = Device::new(OwnedFd::from(a), "utun3".to_owned());
        if nonblocking {
            sys::set_nonblocking(device.as_raw_fd()).unwrap();
        }
        (device, b)
    }

    #[tokio::test]
    async fn test_rejects_blocking_device() {
        let (device, _peer) = device_pair(false);
        let rv = AsyncDevice::new(device);
        assert!(matches!(rv, Err(Error::ModeConfiguration(Errno::EINVAL))));
    }

    #[tokio::test]
    async fn test_try_new_returns_device() {
        let (device, peer) = device_pair(false);
        let raw = device.as_raw_fd();

        let (device, e) = AsyncDevice::try_new(device).unwrap_err();
        assert!(matches!(e, Error::ModeConfiguration(Errno::EINVAL)));
        assert_eq!(device.as_raw_fd(), raw);
        assert_eq!(device.name(), "utun3");

        // Still open: the peer sees what the returned device writes.
        assert_eq!((&device).write(b"pkt").unwrap(), 3);
        let mut buf = [0u8; 4];
        assert_eq!(peer.recv(&mut buf).unwrap(), 3);

        sys::set_nonblocking(device.as_raw_fd()).unwrap();
        let device = AsyncDevice::try_new(device).map_err(|(_, e)| e).unwrap();
        assert_eq!(device.name(), "utun3");
    }

    #[tokio::test]
    async fn test_recv_send() {
        let (device, peer) = device_pair(true);
        let device = AsyncDevice::new(device).unwrap();
        assert_eq!(device.name(), "utun3");

        let peer = tokio::net::UnixDatagram::from_std({
            peer.set_nonblocking(true).unwrap();
            peer
        })
        .unwrap();

        let recv = tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let n = device.recv(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], &[0, 0, 0, 2, 0x45]);
            assert_eq!(device.send(&[0, 0, 0, 30, 0x60]).await.unwrap(), 5);
            device
        });

        peer.send(&[0, 0, 0, 2, 0x45]).await.unwrap();
        let mut buf = [0u8; 64];
        let n = peer.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0, 0, 0, 30, 0x60]);

        let device = recv.await.unwrap().into_inner();
        assert_eq!(device.name(), "utun3");
    }
}
