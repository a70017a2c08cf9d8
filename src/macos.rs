use std::mem::size_of_val;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use nix::errno::Errno;
use tracing::debug;

use crate::sys::{self, CtlInfo, SockaddrCtl};
use crate::{Device, Error, InterfaceRequest, OpenOptions};

/// Runs the kernel control handshake for `req`.
///
/// The socket lives in an `OwnedFd` from creation on, so any early return closes it.
pub(crate) fn open(req: InterfaceRequest, opts: &OpenOptions) -> Result<Device, Error> {
    let fd = control_socket()?;
    debug!("created kernel control socket {}", fd.as_raw_fd());

    if opts.cloexec {
        sys::set_cloexec(fd.as_raw_fd()).map_err(Error::ModeConfiguration)?;
    }

    let ctl_id = resolve_ctl_id(&fd)?;
    debug!("resolved utun control id {}", ctl_id);

    bind_unit(&fd, ctl_id, req.control_unit())?;
    debug!("connected {} as control unit {}", req, req.control_unit());

    let name = unsafe { sys::get_iface_name(fd.as_raw_fd()) }.map_err(Error::NameRetrieval)?;
    debug!("kernel assigned interface {}", name);

    if opts.nonblocking {
        sys::set_nonblocking(fd.as_raw_fd()).map_err(Error::ModeConfiguration)?;
    }

    Ok(Device::new(fd, name))
}

fn control_socket() -> Result<OwnedFd, Error> {
    match unsafe { libc::socket(sys::AF_SYSTEM, libc::SOCK_DGRAM, sys::SYSPROTO_CONTROL) } {
        -1 => Err(Error::SocketCreation(Errno::last())),
        fd => Ok(unsafe { OwnedFd::from_raw_fd(fd) }),
    }
}

fn resolve_ctl_id(fd: &OwnedFd) -> Result<u32, Error> {
    let mut info = CtlInfo::utun();
    unsafe { sys::ioctl_ctl_info(fd.as_raw_fd(), &mut info) }.map_err(Error::ControllerLookup)?;
    Ok(info.ctl_id)
}

fn bind_unit(fd: &OwnedFd, ctl_id: u32, control_unit: u32) -> Result<(), Error> {
    let addr = SockaddrCtl::new(ctl_id, control_unit);
    Errno::result(unsafe {
        libc::connect(
            fd.as_raw_fd(),
            &addr as *const SockaddrCtl as *const libc::sockaddr,
            size_of_val(&addr) as libc::socklen_t,
        )
    })
    .map_err(Error::UnitBind)?;
    Ok(())
}
