//! Darwin kernel control ABI used to create utun interfaces.
//!
//! Layouts mirror `<sys/kern_control.h>`, `<sys/sys_domain.h>` and `<net/if_utun.h>`.
//! They are declared here rather than taken from `libc` so the byte layout can be
//! checked on every host.

use std::ffi::CStr;
use std::mem;
use std::os::fd::RawFd;

use libc::{c_int, c_ulong};
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};

/// `PF_SYSTEM` / `AF_SYSTEM`.
pub const AF_SYSTEM: c_int = 32;
/// Protocol of `PF_SYSTEM` sockets talking to kernel controls.
pub const SYSPROTO_CONTROL: c_int = 2;
/// `ss_sysaddr` subtype for kernel control addresses.
pub const AF_SYS_CONTROL: u16 = 2;
/// `getsockopt` option returning the interface name of a connected utun socket.
pub const UTUN_OPT_IFNAME: c_int = 2;
pub const MAX_KCTL_NAME: usize = 96;
/// Buffer handed to `UTUN_OPT_IFNAME`, terminator included.
pub const IFNAME_BUF_LEN: usize = 20;
/// `_IOWR('N', 3, struct ctl_info)`
pub const CTLIOCGINFO: c_ulong = 0xc0644e03;

pub const UTUN_CONTROL_NAME: &[u8] = b"com.apple.net.utun_control";

const _: () = assert!(UTUN_CONTROL_NAME.len() < MAX_KCTL_NAME);

/// `UTUN_CONTROL_NAME`, NUL padded to `MAX_KCTL_NAME`.
pub const CTRL_NAME: [u8; MAX_KCTL_NAME] = {
    let mut buf = [0u8; MAX_KCTL_NAME];
    let mut i = 0;
    while i < UTUN_CONTROL_NAME.len() {
        buf[i] = UTUN_CONTROL_NAME[i];
        i += 1;
    }
    buf
};

/// `struct ctl_info`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CtlInfo {
    pub ctl_id: u32,
    pub ctl_name: [u8; MAX_KCTL_NAME],
}

impl CtlInfo {
    /// Lookup request for the utun control; the kernel fills in `ctl_id`.
    pub fn utun() -> Self {
        Self {
            ctl_id: 0,
            ctl_name: CTRL_NAME,
        }
    }
}

/// `struct sockaddr_ctl`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SockaddrCtl {
    pub sc_len: u8,
    pub sc_family: u8,
    pub ss_sysaddr: u16,
    pub sc_id: u32,
    pub sc_unit: u32,
    pub sc_reserved: [u32; 5],
}

impl SockaddrCtl {
    /// `sc_len` carries the low byte of the control id, not the struct size.
    pub fn new(ctl_id: u32, control_unit: u32) -> Self {
        Self {
            sc_len: ctl_id as u8,
            sc_family: AF_SYSTEM as u8,
            ss_sysaddr: AF_SYS_CONTROL,
            sc_id: ctl_id,
            sc_unit: control_unit,
            sc_reserved: [0; 5],
        }
    }
}

const _: () = assert!(mem::size_of::<CtlInfo>() == 4 + MAX_KCTL_NAME);
const _: () = assert!(mem::size_of::<SockaddrCtl>() == 32);

#[cfg(target_os = "macos")]
nix::ioctl_readwrite_bad!(ioctl_ctl_info, CTLIOCGINFO, CtlInfo);

pub fn set_nonblocking(fd: RawFd) -> Result<(), Errno> {
    let flag = fcntl(fd, FcntlArg::F_GETFL).map(OFlag::from_bits_retain)?;
    let flag = OFlag::O_NONBLOCK | flag;
    fcntl(fd, FcntlArg::F_SETFL(flag))?;
    Ok(())
}

pub fn is_nonblocking(fd: RawFd) -> Result<bool, Errno> {
    let flag = fcntl(fd, FcntlArg::F_GETFL).map(OFlag::from_bits_retain)?;
    Ok(flag.contains(OFlag::O_NONBLOCK))
}

pub fn set_cloexec(fd: RawFd) -> Result<(), Errno> {
    let flag = fcntl(fd, FcntlArg::F_GETFD).map(FdFlag::from_bits_retain)?;
    let flag = FdFlag::FD_CLOEXEC | flag;
    fcntl(fd, FcntlArg::F_SETFD(flag))?;
    Ok(())
}

/// # Safety
///
/// `fd` must be a utun control socket that has been connected.
pub unsafe fn get_iface_name(fd: RawFd) -> Result<String, Errno> {
    let mut name = [0u8; IFNAME_BUF_LEN];
    let mut name_len: libc::socklen_t = name.len() as _;
    Errno::result(libc::getsockopt(
        fd,
        SYSPROTO_CONTROL,
        UTUN_OPT_IFNAME,
        name.as_mut_ptr() as _,
        &mut name_len,
    ))?;
    Ok(iface_name_from_buf(&name, name_len as usize))
}

/// Decode the kernel's answer: up to the first NUL, or `len` bytes without one.
pub fn iface_name_from_buf(buf: &[u8], len: usize) -> String {
    let buf = &buf[..len.min(buf.len())];
    match CStr::from_bytes_until_nul(buf) {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(_) => String::from_utf8_lossy(buf).into_owned(),
    }
}
