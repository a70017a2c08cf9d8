use std::io;

use nix::errno::Errno;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("interface must be named utun[0-9]+")]
    InvalidName,
    #[error("interface name must carry a non-negative unit number")]
    InvalidUnit,
    #[error("failed to create kernel control socket: {0}")]
    SocketCreation(Errno),
    #[error("failed to resolve utun kernel control id: {0}")]
    ControllerLookup(Errno),
    #[error("failed to bind utun unit: {0}")]
    UnitBind(Errno),
    #[error("failed to read utun interface name: {0}")]
    NameRetrieval(Errno),
    #[error("failed to configure descriptor mode: {0}")]
    ModeConfiguration(Errno),
    #[error("utun devices are only available on macOS")]
    Unsupported,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// The OS error code behind a failed system call, if any.
    pub fn errno(&self) -> Option<Errno> {
        match self {
            Error::SocketCreation(e)
            | Error::ControllerLookup(e)
            | Error::UnitBind(e)
            | Error::NameRetrieval(e)
            | Error::ModeConfiguration(e) => Some(*e),
            Error::Io(e) => e.raw_os_error().map(Errno::from_raw),
            Error::InvalidName | Error::InvalidUnit | Error::Unsupported => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(e) => e,
            Error::InvalidName | Error::InvalidUnit => {
                io::Error::new(io::ErrorKind::InvalidInput, e)
            }
            Error::Unsupported => io::Error::new(io::ErrorKind::Unsupported, e),
            e => match e.errno() {
                Some(errno) => io::Error::from(errno),
                None => io::Error::other(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno() {
        assert_eq!(Error::UnitBind(Errno::EBUSY).errno(), Some(Errno::EBUSY));
        assert_eq!(
            Error::ControllerLookup(Errno::ENOENT).errno(),
            Some(Errno::ENOENT)
        );
        assert_eq!(Error::InvalidName.errno(), None);
        assert_eq!(Error::InvalidUnit.errno(), None);
    }

    #[test]
    fn test_into_io_error() {
        let e: io::Error = Error::UnitBind(Errno::EBUSY).into();
        assert_eq!(e.raw_os_error(), Some(Errno::EBUSY as i32));

        let e: io::Error = Error::InvalidName.into();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);

        let e: io::Error = Error::Unsupported.into();
        assert_eq!(e.kind(), io::ErrorKind::Unsupported);
    }
}
