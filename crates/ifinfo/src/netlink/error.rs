//! Error types for interface queries.

use std::io;

/// Result type for interface queries.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while querying interface configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket or ioctl operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Kernel returned an error code in a NLMSG_ERROR frame.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Message or error frame was shorter than its fixed header.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// No interface with the requested name exists.
    #[error("no such device: {name}")]
    NoSuchDevice {
        /// The interface name that was not found.
        name: String,
    },

    /// Interface name is empty, too long or contains invalid characters.
    #[error("invalid interface name: {0}")]
    InvalidName(String),
}

impl Error {
    /// Create a kernel error from a (negative) errno value.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Check if this is a "not found" error (ENOENT, ENODEV, or name
    /// resolution failure).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } => matches!(*errno, libc::ENOENT | libc::ENODEV),
            Self::NoSuchDevice { .. } => true,
            _ => false,
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } => matches!(*errno, libc::EPERM | libc::EACCES),
            Self::Io(err) => err.kind() == io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_errno_negates_and_describes() {
        let err = Error::from_errno(-19); // -ENODEV
        assert_eq!(err.errno(), Some(19));
        assert!(err.is_not_found());
        assert!(err.to_string().contains("errno 19"));
    }

    #[test]
    fn no_such_device_is_not_found() {
        let err = Error::NoSuchDevice {
            name: "eth7".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no such device: eth7");
    }

    #[test]
    fn permission_classification() {
        assert!(Error::from_errno(-1).is_permission_denied()); // EPERM
        assert!(Error::from_errno(-13).is_permission_denied()); // EACCES
        assert!(!Error::from_errno(-19).is_permission_denied());
    }

    #[test]
    fn truncated_is_distinct_from_kernel_error() {
        let truncated = Error::Truncated {
            expected: 20,
            actual: 4,
        };
        assert!(truncated.errno().is_none());
        assert!(!truncated.is_not_found());
    }
}
