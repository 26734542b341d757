//! Dongle adapter error types.

use std::path::PathBuf;

use sensebridge_domain::error::BridgeError;

#[derive(Debug, thiserror::Error)]
pub enum DongleError {
    /// The hidraw class directory could not be read.
    #[error("failed to probe {}", path.display())]
    Probe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<DongleError> for BridgeError {
    fn from(err: DongleError) -> Self {
        Self::Storage(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_probe_error_with_path() {
        let err = DongleError::Probe {
            path: PathBuf::from("/sys/class/hidraw"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.to_string(), "failed to probe /sys/class/hidraw");
    }

    #[test]
    fn should_convert_into_storage_error() {
        let err: BridgeError = DongleError::Probe {
            path: PathBuf::from("/sys/class/hidraw"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
        .into();
        assert!(matches!(err, BridgeError::Storage(_)));
    }
}
