use flycap2_sys as ffi;

use crate::Guid;

fn err_str(code: ffi::fc2Error) -> &'static str {
    use ffi::_fc2Error::*;
    match code {
        FC2_ERROR_UNDEFINED => "undefined",
        FC2_ERROR_OK => "no error",
        FC2_ERROR_FAILED => "general failure",
        FC2_ERROR_NOT_IMPLEMENTED => "function has not been implemented",
        FC2_ERROR_FAILED_BUS_MASTER_CONNECTION => "could not connect to bus master",
        FC2_ERROR_NOT_CONNECTED => "camera has not been connected",
        FC2_ERROR_INIT_FAILED => "initialization failed",
        FC2_ERROR_NOT_INTITIALIZED => "camera has not been initialized",
        FC2_ERROR_INVALID_PARAMETER => "invalid parameter passed to function",
        FC2_ERROR_INVALID_SETTINGS => "setting set to camera is invalid",
        FC2_ERROR_INVALID_BUS_MANAGER => "invalid bus manager object",
        FC2_ERROR_MEMORY_ALLOCATION_FAILED => "could not allocate memory",
        FC2_ERROR_LOW_LEVEL_FAILURE => "low level error",
        FC2_ERROR_NOT_FOUND => "device not found",
        FC2_ERROR_FAILED_GUID => "GUID failure",
        FC2_ERROR_INVALID_PACKET_SIZE => "packet size set to camera is invalid",
        FC2_ERROR_INVALID_MODE => "invalid mode",
        FC2_ERROR_NOT_IN_FORMAT7 => "not in format7",
        FC2_ERROR_NOT_SUPPORTED => "feature is unsupported",
        FC2_ERROR_TIMEOUT => "timeout",
        FC2_ERROR_BUS_MASTER_FAILED => "bus master failure",
        FC2_ERROR_INVALID_GENERATION => "generation count mismatch",
        FC2_ERROR_LUT_FAILED => "look up table failure",
        FC2_ERROR_IIDC_FAILED => "IIDC failure",
        FC2_ERROR_STROBE_FAILED => "strobe failure",
        FC2_ERROR_TRIGGER_FAILED => "trigger failure",
        FC2_ERROR_PROPERTY_FAILED => "property failure",
        FC2_ERROR_PROPERTY_NOT_PRESENT => "property is not present",
        FC2_ERROR_REGISTER_FAILED => "register access failed",
        FC2_ERROR_READ_REGISTER_FAILED => "register read failed",
        FC2_ERROR_WRITE_REGISTER_FAILED => "register write failed",
        FC2_ERROR_ISOCH_FAILED => "isochronous failure",
        FC2_ERROR_ISOCH_ALREADY_STARTED => "isochronous transfer already started",
        FC2_ERROR_ISOCH_NOT_STARTED => "isochronous transfer not started",
        FC2_ERROR_ISOCH_START_FAILED => "isochronous start failed",
        FC2_ERROR_ISOCH_RETRIEVE_BUFFER_FAILED => "isochronous retrieve buffer failed",
        FC2_ERROR_ISOCH_STOP_FAILED => "isochronous stop failed",
        FC2_ERROR_ISOCH_SYNC_FAILED => "isochronous image synchronization failed",
        FC2_ERROR_ISOCH_BANDWIDTH_EXCEEDED => "isochronous bandwidth exceeded",
        FC2_ERROR_IMAGE_CONVERSION_FAILED => "image conversion failed",
        FC2_ERROR_IMAGE_LIBRARY_FAILURE => "image library failure",
        FC2_ERROR_BUFFER_TOO_SMALL => "buffer is too small",
        FC2_ERROR_IMAGE_CONSISTENCY_ERROR => "image consistency error",
        FC2_ERROR_INCOMPATIBLE_DRIVER => "installed driver is not compatible with the library",
        _ => "unknown error",
    }
}

/// An error code returned by the FlyCapture2 library.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("FlyCapture2 error {code}: {}", err_str(*code))]
pub struct Fc2Error {
    pub code: ffi::fc2Error,
}

impl Fc2Error {
    pub fn is_timeout(&self) -> bool {
        self.code == ffi::_fc2Error::FC2_ERROR_TIMEOUT
    }

    /// Whether the error means the camera is no longer reachable.
    pub fn is_link_down(&self) -> bool {
        use ffi::_fc2Error::*;
        matches!(
            self.code,
            FC2_ERROR_NOT_CONNECTED
                | FC2_ERROR_FAILED_BUS_MASTER_CONNECTION
                | FC2_ERROR_BUS_MASTER_FAILED
                | FC2_ERROR_LOW_LEVEL_FAILURE
                | FC2_ERROR_INVALID_GENERATION
                | FC2_ERROR_ISOCH_NOT_STARTED
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ffi::_fc2Error::FC2_ERROR_NOT_FOUND
    }

    pub fn is_property_not_present(&self) -> bool {
        self.code == ffi::_fc2Error::FC2_ERROR_PROPERTY_NOT_PRESENT
    }
}

pub(crate) fn fc2_result(code: ffi::fc2Error) -> std::result::Result<(), Fc2Error> {
    if code == ffi::_fc2Error::FC2_ERROR_OK {
        Ok(())
    } else {
        Err(Fc2Error { code })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("loading FlyCapture2 library at {}: {source}", path.display())]
    LibLoading {
        source: libloading::Error,
        path: std::path::PathBuf,
    },
    #[error("{source}")]
    Fc2 {
        #[from]
        source: Fc2Error,
    },
    #[error("camera {guid}: {source}")]
    CameraFc2 { guid: Guid, source: Fc2Error },
    #[error("GUID was not parseable")]
    UnparsableGuid,
}

impl Error {
    /// The underlying library error code, if any.
    pub fn fc2_error(&self) -> Option<&Fc2Error> {
        match self {
            Error::Fc2 { source } | Error::CameraFc2 { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let timeout = Fc2Error {
            code: ffi::_fc2Error::FC2_ERROR_TIMEOUT,
        };
        assert!(timeout.is_timeout());
        assert!(!timeout.is_link_down());

        let gone = Fc2Error {
            code: ffi::_fc2Error::FC2_ERROR_NOT_CONNECTED,
        };
        assert!(gone.is_link_down());
        assert!(!gone.is_timeout());

        assert!(fc2_result(ffi::_fc2Error::FC2_ERROR_OK).is_ok());
    }

    #[test]
    fn display_includes_description() {
        let e = Error::from(Fc2Error {
            code: ffi::_fc2Error::FC2_ERROR_PROPERTY_NOT_PRESENT,
        });
        assert_eq!(
            e.to_string(),
            "FlyCapture2 error 26: property is not present"
        );
        assert!(e.fc2_error().unwrap().is_property_not_present());
    }
}
