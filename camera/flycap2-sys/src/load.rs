use std::os::raw::c_uint;

use crate::*;

macro_rules! fc2_api {
    ($( $name:ident ( $($arg:ty),* ) -> $ret:ty; )*) => {
        /// Function table resolved from the FlyCapture2 C shared library.
        ///
        /// The library stays loaded for as long as this value lives.
        pub struct FlyCapture2C {
            _library: libloading::Library,
            $( pub $name: unsafe extern "C" fn($($arg),*) -> $ret, )*
        }

        impl FlyCapture2C {
            /// Resolve every required symbol from an already opened library.
            ///
            /// # Safety
            ///
            /// `library` must be a FlyCapture2 C library whose exported
            /// functions match the declarations in this crate.
            pub unsafe fn from_library<L>(library: L) -> Result<Self, libloading::Error>
            where
                L: Into<libloading::Library>,
            {
                let library = library.into();
                $(
                    let $name = unsafe {
                        *library.get::<unsafe extern "C" fn($($arg),*) -> $ret>(
                            concat!(stringify!($name), "\0").as_bytes(),
                        )?
                    };
                )*
                Ok(Self {
                    _library: library,
                    $( $name, )*
                })
            }
        }
    };
}

fc2_api! {
    fc2CreateGigEContext(*mut fc2Context) -> fc2Error;
    fc2DestroyContext(fc2Context) -> fc2Error;

    fc2GetNumOfCameras(fc2Context, *mut c_uint) -> fc2Error;
    fc2GetCameraFromIndex(fc2Context, c_uint, *mut fc2PGRGuid) -> fc2Error;
    fc2GetCameraFromSerialNumber(fc2Context, c_uint, *mut fc2PGRGuid) -> fc2Error;
    fc2ForceAllIPAddressesAutomatically() -> fc2Error;

    fc2Connect(fc2Context, *mut fc2PGRGuid) -> fc2Error;
    fc2Disconnect(fc2Context) -> fc2Error;
    fc2GetCameraInfo(fc2Context, *mut fc2CameraInfo) -> fc2Error;

    fc2GetPropertyInfo(fc2Context, *mut fc2PropertyInfo) -> fc2Error;
    fc2GetProperty(fc2Context, *mut fc2Property) -> fc2Error;
    fc2SetProperty(fc2Context, *mut fc2Property) -> fc2Error;

    fc2GetGigEProperty(fc2Context, *mut fc2GigEProperty) -> fc2Error;
    fc2SetGigEProperty(fc2Context, *const fc2GigEProperty) -> fc2Error;
    fc2GetGigEImageSettingsInfo(fc2Context, *mut fc2GigEImageSettingsInfo) -> fc2Error;
    fc2GetGigEImageSettings(fc2Context, *mut fc2GigEImageSettings) -> fc2Error;
    fc2SetGigEImageSettings(fc2Context, *const fc2GigEImageSettings) -> fc2Error;

    fc2GetEmbeddedImageInfo(fc2Context, *mut fc2EmbeddedImageInfo) -> fc2Error;
    fc2SetEmbeddedImageInfo(fc2Context, *mut fc2EmbeddedImageInfo) -> fc2Error;

    fc2ReadRegister(fc2Context, c_uint, *mut c_uint) -> fc2Error;
    fc2WriteRegister(fc2Context, c_uint, c_uint) -> fc2Error;
    fc2ReadGVCPRegister(fc2Context, c_uint, *mut c_uint) -> fc2Error;
    fc2WriteGVCPRegister(fc2Context, c_uint, c_uint) -> fc2Error;
    fc2WriteGVCPRegisterBroadcast(fc2Context, c_uint, c_uint) -> fc2Error;

    fc2StartCapture(fc2Context) -> fc2Error;
    fc2StopCapture(fc2Context) -> fc2Error;
    fc2RetrieveBuffer(fc2Context, *mut fc2Image) -> fc2Error;

    fc2CreateImage(*mut fc2Image) -> fc2Error;
    fc2DestroyImage(*mut fc2Image) -> fc2Error;
    fc2GetImageTimeStamp(*mut fc2Image) -> fc2TimeStamp;
}

impl FlyCapture2C {
    /// Open the shared library at `path` and resolve the function table.
    ///
    /// # Safety
    ///
    /// Loading a library runs its initialisation routines. `path` must point
    /// to a FlyCapture2 C library.
    pub unsafe fn new<P>(path: P) -> Result<Self, libloading::Error>
    where
        P: AsRef<std::ffi::OsStr>,
    {
        let library = unsafe { libloading::Library::new(path)? };
        unsafe { Self::from_library(library) }
    }
}
