use super::SystemSleep;
use anyhow::Result;

/// Requests immediate system sleep through the platform power manager
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformSleep;

impl SystemSleep for PlatformSleep {
    fn request_system_sleep(&self) -> Result<()> {
        request_system_sleep()
    }
}

#[cfg(target_os = "macos")]
fn request_system_sleep() -> Result<()> {
    iokit::sleep_system()
}

#[cfg(target_os = "linux")]
fn request_system_sleep() -> Result<()> {
    use anyhow::{bail, Context};
    use std::process::Command;

    log::info!("Executing system suspension");
    let output = Command::new("systemctl")
        .arg("suspend")
        .output()
        .context("Failed to execute systemctl suspend")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("systemctl suspend failed: {}", stderr.trim());
    }
    Ok(())
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn request_system_sleep() -> Result<()> {
    anyhow::bail!("System sleep requests are not supported on this platform")
}

#[cfg(target_os = "macos")]
#[allow(non_camel_case_types)]
#[allow(non_snake_case)]
mod iokit {
    use anyhow::{bail, Result};
    use std::ffi::c_int;

    type natural_t = u32;
    type mach_port_t = natural_t;
    type io_object_t = mach_port_t;
    type io_connect_t = io_object_t;
    type kern_return_t = c_int;
    type IOReturn = kern_return_t;

    const MACH_PORT_NULL: mach_port_t = 0;
    const kIOReturnSuccess: IOReturn = 0;

    // Linked through build.rs
    extern "C" {
        fn IOPMFindPowerManagement(master_device_port: mach_port_t) -> io_connect_t;
        fn IOPMSleepSystem(fb: io_connect_t) -> IOReturn;
        fn IOServiceClose(connect: io_connect_t) -> kern_return_t;
    }

    pub(super) fn sleep_system() -> Result<()> {
        // SAFETY: plain IOKit calls on a connection we open and close here
        unsafe {
            let port = IOPMFindPowerManagement(MACH_PORT_NULL);
            if port == 0 {
                bail!("IOPMFindPowerManagement returned no connection");
            }

            let ret = IOPMSleepSystem(port);
            IOServiceClose(port);

            if ret != kIOReturnSuccess {
                bail!("IOPMSleepSystem failed. ret={:08x}", ret);
            }
        }
        Ok(())
    }
}
