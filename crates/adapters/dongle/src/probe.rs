//! Dongle auto-probe.
//!
//! Every entry of `/sys/class/hidraw` is a symlink into the device tree whose
//! target carries the USB `vendor:product` pair, e.g.
//! `../../devices/.../0003:1A86:E024.0001/hidraw/hidraw0`.

use std::path::{Path, PathBuf};

use crate::error::DongleError;

/// Where the kernel lists hidraw devices.
pub const HIDRAW_CLASS_DIR: &str = "/sys/class/hidraw";

pub const VENDOR_ID: &str = "1a86";
pub const PRODUCT_ID: &str = "e024";

/// Find the first hidraw device under `root` matching the dongle's
/// vendor/product pair and return its `/dev` node.
///
/// # Errors
///
/// Returns [`DongleError::Probe`] when `root` cannot be listed.
pub fn find_dongle(root: &Path) -> Result<Option<PathBuf>, DongleError> {
    let probe_err = |source| DongleError::Probe {
        path: root.to_path_buf(),
        source,
    };

    let mut names: Vec<String> = std::fs::read_dir(root)
        .map_err(probe_err)?
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with("hidraw"))
        .collect();
    names.sort();

    for name in names {
        let Ok(target) = std::fs::read_link(root.join(&name)) else {
            continue;
        };
        let target = target.to_string_lossy().to_lowercase();
        if target.contains(VENDOR_ID) && target.contains(PRODUCT_ID) {
            tracing::debug!(%name, %target, "dongle found");
            return Ok(Some(Path::new("/dev").join(name)));
        }
    }
    Ok(None)
}
