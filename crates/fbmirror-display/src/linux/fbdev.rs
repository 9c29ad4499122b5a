//! `/dev/fb*` access through the fbdev ioctls and a shared mapping.

use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use fbmirror_types::DisplayGeometry;
use memmap2::{Mmap, MmapOptions};
use tracing::{debug, info};

use crate::convert::RGB565_BYTES;
use crate::error::DisplayError;
use crate::FrameSource;

const FBIOGET_VSCREENINFO: libc::Ioctl = 0x4600;
const FBIOGET_FSCREENINFO: libc::Ioctl = 0x4602;

/// `struct fb_bitfield`.
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

/// `struct fb_fix_screeninfo`.
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbFixScreeninfo {
    id: [libc::c_char; 16],
    smem_start: libc::c_ulong,
    smem_len: u32,
    type_: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: libc::c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

/// `struct fb_var_screeninfo`.
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbVarScreeninfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitfield,
    green: FbBitfield,
    blue: FbBitfield,
    transp: FbBitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

#[allow(unsafe_code)]
fn query_fixed(file: &File) -> std::io::Result<FbFixScreeninfo> {
    let mut info = FbFixScreeninfo::default();
    // SAFETY: FBIOGET_FSCREENINFO writes exactly one fb_fix_screeninfo, which
    // `info` matches in layout.
    let rc = unsafe {
        libc::ioctl(
            file.as_raw_fd(),
            FBIOGET_FSCREENINFO,
            std::ptr::addr_of_mut!(info),
        )
    };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(info)
}

#[allow(unsafe_code)]
fn query_variable(file: &File) -> std::io::Result<FbVarScreeninfo> {
    let mut info = FbVarScreeninfo::default();
    // SAFETY: FBIOGET_VSCREENINFO writes exactly one fb_var_screeninfo, which
    // `info` matches in layout.
    let rc = unsafe {
        libc::ioctl(
            file.as_raw_fd(),
            FBIOGET_VSCREENINFO,
            std::ptr::addr_of_mut!(info),
        )
    };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(info)
}

/// Derive the display geometry from the two screen-info blocks.
fn geometry_from_screen_info(
    fix: &FbFixScreeninfo,
    var: &FbVarScreeninfo,
) -> Result<DisplayGeometry, DisplayError> {
    let bytes_per_pixel = var.bits_per_pixel >> 3;
    if bytes_per_pixel != RGB565_BYTES {
        return Err(DisplayError::UnsupportedFormat {
            bits_per_pixel: var.bits_per_pixel,
        });
    }
    Ok(DisplayGeometry {
        width: var.xres,
        height: var.yres,
        virtual_width: var.xres_virtual,
        virtual_height: var.yres_virtual,
        x_offset: var.xoffset,
        y_offset: var.yoffset,
        bytes_per_pixel,
        stride_pixels: fix.line_length / bytes_per_pixel,
    })
}

/// An opened and queried framebuffer device, not yet mapped.
pub struct FramebufferDevice {
    path: PathBuf,
    file: File,
    geometry: DisplayGeometry,
    mapped_len: usize,
}

impl FramebufferDevice {
    /// Open `path` read/write and read its fixed and variable screen info.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DisplayError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| DisplayError::DeviceOpen(format!("{}: {e}", path.display())))?;

        let fix = query_fixed(&file)
            .map_err(|e| DisplayError::Query(format!("fixed screen info: {e}")))?;
        let var = query_variable(&file)
            .map_err(|e| DisplayError::Query(format!("variable screen info: {e}")))?;
        debug!(?fix, ?var, "framebuffer screen info");

        let geometry = geometry_from_screen_info(&fix, &var)?;
        let mapped_len = fix.smem_len as usize;
        geometry.validate(mapped_len)?;

        info!(
            path = %path.display(),
            width = geometry.width,
            height = geometry.height,
            virtual_width = geometry.virtual_width,
            virtual_height = geometry.virtual_height,
            x_offset = geometry.x_offset,
            y_offset = geometry.y_offset,
            stride = geometry.stride_pixels,
            "framebuffer opened"
        );
        Ok(Self {
            path,
            file,
            geometry,
            mapped_len,
        })
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    /// Map the whole reported buffer, shared with the producer.
    #[allow(unsafe_code)]
    pub fn map(self) -> Result<LinuxFramebuffer, DisplayError> {
        // SAFETY: the mapping is read-only from this process. The guest keeps
        // writing it; readers treat the contents as a best-effort snapshot
        // and never rely on them staying stable.
        let map = unsafe { MmapOptions::new().len(self.mapped_len).map(&self.file) }
            .map_err(|e| DisplayError::Map(format!("{}: {e}", self.path.display())))?;
        info!(len = self.mapped_len, "framebuffer mapped");
        Ok(LinuxFramebuffer {
            path: self.path,
            _file: self.file,
            map,
            geometry: self.geometry,
        })
    }
}

/// A mapped framebuffer. Dropping it unmaps the surface and closes the device.
pub struct LinuxFramebuffer {
    path: PathBuf,
    _file: File,
    map: Mmap,
    geometry: DisplayGeometry,
}

impl LinuxFramebuffer {
    /// Open, query and map in one step.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DisplayError> {
        FramebufferDevice::open(path)?.map()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for LinuxFramebuffer {
    fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    fn pixels(&mut self) -> Result<&[u8], DisplayError> {
        Ok(&self.map[..])
    }
}

impl Drop for LinuxFramebuffer {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "framebuffer released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen_info(bits_per_pixel: u32, line_length: u32) -> (FbFixScreeninfo, FbVarScreeninfo) {
        let fix = FbFixScreeninfo {
            smem_len: 640 * 960 * 2,
            line_length,
            ..FbFixScreeninfo::default()
        };
        let var = FbVarScreeninfo {
            xres: 640,
            yres: 480,
            xres_virtual: 640,
            yres_virtual: 960,
            yoffset: 480,
            bits_per_pixel,
            ..FbVarScreeninfo::default()
        };
        (fix, var)
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn kernel_struct_sizes() {
        assert_eq!(std::mem::size_of::<FbFixScreeninfo>(), 80);
        assert_eq!(std::mem::size_of::<FbVarScreeninfo>(), 160);
    }

    #[test]
    fn geometry_from_rgb565_info() {
        let (fix, var) = screen_info(16, 1280);
        let geo = geometry_from_screen_info(&fix, &var).unwrap();
        assert_eq!(geo.width, 640);
        assert_eq!(geo.virtual_height, 960);
        assert_eq!(geo.y_offset, 480);
        assert_eq!(geo.bytes_per_pixel, 2);
        assert_eq!(geo.stride_pixels, 640);
        assert!(geo.validate(fix.smem_len as usize).is_ok());
    }

    #[test]
    fn rejects_non_rgb565() {
        let (fix, var) = screen_info(32, 2560);
        assert!(matches!(
            geometry_from_screen_info(&fix, &var),
            Err(DisplayError::UnsupportedFormat { bits_per_pixel: 32 })
        ));
    }

    #[test]
    fn missing_device_is_open_error() {
        let err = FramebufferDevice::open("/nonexistent/fb9").err().unwrap();
        assert!(matches!(err, DisplayError::DeviceOpen(_)));
    }
}
