//! Frame sinks: velocity-magnitude rendering and output targets.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// One rendered frame: velocity magnitude over the z = 0 slice, normalized
/// to [0, 255] and mapped to RGB.
#[derive(Debug, Clone)]
pub struct VelocityFrame {
    pub width: usize,
    pub height: usize,
    /// Row-major RGB pixels, `width * height` entries.
    pub pixels: Vec<[u8; 3]>,
}

/// Consumer of rendered frames, e.g. a video encoder.
///
/// `write_frame` is called from inside the run loop and should return
/// promptly; slow consumers must buffer or drop frames rather than stall
/// the step cadence.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &VelocityFrame) -> io::Result<()>;

    /// Close the sink. Called exactly once at the end of `Domain::run`.
    fn release(&mut self) -> io::Result<()>;
}

/// Sink that discards every frame.
pub struct NullSink;

impl FrameSink for NullSink {
    fn write_frame(&mut self, _frame: &VelocityFrame) -> io::Result<()> {
        Ok(())
    }

    fn release(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes each frame as a numbered binary PPM image into a directory.
pub struct PpmSink {
    dir: PathBuf,
    frames_written: u64,
}

impl PpmSink {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl FrameSink for PpmSink {
    fn write_frame(&mut self, frame: &VelocityFrame) -> io::Result<()> {
        let path = self
            .dir
            .join(format!("frame_{:05}.ppm", self.frames_written));
        let mut writer = BufWriter::new(fs::File::create(path)?);
        write!(writer, "P6\n{} {}\n255\n", frame.width, frame.height)?;
        for px in &frame.pixels {
            writer.write_all(px)?;
        }
        writer.flush()?;
        self.frames_written += 1;
        Ok(())
    }

    fn release(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Render the velocity magnitude of the z = 0 slice, normalized by the
/// frame maximum to [0, 255] and colormapped.
///
/// `vel` holds 3 components per cell; only the first `width * height` cells
/// are read.
pub fn render_velocity_frame(width: usize, height: usize, vel: &[f32]) -> VelocityFrame {
    let n = width * height;
    let mag: Vec<f32> = (0..n)
        .map(|idx| {
            let u = &vel[idx * 3..idx * 3 + 3];
            (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]).sqrt()
        })
        .collect();

    let max = mag.iter().fold(0.0f32, |a, &b| a.max(b));
    let scale = if max > 0.0 { 255.0 / max } else { 0.0 };

    let pixels = mag
        .iter()
        .map(|&m| colormap((m * scale).round() as u8))
        .collect();

    VelocityFrame {
        width,
        height,
        pixels,
    }
}

/// Fixed heat colormap: black, red, yellow, white ramp.
fn colormap(v: u8) -> [u8; 3] {
    let t = v as f32 / 255.0;
    let r = (3.0 * t).min(1.0);
    let g = (3.0 * t - 1.0).clamp(0.0, 1.0);
    let b = (3.0 * t - 2.0).clamp(0.0, 1.0);
    [
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_velocity_renders_black() {
        let vel = vec![0.0f32; 4 * 3 * 3];
        let frame = render_velocity_frame(4, 3, &vel);
        assert_eq!(frame.pixels.len(), 12);
        assert!(frame.pixels.iter().all(|&px| px == [0, 0, 0]));
    }

    #[test]
    fn frame_maximum_saturates_colormap() {
        let mut vel = vec![0.0f32; 4 * 1 * 3];
        vel[0] = 0.2; // cell 0: |u| = 0.2, the frame max
        vel[3 * 2] = 0.1; // cell 2: half of max
        let frame = render_velocity_frame(4, 1, &vel);

        assert_eq!(frame.pixels[0], [255, 255, 255]);
        assert_eq!(frame.pixels[1], [0, 0, 0]);
        // mid-range values land strictly between black and white
        let mid = frame.pixels[2];
        assert!(mid[0] > 0 && mid[2] < 255);
    }

    #[test]
    fn ppm_sink_writes_numbered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = PpmSink::new(dir.path().join("frames")).unwrap();
        let vel = vec![0.0f32; 2 * 2 * 3];
        let frame = render_velocity_frame(2, 2, &vel);

        sink.write_frame(&frame).unwrap();
        sink.write_frame(&frame).unwrap();
        sink.release().unwrap();

        assert_eq!(sink.frames_written(), 2);
        let first = dir.path().join("frames/frame_00000.ppm");
        let data = fs::read(first).unwrap();
        assert!(data.starts_with(b"P6\n2 2\n255\n"));
        assert_eq!(data.len(), b"P6\n2 2\n255\n".len() + 2 * 2 * 3);
    }
}
