//! Box Overlay Example
//!
//! Projects one 3D box through a camera calibration and draws its wireframe
//! onto a frame from that camera.
//!
//! Usage:
//! ```bash
//! cargo run --example draw_overlay -- \
//!   --calibration samples/fr_sd_cmr_rh.json \
//!   --box-path samples/vehicle_box.yaml \
//!   --image CMR_GT_Frame.jpg \
//!   --output output/overlay.png
//! ```

use clap::Parser;
use cuboid_overlay::camera::CalibrationProfile;
use cuboid_overlay::geometry::OrientedBox;
use cuboid_overlay::overlay::Stroke;
use cuboid_overlay::util::{self, DirectoryCache, FileImageLoader};
use flexi_logger::{colored_detailed_format, detailed_format, Duplicate, FileSpec, Logger};
use image::Rgb;
use log::{error, info};
use std::fs;
use std::path::PathBuf;

/// Draw a projected 3D box onto a camera frame
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Calibration file (.json or .yaml)
    #[arg(short = 'c', long)]
    calibration: PathBuf,

    /// Box description (YAML with center, length, width, height)
    #[arg(short = 'b', long)]
    box_path: PathBuf,

    /// Background frame to draw on
    #[arg(short = 'i', long)]
    image: PathBuf,

    /// Where to write the annotated PNG
    #[arg(short = 'o', long, default_value = "output/overlay.png")]
    output: PathBuf,

    /// Also keep the result in this cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Line width in pixels
    #[arg(long, default_value = "4")]
    stroke_width: u32,
}

fn load_calibration(path: &PathBuf) -> Result<CalibrationProfile, Box<dyn std::error::Error>> {
    let path_str = path.to_str().ok_or("Invalid calibration path string")?;
    let profile = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => CalibrationProfile::load_from_json(path_str)?,
        Some("yaml") | Some("yml") => CalibrationProfile::load_from_yaml(path_str)?,
        other => {
            error!("Unsupported calibration format: {:?}", other);
            return Err("Unsupported calibration format, expected .json or .yaml".into());
        }
    };
    Ok(profile)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Logger::try_with_str("info")?
        .log_to_file(
            FileSpec::default()
                .directory("logs")
                .suppress_timestamp()
                .suffix("log"),
        )
        .duplicate_to_stdout(Duplicate::All)
        .format_for_files(detailed_format)
        .format_for_stdout(colored_detailed_format)
        // error;warn;info;debug;trace
        .set_palette("196;208;76;39;178".to_string())
        .start()?;

    let cli = Cli::parse();

    info!("Calibration: {:?}", cli.calibration);
    info!("Box: {:?}", cli.box_path);
    info!("Image: {:?}", cli.image);

    let calibration = load_calibration(&cli.calibration)?;
    let box_path = cli.box_path.to_str().ok_or("Invalid box path string")?;
    let oriented_box = OrientedBox::load_from_yaml(box_path)?;
    let loader = FileImageLoader::new(&cli.image);
    let stroke = Stroke {
        color: Rgb([255, 0, 0]),
        width: cli.stroke_width,
    };

    let rendered = match cli.cache_dir {
        Some(ref dir) => {
            let mut cache = DirectoryCache::new(dir);
            util::render_and_cache(&loader, &mut cache, &calibration, &oriented_box, &stroke)
        }
        None => util::render_overlay(&loader, &calibration, &oriented_box, &stroke),
    };
    let rendered = match rendered {
        Ok(rendered) => rendered,
        Err(e) => {
            error!("Overlay failed: {e}");
            return Err(e.into());
        }
    };

    for (i, corner) in rendered.wireframe.corners.iter().enumerate() {
        info!(
            "corner {i}: ({:.3}, {:.3}) depth {:.3}",
            corner.x, corner.y, corner.depth
        );
    }

    if let Some(parent) = cli.output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&cli.output, &rendered.png)?;
    info!("Saved overlay image: {:?}", cli.output);

    Ok(())
}
