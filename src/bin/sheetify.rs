use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use image::GenericImageView;

const DIRECTIONS: [&str; 4] = ["up", "right", "down", "left"];

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        eprintln!("Usage: sheetify <input.png> <output.json> [sprite_size]");
        std::process::exit(1);
    }

    let input_path = Path::new(&args[1]);
    let output_path = Path::new(&args[2]);
    let sprite_size: u32 = if args.len() == 4 {
        args[3].parse().unwrap_or_else(|_| {
            eprintln!("Sprite size must be a positive integer");
            std::process::exit(1);
        })
    } else {
        32
    };

    if sprite_size == 0 {
        eprintln!("Sprite size must be greater than zero");
        std::process::exit(1);
    }

    if !input_path.exists() {
        eprintln!("Input image not found: {}", input_path.display());
        std::process::exit(1);
    }

    let texture_name = input_path
        .file_name()
        .and_then(|f| f.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "input path must have a file name",
            )
        })?;

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let target_texture_path = output_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(texture_name);

    if target_texture_path != input_path {
        fs::copy(input_path, &target_texture_path)?;
    }

    let image = image::open(&target_texture_path).map_err(|err| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "failed to open image {}: {err}",
                target_texture_path.display()
            ),
        )
    })?;
    let (width, height) = image.dimensions();

    if width % sprite_size != 0 || height % sprite_size != 0 {
        eprintln!(
            "Image dimensions {}x{} are not divisible by sprite size {}",
            width, height, sprite_size
        );
        std::process::exit(1);
    }

    let tiles = (width / sprite_size) * (height / sprite_size);
    let frames_per_direction = tiles / DIRECTIONS.len() as u32;
    if frames_per_direction == 0 {
        eprintln!(
            "Sheet has {} tiles; at least one per direction ({}) is needed",
            tiles,
            DIRECTIONS.len()
        );
        std::process::exit(1);
    }

    // Directions take consecutive runs of tiles in row-major order.
    let animations: serde_json::Map<String, serde_json::Value> = DIRECTIONS
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let first = index as u32 * frames_per_direction;
            let frames: Vec<u32> = (first..first + frames_per_direction).collect();
            (name.to_string(), serde_json::json!(frames))
        })
        .collect();

    let metadata = serde_json::json!({
        "texture": texture_name,
        "sprite_size": sprite_size,
        "animations": animations,
    });
    let pretty = serde_json::to_string_pretty(&metadata)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

    let mut file = fs::File::create(output_path)?;
    writeln!(file, "{pretty}")?;

    println!(
        "Wrote metadata {} ({} frames per direction, {} tiles)",
        output_path.display(),
        frames_per_direction,
        tiles
    );

    Ok(())
}
