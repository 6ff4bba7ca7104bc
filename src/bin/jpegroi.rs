//! jpegroi CLI - baseline JPEG decoder driver.
//!
//! Exercises the callback-driven decoder from the command line: decodes a
//! file (optionally a region of interest only) into raw pixels or PPM/PGM,
//! and reports stream geometry and work-buffer usage.

use clap::{Parser, Subcommand, ValueEnum};
use jpegroi_rs::{Config, JpegDecoder, PixelFormat, Rect};
use std::fs;
use std::path::PathBuf;

/// Baseline JPEG decoder with region-of-interest and resumable scans
#[derive(Parser)]
#[command(name = "jpegroi")]
#[command(author = "jpegroi-rs contributors")]
#[command(version)]
#[command(about = "Decode baseline JPEG streams through pull/push callbacks", long_about = None)]
#[command(after_help = "EXAMPLES:
    jpegroi decode -i image.jpg -o image.ppm
    jpegroi decode -i image.jpg -o tile.raw -f raw -p rgb565 --roi 64,64,128,128
    jpegroi info -i image.jpg")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a baseline JPEG image
    ///
    /// Output covers the full frame; with --roi only the region's pixels
    /// are decoded and filled in, the rest stays black.
    #[command(visible_alias = "d")]
    Decode {
        /// Input JPEG file
        #[arg(short, long, help = "Path to the input image file")]
        input: PathBuf,

        /// Output file path for decoded pixels
        #[arg(short, long, help = "Path for the output file")]
        output: PathBuf,

        /// Output format: raw (binary pixels) or ppm (PPM/PGM)
        #[arg(short, long, default_value = "ppm", value_enum)]
        format: OutputFormat,

        /// Pixel format for raw output (ppm uses rgb888 or grayscale)
        #[arg(short, long, default_value = "rgb888", value_enum)]
        pixel: PixelArg,

        /// Region of interest as x,y,w,h in pixels
        #[arg(long, value_parser = parse_rect)]
        roi: Option<Rect>,

        /// Work buffer size in bytes
        #[arg(long, default_value = "8192")]
        work_size: usize,
    },

    /// Display stream geometry and decoder memory cost
    #[command(visible_alias = "i")]
    Info {
        /// Input JPEG file
        #[arg(short, long, help = "Path to the image file to inspect")]
        input: PathBuf,

        /// Work buffer size in bytes
        #[arg(long, default_value = "8192")]
        work_size: usize,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Raw binary pixel data
    Raw,
    /// Portable PixMap (PPM/PGM) format
    Ppm,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PixelArg {
    Grayscale,
    Rgb565,
    Bgr565,
    Rgb888,
    Bgr888,
    Rgba8888,
    Bgra8888,
}

impl From<PixelArg> for PixelFormat {
    fn from(arg: PixelArg) -> Self {
        match arg {
            PixelArg::Grayscale => PixelFormat::Grayscale,
            PixelArg::Rgb565 => PixelFormat::Rgb565,
            PixelArg::Bgr565 => PixelFormat::Bgr565,
            PixelArg::Rgb888 => PixelFormat::Rgb888,
            PixelArg::Bgr888 => PixelFormat::Bgr888,
            PixelArg::Rgba8888 => PixelFormat::Rgba8888,
            PixelArg::Bgra8888 => PixelFormat::Bgra8888,
        }
    }
}

fn parse_rect(value: &str) -> Result<Rect, String> {
    let fields: Vec<&str> = value.split(',').collect();
    if fields.len() != 4 {
        return Err("expected x,y,w,h".to_string());
    }
    let mut parsed = [0u16; 4];
    for (slot, field) in parsed.iter_mut().zip(&fields) {
        *slot = field.trim().parse().map_err(|e| format!("{e}"))?;
    }
    Ok(Rect {
        x: parsed[0],
        y: parsed[1],
        w: parsed[2],
        h: parsed[3],
    })
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode {
            input,
            output,
            format,
            pixel,
            roi,
            work_size,
        } => decode_image(&input, &output, &format, pixel, roi, work_size),
        Commands::Info { input, work_size } => show_info(&input, work_size),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn decode_image(
    input: &PathBuf,
    output: &PathBuf,
    format: &OutputFormat,
    pixel: PixelArg,
    roi: Option<Rect>,
    work_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let pixel_format = PixelFormat::from(pixel);

    if matches!(format, OutputFormat::Ppm)
        && !matches!(pixel_format, PixelFormat::Rgb888 | PixelFormat::Grayscale)
    {
        return Err("ppm output requires rgb888 or grayscale pixels".into());
    }

    // First pass reads just the header for the frame geometry.
    let (width, height) = {
        let mut work = vec![0u8; work_size];
        let decoder = JpegDecoder::new(Config {
            format: pixel_format,
            source: data.as_slice(),
            sink: |_: &Rect, _: &[u8]| true,
            work: &mut work,
        })?;
        (decoder.width() as usize, decoder.height() as usize)
    };

    let bpp = pixel_format.bytes_per_pixel();
    let mut framebuffer = vec![0u8; width * height * bpp];

    let mut work = vec![0u8; work_size];
    let sink = |rect: &Rect, pixels: &[u8]| {
        let row_bytes = rect.w as usize * bpp;
        for row in 0..rect.h as usize {
            let dst = ((rect.y as usize + row) * width + rect.x as usize) * bpp;
            framebuffer[dst..dst + row_bytes]
                .copy_from_slice(&pixels[row * row_bytes..(row + 1) * row_bytes]);
        }
        true
    };
    let mut decoder = JpegDecoder::new(Config {
        format: pixel_format,
        source: data.as_slice(),
        sink,
        work: &mut work,
    })?;
    decoder.scan(None, roi)?;
    let used = decoder.arena_used();
    drop(decoder);

    match format {
        OutputFormat::Raw => fs::write(output, &framebuffer)?,
        OutputFormat::Ppm => write_ppm(output, &framebuffer, width, height, bpp)?,
    }

    println!(
        "Decoded {}x{} image to {:?} ({} of {} work-buffer bytes used)",
        width, height, output, used, work_size
    );
    Ok(())
}

fn show_info(input: &PathBuf, work_size: usize) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let mut work = vec![0u8; work_size];
    let decoder = JpegDecoder::new(Config {
        format: PixelFormat::Rgb888,
        source: data.as_slice(),
        sink: |_: &Rect, _: &[u8]| true,
        work: &mut work,
    })?;

    println!("File: {:?}", input);
    println!("Size: {} bytes", data.len());
    println!("  Dimensions: {}x{}", decoder.width(), decoder.height());
    println!("  Components: {}", decoder.component_count());
    println!("  Work used:  {} bytes", decoder.arena_used());
    println!("  Work free:  {} bytes", decoder.arena_remaining());
    Ok(())
}

fn write_ppm(
    path: &PathBuf,
    pixels: &[u8],
    width: usize,
    height: usize,
    bpp: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Write;
    let mut file = fs::File::create(path)?;

    if bpp == 1 {
        writeln!(file, "P5")?;
    } else {
        writeln!(file, "P6")?;
    }
    writeln!(file, "{} {}", width, height)?;
    writeln!(file, "255")?;
    file.write_all(pixels)?;

    Ok(())
}
