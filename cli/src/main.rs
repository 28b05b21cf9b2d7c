//! PRI converter: raster artwork in, badge-ready .pri out (and back again
//! for round-trip checking).

use std::{
    env,
    path::{Path, PathBuf},
    process::exit,
};

enum Format {
    Pri,
    Image(image::ImageFormat),
}

fn main() {
    let mut args = env::args();
    let _ = args.next().unwrap();

    let input = match args.next() {
        Some(v) => PathBuf::from(v),
        None => usage(),
    };

    let input_format = format_for(&input);

    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| match input_format {
            Format::Pri => input.with_extension("png"),
            _ => input.with_extension(pri::PREFERRED_FILE_EXT),
        });

    let output_format = format_for(&output);

    let read_data = std::fs::read(&input)
        .unwrap_or_else(|err| fail(format!("cannot read {}: {}", input.display(), err)));

    eprintln!("Generating {} from {}...", output.display(), input.display());

    match (input_format, output_format) {
        (Format::Image(format), Format::Pri) => {
            let dynamic_image = image::load_from_memory_with_format(&read_data, format)
                .unwrap_or_else(|err| fail(format!("unsupported source format: {}", err)));

            // Wrong-sized artwork gets smushed to the badge screen rather
            // than rejected, like the device expects.
            let dynamic_image = if dynamic_image.width() != pri::MAX_WIDTH as u32
                || dynamic_image.height() != pri::MAX_HEIGHT as u32
            {
                dynamic_image.resize_exact(
                    pri::MAX_WIDTH as u32,
                    pri::MAX_HEIGHT as u32,
                    image::imageops::FilterType::Lanczos3,
                )
            } else {
                dynamic_image
            };

            let rgb = dynamic_image.to_rgb8();
            let encoded = pri::Encoder::encode(rgb.as_raw(), rgb.width(), rgb.height())
                .unwrap_or_else(|err| fail(format!("cannot encode {}: {}", input.display(), err)));

            // The whole artifact is in memory by now; a failed encode never
            // touches the destination.
            std::fs::write(&output, encoded)
                .unwrap_or_else(|err| fail(format!("cannot write {}: {}", output.display(), err)));
        }
        (Format::Pri, Format::Image(format)) => {
            let decoder = pri::Decoder::<()>::new(&read_data)
                .unwrap_or_else(|err| fail(format!("cannot decode {}: {}", input.display(), err)));
            let info = decoder.info();
            let raw_image = decoder
                .decode()
                .unwrap_or_else(|err| fail(format!("cannot decode {}: {}", input.display(), err)));

            let rgb = image::RgbImage::from_raw(info.width(), info.height(), raw_image)
                .unwrap_or_else(|| fail("decoded image has inconsistent dimensions"));
            image::DynamicImage::ImageRgb8(rgb)
                .save_with_format(&output, format)
                .unwrap_or_else(|err| fail(format!("cannot write {}: {}", output.display(), err)));
        }
        _ => fail("exactly one of INFILE and OUTFILE must be a .pri file"),
    }
}

fn format_for(path: &Path) -> Format {
    let ext = path
        .extension()
        .unwrap_or_else(|| fail(format!("{}: unknown file extension", path.display())));
    if ext == pri::PREFERRED_FILE_EXT {
        Format::Pri
    } else {
        Format::Image(
            image::ImageFormat::from_extension(ext)
                .unwrap_or_else(|| fail(format!("{}: unknown file extension", path.display()))),
        )
    }
}

fn fail(msg: impl AsRef<str>) -> ! {
    eprintln!("error: {}", msg.as_ref());
    exit(1);
}

fn usage() -> ! {
    let mut args = env::args_os();
    let arg = args.next().unwrap();
    let path = Path::new(&arg);
    let lpc = path.file_name().unwrap();
    eprintln!("usage: {} INFILE [OUTFILE]", lpc.to_str().unwrap());
    exit(1);
}
