//! Previews a .pri file on a simulated badge screen.

use embedded_graphics::{image::Image, pixelcolor::Rgb565, prelude::*};
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, Window};
use std::{env, fs::File, io::Read};

fn main() {
    let mut args = env::args();
    let _ = args.next().unwrap();

    let arg = args.next().expect("file name not given");
    let mut file = File::open(&arg).expect("file cannot open");
    let mut data = Vec::new();
    file.read_to_end(&mut data).expect("file cannot read");

    let decoder = pri::Decoder::<Rgb565>::new(&data).expect("unexpected file format");

    // The badge panel is a fixed 320x240; smaller images sit at the origin
    // like they do on the device.
    let mut display = SimulatorDisplay::<Rgb565>::new(Size::new(
        pri::MAX_WIDTH as u32,
        pri::MAX_HEIGHT as u32,
    ));
    Image::new(&decoder, Point::zero())
        .draw(&mut display)
        .unwrap();

    let output_settings = OutputSettingsBuilder::new().scale(2).build();
    Window::new("PRI Viewer", &output_settings).show_static(&display);
}
