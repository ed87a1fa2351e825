//! Splits a file containing concatenated JPEG pictures (eg. raw Motion JPEG) and prints what was
//! found in each of them.

use std::{env, fs, process};

use jpegparse::FrameSplitter;

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_module(env!("CARGO_PKG_NAME"), log::LevelFilter::Trace)
        .parse_default_env()
        .init();

    let data = match &*env::args().skip(1).collect::<Vec<_>>() {
        [path] => fs::read(path)?,
        _ => {
            eprintln!("usage: split <file.mjpeg>");
            process::exit(1);
        }
    };

    let mut splitter = FrameSplitter::default();
    splitter.push(&data);

    let mut index = 0;
    while let Some(frame) = splitter.next_frame()? {
        println!("#{index}: {} bytes", frame.data.len());
        if frame.caps_changed {
            println!("  caps: {}", frame.caps);
        }
        if !frame.tags.is_empty() {
            println!("  tags: {}", frame.tags);
        }
        if !frame.valid {
            println!("  (incomplete picture)");
        }
        index += 1;
    }

    let skipped = splitter.skipped();
    let rest = splitter.finish();
    println!(
        "{index} pictures, {skipped} bytes skipped, {} trailing bytes",
        rest.len()
    );
    Ok(())
}
