//! Basic usage of LineFileChannel
//!
//! Run with: cargo run --example basic_usage

use line_channel::{LineFileChannel, Mode};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut channel = LineFileChannel::with_separator(",");

    // Write a couple of rows
    if !channel.open("example.csv", Mode::Write)? {
        eprintln!("could not create example.csv");
        return Ok(());
    }
    channel.write_line(&["name", "count"])?;
    channel.write_line(&["Alice", "42"])?;
    channel.write_line(&["Bob", ""])?;

    // Read them back
    if channel.open("example.csv", Mode::Read)? {
        println!("All rows:");
        while let Some(fields) = channel.read_line()? {
            println!("  {:?}", fields);
        }
    }

    channel.close();
    Ok(())
}
