//! Async usage of AsyncLineFileChannel
//!
//! Run with: cargo run --example async_basic_usage --features tokio

use line_channel::{AsyncLineFileChannel, Mode};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut channel = AsyncLineFileChannel::new();

    if channel.open("example.tsv", Mode::Write).await? {
        channel.write_line(&["id", "title"]).await?;
        channel.write_line(&["1", "Cool Track"]).await?;
    }

    if channel.open("example.tsv", Mode::Read).await? {
        while let Some(fields) = channel.read_line().await? {
            println!("{:?}", fields);
        }
    }

    channel.close();
    Ok(())
}
