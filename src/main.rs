use anyhow::Result;
use aristotle::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
