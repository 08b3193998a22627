#[tokio::main]
async fn main() -> anyhow::Result<()> {
    almwork::cli::run().await
}
