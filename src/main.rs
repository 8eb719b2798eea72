#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fastlog_lib::run().await
}
