#[tokio::main]
async fn main() -> anyhow::Result<()> {
    atlasbuilder_lib::run().await
}
