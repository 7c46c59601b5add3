use neurobagel_api::cli;

#[tokio::main]
async fn main() -> neurobagel_api::Result<()> {
    cli::main().await
}
