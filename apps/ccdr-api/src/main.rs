use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = ccdr_api::Args::parse();

	ccdr_api::run(args).await
}
