use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use trekmint::MintError;
use trekmint::config::MinterConfig;
use trekmint::data_url::file_to_data_url;
use trekmint::location::StaticLocationSource;
use trekmint::minter::{PipelineStage, TrekMinter};

/// Command-line driver: mint a photo file as a location-stamped asset.
///
/// Usage: trekmint <photo> <owner-address> <latitude> <longitude>
///
/// Credentials and the RPC endpoint come from the environment (or `.env`),
/// see `MinterConfig::from_env`. Coordinates are passed on the command line
/// because a headless host has no geolocation capability to ask.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [photo, owner, latitude, longitude] = args.as_slice() else {
        eprintln!("usage: trekmint <photo> <owner-address> <latitude> <longitude>");
        return ExitCode::FAILURE;
    };
    let (Ok(latitude), Ok(longitude)) = (latitude.parse::<f64>(), longitude.parse::<f64>())
    else {
        eprintln!("latitude and longitude must be decimal degrees");
        return ExitCode::FAILURE;
    };

    match mint(photo, owner, latitude, longitude).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn mint(photo: &str, owner: &str, latitude: f64, longitude: f64) -> Result<(), MintError> {
    let minter = TrekMinter::builder()
        .config(MinterConfig::from_env())
        .location_source(Box::new(StaticLocationSource::new(latitude, longitude)))
        .build();

    // Echo every stage transition while the attempt runs.
    let mut status = minter.subscribe();
    let progress = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let stage = *status.borrow_and_update();
            println!("[{stage}]");
            if stage >= PipelineStage::Complete {
                break;
            }
        }
    });

    let image = file_to_data_url(photo)?;
    let result = minter.run(&image, owner).await;
    let _ = progress.await;

    let outcome = result?;
    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{json}"),
        Err(_) => println!("minted asset {}", outcome.asset_id),
    }
    Ok(())
}
