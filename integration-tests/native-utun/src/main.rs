use std::error::Error;
use std::io::{self, Read};

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use utun::{AsyncDevice, OpenOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    test_open().await?;
    test_exclusive_unit().await?;
    test_async_device().await?;

    Ok(())
}

async fn test_open() -> Result<(), Box<dyn Error>> {
    info!("test_open");

    let mut device = utun::open("utun10")?;
    assert_eq!(device.name(), "utun10");
    assert!(device.is_nonblocking()?);

    let mut buf = [0u8; 1500];
    let err = device.read(&mut buf).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WouldBlock);

    Ok(())
}

async fn test_exclusive_unit() -> Result<(), Box<dyn Error>> {
    info!("test_exclusive_unit");

    let device = OpenOptions::new().nonblocking(false).open("utun11")?;
    assert!(!device.is_nonblocking()?);
    match utun::open("utun11") {
        Err(utun::Error::UnitBind(errno)) => info!("second open refused: {}", errno),
        other => panic!("unexpected result: {:?}", other),
    }

    Ok(())
}

async fn test_async_device() -> Result<(), Box<dyn Error>> {
    info!("test_async_device");

    let device = AsyncDevice::new(utun::open("utun12")?)?;
    info!("registered {} with the reactor", device.name());

    // A bare IPv4 header with no payload, behind the utun AF_INET family word.
    let mut pkt = [0u8; 24];
    pkt[3] = nix::libc::AF_INET as u8;
    pkt[4] = 0x45;
    pkt[7] = 20;
    match device.send(&pkt).await {
        Ok(n) => info!("wrote {} bytes", n),
        Err(e) => info!("kernel rejected probe packet: {}", e),
    }

    Ok(())
}
