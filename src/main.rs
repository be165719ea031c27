use gimbal_controller::{
    default_adapter, discover_gimbals, serve, ControlInput, Fleet, Gimbal, DEFAULT_LISTEN_ADDR,
};
use std::error::Error;
use std::io::Write as _;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::Mutex;
use tokio::time::Duration;

const SCAN_DURATION: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let interactive = std::env::args().any(|arg| arg == "--interactive");

    let adapter = default_adapter().await?;
    let found = discover_gimbals(&adapter, SCAN_DURATION).await?;
    let gimbals: Vec<Gimbal> = found
        .into_iter()
        .map(|(name, peripheral)| Gimbal::new(name, peripheral))
        .collect();

    for (index, gimbal) in gimbals.iter().enumerate() {
        println!("Camera {}: {}", index, gimbal.name());
    }

    let fleet = Arc::new(Mutex::new(Fleet::new(gimbals)));

    // Connections are torn down on every exit path below, including errors.
    if let Err(e) = fleet.lock().await.connect_all().await {
        fleet.lock().await.disconnect_all().await;
        return Err(e.into());
    }

    let result = if interactive {
        run_interactive(fleet.clone()).await
    } else {
        run_server(fleet.clone()).await
    };

    fleet.lock().await.disconnect_all().await;
    result
}

async fn run_server(fleet: Arc<Mutex<Fleet>>) -> Result<(), Box<dyn Error + Send + Sync>> {
    tokio::select! {
        result = serve(DEFAULT_LISTEN_ADDR, fleet) => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down");
            Ok(())
        }
    }
}

/// Line-oriented fallback for testing without the browser UI. Commands go to
/// camera 0; an empty line ends the session.
async fn run_interactive(fleet: Arc<Mutex<Fleet>>) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    println!("Enter 'pan tilt roll' in [-1, 1]; empty line quits.");

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        if line.trim().is_empty() {
            break;
        }
        match parse_axes(&line) {
            Ok(input) => {
                if let Err(e) = fleet.lock().await.dispatch(0, &input).await {
                    eprintln!("{}", e);
                }
            }
            Err(e) => eprintln!("{}", e),
        }
    }
    Ok(())
}

fn parse_axes(line: &str) -> Result<ControlInput, String> {
    let values: Vec<f64> = line
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|e| format!("Invalid number: {}", e))?;
    match values[..] {
        [pan, tilt, roll] => Ok(ControlInput::new(pan, tilt, roll)),
        _ => Err(format!(
            "Expected 'pan tilt roll', got {} value(s)",
            values.len()
        )),
    }
}
