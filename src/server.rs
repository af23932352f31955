use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, instrument};

use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::snapshot;
use crate::store::Store;
use crate::{Error, SNAPSHOT_FILE, SNAPSHOT_INTERVAL_SECS};

/// Run the server until SIGINT. Binds the listener, restores the snapshot,
/// starts the background snapshot loop, then accepts connections, one task
/// per client. Shutdown only stops the accept loop; existing connections
/// keep serving until their client closes or a read fails, and the final
/// snapshot is written once the last of them has returned.
pub async fn run(port: u16) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    let store = Store::new();
    let snapshot_path = PathBuf::from(SNAPSHOT_FILE);

    match snapshot::load(&store, &snapshot_path) {
        Ok(true) => info!("keyspace restored from {}", snapshot_path.display()),
        Ok(false) => info!("no snapshot found, starting with an empty keyspace"),
        Err(e) => error!(
            "failed to restore {}: {}; starting with an empty keyspace",
            snapshot_path.display(),
            e
        ),
    }

    // The snapshot loop subscribes to `notify_shutdown`; each connection
    // task holds a `task_done` handle so we know when the last one is gone.
    let (notify_shutdown, _) = broadcast::channel::<()>(1);
    let (task_done_tx, mut task_done_rx) = mpsc::channel::<()>(1);

    tokio::spawn(snapshot::run_save_loop(
        store.clone(),
        snapshot_path.clone(),
        Duration::from_secs(SNAPSHOT_INTERVAL_SECS),
        notify_shutdown.subscribe(),
    ));

    info!("server listening on {}", listener.local_addr()?);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, client_address) = accepted?;
                info!("Accepted connection from {:?}", client_address);

                let store = store.clone();
                let task_done = task_done_tx.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(socket, client_address, store).await {
                        error!("connection error: {}", e);
                    }
                    drop(task_done);
                });
            }
            _ = signal::ctrl_c() => {
                info!("shutdown signal received, closing listener");
                break;
            }
        }
    }

    // Stop accepting and wait for the remaining connections to drain on
    // their own; each returns when its client hangs up or a read fails.
    drop(listener);
    drop(task_done_tx);
    let _ = task_done_rx.recv().await;

    // All connections are gone; stop the snapshot loop and write the final
    // snapshot ourselves.
    let _ = notify_shutdown.send(());

    match snapshot::save(&store, &snapshot_path) {
        Ok(()) => info!("final snapshot written to {}", snapshot_path.display()),
        Err(e) => error!("failed to write final snapshot: {}", e),
    }

    info!("server shutdown complete");
    Ok(())
}

#[instrument(name = "connection", skip_all, fields(client_address = %client_address))]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: Store,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream);

    loop {
        let frame = match conn.read_request().await {
            Ok(Some(frame)) => frame,
            // The client closed its end.
            Ok(None) => break,
            // Malformed framing leaves the byte stream unusable. Send one
            // error reply as a courtesy and drop the connection.
            Err(e) => {
                let reply = Frame::Error(format!("Error: {}", e));
                let _ = conn.write_frame(&reply).await;
                return Err(e);
            }
        };

        debug!("received request: {}", frame);

        let reply = match Command::try_from(frame) {
            Ok(cmd) => cmd.exec(store.clone())?,
            // Dispatch-level failures (unknown command, arity, bad numbers)
            // are replies; the connection stays usable.
            Err(e) => Frame::Error(e.to_string()),
        };

        debug!("sending reply: {}", reply);
        conn.write_frame(&reply).await?;
    }

    info!("Connection closed");
    Ok(())
}
