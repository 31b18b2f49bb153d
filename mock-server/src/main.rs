use tokio::net::TcpListener;

use mock_server::{VALID_EMAIL, VALID_PASSWORD};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("mock contacts API listening on {addr}");
    println!("login accepts {VALID_EMAIL} / {VALID_PASSWORD}");
    mock_server::run(listener).await
}
