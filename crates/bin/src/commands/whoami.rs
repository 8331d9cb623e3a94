//! Whoami command - logs in to a running server and prints the identity.

use tessera::{client::SessionStore, constants::ME_PATH, user::Identity};

use crate::cli::WhoamiArgs;

/// Run the whoami command
pub async fn run(args: &WhoamiArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = SessionStore::connect(&args.url)?;

    if let Err(e) = session.login(&args.username, &args.password).await {
        eprintln!("login failed: {e}");
        std::process::exit(1);
    }

    // Ask the server rather than echoing the login response
    let result = session.api().get_json::<Identity>(ME_PATH).await;
    session.logout().await;

    match result {
        Ok(identity) => {
            println!("{}", serde_json::to_string_pretty(&identity)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("logged in, but {ME_PATH} failed: {e}");
            std::process::exit(1);
        }
    }
}
