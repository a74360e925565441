use dotenvy::dotenv;
use std::env;

use todo_backend::{auth, config::AppConfig, db};

fn is_revoke() -> bool {
    env::args().any(|a| a == "--revoke")
}

fn username_arg() -> Option<String> {
    env::args().skip(1).find(|a| !a.starts_with("--"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let Some(username) = username_arg() else {
        eprintln!("usage: issue_token <username> [--revoke]");
        std::process::exit(2);
    };

    let config = AppConfig::new_from_env()?;
    let pool = db::connect(&config.database_url, 1).await?;
    db::migrate(&pool).await?;

    let user = auth::ensure_user(&pool, &username).await?;

    if is_revoke() {
        let revoked = auth::revoke_tokens(&pool, user).await?;
        println!("Revoked {} token(s) for {}", revoked, username);
    } else {
        let token = auth::issue_token(&pool, user).await?;
        println!("User {} (id {})", username, user);
        println!("Authorization: Token {}", token);
    }

    Ok(())
}
