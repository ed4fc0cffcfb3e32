use crate::error::{Result, ServiceError};
use crate::models::NewUser;
use crate::service::Marketplace;
use secrecy::SecretString;

/// Use the password given on the command line or ask for it
pub fn read_password(given: &Option<String>, prompt: &str) -> Result<SecretString> {
    let password = match given {
        Some(p) => p.clone(),
        None => rpassword::prompt_password(prompt).map_err(ServiceError::from)?,
    };
    Ok(SecretString::from(password))
}

pub async fn execute_register(
    name: &str,
    email: &str,
    password: SecretString,
    profile_picture: &Option<String>,
    market: &Marketplace,
) -> Result<()> {
    let new_user = NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password,
        profile_picture: profile_picture.clone(),
    };
    let user = market.register_user(&new_user).await?;
    println!("Registered user {} ({}) with id {}", user.name, user.email, user.id);

    Ok(())
}

pub async fn execute_reputation(user_id: i64, market: &Marketplace) -> Result<()> {
    let reputation = market.reputation(user_id).await?;
    if reputation.is_rated() {
        println!(
            "User {user_id} is rated {}/5 over {} trades",
            reputation.average, reputation.total_ratings
        );
    } else {
        println!("User {user_id} has no ratings yet");
    }

    Ok(())
}
