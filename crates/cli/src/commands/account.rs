//! Account commands: login, logout, whoami.

use fernway_storefront::checkout::format::format_phone;
use fernway_storefront::services::Services;

use super::CliError;

/// Sign in and persist the session.
#[allow(clippy::print_stdout)]
pub async fn login(services: &Services, email: &str, password: &str) -> Result<(), CliError> {
    let user = services.auth().login(email, password).await?;
    println!("Signed in as {} <{}>", user.display_name(), user.email);
    Ok(())
}

/// Drop the stored session and any order draft.
#[allow(clippy::print_stdout)]
pub fn logout(services: &Services) -> Result<(), CliError> {
    services.auth().logout()?;
    println!("Signed out");
    Ok(())
}

/// Show the signed-in user from the session snapshot.
#[allow(clippy::print_stdout)]
pub fn whoami(services: &Services) -> Result<(), CliError> {
    match services.session().user() {
        Some(user) => {
            println!("{} <{}>", user.display_name(), user.email);
            println!("phone: {}", format_phone(&user.phone));
        }
        None => println!("Not signed in"),
    }
    Ok(())
}
