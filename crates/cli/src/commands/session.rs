//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! cougarpost login -e pat@cougarpost.example --password "$PASSWORD"
//! cougarpost whoami
//! cougarpost screens
//! cougarpost logout
//! ```

use secrecy::SecretString;

use cougarpost_core::Email;
use cougarpost_portal::PortalState;
use cougarpost_portal::api::Credentials;

/// Sign in and persist the identity.
pub async fn login(
    state: &PortalState,
    email: &str,
    password: String,
) -> cougarpost_portal::Result<()> {
    let credentials = Credentials::new(Email::parse(email)?, SecretString::from(password));
    let identity = state.sign_in(&credentials).await?;

    #[allow(clippy::print_stdout)]
    {
        let email = identity.email.as_ref().unwrap_or(&credentials.email);
        println!("Signed in as {email} ({})", identity.role);
    }
    Ok(())
}

/// Sign out. Succeeds when nobody is signed in.
#[allow(clippy::print_stdout)]
pub fn logout(state: &PortalState) {
    let was_signed_in = state.session().is_authenticated();
    state.session().logout();

    if was_signed_in {
        println!("Signed out");
    } else {
        println!("Not signed in");
    }
}

#[allow(clippy::print_stdout)]
pub fn whoami(state: &PortalState) {
    let Some(identity) = state.session().current() else {
        println!("Not signed in");
        return;
    };

    match &identity.email {
        Some(email) => println!("{email} ({})", identity.role),
        None => println!("{}", identity.role),
    }
    println!("  account: {}", identity.account_id);
    match identity.address_id {
        Some(address_id) => println!("  address: {address_id}"),
        None => println!("  address: none on file"),
    }
}

/// Print the navigation the current role would see.
#[allow(clippy::print_stdout)]
pub fn screens(state: &PortalState) {
    let screens = state.session().visible_screens();
    if screens.is_empty() {
        println!("Not signed in; log in to see your screens");
        return;
    }
    for screen in screens {
        println!("{}", screen.title());
    }
}
