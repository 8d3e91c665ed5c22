//! Sign-in commands.

use bestie_core::UserId;
use bestie_storefront::CartError;

use super::App;
use crate::output;

/// Sign in as `user_id`, merging the guest cart.
///
/// # Errors
///
/// Returns an error if the merge cannot be completed. The guest cart keeps
/// the lines that were not pushed yet.
pub async fn login(app: &App, user_id: &str) -> Result<(), CartError> {
    let mut session = app.session().await?;
    session.login(UserId::new(user_id)).await?;

    output::message(&format!("Signed in as {user_id}"));
    output::summary(&session.summary(), app.currency());
    Ok(())
}

/// Sign out.
///
/// # Errors
///
/// Returns an error if the stored session cannot be removed.
pub async fn logout(app: &App) -> Result<(), CartError> {
    let mut session = app.session().await?;
    session.logout()?;

    output::message("Signed out");
    Ok(())
}
