//! TonicPow client walkthrough.
//!
//! Reads `TONICPOW_API_KEY` and `TONICPOW_ENVIRONMENT`, opens a session,
//! then creates, fetches, updates and logs in a user. When
//! `TONICPOW_GOAL_ID` is set a conversion is also recorded for
//! `TONICPOW_VISITOR_SESSION`. The user is logged out whatever the
//! conversion outcome.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tonicpow_core::{ApiError, Client, Transport, User};

const PASSWORD: &str = "ExamplePassForNow0!";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tonicpow_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut client = Client::from_env()?;
    tracing::info!(
        environment = %client.config().environment,
        base_url = %client.config().base_url(),
        "session created"
    );

    let goal_id = std::env::var("TONICPOW_GOAL_ID")
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok());
    let visitor = std::env::var("TONICPOW_VISITOR_SESSION").unwrap_or_default();

    let result = walkthrough(&mut client, goal_id, &visitor);
    if let Err(err) = &result {
        report(&client, err);
    }

    // Sessions expire on their own; ending it is a courtesy.
    if let Err(err) = client.end_session(None) {
        tracing::warn!(error = %err, "failed to end session");
    }
    result.map_err(Into::into)
}

fn report<T: Transport>(client: &Client<T>, err: &ApiError) {
    if let Some(api) = client.last_request().error.as_ref() {
        tracing::error!(message = %api.message, data = %api.data, "api error");
    }
    tracing::error!(error = %err, "request failed");
}

/// Runs the user steps, then the optional conversion. A logged-in user is
/// always logged out again, even when the conversion fails.
fn walkthrough<T: Transport>(
    client: &mut Client<T>,
    goal_id: Option<u64>,
    visitor: &str,
) -> Result<(), ApiError> {
    let token = user_steps(client)?;
    let converted = match goal_id {
        Some(goal_id) => convert(client, goal_id, visitor),
        None => Ok(()),
    };
    if let Err(err) = &converted {
        report(client, err);
    }

    let logged_out = client.logout_user(&token);
    match &logged_out {
        Ok(()) => tracing::info!("user logged out"),
        Err(err) => tracing::warn!(error = %err, "failed to log user out"),
    }
    converted.and(logged_out)
}

fn user_steps<T: Transport>(client: &mut Client<T>) -> Result<String, ApiError> {
    client.prolong_session(None)?;
    tracing::info!("session prolonged");

    let user = client.create_user(&User {
        email: format!("testing-{}@tonicpow.test", uuid::Uuid::new_v4().simple()),
        password: PASSWORD.to_string(),
        ..User::default()
    })?;
    tracing::info!(user_id = user.id, "user created");

    let mut user = client.get_user(user.id, "", None)?;
    tracing::info!(user_id = user.id, "got user by id");

    let user_by_email = client.get_user(0, &user.email, None)?;
    tracing::info!(user_id = user_by_email.id, "got user by email");

    user.first_name = "Austin".to_string();
    let user = client.update_user(&user, None)?;
    tracing::info!(user_id = user.id, first_name = %user.first_name, "user updated");

    let token = client.login_user(&User {
        email: user.email.clone(),
        password: PASSWORD.to_string(),
        ..User::default()
    })?;
    tracing::info!(user_id = user.id, "user logged in");

    Ok(token)
}

fn convert<T: Transport>(
    client: &mut Client<T>,
    goal_id: u64,
    visitor: &str,
) -> Result<(), ApiError> {
    let conversion = client.convert_goal_by_goal_id(goal_id, visitor, "")?;
    tracing::info!(conversion_id = conversion.id, goal_id, "conversion created");
    Ok(())
}
