use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::api::{
        admin::{AdminCredentials, AdminSession},
        auth::{AuthToken, AUTH_TOKEN_COOKIE},
        group::{DelegateDescription, DelegateLogin},
    },
    voting::DelegateRoll,
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![admin_login, admin_logout, delegate_login]
}

#[post("/admin/login", data = "<credentials>", format = "json")]
pub async fn admin_login(
    cookies: &CookieJar<'_>,
    credentials: Json<AdminCredentials>,
    config: &State<Config>,
) -> Result<Json<AdminSession>> {
    if !config.verify_admin_password(&credentials.password)? {
        return Err(Error::Unauthorized("Incorrect admin password".to_string()));
    }

    let token = AuthToken::admin().encode(config);
    cookies.add(AuthToken::cookie(token.clone(), config));
    info!("Admin logged in");

    Ok(Json(AdminSession { token }))
}

#[post("/admin/logout")]
pub fn admin_logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

/// Delegates only prove they hold a credential; there is no session.
#[post("/login", data = "<login>", format = "json")]
pub async fn delegate_login(
    login: Json<DelegateLogin>,
    roll: DelegateRoll,
) -> Result<Json<DelegateDescription>> {
    let delegate = roll.login(&login.credential).await?;
    Ok(Json(delegate.into()))
}
