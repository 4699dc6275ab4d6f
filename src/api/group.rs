use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::api::{
        auth::AuthToken,
        group::{CheckIn, DelegateDescription, GroupDescription, GroupSpec},
    },
    voting::DelegateRoll,
};

pub fn routes() -> Vec<Route> {
    routes![groups, register_group, remove_group, check_in]
}

#[get("/groups")]
async fn groups(_token: AuthToken, roll: DelegateRoll) -> Result<Json<Vec<GroupDescription>>> {
    let groups = roll.groups().await?;
    Ok(Json(groups.into_iter().map(GroupDescription::from).collect()))
}

#[post("/groups", data = "<spec>", format = "json")]
async fn register_group(
    _token: AuthToken,
    spec: Json<GroupSpec>,
    roll: DelegateRoll,
) -> Result<Json<GroupDescription>> {
    let group = roll.register_group(&spec.number, spec.quantity).await?;
    Ok(Json(group.into()))
}

#[delete("/groups/<number>")]
async fn remove_group(_token: AuthToken, number: &str, roll: DelegateRoll) -> Result<()> {
    roll.remove_group(number).await
}

#[post("/delegates/<credential>/check-in", data = "<change>", format = "json")]
async fn check_in(
    _token: AuthToken,
    credential: &str,
    change: Json<CheckIn>,
    roll: DelegateRoll,
) -> Result<Json<DelegateDescription>> {
    let delegate = roll.check_in(credential, change.checked_in).await?;
    Ok(Json(delegate.into()))
}
