use anyhow::Context;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::{
    api::auth::{self, AuthError, AuthUser},
    app::{app_error::AppError, app_state::AppState},
    domain::role::Role,
    models::{CreateProfileEntity, ProfileEntity},
    schema::profiles,
};

/// The signed-in user, resolved once per request by [`resolve_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub profile: ProfileEntity,
    pub access_token: String,
}

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.profile.id
    }

    pub fn role(&self) -> Role {
        self.profile.role()
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Loads the profile of `user`, creating a customer profile on first sight.
pub async fn ensure_profile(
    conn: &mut AsyncPgConnection,
    user: &AuthUser,
) -> Result<ProfileEntity, AppError> {
    diesel::insert_into(profiles::table)
        .values(CreateProfileEntity {
            id: user.id,
            email: user.email.clone().unwrap_or_default(),
            name: user.name(),
            phone: user.phone(),
            role: Role::Customer.to_string(),
        })
        .on_conflict(profiles::id)
        .do_nothing()
        .execute(conn)
        .await
        .context("Failed to create profile")?;

    let profile = profiles::table
        .filter(profiles::id.eq(user.id))
        .select(ProfileEntity::as_select())
        .get_result(conn)
        .await
        .context("Failed to get profile")?;

    Ok(profile)
}

/// Attaches a [`CurrentUser`] when the request carries a valid bearer token.
///
/// Requests without a token, or with one the auth service rejects, continue anonymously and are
/// turned away by the role layers of protected routes.
pub async fn resolve_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(req.headers()).map(str::to_string) else {
        return Ok(next.run(req).await);
    };

    let user = match auth::get_user(&state.http_client, &state.api_urls, &token).await {
        Ok(user) => user,
        Err(AuthError::Rejected { status, message }) => {
            tracing::debug!(%status, "Ignoring rejected session: {message}");
            return Ok(next.run(req).await);
        }
        Err(err) => return Err(err.into()),
    };

    let profile = {
        let conn = &mut state
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;
        ensure_profile(conn, &user).await?
    };

    req.extensions_mut().insert(CurrentUser {
        profile,
        access_token: token,
    });
    Ok(next.run(req).await)
}

fn authorize(req: &Request, allowed: &[Role]) -> Result<(), AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::Unauthorized)?;

    if allowed.contains(&user.role()) {
        Ok(())
    } else {
        Err(AppError::ForbiddenResource(format!(
            "{} accounts cannot access this resource",
            user.role()
        )))
    }
}

/// Any signed-in user.
pub async fn customers_authorization(req: Request, next: Next) -> Result<Response, AppError> {
    authorize(&req, Role::ALL)?;
    Ok(next.run(req).await)
}

pub async fn admins_authorization(req: Request, next: Next) -> Result<Response, AppError> {
    authorize(&req, &[Role::Admin])?;
    Ok(next.run(req).await)
}

/// Admins and delivery staff.
pub async fn couriers_authorization(req: Request, next: Next) -> Result<Response, AppError> {
    authorize(&req, &[Role::Admin, Role::Delivery])?;
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_tokens() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
    }

    #[test]
    fn ignores_other_schemes() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn anonymous_requests_are_unauthorized() {
        let req = Request::new(axum::body::Body::empty());
        let err = authorize(&req, &[Role::Admin]).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }
}
