//! Navigation surface and the guard in front of protected pages.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};

use photoshare_shared::{PhotoId, Session};

use crate::session::SessionProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    SignUp,
    SignIn,
    Gallery,
    Photo(PhotoId),
}

impl Route {
    /// Gallery and photo pages need a signed-in user.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Gallery | Route::Photo(_))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => f.write_str("/"),
            Route::SignUp => f.write_str("/auth/signup"),
            Route::SignIn => f.write_str("/auth/signin"),
            Route::Gallery => f.write_str("/gallery"),
            Route::Photo(id) => write!(f, "/photos/{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no page at {0}")]
pub struct UnknownRoute(pub String);

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim();
        let normalized = match trimmed.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        match normalized {
            "/" => Ok(Route::Home),
            "/auth/signup" => Ok(Route::SignUp),
            "/auth/signin" => Ok(Route::SignIn),
            "/gallery" => Ok(Route::Gallery),
            p => p
                .strip_prefix("/photos/")
                .and_then(|id| id.parse::<PhotoId>().ok())
                .map(Route::Photo)
                .ok_or_else(|| UnknownRoute(trimmed.to_string())),
        }
    }
}

/// Outcome of checking a route before its view loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Unprotected page; no session needed.
    Open,
    Proceed(Session),
    Redirect(Route),
}

/// Run the session check a protected page does on every load.
pub async fn guard(provider: &mut SessionProvider, route: Route) -> Guard {
    if !route.is_protected() {
        return Guard::Open;
    }
    match provider.current_session().await {
        Ok(Some(session)) => Guard::Proceed(session),
        Ok(None) => {
            debug!(%route, "No session, redirecting to sign-in");
            Guard::Redirect(Route::SignIn)
        }
        Err(e) => {
            warn!(%route, error = %e, "Session check failed, redirecting to sign-in");
            Guard::Redirect(Route::SignIn)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[test]
    fn parse_and_render() {
        let id = PhotoId::new();
        for route in [
            Route::Home,
            Route::SignUp,
            Route::SignIn,
            Route::Gallery,
            Route::Photo(id),
        ] {
            assert_eq!(route.to_string().parse::<Route>().unwrap(), route);
        }
        assert_eq!("/gallery/".parse::<Route>().unwrap(), Route::Gallery);
        assert!("/photos/not-an-id".parse::<Route>().is_err());
        assert!("/admin".parse::<Route>().is_err());
    }

    #[tokio::test]
    async fn protected_routes_need_a_session() {
        let h = Harness::new().await;
        let mut provider = crate::session::SessionProvider::new(&h.backend);

        assert_eq!(guard(&mut provider, Route::Home).await, Guard::Open);
        assert_eq!(
            guard(&mut provider, Route::Gallery).await,
            Guard::Redirect(Route::SignIn)
        );

        let session = h.signed_in("user@test.com").await;
        provider.restore(&session.token).await.unwrap();
        assert_eq!(
            guard(&mut provider, Route::Photo(PhotoId::new())).await,
            Guard::Proceed(session)
        );
    }
}
