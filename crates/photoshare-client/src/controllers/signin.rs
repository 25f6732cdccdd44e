use photoshare_shared::{ApiError, Session};

use crate::routes::Route;
use crate::session::SessionProvider;
use crate::view::{Notice, NoticeKind};

/// The `/auth/signin` form.
#[derive(Default)]
pub struct SignInController {
    notice: Option<Notice>,
    navigate_to: Option<Route>,
}

impl SignInController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn take_navigation(&mut self) -> Option<Route> {
        self.navigate_to.take()
    }

    pub async fn submit(
        &mut self,
        provider: &mut SessionProvider,
        email: &str,
        password: &str,
    ) -> Option<Session> {
        match provider.sign_in(email, password).await {
            Ok(session) => {
                self.navigate_to = Some(Route::Gallery);
                Some(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-in rejected");
                self.notice = Some(sign_in_notice(&e));
                None
            }
        }
    }
}

/// Inline message for a sign-in rejection.
fn sign_in_notice(err: &ApiError) -> Notice {
    match err {
        ApiError::Unconfirmed(_) => {
            Notice::inline("Please confirm your account with the emailed code first")
        }
        ApiError::Authorization(_) => Notice::inline("Incorrect username or password."),
        other => Notice::from_error("Sign-in failed", other, NoticeKind::Inline),
    }
}
