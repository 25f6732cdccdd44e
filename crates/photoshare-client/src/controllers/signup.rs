use tracing::info;

use photoshare_shared::Session;

use crate::routes::Route;
use crate::session::SessionProvider;
use crate::view::{Notice, NoticeKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpStep {
    Details,
    /// Waiting for the code sent to `destination`.
    Confirm { email: String, destination: String },
    Done,
}

/// The `/auth/signup` form: details, then confirmation code.
pub struct SignUpController {
    step: SignUpStep,
    // kept so confirmation can sign straight in
    password: Option<String>,
    notice: Option<Notice>,
    navigate_to: Option<Route>,
}

impl Default for SignUpController {
    fn default() -> Self {
        Self::new()
    }
}

impl SignUpController {
    pub fn new() -> Self {
        Self {
            step: SignUpStep::Details,
            password: None,
            notice: None,
            navigate_to: None,
        }
    }

    /// Pick up at the confirmation step for an account created earlier.
    pub fn resume(email: impl Into<String>, password: Option<String>) -> Self {
        let email = email.into();
        Self {
            step: SignUpStep::Confirm {
                destination: email.clone(),
                email,
            },
            password,
            notice: None,
            navigate_to: None,
        }
    }

    pub fn step(&self) -> &SignUpStep {
        &self.step
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
    ) -> bool {
        match provider.sign_up(email, password).await {
            Ok(outcome) => {
                self.step = SignUpStep::Confirm {
                    email: email.trim().to_string(),
                    destination: outcome.destination,
                };
                self.password = Some(password.to_string());
                true
            }
            Err(e) => {
                self.notice = Some(Notice::from_error("Sign-up failed", &e, NoticeKind::Inline));
                false
            }
        }
    }

    /// Confirm the code, then sign in with the remembered password.
    ///
    /// Without a remembered password the user is sent to the sign-in page.
    pub async fn confirm(&mut self, provider: &mut SessionProvider, code: &str) -> Option<Session> {
        let SignUpStep::Confirm { email, .. } = &self.step else {
            self.notice = Some(Notice::inline("Sign up first"));
            return None;
        };
        let email = email.clone();

        if let Err(e) = provider.confirm_sign_up(&email, code).await {
            self.notice = Some(Notice::from_error(
                "Confirmation failed",
                &e,
                NoticeKind::Inline,
            ));
            return None;
        }
        info!("Account confirmed");
        self.step = SignUpStep::Done;

        let Some(password) = self.password.take() else {
            self.navigate_to = Some(Route::SignIn);
            return None;
        };
        match provider.sign_in(&email, &password).await {
            Ok(session) => {
                self.navigate_to = Some(Route::Gallery);
                Some(session)
            }
            Err(e) => {
                self.notice = Some(Notice::from_error("Sign-in failed", &e, NoticeKind::Inline));
                self.navigate_to = Some(Route::SignIn);
                None
            }
        }
    }
}
