//! Login/registration and patient entry form state.

use zeroize::Zeroize;

use crate::domain::{Credentials, PatientRecord};

/// Presentation mode of the authentication form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    /// Email and password fields; primary action signs in.
    #[default]
    Login,
    /// Adds the confirmation field; primary action creates the account.
    Registering,
}

/// State of the login/registration form.
///
/// Owns the transient field buffers and the live password-match hint.
/// Password buffers are zeroized whenever the form is cleared.
#[derive(Debug, Default)]
pub struct AuthFormState {
    mode: FormMode,
    pub email: String,
    password: String,
    confirm: String,
    mismatch_hint: Option<&'static str>,
}

impl AuthFormState {
    #[must_use]
    pub fn mode(&self) -> FormMode {
        self.mode
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    #[must_use]
    pub fn confirm(&self) -> &str {
        &self.confirm
    }

    /// Live mismatch hint, present while password and confirmation are
    /// both non-empty and unequal. Non-blocking for typing; blocks the
    /// submit action.
    #[must_use]
    pub fn mismatch_hint(&self) -> Option<&'static str> {
        self.mismatch_hint
    }

    #[must_use]
    pub fn submit_blocked_by_hint(&self) -> bool {
        self.mismatch_hint.is_some()
    }

    pub fn set_email(&mut self, value: impl Into<String>) {
        self.email = value.into();
    }

    /// Replace the password buffer and recompute the live hint.
    pub fn set_password(&mut self, value: impl Into<String>) {
        self.password.zeroize();
        self.password = value.into();
        self.revalidate();
    }

    /// Replace the confirmation buffer and recompute the live hint.
    pub fn set_confirm(&mut self, value: impl Into<String>) {
        self.confirm.zeroize();
        self.confirm = value.into();
        self.revalidate();
    }

    /// Reveal the confirmation field and enter registration mode.
    pub fn switch_to_register(&mut self) {
        if self.mode == FormMode::Login {
            self.mode = FormMode::Registering;
            self.revalidate();
        }
    }

    /// Leave registration mode, clearing all three fields and the hint.
    ///
    /// Also used to reset the form after auth completion or logout.
    pub fn cancel_registration(&mut self) {
        self.mode = FormMode::Login;
        self.email.clear();
        self.password.zeroize();
        self.confirm.zeroize();
        self.mismatch_hint = None;
    }

    /// Whether every field the current mode shows is filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let base = !self.email.is_empty() && !self.password.is_empty();
        match self.mode {
            FormMode::Login => base,
            FormMode::Registering => base && !self.confirm.is_empty(),
        }
    }

    /// Snapshot the current field values as credentials.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        match self.mode {
            FormMode::Login => Credentials::for_login(&self.email, &self.password),
            FormMode::Registering => {
                Credentials::for_registration(&self.email, &self.password, &self.confirm)
            }
        }
    }

    fn revalidate(&mut self) {
        let unequal = !self.password.is_empty()
            && !self.confirm.is_empty()
            && self.password != self.confirm;
        self.mismatch_hint = match self.mode {
            FormMode::Registering if unequal => Some("Passwords do not match"),
            _ => None,
        };
    }
}

/// State of the five patient entry fields.
#[derive(Debug, Default)]
pub struct PatientFormState {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: String,
    pub disease: String,
}

impl PatientFormState {
    /// Submit gate: every field non-empty. `age` gets no validation
    /// beyond non-emptiness and accepts free-form text.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.id.is_empty()
            && !self.name.is_empty()
            && !self.email.is_empty()
            && !self.age.is_empty()
            && !self.disease.is_empty()
    }

    pub fn clear(&mut self) {
        self.id.clear();
        self.name.clear();
        self.email.clear();
        self.age.clear();
        self.disease.clear();
    }

    /// Build the record to upsert from the current field values.
    #[must_use]
    pub fn to_record(&self) -> PatientRecord {
        PatientRecord::new(&self.id, &self.name, &self.email, &self.age, &self.disease)
    }
}
