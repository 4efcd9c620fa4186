//! Pure projection from session/form state to visible UI elements.
//!
//! The embedding front end renders whatever this projection says; the
//! state machine itself never touches widgets.

use super::forms::{AuthFormState, FormMode};

/// Top-level screen state, derived from the presence of a live identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUiState {
    /// No identity: the login/registration card is shown.
    LoggedOut,
    /// Live identity: the patient management card is shown.
    LoggedIn,
}

/// Everything a rendering layer needs to draw the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiProjection {
    pub login_card_visible: bool,
    pub patient_card_visible: bool,
    pub confirm_field_visible: bool,
    pub cancel_button_visible: bool,
    pub records_visible: bool,
    pub progress_visible: bool,
    pub form_title: &'static str,
    /// Label of the primary control; doubles as "Cancel" while
    /// registering.
    pub primary_button_label: &'static str,
    pub register_button_label: &'static str,
    pub records_button_label: &'static str,
    pub mismatch_hint: Option<&'static str>,
}

/// Compute the visible elements for the given state.
#[must_use]
pub fn project(
    session: SessionUiState,
    auth_form: &AuthFormState,
    busy: bool,
    records_visible: bool,
) -> UiProjection {
    let registering = auth_form.mode() == FormMode::Registering;
    let logged_in = session == SessionUiState::LoggedIn;

    UiProjection {
        login_card_visible: !logged_in,
        patient_card_visible: logged_in,
        confirm_field_visible: !logged_in && registering,
        cancel_button_visible: !logged_in && registering,
        records_visible: logged_in && records_visible,
        progress_visible: busy,
        form_title: if registering {
            "Create Admin Account"
        } else {
            "Hospital Admin Portal"
        },
        primary_button_label: if registering { "Cancel" } else { "Login" },
        register_button_label: if registering {
            "Create Account"
        } else {
            "Register"
        },
        records_button_label: if logged_in && records_visible {
            "Hide Patient Records"
        } else {
            "View Patient Records"
        },
        mismatch_hint: if logged_in {
            None
        } else {
            auth_form.mismatch_hint()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logged_out_login_mode() {
        let form = AuthFormState::default();
        let p = project(SessionUiState::LoggedOut, &form, false, false);

        assert!(p.login_card_visible);
        assert!(!p.patient_card_visible);
        assert!(!p.confirm_field_visible);
        assert!(!p.cancel_button_visible);
        assert_eq!(p.form_title, "Hospital Admin Portal");
        assert_eq!(p.primary_button_label, "Login");
        assert_eq!(p.register_button_label, "Register");
    }

    #[test]
    fn test_registering_reveals_confirmation_and_relabels() {
        let mut form = AuthFormState::default();
        form.switch_to_register();
        let p = project(SessionUiState::LoggedOut, &form, false, false);

        assert!(p.confirm_field_visible);
        assert!(p.cancel_button_visible);
        assert_eq!(p.form_title, "Create Admin Account");
        assert_eq!(p.primary_button_label, "Cancel");
        assert_eq!(p.register_button_label, "Create Account");
    }

    #[test]
    fn test_logged_in_hides_login_card() {
        let form = AuthFormState::default();
        let p = project(SessionUiState::LoggedIn, &form, false, false);

        assert!(!p.login_card_visible);
        assert!(p.patient_card_visible);
        assert!(!p.records_visible);
        assert_eq!(p.records_button_label, "View Patient Records");

        let p = project(SessionUiState::LoggedIn, &form, false, true);
        assert!(p.records_visible);
        assert_eq!(p.records_button_label, "Hide Patient Records");
    }

    #[test]
    fn test_mismatch_hint_is_projected() {
        let mut form = AuthFormState::default();
        form.switch_to_register();
        form.set_password("abc123");
        form.set_confirm("xyz999");

        let p = project(SessionUiState::LoggedOut, &form, false, false);
        assert_eq!(p.mismatch_hint, Some("Passwords do not match"));
    }

    #[test]
    fn test_busy_shows_progress() {
        let form = AuthFormState::default();
        let p = project(SessionUiState::LoggedOut, &form, true, false);
        assert!(p.progress_visible);
    }
}
